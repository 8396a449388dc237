//! The signature model and the override-consistency algorithm.
//!
//! A [`Signature`] normalizes a callable's parameter list into
//! required/defaulted buckets plus the two variadic capture flags.
//! [`signatures_consistent`] decides whether an overriding signature can be
//! called everywhere the base signature could be called.
//!
//! Parameter lists name explicit parameters only -- the receiver is implied
//! by the method kind and never appears here.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A callable's parameter list, normalized for consistency checking.
///
/// Parameters are positional names in declaration order; the trailing
/// `n_defaults` of them carry default values. `has_varargs` / `has_kwargs`
/// record variadic positional and keyword captures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    args: SmallVec<[String; 4]>,
    n_defaults: usize,
    has_varargs: bool,
    has_kwargs: bool,
}

impl Signature {
    /// Creates a signature where every named parameter is required.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Signature {
            args: args.into_iter().map(Into::into).collect(),
            n_defaults: 0,
            has_varargs: false,
            has_kwargs: false,
        }
    }

    /// Marks the trailing `n` parameters as defaulted.
    ///
    /// `n` is clamped to the parameter count.
    pub fn with_defaults(mut self, n: usize) -> Self {
        self.n_defaults = n.min(self.args.len());
        self
    }

    /// Adds a variadic positional capture (`*args`).
    pub fn with_varargs(mut self) -> Self {
        self.has_varargs = true;
        self
    }

    /// Adds a variadic keyword capture (`**kwargs`).
    pub fn with_kwargs(mut self) -> Self {
        self.has_kwargs = true;
        self
    }

    /// All positional parameter names, in declaration order.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The required (non-defaulted) parameter names.
    pub fn required(&self) -> &[String] {
        &self.args[..self.default_boundary()]
    }

    /// The defaulted parameter names, in declaration order.
    pub fn defaulted(&self) -> &[String] {
        &self.args[self.default_boundary()..]
    }

    // Saturates so that a deserialized signature with an oversized
    // `n_defaults` splits at zero instead of panicking.
    fn default_boundary(&self) -> usize {
        self.args.len().saturating_sub(self.n_defaults)
    }

    /// Returns `true` if the signature captures variadic positional args.
    pub fn has_varargs(&self) -> bool {
        self.has_varargs
    }

    /// Returns `true` if the signature captures variadic keyword args.
    pub fn has_kwargs(&self) -> bool {
        self.has_kwargs
    }
}

/// Decides whether `func` (an override) can safely substitute for `base`.
///
/// The override must be callable everywhere the base could be called:
///
/// - Required parameter names must match the base's verbatim (renaming a
///   required parameter is a break; adding a trailing parameter with a
///   default is not). A varargs override only needs the overlapping prefix
///   to match.
/// - The override must not add required parameters beyond the base's count.
/// - Unless the override captures keywords, its defaulted names must start
///   with the base's defaulted names in the same order. A kwargs capture
///   always satisfies this rule -- a deliberate leniency kept for
///   compatibility.
/// - When the base has defaults and the override captures varargs, a
///   defaulted name that sits at a different positional index in the two
///   lists invalidates the override (a call that bound it positionally on
///   the base would bind it twice on the override).
/// - A varargs/kwargs capture on the base must be preserved by the override.
///
/// Zero-parameter signatures are trivially consistent.
pub fn signatures_consistent(func: &Signature, base: &Signature) -> bool {
    let base_required = base.required();
    let base_defaulted = base.defaulted();
    let func_required = func.required();
    let func_defaulted = func.defaulted();

    let req_names_match = if func.has_varargs() {
        let shortest = base_required.len().min(func_required.len());
        func_required[..shortest] == base_required[..shortest]
    } else {
        // (a, b, c) can be overridden with (a, b, c=0), so compare against
        // the full parameter list here, not just the required bucket.
        func.args()
            .get(..base_required.len())
            .is_some_and(|prefix| prefix == base_required)
    };

    let no_new_required = func_required.len() <= base_required.len();

    let mut def_names_match = if func.has_kwargs() {
        true
    } else {
        func_defaulted
            .get(..base_defaulted.len())
            .is_some_and(|prefix| prefix == base_defaulted)
    };

    if !base_defaulted.is_empty() && func.has_varargs() {
        // Guard against duplicate binding, e.g. base(a, b, c=None) vs
        // func(a, c=4, *args): base can be called with (x, y, z) but the
        // override would bind c twice.
        let defaulted_from = func.args().len() - func_defaulted.len();
        for (func_index, arg) in func.args().iter().enumerate().skip(defaulted_from) {
            if let Some(base_index) = base.args().iter().position(|a| a == arg) {
                if base_index != func_index {
                    def_names_match = false;
                    break;
                }
            }
        }
    }

    let mut varargs_ok = true;
    if base.has_varargs() {
        varargs_ok = func.has_varargs();
    }
    if base.has_kwargs() {
        varargs_ok &= func.has_kwargs();
    }

    req_names_match && def_names_match && no_new_required && varargs_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sig<const N: usize>(args: [&str; N]) -> Signature {
        Signature::new(args)
    }

    // -----------------------------------------------------------------------
    // Bucket views
    // -----------------------------------------------------------------------

    #[test]
    fn buckets_split_at_default_boundary() {
        let s = sig(["a", "b", "c"]).with_defaults(1);
        assert_eq!(s.required(), ["a", "b"]);
        assert_eq!(s.defaulted(), ["c"]);
    }

    #[test]
    fn defaults_clamped_to_arg_count() {
        let s = sig(["a"]).with_defaults(5);
        assert!(s.required().is_empty());
        assert_eq!(s.defaulted(), ["a"]);
    }

    #[test]
    fn deserialized_oversized_defaults_split_at_zero() {
        // The builder clamps, but deserialization bypasses it; the bucket
        // views must saturate rather than underflow.
        let s: Signature = serde_json::from_str(
            r#"{"args":["a"],"n_defaults":5,"has_varargs":false,"has_kwargs":false}"#,
        )
        .unwrap();
        assert!(s.required().is_empty());
        assert_eq!(s.defaulted(), ["a"]);
    }

    // -----------------------------------------------------------------------
    // Required-name rules
    // -----------------------------------------------------------------------

    #[test]
    fn identical_signatures_are_consistent() {
        let base = sig(["a", "b"]);
        assert!(signatures_consistent(&base.clone(), &base));
    }

    #[test]
    fn zero_parameter_signatures_are_consistent() {
        assert!(signatures_consistent(&sig([]), &sig([])));
    }

    #[test]
    fn adding_trailing_default_is_consistent() {
        let base = sig(["a", "b"]);
        let func = sig(["a", "b", "c"]).with_defaults(1);
        assert!(signatures_consistent(&func, &base));
    }

    #[test]
    fn dropping_required_parameter_is_inconsistent() {
        let base = sig(["a", "b"]);
        let func = sig(["a"]);
        assert!(!signatures_consistent(&func, &base));
    }

    #[test]
    fn reordering_required_parameters_is_inconsistent() {
        let base = sig(["a", "b"]);
        let func = sig(["b", "a"]);
        assert!(!signatures_consistent(&func, &base));
    }

    #[test]
    fn renaming_required_parameter_is_inconsistent() {
        let base = sig(["a", "b"]);
        let func = sig(["a", "x"]);
        assert!(!signatures_consistent(&func, &base));
    }

    #[test]
    fn defaulting_an_existing_required_parameter_is_consistent() {
        // base(a, b, c) overridden with func(a, b, c=0).
        let base = sig(["a", "b", "c"]);
        let func = sig(["a", "b", "c"]).with_defaults(1);
        assert!(signatures_consistent(&func, &base));
    }

    #[test]
    fn adding_required_parameter_is_inconsistent() {
        let base = sig(["a"]);
        let func = sig(["a", "b"]);
        assert!(!signatures_consistent(&func, &base));
    }

    // -----------------------------------------------------------------------
    // Varargs rules
    // -----------------------------------------------------------------------

    #[test]
    fn varargs_override_matches_on_overlapping_prefix() {
        let base = sig(["a", "b", "c"]);
        let func = sig(["a", "b"]).with_varargs();
        assert!(signatures_consistent(&func, &base));
    }

    #[test]
    fn varargs_override_with_mismatched_prefix_is_inconsistent() {
        let base = sig(["a", "b", "c"]);
        let func = sig(["a", "x"]).with_varargs();
        assert!(!signatures_consistent(&func, &base));
    }

    #[test]
    fn base_varargs_must_be_preserved() {
        let base = sig(["a"]).with_varargs();
        assert!(!signatures_consistent(&sig(["a"]), &base));
        assert!(signatures_consistent(&sig(["a"]).with_varargs(), &base));
    }

    #[test]
    fn base_kwargs_must_be_preserved() {
        let base = sig(["a"]).with_kwargs();
        assert!(!signatures_consistent(&sig(["a"]), &base));
        assert!(signatures_consistent(&sig(["a"]).with_kwargs(), &base));
    }

    #[test]
    fn duplicate_binding_through_varargs_is_inconsistent() {
        // base(a, b, c=None) vs func(a, c=4, *args): calling with three
        // positional values binds c twice on the override.
        let base = sig(["a", "b", "c"]).with_defaults(1);
        let func = sig(["a", "c"]).with_defaults(1).with_varargs();
        assert!(!signatures_consistent(&func, &base));
    }

    #[test]
    fn same_index_default_with_varargs_is_consistent() {
        let base = sig(["a", "b", "c"]).with_defaults(1);
        let func = sig(["a", "b", "c"]).with_defaults(1).with_varargs();
        assert!(signatures_consistent(&func, &base));
    }

    // -----------------------------------------------------------------------
    // Defaulted-name rules
    // -----------------------------------------------------------------------

    #[test]
    fn defaulted_names_must_prefix_match() {
        let base = sig(["a", "b", "c"]).with_defaults(2);
        let func = sig(["a", "c", "b"]).with_defaults(2);
        assert!(!signatures_consistent(&func, &base));
    }

    #[test]
    fn dropping_defaulted_parameter_is_inconsistent() {
        let base = sig(["a", "b"]).with_defaults(1);
        let func = sig(["a"]);
        assert!(!signatures_consistent(&func, &base));
    }

    #[test]
    fn kwargs_capture_always_satisfies_defaulted_names() {
        // Documented leniency: a keyword capture stands in for any set of
        // defaulted names.
        let base = sig(["a", "b", "c"]).with_defaults(2);
        let func = sig(["a"]).with_kwargs();
        assert!(signatures_consistent(&func, &base));
    }

    // -----------------------------------------------------------------------
    // Property-based coverage
    // -----------------------------------------------------------------------

    fn arb_names() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-e]", 0..5).prop_map(|names| {
            let mut out: Vec<String> = Vec::new();
            for n in names {
                if !out.contains(&n) {
                    out.push(n);
                }
            }
            out
        })
    }

    proptest! {
        #[test]
        fn every_signature_is_consistent_with_itself(
            names in arb_names(),
            n_defaults in 0usize..5,
            varargs in any::<bool>(),
            kwargs in any::<bool>(),
        ) {
            let mut s = Signature::new(names).with_defaults(n_defaults);
            if varargs { s = s.with_varargs(); }
            if kwargs { s = s.with_kwargs(); }
            prop_assert!(signatures_consistent(&s, &s));
        }

        #[test]
        fn appending_a_defaulted_parameter_preserves_consistency(
            names in arb_names(),
        ) {
            let base = Signature::new(names.clone());
            let mut extended = names;
            extended.push("zz".to_string());
            // Only the new trailing parameter is defaulted.
            let func = Signature::new(extended).with_defaults(1);
            prop_assert!(signatures_consistent(&func, &base));
        }

        #[test]
        fn appending_a_required_parameter_breaks_consistency(
            names in arb_names(),
        ) {
            let base = Signature::new(names.clone());
            let mut extended = names;
            extended.push("zz".to_string());
            let func = Signature::new(extended);
            prop_assert!(!signatures_consistent(&func, &base));
        }
    }
}
