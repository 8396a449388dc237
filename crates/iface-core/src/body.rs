//! Callable bodies as declared data, and the emptiness verifier.
//!
//! There is no reflection to inspect compiled code, so callable bodies are
//! written down in a restricted instruction grammar ([`BodyOp`]). The
//! verifier classifies an instruction sequence as a no-op placeholder, a
//! construct-and-raise of the not-implemented signal, or real computation.
//! Bodies are shape-checked only; nothing here executes them.

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

use crate::signature::Signature;
use crate::value::ConstValue;

/// Global name of the "not implemented" signal. A body whose sole effect is
/// constructing and raising this signal counts as empty.
pub const NOT_IMPLEMENTED_SIGNAL: &str = "NotImplementedError";

/// One instruction in a callable body.
///
/// The grammar covers exactly the shapes the emptiness verifier has to
/// distinguish (constant loads, global loads, calls, raises, returns) plus
/// a few attribute ops so non-trivial bodies can be written down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BodyOp {
    /// Push a constant.
    LoadConst(ConstValue),
    /// Push a global by name.
    LoadGlobal(String),
    /// Push an attribute of the value on top of the stack.
    LoadAttr(String),
    /// Store the top of the stack into an attribute.
    StoreAttr(String),
    /// Call the value on top of the stack with `argc` arguments.
    Call { argc: u8 },
    /// Raise the value on top of the stack.
    Raise,
    /// Return the value on top of the stack.
    Return,
}

/// An instruction sequence forming a callable body.
///
/// Every body built by the convenience constructors ends with the implicit
/// `LoadConst(Null); Return` pair, mirroring how a compiler terminates a
/// body with no explicit return value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    ops: SmallVec<[BodyOp; 8]>,
}

impl Body {
    /// A body with no statements: just the implicit `return null`.
    pub fn empty() -> Self {
        Body {
            ops: smallvec![BodyOp::LoadConst(ConstValue::Null), BodyOp::Return],
        }
    }

    /// A body that constructs and raises the not-implemented signal.
    ///
    /// The trailing implicit return is unreachable but present, as it would
    /// be in compiled code.
    pub fn not_implemented() -> Self {
        Body {
            ops: smallvec![
                BodyOp::LoadGlobal(NOT_IMPLEMENTED_SIGNAL.to_string()),
                BodyOp::Call { argc: 0 },
                BodyOp::Raise,
                BodyOp::LoadConst(ConstValue::Null),
                BodyOp::Return,
            ],
        }
    }

    /// A body returning a constant value.
    pub fn returning(value: ConstValue) -> Self {
        Body {
            ops: smallvec![BodyOp::LoadConst(value), BodyOp::Return],
        }
    }

    /// A body from a raw instruction sequence, as given.
    pub fn of<I>(ops: I) -> Self
    where
        I: IntoIterator<Item = BodyOp>,
    {
        Body {
            ops: ops.into_iter().collect(),
        }
    }

    /// The instruction sequence.
    pub fn ops(&self) -> &[BodyOp] {
        &self.ops
    }
}

/// A named callable: signature, body, and an optional back-reference to the
/// callable a decorator wrapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Callable {
    pub name: String,
    pub signature: Signature,
    pub body: Body,
    /// Decorator back-reference chain. The verifier only follows it in
    /// unwrap mode.
    pub wrapped: Option<Box<Callable>>,
}

impl Callable {
    /// Creates a callable with the given name, signature and body.
    pub fn new(name: impl Into<String>, signature: Signature, body: Body) -> Self {
        Callable {
            name: name.into(),
            signature,
            body,
            wrapped: None,
        }
    }

    /// Records the callable this one wraps (decorator back-reference).
    pub fn wrapping(mut self, inner: Callable) -> Self {
        self.wrapped = Some(Box::new(inner));
        self
    }
}

/// Decides whether a callable body is a no-op placeholder.
///
/// A body is empty iff, after stripping the implicit trailing
/// `LoadConst(Null); Return` pair, the remaining instructions are nothing at
/// all, or exactly a construct-and-raise of [`NOT_IMPLEMENTED_SIGNAL`]. Any
/// other trailing return value marks the body non-empty, as does a raise
/// without the constructing call.
///
/// With `unwrap` set, the decorator back-reference chain is followed first,
/// so a decorated placeholder is judged by the callable it wraps.
pub fn is_empty_function(func: &Callable, unwrap: bool) -> bool {
    let mut func = func;
    if unwrap {
        while let Some(inner) = &func.wrapped {
            func = inner;
        }
    }
    let ops = func.body.ops();
    if ops.len() < 2 {
        // Shorter than the implicit return pair: nothing to inspect.
        return true;
    }
    if !matches!(ops[ops.len() - 1], BodyOp::Return) {
        return false;
    }
    if !matches!(ops[ops.len() - 2], BodyOp::LoadConst(ConstValue::Null)) {
        // The returned value is not the implicit null.
        return false;
    }
    let rest = &ops[..ops.len() - 2];
    if rest.is_empty() {
        return true;
    }
    // The only other empty shape: construct and raise the signal. The raise
    // must consume the result of a call that instantiates the signal.
    if matches!(rest.last(), Some(BodyOp::Raise))
        && rest.len() >= 2
        && matches!(rest[rest.len() - 2], BodyOp::Call { .. })
    {
        return rest[..rest.len() - 2]
            .iter()
            .any(|op| matches!(op, BodyOp::LoadGlobal(name) if name == NOT_IMPLEMENTED_SIGNAL));
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn callable(body: Body) -> Callable {
        Callable::new("f", Signature::new(["a"]), body)
    }

    #[test]
    fn empty_body_is_empty() {
        assert!(is_empty_function(&callable(Body::empty()), false));
    }

    #[test]
    fn not_implemented_body_is_empty() {
        assert!(is_empty_function(&callable(Body::not_implemented()), false));
    }

    #[test]
    fn returning_a_value_is_not_empty() {
        assert!(!is_empty_function(
            &callable(Body::returning(ConstValue::Int(42))),
            false
        ));
    }

    #[test]
    fn returning_a_global_is_not_empty() {
        let body = Body::of([BodyOp::LoadGlobal("x".into()), BodyOp::Return]);
        assert!(!is_empty_function(&callable(body), false));
    }

    #[test]
    fn storing_an_attribute_is_not_empty() {
        let body = Body::of([
            BodyOp::LoadConst(ConstValue::Int(1)),
            BodyOp::StoreAttr("x".into()),
            BodyOp::LoadConst(ConstValue::Null),
            BodyOp::Return,
        ]);
        assert!(!is_empty_function(&callable(body), false));
    }

    #[test]
    fn raise_without_constructing_call_is_not_empty() {
        // Raising the bare signal class skips the Call instruction, which
        // the verifier requires.
        let body = Body::of([
            BodyOp::LoadGlobal(NOT_IMPLEMENTED_SIGNAL.into()),
            BodyOp::Raise,
            BodyOp::LoadConst(ConstValue::Null),
            BodyOp::Return,
        ]);
        assert!(!is_empty_function(&callable(body), false));
    }

    #[test]
    fn raising_a_different_signal_is_not_empty() {
        let body = Body::of([
            BodyOp::LoadGlobal("ValueError".into()),
            BodyOp::Call { argc: 0 },
            BodyOp::Raise,
            BodyOp::LoadConst(ConstValue::Null),
            BodyOp::Return,
        ]);
        assert!(!is_empty_function(&callable(body), false));
    }

    #[test]
    fn raise_with_message_argument_is_empty() {
        let body = Body::of([
            BodyOp::LoadGlobal(NOT_IMPLEMENTED_SIGNAL.into()),
            BodyOp::LoadConst(ConstValue::Str("todo".into())),
            BodyOp::Call { argc: 1 },
            BodyOp::Raise,
            BodyOp::LoadConst(ConstValue::Null),
            BodyOp::Return,
        ]);
        assert!(is_empty_function(&callable(body), false));
    }

    #[test]
    fn truncated_body_is_vacuously_empty() {
        let body = Body::of([BodyOp::Return]);
        assert!(is_empty_function(&callable(body), false));
    }

    #[test]
    fn unwrap_sees_through_decorator_chain() {
        let inner = Callable::new("f", Signature::new(["a"]), Body::empty());
        let wrapper = Callable::new(
            "f",
            Signature::new(["a"]).with_varargs().with_kwargs(),
            Body::of([
                BodyOp::LoadGlobal("f".into()),
                BodyOp::Call { argc: 1 },
                BodyOp::Return,
            ]),
        )
        .wrapping(inner);

        assert!(!is_empty_function(&wrapper, false));
        assert!(is_empty_function(&wrapper, true));
    }

    #[test]
    fn serde_roundtrip() {
        let c = callable(Body::not_implemented());
        let json = serde_json::to_string(&c).unwrap();
        let back: Callable = serde_json::from_str(&json).unwrap();
        assert_eq!(c, back);
    }
}
