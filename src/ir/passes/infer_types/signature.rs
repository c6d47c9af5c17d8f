//! # Signature Mini-Language
//!
//! A signature is written `lhs -> rhs`, each side a space separated list of
//! type tokens. A token starting with a lowercase letter is a type variable:
//! its first occurrence on the left binds it to the argument type there, any
//! later occurrence must agree with the binding. Type variables are
//! substituted on the right. Other tokens are concrete types, parsed by the
//! [TypeSystem].
//!
//! ```text
//! I I -> I        two ints to an int
//! a b -> b a      swap two values of any types
//! [J I J ->       store a long into a long array
//! ```

use core::fmt;

use rustc_hash::FxHashMap;

use super::TypeSystem;
use crate::ir::{IrError, IrResult};

/// The type of an operation: a fixed number of arguments to some results.
pub trait FuncType<Ty> {
    fn arity(&self) -> usize;

    /// Check the argument types and compute the result types.
    ///
    /// # Errors
    ///
    /// - [IrError::IllegalArgument] if the number of arguments is not
    ///   [arity](Self::arity).
    /// - [IrError::TypeMismatch] if an argument has the wrong type.
    fn infer_result(&self, args: &[Ty]) -> IrResult<Vec<Ty>>;
}

fn check_arity(expected: usize, actual: usize) -> IrResult<()> {
    if expected != actual {
        return Err(IrError::illegal(format!(
            "parameter length mismatch: expected {expected}, got {actual}"
        )));
    }
    Ok(())
}

/// A [FuncType] computing its results with a closure.
pub struct WithArity<F> {
    arity: usize,
    f: F,
}

/// A [FuncType] of `arity` arguments computing its results with `f`.
pub fn with_arity<Ty, F>(arity: usize, f: F) -> WithArity<F>
where
    F: Fn(&[Ty]) -> IrResult<Vec<Ty>>,
{
    WithArity { arity, f }
}

impl<Ty, F> FuncType<Ty> for WithArity<F>
where
    F: Fn(&[Ty]) -> IrResult<Vec<Ty>>,
{
    fn arity(&self) -> usize { self.arity }

    fn infer_result(&self, args: &[Ty]) -> IrResult<Vec<Ty>> {
        check_arity(self.arity, args.len())?;
        (self.f)(args)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Slot<Ty> {
    /// Binds a type variable to the argument at this position.
    Bind,
    /// A type variable bound at the given argument position.
    Var(usize),
    Concrete(Ty),
}

/// A parsed signature.
pub struct Signature<T: TypeSystem> {
    lhs: Vec<Slot<T::Ty>>,
    rhs: Vec<Slot<T::Ty>>,
    source: String,
}

impl<T: TypeSystem> Signature<T> {
    /// Parse a signature.
    ///
    /// # Errors
    ///
    /// Fails with [IrError::IllegalArgument] if the string has no single `->`,
    /// a type variable first appears on the right, or a concrete type does not
    /// parse.
    pub fn parse(source: &str) -> IrResult<Self> {
        let mut sides = source.split("->");
        let (Some(lhs), Some(rhs), None) = (sides.next(), sides.next(), sides.next()) else {
            return Err(IrError::illegal(format!("malformed signature: {source:?}")));
        };

        let mut vars: FxHashMap<&str, usize> = FxHashMap::default();

        let mut lhs_slots = Vec::new();
        for (i, token) in lhs.split_whitespace().enumerate() {
            let slot = if is_type_var(token) {
                match vars.get(token) {
                    Some(&pos) => Slot::Var(pos),
                    None => {
                        vars.insert(token, i);
                        Slot::Bind
                    }
                }
            } else {
                Slot::Concrete(T::parse_ty(token)?)
            };
            lhs_slots.push(slot);
        }

        let mut rhs_slots = Vec::new();
        for token in rhs.split_whitespace() {
            let slot = if is_type_var(token) {
                match vars.get(token) {
                    Some(&pos) => Slot::Var(pos),
                    None => {
                        return Err(IrError::illegal(format!(
                            "new type variables only allowed in lhs: {token} in {source:?}"
                        )))
                    }
                }
            } else {
                Slot::Concrete(T::parse_ty(token)?)
            };
            rhs_slots.push(slot);
        }

        Ok(Self {
            lhs: lhs_slots,
            rhs: rhs_slots,
            source: source.to_string(),
        })
    }

    pub fn results(&self) -> usize { self.rhs.len() }
}

fn is_type_var(token: &str) -> bool { token.starts_with(|c: char| c.is_lowercase()) }

impl<T: TypeSystem> FuncType<T::Ty> for Signature<T> {
    fn arity(&self) -> usize { self.lhs.len() }

    fn infer_result(&self, args: &[T::Ty]) -> IrResult<Vec<T::Ty>> {
        check_arity(self.lhs.len(), args.len())?;

        // binding of the type variable introduced at each position
        let mut bound: Vec<Option<T::Ty>> = vec![None; args.len()];
        for (i, (slot, arg)) in self.lhs.iter().zip(args).enumerate() {
            let expected = match slot {
                Slot::Bind => {
                    bound[i] = Some(arg.clone());
                    continue;
                }
                Slot::Var(pos) => bound[*pos].as_ref(),
                Slot::Concrete(ty) => Some(ty),
            };
            let Some(expected) = expected else {
                continue;
            };
            if !T::unifies(expected, arg) {
                return Err(IrError::TypeMismatch {
                    expected: expected.to_string(),
                    index: i,
                    actual: arg.to_string(),
                });
            }
            // a variable bound to bottom takes the first proper type
            if let Slot::Var(pos) = slot {
                if T::is_bottom(expected) && !T::is_bottom(arg) {
                    bound[*pos] = Some(arg.clone());
                }
            }
        }

        self.rhs
            .iter()
            .map(|slot| match slot {
                Slot::Var(pos) => bound[*pos]
                    .clone()
                    .ok_or_else(|| IrError::illegal(format!("unbound type variable in {self}"))),
                Slot::Concrete(ty) => Ok(ty.clone()),
                Slot::Bind => Err(IrError::illegal(format!("binding on the right of {self}"))),
            })
            .collect()
    }
}

impl<T: TypeSystem> fmt::Display for Signature<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.source) }
}

impl<T: TypeSystem> fmt::Debug for Signature<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("source", &self.source)
            .field("lhs", &self.lhs)
            .field("rhs", &self.rhs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Types are the tokens themselves; `_` is bottom and unifies with all.
    struct Tokens;

    impl TypeSystem for Tokens {
        type Ty = String;

        fn parse_ty(token: &str) -> IrResult<String> {
            if token.contains('!') {
                return Err(IrError::illegal(format!("bad type {token}")));
            }
            Ok(token.to_string())
        }

        fn is_bottom(ty: &String) -> bool { ty == "_" }

        fn unifies(expected: &String, actual: &String) -> bool {
            expected == actual || expected == "_" || actual == "_"
        }
    }

    fn tys(tokens: &[&str]) -> Vec<String> { tokens.iter().map(|t| t.to_string()).collect() }

    fn sig(source: &str) -> Signature<Tokens> { Signature::parse(source).unwrap() }

    #[test]
    fn test_concrete_signature() {
        let add = sig("I I -> I");
        assert_eq!(add.arity(), 2);
        assert_eq!(add.results(), 1);
        assert_eq!(add.infer_result(&tys(&["I", "I"])).unwrap(), tys(&["I"]));
    }

    #[test]
    fn test_type_variables_substitute() {
        let dup_x1 = sig("a b -> b a b");
        assert_eq!(
            dup_x1.infer_result(&tys(&["X", "Y"])).unwrap(),
            tys(&["Y", "X", "Y"])
        );

        let select = sig("b b I -> b");
        assert_eq!(
            select.infer_result(&tys(&["F", "F", "I"])).unwrap(),
            tys(&["F"])
        );
    }

    #[test]
    fn test_mismatch_names_index() {
        let select = sig("b b I -> b");
        let err = select.infer_result(&tys(&["F", "D", "I"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "type mismatch: expected F at index 1, got D"
        );

        let err = sig("I I -> I")
            .infer_result(&tys(&["I", "J"]))
            .unwrap_err();
        assert!(matches!(err, IrError::TypeMismatch { index: 1, .. }));
    }

    #[test]
    fn test_arity_mismatch() {
        let err = sig("a -> ").infer_result(&tys(&["I", "I"])).unwrap_err();
        assert!(matches!(err, IrError::IllegalArgument(_)));
    }

    #[test]
    fn test_bottom_binding_is_upgraded() {
        let select = sig("b b I -> b");
        assert_eq!(
            select.infer_result(&tys(&["_", "S", "I"])).unwrap(),
            tys(&["S"])
        );
        assert_eq!(
            select.infer_result(&tys(&["S", "_", "I"])).unwrap(),
            tys(&["S"])
        );
    }

    #[test]
    fn test_malformed_signatures() {
        assert!(Signature::<Tokens>::parse("I I").is_err());
        assert!(Signature::<Tokens>::parse("I -> I -> I").is_err());
        assert!(Signature::<Tokens>::parse("I -> a").is_err());
        assert!(Signature::<Tokens>::parse("I! -> I").is_err());

        let nop = sig(" -> ");
        assert_eq!(nop.arity(), 0);
        assert!(nop.infer_result(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_parsing_is_deterministic() {
        let args = tys(&["A", "B", "C"]);
        let first = sig("a b c -> c b a");
        let second = sig("a b c -> c b a");
        assert_eq!(
            first.infer_result(&args).unwrap(),
            second.infer_result(&args).unwrap()
        );
        assert_eq!(first.to_string(), "a b c -> c b a");
    }

    #[test]
    fn test_with_arity() {
        let first = with_arity(2, |args: &[String]| Ok(vec![args[0].clone()]));
        assert_eq!(first.arity(), 2);
        assert_eq!(first.infer_result(&tys(&["X", "Y"])).unwrap(), tys(&["X"]));
        assert!(first.infer_result(&tys(&["X"])).is_err());
    }
}
