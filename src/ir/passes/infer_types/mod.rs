//! # Type Inference
//!
//! Types flow forward from the entry: every effect is visited in DFS
//! pre-order and the types of the variables it assigns are computed from its
//! operator and the types of its arguments. The pass is generic over the
//! [TypeSystem]; the rule for each operator is an inferer registered under
//! its [OpKey].
//!
//! The results are stored as the [TypeOf] ext of each assigned variable.

mod java;
mod signature;

use core::fmt;
use std::marker::PhantomData;

use rustc_hash::FxHashMap;

pub use self::{
    java::{FunctionMethod, JavaTypes},
    signature::{with_arity, FuncType, Signature, WithArity},
};
use crate::{
    collections::ext::{ExtContainer, ExtKey},
    ir::{
        passman::LocalPassMut,
        Block,
        Context,
        Effect,
        Func,
        Insn,
        IrError,
        IrResult,
        MetaKinds,
        OpKey,
        Var,
    },
    utils::dfs::PreOrder,
};

/// A set of types the inference works with.
pub trait TypeSystem: 'static {
    type Ty: Clone + PartialEq + fmt::Display + fmt::Debug + 'static;

    /// Parse a concrete type token of a [Signature].
    fn parse_ty(token: &str) -> IrResult<Self::Ty>;

    /// Whether the type is the type of a value with no information, like
    /// `null`.
    fn is_bottom(_ty: &Self::Ty) -> bool { false }

    /// Whether a value of type `actual` is acceptable where `expected` is.
    fn unifies(expected: &Self::Ty, actual: &Self::Ty) -> bool { expected == actual }
}

/// The inferred type of a variable.
pub struct TypeOf<Ty>(PhantomData<fn() -> Ty>);

impl<Ty: 'static> ExtKey for TypeOf<Ty> {
    type Value = Ty;

    const NAME: &'static str = "TYPE";
}

pub fn type_of<Ty: 'static>(ctx: &Context, var: Var) -> Option<&Ty> {
    var.get_ext::<TypeOf<Ty>>(ctx)
}

/// The types of the arguments of an instruction, all of which must be known.
pub fn arg_types<Ty: Clone + 'static>(ctx: &Context, insn: Insn) -> IrResult<Vec<Ty>> {
    insn.args(ctx)
        .iter()
        .map(|&arg| var_type(ctx, arg))
        .collect()
}

fn var_type<Ty: Clone + 'static>(ctx: &Context, var: Var) -> IrResult<Ty> {
    var.get_ext_or_err::<TypeOf<Ty>>(ctx)
        .cloned()
        .map_err(|err| IrError::from_missing_ext(err, var.display(ctx)))
}

/// Computes the result types of an instruction.
pub type Inferer<Ty> = Box<dyn Fn(&Context, Insn) -> IrResult<Vec<Ty>>>;

/// Infer the types of all variables assigned in a function.
pub struct InferTypes<T: TypeSystem> {
    inferers: FxHashMap<OpKey, Inferer<T::Ty>>,
    strict_phis: bool,
}

impl<T: TypeSystem> Default for InferTypes<T> {
    fn default() -> Self { Self::new() }
}

impl<T: TypeSystem> InferTypes<T> {
    /// An inference knowing only the operators meaningful in any type system:
    /// [OpKey::Identity] and [OpKey::Phi].
    pub fn new() -> Self {
        let mut infer = Self {
            inferers: FxHashMap::default(),
            strict_phis: false,
        };
        infer.register(OpKey::Identity, |ctx, insn| arg_types(ctx, insn));
        infer.register(OpKey::Phi, phi_inferer::<T>(false));
        infer
    }

    /// With strict phis, all typed arguments of a phi must agree.
    pub fn with_strict_phis(mut self, strict: bool) -> Self {
        self.strict_phis = strict;
        self.register(OpKey::Phi, phi_inferer::<T>(strict));
        self
    }

    pub fn strict_phis(&self) -> bool { self.strict_phis }

    /// Register the rule for an operator, replacing the previous one.
    pub fn register<F>(&mut self, key: OpKey, inferer: F)
    where
        F: Fn(&Context, Insn) -> IrResult<Vec<T::Ty>> + 'static,
    {
        self.inferers.insert(key, Box::new(inferer));
    }

    /// Register an operator whose argument and result types follow a fixed
    /// signature.
    pub fn register_signature(&mut self, key: OpKey, sig: &str) -> IrResult<()> {
        let sig = Signature::<T>::parse(sig)?;
        self.register(key, move |ctx, insn| sig.infer_result(&arg_types(ctx, insn)?));
        Ok(())
    }

    pub fn supports(&self, key: OpKey) -> bool { self.inferers.contains_key(&key) }

    fn infer_effect(&self, ctx: &Context, effect: Effect) -> IrResult<Vec<T::Ty>> {
        let insn = effect.insn(ctx);
        let key = insn.op(ctx).key;
        let inferer = self
            .inferers
            .get(&key)
            .ok_or_else(|| IrError::unsupported(format!("no type rule for {key}")))?;

        let tys = inferer(ctx, insn)?;
        let assigned = effect.assigns_to(ctx).len();
        if assigned != tys.len() {
            return Err(IrError::illegal(format!(
                "insn return type mismatch, assigns {}, inferred {}",
                assigned,
                tys.len()
            )));
        }
        Ok(tys)
    }
}

/// A phi has the type of its first typed argument which is not bottom.
///
/// Arguments not typed yet come from back edges and are skipped. A phi with
/// only bottom arguments has no type.
fn phi_inferer<T: TypeSystem>(
    strict: bool,
) -> impl Fn(&Context, Insn) -> IrResult<Vec<T::Ty>> + 'static {
    move |ctx, insn| {
        let mut found: Option<T::Ty> = None;
        for (i, &arg) in insn.args(ctx).iter().enumerate() {
            let Some(ty) = type_of::<T::Ty>(ctx, arg) else {
                continue;
            };
            if T::is_bottom(ty) {
                continue;
            }
            if let Some(first) = &found {
                if !T::unifies(first, ty) {
                    return Err(IrError::TypeMismatch {
                        expected: first.to_string(),
                        index: i,
                        actual: ty.to_string(),
                    });
                }
            } else {
                found = Some(ty.clone());
                if !strict {
                    break;
                }
            }
        }
        found
            .map(|ty| vec![ty])
            .ok_or_else(|| IrError::illegal("could not infer phi type"))
    }
}

impl<T: TypeSystem> LocalPassMut for InferTypes<T> {
    type Output = ();

    fn run(&mut self, ctx: &mut Context, func: Func) -> IrResult<((), bool)> {
        let order: Vec<Block> = PreOrder::<Block>::new(ctx, func).collect();

        let mut typed = 0;
        for block in order {
            let effects = block.effects(ctx).to_vec();
            for effect in effects {
                let tys = self.infer_effect(ctx, effect).map_err(|err| {
                    IrError::InferenceFailed {
                        effect: effect.display(ctx).to_string(),
                        block: block.to_string(),
                        created_at: effect.insn(ctx).created_at(ctx).map(str::to_string),
                        source: Box::new(err),
                    }
                })?;
                let vars = effect.assigns_to(ctx).to_vec();
                for (var, ty) in vars.into_iter().zip(tys) {
                    log::trace!("{}: {}", var.display(ctx), ty);
                    var.attach_ext::<TypeOf<T::Ty>>(ctx, ty);
                    typed += 1;
                }
            }
        }

        log::debug!("inferred {} types in {}", typed, func.name(ctx));

        func.metadata_mut(ctx).validate(MetaKinds::TYPES_INFERRED);
        Ok(((), false))
    }
}
