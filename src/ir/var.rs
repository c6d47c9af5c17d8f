use core::fmt;

use rustc_hash::FxHashSet;

use super::{Context, Effect, Insn, IrError, IrResult};
use crate::{
    collections::{
        ext::{ExtContainer, ExtMap},
        storage::{ArenaAlloc, ArenaPtr, BaseArenaPtr},
    },
    impl_arena,
};

/// The data of an SSA variable.
///
/// The name and index are for display only, variables are identified by
/// their handle.
pub struct VarData {
    self_ptr: Var,
    name: String,
    index: u32,
    /// The effect assigning the variable, set when the effect is created.
    pub(super) assigned_at: Option<Effect>,
    /// The instructions using the variable, computed by
    /// [ComputeUses](super::passes::ComputeUses).
    pub(super) used_at: Option<FxHashSet<Insn>>,
    pub(super) exts: ExtMap,
}

impl VarData {
    pub fn self_ptr(&self) -> Var { self.self_ptr }
}

#[derive(Debug, Hash, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Var(BaseArenaPtr<VarData>);

impl_arena!(Context, VarData, Var, vars);

impl Var {
    /// Create a variable with a fixed index.
    ///
    /// Most code should use [Func::new_var](super::Func::new_var) instead, which
    /// disambiguates indices when configured to.
    pub fn new(ctx: &mut Context, name: impl Into<String>, index: u32) -> Var {
        ctx.alloc_with(|self_ptr| VarData {
            self_ptr,
            name: name.into(),
            index,
            assigned_at: None,
            used_at: None,
            exts: ExtMap::default(),
        })
    }

    pub fn name(self, ctx: &Context) -> &str { &self.deref(ctx).name }

    pub fn index(self, ctx: &Context) -> u32 { self.deref(ctx).index }

    pub fn assigned_at(self, ctx: &Context) -> Option<Effect> { self.deref(ctx).assigned_at }

    /// The instructions using this variable.
    ///
    /// # Errors
    ///
    /// Fails if uses were not computed since the variable was created or
    /// its uses were cleared.
    pub fn used_at(self, ctx: &Context) -> IrResult<&FxHashSet<Insn>> {
        self.deref(ctx)
            .used_at
            .as_ref()
            .ok_or_else(|| IrError::missing("USED_AT", self.display(ctx)))
    }

    pub(super) fn set_used_at(self, ctx: &mut Context, uses: Option<FxHashSet<Insn>>) {
        self.deref_mut(ctx).used_at = uses;
    }

    /// The use set, created empty if absent.
    pub(super) fn uses_mut(self, ctx: &mut Context) -> &mut FxHashSet<Insn> {
        self.deref_mut(ctx)
            .used_at
            .get_or_insert_with(FxHashSet::default)
    }

    pub fn id(self) -> usize { self.0.id() }

    pub fn display(self, ctx: &Context) -> DisplayVar<'_> {
        DisplayVar {
            data: self.deref(ctx),
        }
    }
}

impl ExtContainer<Context> for Var {
    fn ext_map(self, ctx: &Context) -> &ExtMap { &self.deref(ctx).exts }

    fn ext_map_mut(self, ctx: &mut Context) -> &mut ExtMap { &mut self.deref_mut(ctx).exts }
}

pub struct DisplayVar<'a> {
    data: &'a VarData,
}

impl fmt::Display for DisplayVar<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.data.name)?;
        if self.data.index != 0 {
            write!(f, ".{}", self.data.index)?;
        }
        Ok(())
    }
}
