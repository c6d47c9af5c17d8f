use core::fmt;
use std::any::{Any, TypeId};

use super::{Block, Context, Insn, InsnOwner, Var};
use crate::{
    collections::{
        ext::{ExtContainer, ExtMap},
        storage::{ArenaAlloc, ArenaPtr, BaseArenaPtr},
    },
    impl_arena,
};

/// The data of an effect: an instruction and the variables its results are
/// bound to.
pub struct EffectData {
    self_ptr: Effect,
    insn: Insn,
    assigns_to: Vec<Var>,
    /// The block the effect is in.
    pub(super) owner: Option<Block>,
    exts: ExtMap,
}

impl EffectData {
    pub fn self_ptr(&self) -> Effect { self.self_ptr }
}

#[derive(Debug, Hash, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Effect(BaseArenaPtr<EffectData>);

impl_arena!(Context, EffectData, Effect, effects);

impl Effect {
    /// Create an effect, claiming `insn` and marking it as the assignment of
    /// every variable in `assigns_to`.
    ///
    /// # Panics
    ///
    /// Panics if `insn` already belongs to an effect or control.
    pub fn new(ctx: &mut Context, insn: Insn, assigns_to: Vec<Var>) -> Effect {
        let effect = ctx.alloc_with(|self_ptr| EffectData {
            self_ptr,
            insn,
            assigns_to,
            owner: None,
            exts: ExtMap::default(),
        });
        insn.set_owner(ctx, InsnOwner::Effect(effect));
        effect.mark_assignments(ctx);
        effect
    }

    fn mark_assignments(self, ctx: &mut Context) {
        for i in 0..self.deref(ctx).assigns_to.len() {
            let var = self.deref(ctx).assigns_to[i];
            var.deref_mut(ctx).assigned_at = Some(self);
        }
    }

    pub fn insn(self, ctx: &Context) -> Insn { self.deref(ctx).insn }

    pub fn assigns_to(self, ctx: &Context) -> &[Var] { &self.deref(ctx).assigns_to }

    /// The block holding the effect.
    pub fn owner(self, ctx: &Context) -> Option<Block> { self.deref(ctx).owner }

    /// Replace the instruction, releasing the old one.
    pub fn set_insn(self, ctx: &mut Context, insn: Insn) {
        let old = std::mem::replace(&mut self.deref_mut(ctx).insn, insn);
        if old != insn {
            old.clear_owner(ctx);
            insn.set_owner(ctx, InsnOwner::Effect(self));
        }
        self.notify_vars_changed(ctx);
    }

    pub fn set_assigns_to(self, ctx: &mut Context, vars: Vec<Var>) {
        let old = std::mem::replace(&mut self.deref_mut(ctx).assigns_to, vars);
        for var in old {
            let data = var.deref_mut(ctx);
            if data.assigned_at == Some(self) {
                data.assigned_at = None;
            }
        }
        self.mark_assignments(ctx);
        self.notify_vars_changed(ctx);
    }

    fn notify_vars_changed(self, ctx: &mut Context) {
        if let Some(func) = self.owner(ctx).and_then(|block| block.parent(ctx)) {
            func.metadata_mut(ctx).vars_changed();
        }
    }

    pub fn id(self) -> usize { self.0.id() }

    pub fn display(self, ctx: &Context) -> DisplayEffect<'_> {
        DisplayEffect {
            ctx,
            data: self.deref(ctx),
        }
    }
}

impl ExtContainer<Context> for Effect {
    fn ext_map(self, ctx: &Context) -> &ExtMap { &self.deref(ctx).exts }

    fn ext_map_mut(self, ctx: &mut Context) -> &mut ExtMap { &mut self.deref_mut(ctx).exts }

    fn lookup_delegate(self, ctx: &Context, key: TypeId) -> Option<&dyn Any> {
        self.insn(ctx).lookup_erased(ctx, key)
    }
}

pub struct DisplayEffect<'a> {
    ctx: &'a Context,
    data: &'a EffectData,
}

impl fmt::Display for DisplayEffect<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.data.assigns_to.is_empty() {
            for (i, var) in self.data.assigns_to.iter().enumerate() {
                if i != 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", var.display(self.ctx))?;
            }
            write!(f, " = ")?;
        }
        write!(f, "{}", self.data.insn.display(self.ctx))
    }
}
