use core::fmt;
use std::{
    any::{Any, TypeId},
    backtrace::Backtrace,
};

use super::{Block, Context, Control, Effect, Func, Op, Var};
use crate::{
    collections::{
        ext::{ExtContainer, ExtMap},
        storage::{ArenaAlloc, ArenaPtr, BaseArenaPtr},
    },
    impl_arena,
};

/// What an instruction belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsnOwner {
    Effect(Effect),
    Control(Control),
}

impl InsnOwner {
    pub fn block(self, ctx: &Context) -> Option<Block> {
        match self {
            InsnOwner::Effect(effect) => effect.owner(ctx),
            InsnOwner::Control(control) => control.owner(ctx),
        }
    }
}

pub struct InsnData {
    self_ptr: Insn,
    op: Op,
    args: Vec<Var>,
    pub(super) owner: Option<InsnOwner>,
    /// Where the instruction was created, if tracking is enabled.
    created_at: Option<String>,
    exts: ExtMap,
}

impl InsnData {
    pub fn self_ptr(&self) -> Insn { self.self_ptr }
}

#[derive(Debug, Hash, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Insn(BaseArenaPtr<InsnData>);

impl_arena!(Context, InsnData, Insn, insns);

impl Insn {
    pub fn new(ctx: &mut Context, op: Op, args: Vec<Var>) -> Insn {
        let created_at = ctx
            .config
            .track_insn_creations
            .then(|| Backtrace::force_capture().to_string());
        ctx.alloc_with(|self_ptr| InsnData {
            self_ptr,
            op,
            args,
            owner: None,
            created_at,
            exts: ExtMap::default(),
        })
    }

    pub fn op(self, ctx: &Context) -> &Op { &self.deref(ctx).op }

    pub fn op_mut(self, ctx: &mut Context) -> &mut Op { &mut self.deref_mut(ctx).op }

    pub fn args(self, ctx: &Context) -> &[Var] { &self.deref(ctx).args }

    /// Replace the arguments of the instruction.
    pub fn set_args(self, ctx: &mut Context, args: Vec<Var>) {
        self.deref_mut(ctx).args = args;
        if let Some(func) = self.owning_func(ctx) {
            func.metadata_mut(ctx).vars_changed();
        }
    }

    /// Replace every use of `old` with `new`, returning whether any was found.
    pub fn replace_arg(self, ctx: &mut Context, old: Var, new: Var) -> bool {
        let mut replaced = false;
        for arg in self.deref_mut(ctx).args.iter_mut() {
            if *arg == old {
                *arg = new;
                replaced = true;
            }
        }
        if replaced {
            if let Some(func) = self.owning_func(ctx) {
                func.metadata_mut(ctx).vars_changed();
            }
        }
        replaced
    }

    pub fn owner(self, ctx: &Context) -> Option<InsnOwner> { self.deref(ctx).owner }

    pub fn owning_block(self, ctx: &Context) -> Option<Block> { self.owner(ctx)?.block(ctx) }

    pub fn owning_func(self, ctx: &Context) -> Option<Func> { self.owning_block(ctx)?.parent(ctx) }

    pub fn created_at(self, ctx: &Context) -> Option<&str> { self.deref(ctx).created_at.as_deref() }

    /// Bind the result of the instruction to `vars`.
    pub fn assign_to(self, ctx: &mut Context, vars: Vec<Var>) -> Effect {
        Effect::new(ctx, self, vars)
    }

    /// Terminate a block with the instruction, branching to `targets`.
    pub fn jumps_to(self, ctx: &mut Context, targets: Vec<Block>) -> Control {
        Control::new(ctx, self, targets)
    }

    /// Claim the instruction for an effect or a control.
    ///
    /// # Panics
    ///
    /// Panics if the instruction already belongs to another one.
    pub(super) fn set_owner(self, ctx: &mut Context, owner: InsnOwner) {
        let data = self.deref_mut(ctx);
        if let Some(prev) = data.owner {
            if prev != owner {
                panic!("instruction is already owned by {:?}", prev);
            }
        }
        data.owner = Some(owner);
    }

    pub(super) fn clear_owner(self, ctx: &mut Context) { self.deref_mut(ctx).owner = None; }

    pub fn id(self) -> usize { self.0.id() }

    pub fn display(self, ctx: &Context) -> DisplayInsn<'_> { DisplayInsn { ctx, insn: self } }
}

impl ExtContainer<Context> for Insn {
    fn ext_map(self, ctx: &Context) -> &ExtMap { &self.deref(ctx).exts }

    fn ext_map_mut(self, ctx: &mut Context) -> &mut ExtMap { &mut self.deref_mut(ctx).exts }

    fn lookup_delegate(self, ctx: &Context, key: TypeId) -> Option<&dyn Any> {
        self.deref(ctx).op.exts.get_erased(key)
    }
}

pub struct DisplayInsn<'a> {
    ctx: &'a Context,
    insn: Insn,
}

impl fmt::Display for DisplayInsn<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.insn.op(self.ctx))?;
        for arg in self.insn.args(self.ctx) {
            write!(f, " {}", arg.display(self.ctx))?;
        }
        Ok(())
    }
}
