use core::fmt;
use std::any::{Any, TypeId};

use super::{Block, Context, Insn, InsnOwner};
use crate::{
    collections::{
        ext::{ExtContainer, ExtMap},
        storage::{ArenaAlloc, ArenaPtr, BaseArenaPtr},
    },
    impl_arena,
};

/// The data of a control: the terminator of a block.
///
/// The order of targets is significant to the terminator, e.g. `br_if` jumps
/// to the first target when taken and `br_table` uses the last one as the
/// default.
pub struct ControlData {
    self_ptr: Control,
    insn: Insn,
    targets: Vec<Block>,
    pub(super) owner: Option<Block>,
    exts: ExtMap,
}

impl ControlData {
    pub fn self_ptr(&self) -> Control { self.self_ptr }
}

#[derive(Debug, Hash, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Control(BaseArenaPtr<ControlData>);

impl_arena!(Context, ControlData, Control, controls);

impl Control {
    /// # Panics
    ///
    /// Panics if `insn` already belongs to an effect or control.
    pub fn new(ctx: &mut Context, insn: Insn, targets: Vec<Block>) -> Control {
        let control = ctx.alloc_with(|self_ptr| ControlData {
            self_ptr,
            insn,
            targets,
            owner: None,
            exts: ExtMap::default(),
        });
        insn.set_owner(ctx, InsnOwner::Control(control));
        control
    }

    pub fn insn(self, ctx: &Context) -> Insn { self.deref(ctx).insn }

    pub fn targets(self, ctx: &Context) -> &[Block] { &self.deref(ctx).targets }

    pub fn owner(self, ctx: &Context) -> Option<Block> { self.deref(ctx).owner }

    /// Retarget the control, invalidating the graph facts of its function.
    pub fn set_targets(self, ctx: &mut Context, targets: Vec<Block>) {
        self.deref_mut(ctx).targets = targets;
        if let Some(func) = self.owner(ctx).and_then(|block| block.parent(ctx)) {
            func.metadata_mut(ctx).graph_changed();
        }
    }

    pub fn id(self) -> usize { self.0.id() }

    pub fn display(self, ctx: &Context) -> DisplayControl<'_> {
        DisplayControl {
            ctx,
            data: self.deref(ctx),
        }
    }
}

impl ExtContainer<Context> for Control {
    fn ext_map(self, ctx: &Context) -> &ExtMap { &self.deref(ctx).exts }

    fn ext_map_mut(self, ctx: &mut Context) -> &mut ExtMap { &mut self.deref_mut(ctx).exts }

    fn lookup_delegate(self, ctx: &Context, key: TypeId) -> Option<&dyn Any> {
        self.insn(ctx).lookup_erased(ctx, key)
    }
}

pub struct DisplayControl<'a> {
    ctx: &'a Context,
    data: &'a ControlData,
}

impl fmt::Display for DisplayControl<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.data.insn.display(self.ctx))?;
        if !self.data.targets.is_empty() {
            write!(f, " ->")?;
            for target in &self.data.targets {
                write!(f, " {target}")?;
            }
        }
        Ok(())
    }
}
