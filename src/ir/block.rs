use core::fmt;

use rustc_hash::FxHashSet;

use super::{Context, Control, Effect, Func, IntegrityError, IrError, IrResult, Var};
use crate::{
    collections::{
        ext::{ExtContainer, ExtMap},
        storage::{ArenaAlloc, ArenaPtr, BaseArenaPtr},
    },
    impl_arena,
    utils::cfg::CfgNode,
};

/// The liveness facts of a block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveData {
    /// Variables used in the block before any assignment in it.
    pub gen: FxHashSet<Var>,
    /// Variables assigned in the block.
    pub kill: FxHashSet<Var>,
    pub live_in: FxHashSet<Var>,
    pub live_out: FxHashSet<Var>,
}

/// The data of a basic block.
pub struct BlockData {
    self_ptr: Block,
    effects: Vec<Effect>,
    control: Option<Control>,
    /// The function whose block list contains the block.
    pub(super) parent: Option<Func>,

    // facts of the analysis passes
    pub(super) idom: Option<Block>,
    pub(super) preds: Option<Vec<Block>>,
    pub(super) dom_frontier: Option<FxHashSet<Block>>,
    pub(super) live_data: Option<LiveData>,

    exts: ExtMap,
}

impl BlockData {
    pub fn self_ptr(&self) -> Block { self.self_ptr }
}

#[derive(Debug, Hash, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Block(BaseArenaPtr<BlockData>);

impl_arena!(Context, BlockData, Block, blocks);

impl Block {
    /// Create a block that belongs to no function yet.
    ///
    /// Use [Func::new_block] to create a block appended to a function.
    pub fn new(ctx: &mut Context) -> Block {
        ctx.alloc_with(|self_ptr| BlockData {
            self_ptr,
            effects: Vec::new(),
            control: None,
            parent: None,
            idom: None,
            preds: None,
            dom_frontier: None,
            live_data: None,
            exts: ExtMap::default(),
        })
    }

    pub fn parent(self, ctx: &Context) -> Option<Func> { self.deref(ctx).parent }

    pub fn effects(self, ctx: &Context) -> &[Effect] { &self.deref(ctx).effects }

    /// Append an effect to the block.
    pub fn push_effect(self, ctx: &mut Context, effect: Effect) {
        let len = self.effects(ctx).len();
        self.insert_effect(ctx, len, effect);
    }

    /// Insert an effect at `index`.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn insert_effect(self, ctx: &mut Context, index: usize, effect: Effect) {
        self.deref_mut(ctx).effects.insert(index, effect);
        effect.deref_mut(ctx).owner = Some(self);
        self.notify_vars_changed(ctx);
    }

    /// Remove an effect from the block, returning whether it was there.
    pub fn remove_effect(self, ctx: &mut Context, effect: Effect) -> bool {
        let effects = &mut self.deref_mut(ctx).effects;
        let Some(pos) = effects.iter().position(|e| *e == effect) else {
            return false;
        };
        effects.remove(pos);
        if effect.owner(ctx) == Some(self) {
            effect.deref_mut(ctx).owner = None;
        }
        self.notify_vars_changed(ctx);
        true
    }

    pub fn control(self, ctx: &Context) -> Option<Control> { self.deref(ctx).control }

    /// The control of the block, failing for an unterminated block.
    pub fn control_or_err(self, ctx: &Context) -> IrResult<Control> {
        self.control(ctx).ok_or_else(|| {
            IntegrityError::MissingControl {
                block: self.to_string(),
            }
            .into()
        })
    }

    /// Set the control, releasing the previous one.
    pub fn set_control(self, ctx: &mut Context, control: Control) {
        if let Some(old) = self.deref_mut(ctx).control.replace(control) {
            if old != control && old.owner(ctx) == Some(self) {
                old.deref_mut(ctx).owner = None;
            }
        }
        control.deref_mut(ctx).owner = Some(self);
        if let Some(func) = self.parent(ctx) {
            func.metadata_mut(ctx).graph_changed();
        }
    }

    /// The successors, i.e. the targets of the control.
    pub fn targets(self, ctx: &Context) -> &[Block] {
        match self.control(ctx) {
            Some(control) => control.targets(ctx),
            None => &[],
        }
    }

    fn notify_vars_changed(self, ctx: &mut Context) {
        if let Some(func) = self.parent(ctx) {
            func.metadata_mut(ctx).vars_changed();
        }
    }

    /// The immediate dominator, `None` for the entry block or before
    /// [ComputeDoms](super::passes::ComputeDoms) ran.
    pub fn idom(self, ctx: &Context) -> Option<Block> { self.deref(ctx).idom }

    /// Check whether the block dominates `other`, by the computed
    /// dominator tree.
    pub fn dominates(self, ctx: &Context, other: Block) -> bool {
        let mut runner = Some(other);
        while let Some(block) = runner {
            if block == self {
                return true;
            }
            runner = block.idom(ctx);
        }
        false
    }

    pub fn preds(self, ctx: &Context) -> IrResult<&[Block]> {
        self.deref(ctx)
            .preds
            .as_deref()
            .ok_or_else(|| IrError::missing("PREDS", self))
    }

    pub fn dom_frontier(self, ctx: &Context) -> IrResult<&FxHashSet<Block>> {
        self.deref(ctx)
            .dom_frontier
            .as_ref()
            .ok_or_else(|| IrError::missing("DOM_FRONTIER", self))
    }

    pub fn live_data(self, ctx: &Context) -> IrResult<&LiveData> {
        self.deref(ctx)
            .live_data
            .as_ref()
            .ok_or_else(|| IrError::missing("LIVE_DATA", self))
    }

    pub(super) fn set_idom(self, ctx: &mut Context, idom: Option<Block>) {
        self.deref_mut(ctx).idom = idom;
    }

    pub(super) fn set_preds(self, ctx: &mut Context, preds: Vec<Block>) {
        self.deref_mut(ctx).preds = Some(preds);
    }

    pub(super) fn set_dom_frontier(self, ctx: &mut Context, frontier: FxHashSet<Block>) {
        self.deref_mut(ctx).dom_frontier = Some(frontier);
    }

    pub(super) fn set_live_data(self, ctx: &mut Context, live_data: LiveData) {
        self.deref_mut(ctx).live_data = Some(live_data);
    }

    pub fn id(self) -> usize { self.0.id() }

    /// Display the block with its effects and control.
    ///
    /// The plain [fmt::Display] of a block is its label only.
    pub fn display(self, ctx: &Context) -> DisplayBlock<'_> {
        DisplayBlock {
            ctx,
            data: self.deref(ctx),
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "@bb{}", self.id()) }
}

impl ExtContainer<Context> for Block {
    fn ext_map(self, ctx: &Context) -> &ExtMap { &self.deref(ctx).exts }

    fn ext_map_mut(self, ctx: &mut Context) -> &mut ExtMap { &mut self.deref_mut(ctx).exts }
}

impl CfgNode for Block {
    type Region = Func;

    fn succs(self, arena: &Self::A) -> Vec<Self> { self.targets(arena).to_vec() }
}

pub struct DisplayBlock<'a> {
    ctx: &'a Context,
    data: &'a BlockData,
}

impl fmt::Display for DisplayBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.data.self_ptr)?;
        for effect in &self.data.effects {
            writeln!(f, "  {}", effect.display(self.ctx))?;
        }
        match self.data.control {
            Some(control) => write!(f, "  {}", control.display(self.ctx)),
            None => write!(f, "  <no control>"),
        }
    }
}
