use core::fmt;

use super::{name_alloc::NameAlloc, Block, Context, IrError, IrResult, MetadataState, Var};
use crate::{
    collections::{
        ext::{ExtContainer, ExtMap},
        storage::{ArenaAlloc, ArenaPtr, BaseArenaPtr},
    },
    impl_arena,
    utils::cfg::CfgRegion,
};

/// The data of a function.
pub struct FuncData {
    self_ptr: Func,
    name: String,
    /// The blocks of the function, the first one is the entry.
    blocks: Vec<Block>,
    meta: MetadataState,
    var_names: NameAlloc,
    exts: ExtMap,
}

impl FuncData {
    pub fn self_ptr(&self) -> Func { self.self_ptr }
}

#[derive(Debug, Hash, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Func(BaseArenaPtr<FuncData>);

impl_arena!(Context, FuncData, Func, funcs);

impl Func {
    /// Create an empty function and register it in the context.
    ///
    /// # Panics
    ///
    /// Panics if a function with the same name exists, see
    /// [try_new](Self::try_new).
    pub fn new(ctx: &mut Context, name: impl Into<String>) -> Func {
        Self::try_new(ctx, name).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Create an empty function and register it in the context.
    ///
    /// # Errors
    ///
    /// Fails with [IrError::IllegalArgument] if the name is taken, function
    /// names are unique within a context.
    pub fn try_new(ctx: &mut Context, name: impl Into<String>) -> IrResult<Func> {
        let name = name.into();
        if ctx.lookup_func(&name).is_some() {
            return Err(IrError::illegal(format!(
                "function {name:?} is already defined"
            )));
        }
        let func = ctx.alloc_with(|self_ptr| FuncData {
            self_ptr,
            name: name.clone(),
            blocks: Vec::new(),
            meta: MetadataState::default(),
            var_names: NameAlloc::default(),
            exts: ExtMap::default(),
        });
        ctx.insert_func(name, func);
        Ok(func)
    }

    pub fn name(self, ctx: &Context) -> &str { &self.deref(ctx).name }

    pub fn blocks(self, ctx: &Context) -> &[Block] { &self.deref(ctx).blocks }

    /// The entry block, `None` for a function without blocks.
    pub fn entry(self, ctx: &Context) -> Option<Block> { self.blocks(ctx).first().copied() }

    /// Create a block and append it to the function.
    pub fn new_block(self, ctx: &mut Context) -> Block {
        let block = Block::new(ctx);
        self.push_block(ctx, block);
        block
    }

    pub fn push_block(self, ctx: &mut Context, block: Block) {
        let len = self.blocks(ctx).len();
        self.insert_block(ctx, len, block);
    }

    /// Insert a block at `index` of the block list.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn insert_block(self, ctx: &mut Context, index: usize, block: Block) {
        self.deref_mut(ctx).blocks.insert(index, block);
        block.deref_mut(ctx).parent = Some(self);
        self.metadata_mut(ctx).graph_changed();
    }

    /// Remove a block from the block list, returning whether it was there.
    ///
    /// Controls targeting the block are not rewritten.
    pub fn remove_block(self, ctx: &mut Context, block: Block) -> bool {
        let blocks = &mut self.deref_mut(ctx).blocks;
        let Some(pos) = blocks.iter().position(|b| *b == block) else {
            return false;
        };
        blocks.remove(pos);
        if !self.blocks(ctx).contains(&block) && block.parent(ctx) == Some(self) {
            block.deref_mut(ctx).parent = None;
        }
        self.metadata_mut(ctx).graph_changed();
        true
    }

    /// Replace the block list, invalidating the graph facts.
    pub fn set_blocks(self, ctx: &mut Context, blocks: Vec<Block>) {
        self.replace_blocks(ctx, blocks);
        self.metadata_mut(ctx).graph_changed();
    }

    /// Replace the block list, keeping the parent links consistent.
    ///
    /// Returns the blocks that are no longer in the list.
    pub(super) fn replace_blocks(self, ctx: &mut Context, blocks: Vec<Block>) -> Vec<Block> {
        let old = std::mem::replace(&mut self.deref_mut(ctx).blocks, blocks);
        let mut dropped = Vec::new();
        for block in old {
            if !self.blocks(ctx).contains(&block) {
                if block.parent(ctx) == Some(self) {
                    block.deref_mut(ctx).parent = None;
                }
                dropped.push(block);
            }
        }
        for i in 0..self.blocks(ctx).len() {
            let block = self.blocks(ctx)[i];
            block.deref_mut(ctx).parent = Some(self);
        }
        dropped
    }

    /// Create a variable named `name`.
    pub fn new_var(self, ctx: &mut Context, name: impl Into<String>) -> Var {
        self.new_var_with_index(ctx, name, 0)
    }

    /// Create a variable named `name` with an index of at least `hint`.
    ///
    /// With [Config::unique_var_names](super::Config::unique_var_names) the
    /// index is bumped past every index this function handed out for the
    /// same name, otherwise `hint` is used as is.
    pub fn new_var_with_index(self, ctx: &mut Context, name: impl Into<String>, hint: u32) -> Var {
        let name = name.into();
        let index = if ctx.config.unique_var_names {
            self.deref_mut(ctx).var_names.alloc_index(&name, hint)
        } else {
            hint
        };
        Var::new(ctx, name, index)
    }

    /// Forget the variable name counters.
    pub fn clear_var_names(self, ctx: &mut Context) { self.deref_mut(ctx).var_names.clear(); }

    pub fn metadata(self, ctx: &Context) -> &MetadataState { &self.deref(ctx).meta }

    pub fn metadata_mut(self, ctx: &mut Context) -> &mut MetadataState {
        &mut self.deref_mut(ctx).meta
    }

    pub fn id(self) -> usize { self.0.id() }

    pub fn display(self, ctx: &Context) -> DisplayFunc<'_> {
        DisplayFunc {
            ctx,
            data: self.deref(ctx),
        }
    }
}

impl ExtContainer<Context> for Func {
    fn ext_map(self, ctx: &Context) -> &ExtMap { &self.deref(ctx).exts }

    fn ext_map_mut(self, ctx: &mut Context) -> &mut ExtMap { &mut self.deref_mut(ctx).exts }
}

impl CfgRegion for Func {
    type Node = Block;

    fn entry_node(self, arena: &Self::A) -> Option<Self::Node> { self.entry(arena) }
}

pub struct DisplayFunc<'a> {
    ctx: &'a Context,
    data: &'a FuncData,
}

impl fmt::Display for DisplayFunc<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "func @{} {{", self.data.name)?;
        for block in &self.data.blocks {
            writeln!(f, "{}", block.display(self.ctx))?;
        }
        write!(f, "}}")
    }
}
