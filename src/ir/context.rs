use core::fmt;

use rustc_hash::FxHashMap;

use super::{
    BlockData,
    Config,
    ControlData,
    EffectData,
    Func,
    FuncData,
    InsnData,
    VarData,
};
use crate::collections::storage::BaseArena;

/// The context of the IR.
///
/// A context owns every entity of the IR. Entities refer to each other by
/// handle, and every operation on a handle takes the context.
pub struct Context {
    // +-----------------+
    // |    storages     |
    // +-----------------+
    pub(super) funcs: BaseArena<FuncData>,
    pub(super) blocks: BaseArena<BlockData>,
    pub(super) effects: BaseArena<EffectData>,
    pub(super) controls: BaseArena<ControlData>,
    pub(super) insns: BaseArena<InsnData>,
    pub(super) vars: BaseArena<VarData>,

    /// Functions in creation order.
    pub(super) func_order: Vec<Func>,
    /// Function lookup by name.
    pub(super) symbols: FxHashMap<String, Func>,

    pub(super) config: Config,
}

impl Default for Context {
    fn default() -> Self { Self::new(Config::default()) }
}

impl Context {
    pub fn new(config: Config) -> Self {
        Self {
            funcs: BaseArena::default(),
            blocks: BaseArena::default(),
            effects: BaseArena::default(),
            controls: BaseArena::default(),
            insns: BaseArena::default(),
            vars: BaseArena::default(),

            func_order: Vec::new(),
            symbols: FxHashMap::default(),

            config,
        }
    }

    pub fn config(&self) -> &Config { &self.config }

    /// Register a function under its name, which must not be taken.
    pub(super) fn insert_func(&mut self, name: String, func: Func) {
        debug_assert!(!self.symbols.contains_key(&name));
        self.symbols.insert(name, func);
        self.func_order.push(func);
    }

    pub fn lookup_func(&self, name: &str) -> Option<Func> { self.symbols.get(name).copied() }

    /// All functions, in creation order.
    pub fn funcs(&self) -> &[Func] { &self.func_order }

    pub fn display(&self) -> DisplayContext<'_> { DisplayContext { ctx: self } }
}

pub struct DisplayContext<'a> {
    ctx: &'a Context,
}

impl fmt::Display for DisplayContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for func in self.ctx.funcs() {
            writeln!(f, "{}", func.display(self.ctx))?;
        }
        Ok(())
    }
}
