//! Validity tracking of the derived facts of a function.

use bitflags::bitflags;

use super::{
    passes::{
        ComputeDomFrontier,
        ComputeDoms,
        ComputeLiveVars,
        ComputePreds,
        ComputeUses,
        InferTypes,
    },
    passman::LocalPassMut,
    Context,
    Func,
    IrError,
    IrResult,
};

bitflags! {
    /// Kinds of derived facts about a function.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MetaKinds: u8 {
        /// Every variable is assigned once, by an effect dominating its uses.
        const SSA_FORM = 1 << 0;
        const PREDS = 1 << 1;
        const DOMS = 1 << 2;
        const DOM_FRONTIER = 1 << 3;
        const LIVE_DATA = 1 << 4;
        const USES = 1 << 5;
        const TYPES_INFERRED = 1 << 6;
    }
}

impl MetaKinds {
    /// Facts depending on the shape of the block graph.
    pub const GRAPH: MetaKinds = MetaKinds::PREDS
        .union(MetaKinds::DOMS)
        .union(MetaKinds::DOM_FRONTIER);

    /// Facts depending on the variables and where they are used.
    pub const VARS: MetaKinds = MetaKinds::LIVE_DATA
        .union(MetaKinds::USES)
        .union(MetaKinds::TYPES_INFERRED);
}

/// The set of currently valid facts of a function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetadataState {
    valid: MetaKinds,
}

impl MetadataState {
    /// Check whether all of `kinds` are valid.
    pub fn is_valid(&self, kinds: MetaKinds) -> bool { self.valid.contains(kinds) }

    pub fn valid(&self) -> MetaKinds { self.valid }

    pub fn validate(&mut self, kinds: MetaKinds) { self.valid.insert(kinds); }

    pub fn invalidate(&mut self, kinds: MetaKinds) { self.valid.remove(kinds); }

    /// Invalidate everything depending on the block graph.
    pub fn graph_changed(&mut self) {
        self.invalidate(MetaKinds::GRAPH);
        self.vars_changed();
    }

    /// Invalidate everything depending on the variables.
    pub fn vars_changed(&mut self) { self.invalidate(MetaKinds::VARS); }

    /// Compute every stale fact of `kinds` for `func`.
    ///
    /// Facts are computed in dependency order, so asking for
    /// `DOM_FRONTIER | PREDS` computes the predecessors first.
    ///
    /// # Errors
    ///
    /// [SSA_FORM](MetaKinds::SSA_FORM) is established by the lowering that
    /// builds the function and cannot be recomputed here, asking for it while
    /// it is stale fails with [IrError::MissingMetadata].
    pub fn ensure_valid(ctx: &mut Context, func: Func, kinds: MetaKinds) -> IrResult<()> {
        for kind in kinds.iter() {
            if func.metadata(ctx).is_valid(kind) {
                continue;
            }
            log::trace!("computing stale {:?} of {}", kind, func.name(ctx));
            if kind == MetaKinds::SSA_FORM {
                return Err(IrError::missing("SSA_FORM", func.name(ctx)));
            } else if kind == MetaKinds::PREDS {
                ComputePreds.run(ctx, func)?;
            } else if kind == MetaKinds::DOMS {
                ComputeDoms.run(ctx, func)?;
            } else if kind == MetaKinds::DOM_FRONTIER {
                ComputeDomFrontier.run(ctx, func)?;
            } else if kind == MetaKinds::LIVE_DATA {
                ComputeLiveVars.run(ctx, func)?;
            } else if kind == MetaKinds::USES {
                ComputeUses.run(ctx, func)?;
            } else if kind == MetaKinds::TYPES_INFERRED {
                InferTypes::java().run(ctx, func)?;
            }
            func.metadata_mut(ctx).validate(kind);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalidation_groups() {
        let mut state = MetadataState::default();
        state.validate(MetaKinds::all());
        state.vars_changed();
        assert!(state.is_valid(MetaKinds::GRAPH | MetaKinds::SSA_FORM));
        assert!(!state.is_valid(MetaKinds::USES));

        state.validate(MetaKinds::all());
        state.graph_changed();
        assert_eq!(state.valid(), MetaKinds::SSA_FORM);
    }
}
