//! # Dominance Frontier Computation
//!
//! Cooper, Keith D.; Harvey, Timothy J.; Kennedy, Ken (2001). "A Simple, Fast
//! Dominance Algorithm".

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ir::{passman::LocalPassMut, Block, Context, Func, IrResult, MetaKinds, MetadataState};

/// Compute the dominance frontier of every block.
///
/// Dominators and predecessors are computed first if they are stale.
///
/// The entry is never part of a frontier, its predecessors are ignored.
pub struct ComputeDomFrontier;

impl LocalPassMut for ComputeDomFrontier {
    type Output = ();

    fn run(&mut self, ctx: &mut Context, func: Func) -> IrResult<((), bool)> {
        MetadataState::ensure_valid(ctx, func, MetaKinds::PREDS | MetaKinds::DOMS)?;

        let blocks = func.blocks(ctx).to_vec();
        let entry = func.entry(ctx);
        let mut frontiers: FxHashMap<Block, FxHashSet<Block>> = blocks
            .iter()
            .map(|block| (*block, FxHashSet::default()))
            .collect();

        for &block in &blocks {
            if Some(block) == entry {
                continue;
            }
            let preds = block.preds(ctx)?;
            if preds.len() < 2 {
                continue;
            }
            let idom = block.idom(ctx);
            for &pred in preds {
                let mut runner = Some(pred);
                while let Some(r) = runner {
                    if Some(r) == idom {
                        break;
                    }
                    frontiers.entry(r).or_default().insert(block);
                    runner = r.idom(ctx);
                }
            }
        }

        for (block, frontier) in frontiers {
            log::trace!("DF({}) has {} blocks", block, frontier.len());
            block.set_dom_frontier(ctx, frontier);
        }

        func.metadata_mut(ctx).validate(MetaKinds::DOM_FRONTIER);
        Ok(((), false))
    }
}
