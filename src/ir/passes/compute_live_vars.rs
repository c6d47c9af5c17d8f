//! # Liveness Computation
//!
//! A backward dataflow fixpoint over the blocks. Live sets only grow and are
//! bounded by the number of variables, so the worklist drains.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use super::compute_preds::collect_preds;
use crate::ir::{passman::LocalPassMut, Block, Context, Func, IrResult, LiveData, MetaKinds};

/// Compute the [LiveData] of every block.
///
/// Arguments of phis count as uses in the block of the phi. Predecessors are
/// taken from the controls directly, as the stored ones omit back edges into
/// the entry.
pub struct ComputeLiveVars;

/// A FIFO queue that holds each block at most once.
#[derive(Default)]
struct WorkQueue {
    queue: VecDeque<Block>,
    queued: FxHashSet<Block>,
}

impl WorkQueue {
    fn push(&mut self, block: Block) {
        if self.queued.insert(block) {
            self.queue.push_back(block);
        }
    }

    fn pop(&mut self) -> Option<Block> {
        let block = self.queue.pop_front()?;
        self.queued.remove(&block);
        Some(block)
    }
}

fn local_data(ctx: &Context, block: Block) -> IrResult<LiveData> {
    let mut data = LiveData::default();

    for &effect in block.effects(ctx) {
        for &arg in effect.insn(ctx).args(ctx) {
            if !data.kill.contains(&arg) {
                data.gen.insert(arg);
            }
        }
        data.kill.extend(effect.assigns_to(ctx).iter().copied());
    }
    for &arg in block.control_or_err(ctx)?.insn(ctx).args(ctx) {
        if !data.kill.contains(&arg) {
            data.gen.insert(arg);
        }
    }

    data.live_in = data.gen.clone();
    Ok(data)
}

impl LocalPassMut for ComputeLiveVars {
    type Output = ();

    fn run(&mut self, ctx: &mut Context, func: Func) -> IrResult<((), bool)> {
        let blocks = func.blocks(ctx).to_vec();
        let preds = collect_preds(ctx, &blocks)?;
        let mut live: FxHashMap<Block, LiveData> = FxHashMap::default();
        for &block in &blocks {
            live.insert(block, local_data(ctx, block)?);
        }

        let mut queue = WorkQueue::default();
        for &block in blocks.iter().rev() {
            queue.push(block);
        }

        let mut iterations = 0usize;
        while let Some(block) = queue.pop() {
            iterations += 1;

            let mut incoming = Vec::new();
            for target in block.targets(ctx) {
                if let Some(succ) = live.get(target) {
                    incoming.extend(succ.live_in.iter().copied());
                }
            }

            let mut changed = false;
            if let Some(data) = live.get_mut(&block) {
                for var in incoming {
                    if data.live_out.insert(var) && !data.kill.contains(&var) {
                        data.live_in.insert(var);
                        changed = true;
                    }
                }
            }

            if changed {
                for &pred in &preds[&block] {
                    queue.push(pred);
                }
            }
        }

        log::debug!(
            "liveness of {}: {} blocks, {} iterations",
            func.name(ctx),
            blocks.len(),
            iterations
        );

        for (block, data) in live {
            block.set_live_data(ctx, data);
        }

        func.metadata_mut(ctx).validate(MetaKinds::LIVE_DATA);
        Ok(((), false))
    }
}
