use rustc_hash::FxHashMap;

use crate::ir::{passman::LocalPassMut, Block, Context, Func, IntegrityError, IrResult, MetaKinds};

/// Compute the predecessor list of every block.
///
/// A block branching to the same target twice is listed twice, so the list
/// is parallel to the incoming edges.
pub struct ComputePreds;

/// Collect the predecessors of every block of `blocks`, in block order.
///
/// # Errors
///
/// Fails if a control targets a block outside of `blocks`, or a block has no
/// control.
pub(super) fn collect_preds(
    ctx: &Context,
    blocks: &[Block],
) -> IrResult<FxHashMap<Block, Vec<Block>>> {
    let mut preds: FxHashMap<Block, Vec<Block>> =
        blocks.iter().map(|block| (*block, Vec::new())).collect();

    for &block in blocks {
        let control = block.control_or_err(ctx)?;
        for &target in control.targets(ctx) {
            match preds.get_mut(&target) {
                Some(list) => list.push(block),
                None => {
                    return Err(IntegrityError::DanglingTarget {
                        referenced: target.to_string(),
                        control: control.display(ctx).to_string(),
                        block: block.to_string(),
                    }
                    .into())
                }
            }
        }
    }

    Ok(preds)
}

impl LocalPassMut for ComputePreds {
    type Output = ();

    fn run(&mut self, ctx: &mut Context, func: Func) -> IrResult<((), bool)> {
        let blocks = func.blocks(ctx).to_vec();
        let mut preds = collect_preds(ctx, &blocks)?;

        for block in blocks {
            let list = preds.remove(&block).unwrap_or_default();
            block.set_preds(ctx, list);
        }

        func.metadata_mut(ctx).validate(MetaKinds::PREDS);
        Ok(((), false))
    }
}
