use rustc_hash::FxHashSet;

use crate::ir::{passman::LocalPassMut, Context, Func, IntegrityError, IrResult, OpKey};

/// Check the structural invariants of a function.
///
/// - The function has an entry block and no block twice.
/// - Every block belongs to the function and has a control.
/// - Phis come first in their block and only name blocks of the function.
/// - Effects and controls belong to the block they are found in.
/// - Controls only target blocks of the function.
pub struct VerifyIntegrity;

fn verify(ctx: &Context, func: Func) -> Result<(), IntegrityError> {
    let blocks = func.blocks(ctx);
    if blocks.is_empty() {
        return Err(IntegrityError::EmptyFunction {
            func: func.name(ctx).to_string(),
        });
    }

    let mut block_set = FxHashSet::default();
    for &block in blocks {
        if !block_set.insert(block) {
            return Err(IntegrityError::DuplicateBlock {
                func: func.name(ctx).to_string(),
                block: block.to_string(),
            });
        }
    }

    for &block in blocks {
        if block.parent(ctx) != Some(func) {
            return Err(IntegrityError::BlockNotOwned {
                func: func.name(ctx).to_string(),
                block: block.to_string(),
                owner: block
                    .parent(ctx)
                    .map_or_else(|| "nothing".to_string(), |f| f.name(ctx).to_string()),
            });
        }

        let mut in_phis = true;
        for &effect in block.effects(ctx) {
            let insn = effect.insn(ctx);
            let op = insn.op(ctx);
            if op.key == OpKey::Phi {
                if !in_phis {
                    return Err(IntegrityError::PhiNotAtStart {
                        insn: effect.display(ctx).to_string(),
                        block: block.display(ctx).to_string(),
                    });
                }
                if let Some(pred) = op.phi_preds().iter().find(|p| !block_set.contains(*p)) {
                    return Err(IntegrityError::DanglingPhiPred {
                        referenced: pred.to_string(),
                        insn: effect.display(ctx).to_string(),
                        block: block.display(ctx).to_string(),
                    });
                }
            } else {
                in_phis = false;
            }

            if effect.owner(ctx) != Some(block) {
                return Err(IntegrityError::EffectNotOwned {
                    effect: effect.display(ctx).to_string(),
                    block: block.display(ctx).to_string(),
                });
            }
        }

        let control = block.control(ctx).ok_or_else(|| IntegrityError::MissingControl {
            block: block.to_string(),
        })?;
        if control.owner(ctx) != Some(block) {
            return Err(IntegrityError::ControlNotOwned {
                control: control.display(ctx).to_string(),
                block: block.display(ctx).to_string(),
            });
        }
        if let Some(target) = control
            .targets(ctx)
            .iter()
            .find(|t| !block_set.contains(*t))
        {
            return Err(IntegrityError::DanglingTarget {
                referenced: target.to_string(),
                control: control.display(ctx).to_string(),
                block: block.display(ctx).to_string(),
            });
        }
    }

    Ok(())
}

impl LocalPassMut for VerifyIntegrity {
    type Output = ();

    fn run(&mut self, ctx: &mut Context, func: Func) -> IrResult<((), bool)> {
        verify(ctx, func)?;
        log::trace!("{} passed verification", func.name(ctx));
        Ok(((), false))
    }
}
