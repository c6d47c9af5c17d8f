use crate::ir::{passman::LocalPassMut, Context, Func, Insn, IrResult, MetaKinds, Var};

/// Compute the instructions using each variable of a function.
///
/// Every variable assigned in the function gets a use set, possibly empty,
/// so a missing set always means the uses were not computed.
pub struct ComputeUses;

/// Every instruction of the function with the variables it assigns.
fn insns_of(ctx: &Context, func: Func) -> Vec<(Insn, Vec<Var>)> {
    let mut insns = Vec::new();
    for &block in func.blocks(ctx) {
        for &effect in block.effects(ctx) {
            insns.push((effect.insn(ctx), effect.assigns_to(ctx).to_vec()));
        }
        if let Some(control) = block.control(ctx) {
            insns.push((control.insn(ctx), Vec::new()));
        }
    }
    insns
}

impl LocalPassMut for ComputeUses {
    type Output = ();

    fn run(&mut self, ctx: &mut Context, func: Func) -> IrResult<((), bool)> {
        let insns = insns_of(ctx, func);

        // clear what an earlier run left
        for (insn, assigns_to) in &insns {
            let args = insn.args(ctx).to_vec();
            for var in args.into_iter().chain(assigns_to.iter().copied()) {
                var.set_used_at(ctx, None);
            }
        }

        for (insn, assigns_to) in &insns {
            let args = insn.args(ctx).to_vec();
            for arg in args {
                arg.uses_mut(ctx).insert(*insn);
            }
            for &var in assigns_to {
                var.uses_mut(ctx);
            }
        }

        log::debug!("uses of {}: {} instructions", func.name(ctx), insns.len());

        func.metadata_mut(ctx).validate(MetaKinds::USES);
        Ok(((), false))
    }
}
