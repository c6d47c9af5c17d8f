#![allow(dead_code)]

use rustc_hash::{FxHashMap, FxHashSet};
use wasm_ssa::ir::{Block, Context, Control, Effect, Func, Insn, Op, Var};

/// Terminate `block` with a branch to `targets`, a return when there are
/// none.
pub fn jump(ctx: &mut Context, block: Block, args: Vec<Var>, targets: &[Block]) -> Control {
    let op = match targets.len() {
        0 => Op::ret(),
        1 => Op::br(),
        2 => Op::br_if(),
        _ => Op::br_table(),
    };
    let control = Insn::new(ctx, op, args).jumps_to(ctx, targets.to_vec());
    block.set_control(ctx, control);
    control
}

/// Append `vars = op args` to `block`.
pub fn assign(ctx: &mut Context, block: Block, op: Op, args: Vec<Var>, vars: Vec<Var>) -> Effect {
    let effect = Insn::new(ctx, op, args).assign_to(ctx, vars);
    block.push_effect(ctx, effect);
    effect
}

/// Build a function from successor lists: block `i` branches to every block
/// in `succs[i]`. Block 0 is the entry.
pub fn build_cfg(ctx: &mut Context, name: &str, succs: &[Vec<usize>]) -> (Func, Vec<Block>) {
    let func = Func::new(ctx, name);
    let blocks: Vec<Block> = (0..succs.len()).map(|_| func.new_block(ctx)).collect();
    for (i, targets) in succs.iter().enumerate() {
        let targets: Vec<Block> = targets.iter().map(|&t| blocks[t]).collect();
        jump(ctx, blocks[i], Vec::new(), &targets);
    }
    (func, blocks)
}

/// The indices reachable from 0, in no particular order.
pub fn reachable(succs: &[Vec<usize>]) -> FxHashSet<usize> {
    let mut seen = FxHashSet::default();
    let mut stack = vec![0];
    while let Some(n) = stack.pop() {
        if seen.insert(n) {
            stack.extend(succs[n].iter().copied());
        }
    }
    seen
}

/// The dominator sets of the reachable nodes, by the textbook fixpoint
/// `Dom(n) = {n} + intersection of Dom(p) over the preds p`.
pub fn dominator_sets(succs: &[Vec<usize>]) -> FxHashMap<usize, FxHashSet<usize>> {
    let live = reachable(succs);
    let mut preds: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
    for &n in &live {
        for &s in &succs[n] {
            preds.entry(s).or_default().push(n);
        }
    }

    let mut doms: FxHashMap<usize, FxHashSet<usize>> = live
        .iter()
        .map(|&n| {
            let set = if n == 0 {
                [0].into_iter().collect()
            } else {
                live.clone()
            };
            (n, set)
        })
        .collect();

    let mut changed = true;
    while changed {
        changed = false;
        for &n in &live {
            if n == 0 {
                continue;
            }
            let mut set: Option<FxHashSet<usize>> = None;
            for p in preds.get(&n).into_iter().flatten() {
                let pd = &doms[p];
                set = Some(match set {
                    None => pd.clone(),
                    Some(s) => s.intersection(pd).copied().collect(),
                });
            }
            let mut set = set.unwrap_or_default();
            set.insert(n);
            if set != doms[&n] {
                doms.insert(n, set);
                changed = true;
            }
        }
    }
    doms
}

/// A random control flow graph over `n` nodes, as successor lists.
pub fn arb_cfg(max_nodes: usize) -> impl proptest::strategy::Strategy<Value = Vec<Vec<usize>>> {
    use proptest::prelude::*;

    (1..=max_nodes).prop_flat_map(|n| {
        proptest::collection::vec(proptest::collection::vec(0..n, 0..=3), n)
    })
}
