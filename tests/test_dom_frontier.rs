use common::{arb_cfg, build_cfg, dominator_sets, reachable};
use proptest::prelude::*;
use rustc_hash::FxHashSet;
use wasm_ssa::ir::{
    passes::{ComputeDomFrontier, ComputeDoms, ComputePreds},
    passman::LocalPassMut,
    Block,
    Context,
    MetaKinds,
};

mod common;

fn frontier(ctx: &Context, block: Block) -> FxHashSet<Block> {
    block.dom_frontier(ctx).unwrap().clone()
}

fn set(blocks: &[Block]) -> FxHashSet<Block> { blocks.iter().copied().collect() }

#[test]
fn test_dom_frontier_cooper_figure_2() {
    let mut ctx = Context::default();
    let (func, bbs) = build_cfg(
        &mut ctx,
        "cooper",
        &[vec![1, 2], vec![3], vec![4], vec![4], vec![3]],
    );

    // computes preds and dominators on demand
    ComputeDomFrontier.run(&mut ctx, func).unwrap();
    assert!(func.metadata(&ctx).is_valid(
        MetaKinds::PREDS | MetaKinds::DOMS | MetaKinds::DOM_FRONTIER
    ));

    assert_eq!(frontier(&ctx, bbs[0]), set(&[]));
    assert_eq!(frontier(&ctx, bbs[1]), set(&[bbs[3]]));
    assert_eq!(frontier(&ctx, bbs[2]), set(&[bbs[4]]));
    assert_eq!(frontier(&ctx, bbs[3]), set(&[bbs[4]]));
    assert_eq!(frontier(&ctx, bbs[4]), set(&[bbs[3]]));
}

#[test]
fn test_dom_frontier_loop_header() {
    let mut ctx = Context::default();

    // 0 -> 1 -> 2 -> 3, 2 -> 1
    let (func, bbs) = build_cfg(&mut ctx, "loop", &[vec![1], vec![2], vec![1, 3], vec![]]);

    ComputeDomFrontier.run(&mut ctx, func).unwrap();

    assert_eq!(frontier(&ctx, bbs[0]), set(&[]));
    assert_eq!(frontier(&ctx, bbs[1]), set(&[bbs[1]]));
    assert_eq!(frontier(&ctx, bbs[2]), set(&[bbs[1]]));
    assert_eq!(frontier(&ctx, bbs[3]), set(&[]));
}

#[test]
fn test_dom_frontier_ignores_entry() {
    let mut ctx = Context::default();

    // the entry is a loop header
    let (func, bbs) = build_cfg(&mut ctx, "entry", &[vec![1], vec![0, 2], vec![]]);
    ComputeDomFrontier.run(&mut ctx, func).unwrap();
    for bb in &bbs {
        assert_eq!(frontier(&ctx, *bb), set(&[]));
    }

    // predecessors computed after the dominators still list the back edges
    let (func, bbs) = build_cfg(&mut ctx, "entry2", &[vec![1, 2], vec![0, 3], vec![0, 3], vec![]]);
    ComputeDoms.run(&mut ctx, func).unwrap();
    ComputePreds.run(&mut ctx, func).unwrap();
    assert_eq!(bbs[0].preds(&ctx).unwrap().len(), 2);
    ComputeDomFrontier.run(&mut ctx, func).unwrap();
    assert_eq!(frontier(&ctx, bbs[0]), set(&[]));
    assert_eq!(frontier(&ctx, bbs[1]), set(&[bbs[3]]));
    assert_eq!(frontier(&ctx, bbs[2]), set(&[bbs[3]]));
}

proptest! {
    #[test]
    fn test_dom_frontier_matches_definition(succs in arb_cfg(10)) {
        let mut ctx = Context::default();
        let (func, bbs) = build_cfg(&mut ctx, "random", &succs);

        ComputeDomFrontier.run(&mut ctx, func).unwrap();

        let live = reachable(&succs);
        let doms = dominator_sets(&succs);

        for &x in &live {
            // y is in DF(x) if x dominates a predecessor of y but does not
            // strictly dominate y
            let mut expected = FxHashSet::default();
            for &p in &live {
                if !doms[&p].contains(&x) {
                    continue;
                }
                for &y in &succs[p] {
                    // the entry has no predecessors here
                    if y == 0 {
                        continue;
                    }
                    if y == x || !doms[&y].contains(&x) {
                        expected.insert(bbs[y]);
                    }
                }
            }
            prop_assert_eq!(frontier(&ctx, bbs[x]), expected, "DF({})", x);
        }
    }
}
