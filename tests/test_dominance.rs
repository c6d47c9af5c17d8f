use common::{arb_cfg, build_cfg, dominator_sets, jump, reachable};
use proptest::prelude::*;
use rustc_hash::FxHashSet;
use wasm_ssa::ir::{
    passes::{ComputeDoms, ComputePreds},
    passman::LocalPassMut,
    Block,
    Context,
    IrError,
    IntegrityError,
    MetaKinds,
};

mod common;

#[test]
fn test_doms_diamond() {
    let mut ctx = Context::default();

    //     0
    //    / \
    //   1   2
    //    \ /
    //     3
    let (func, bbs) = build_cfg(&mut ctx, "diamond", &[vec![1, 2], vec![3], vec![3], vec![]]);

    let ((), changed) = ComputeDoms.run(&mut ctx, func).unwrap();
    assert!(!changed);

    assert_eq!(bbs[0].idom(&ctx), None);
    assert_eq!(bbs[1].idom(&ctx), Some(bbs[0]));
    assert_eq!(bbs[2].idom(&ctx), Some(bbs[0]));
    assert_eq!(bbs[3].idom(&ctx), Some(bbs[0]));

    assert!(bbs[0].dominates(&ctx, bbs[3]));
    assert!(bbs[3].dominates(&ctx, bbs[3]));
    assert!(!bbs[1].dominates(&ctx, bbs[3]));

    assert_eq!(bbs[3].preds(&ctx).unwrap(), &[bbs[1], bbs[2]]);
    assert!(func
        .metadata(&ctx)
        .is_valid(MetaKinds::DOMS | MetaKinds::PREDS));
}

#[test]
fn test_doms_cooper_figure_2() {
    let mut ctx = Context::default();

    //       0
    //      / \
    //     1   2
    //     |   |
    //     3 <-> 4
    //
    // Ref: Figure 2 in "A Simple, Fast Dominance Algorithm" by Cooper et al.
    let (func, bbs) = build_cfg(
        &mut ctx,
        "cooper",
        &[vec![1, 2], vec![3], vec![4], vec![4], vec![3]],
    );

    ComputeDoms.run(&mut ctx, func).unwrap();

    assert_eq!(bbs[0].idom(&ctx), None);
    for &bb in &bbs[1..] {
        assert_eq!(bb.idom(&ctx), Some(bbs[0]));
    }
}

#[test]
fn test_doms_loop() {
    let mut ctx = Context::default();

    // 0 -> 1 -> 2 -> 3
    //      ^    |
    //      +----+
    let (func, bbs) = build_cfg(&mut ctx, "loop", &[vec![1], vec![2], vec![1, 3], vec![]]);

    ComputeDoms.run(&mut ctx, func).unwrap();

    assert_eq!(bbs[1].idom(&ctx), Some(bbs[0]));
    assert_eq!(bbs[2].idom(&ctx), Some(bbs[1]));
    assert_eq!(bbs[3].idom(&ctx), Some(bbs[2]));
    assert_eq!(bbs[1].preds(&ctx).unwrap(), &[bbs[0], bbs[2]]);
}

#[test]
fn test_doms_elide_unreachable() {
    let mut ctx = Context::default();

    // 2 is only reachable from 3, which is unreachable
    let (func, bbs) = build_cfg(&mut ctx, "dead", &[vec![1], vec![], vec![1], vec![2]]);

    let ((), changed) = ComputeDoms.run(&mut ctx, func).unwrap();
    assert!(changed);

    assert_eq!(func.blocks(&ctx), &[bbs[0], bbs[1]]);
    assert_eq!(bbs[2].parent(&ctx), None);
    assert_eq!(bbs[3].parent(&ctx), None);
    // only edges from live blocks count
    assert_eq!(bbs[1].preds(&ctx).unwrap(), &[bbs[0]]);
}

#[test]
fn test_doms_reorder_to_preorder() {
    let mut ctx = Context::default();

    // listed as 0, 2, 1 but 0 -> 1 -> 2
    let (func, bbs) = build_cfg(&mut ctx, "order", &[vec![2], vec![], vec![1]]);

    let ((), changed) = ComputeDoms.run(&mut ctx, func).unwrap();
    assert!(changed);
    assert_eq!(func.blocks(&ctx), &[bbs[0], bbs[2], bbs[1]]);
    assert_eq!(bbs[1].idom(&ctx), Some(bbs[2]));

    // the membership did not change, so nothing was invalidated
    ComputePreds.run(&mut ctx, func).unwrap();
    let ((), changed) = ComputeDoms.run(&mut ctx, func).unwrap();
    assert!(!changed);
    assert!(func.metadata(&ctx).is_valid(MetaKinds::PREDS));
}

#[test]
fn test_doms_adopt_orphan_block() {
    let mut ctx = Context::default();
    let (func, bbs) = build_cfg(&mut ctx, "adopt", &[vec![], vec![]]);

    // a block targeted by a control but missing from the function
    let orphan = Block::new(&mut ctx);
    jump(&mut ctx, orphan, Vec::new(), &[bbs[1]]);
    jump(&mut ctx, bbs[0], Vec::new(), &[orphan]);

    ComputeDoms.run(&mut ctx, func).unwrap();

    assert_eq!(func.blocks(&ctx), &[bbs[0], orphan, bbs[1]]);
    assert_eq!(orphan.parent(&ctx), Some(func));
    assert_eq!(bbs[1].idom(&ctx), Some(orphan));
}

#[test]
fn test_preds_keep_duplicate_edges() {
    let mut ctx = Context::default();
    let (func, bbs) = build_cfg(&mut ctx, "dup", &[vec![1, 1], vec![0]]);

    ComputePreds.run(&mut ctx, func).unwrap();
    assert_eq!(bbs[1].preds(&ctx).unwrap(), &[bbs[0], bbs[0]]);
    // the entry has a back edge
    assert_eq!(bbs[0].preds(&ctx).unwrap(), &[bbs[1]]);

    ComputeDoms.run(&mut ctx, func).unwrap();
    assert_eq!(bbs[1].preds(&ctx).unwrap(), &[bbs[0], bbs[0]]);
    assert!(bbs[0].preds(&ctx).unwrap().is_empty());
}

#[test]
fn test_doms_errors() {
    let mut ctx = Context::default();
    let empty = wasm_ssa::ir::Func::new(&mut ctx, "empty");
    let err = ComputeDoms.run(&mut ctx, empty).unwrap_err();
    assert!(matches!(
        err,
        IrError::Integrity(IntegrityError::EmptyFunction { .. })
    ));

    let (func, bbs) = build_cfg(&mut ctx, "open", &[vec![1], vec![]]);
    let open = func.new_block(&mut ctx);
    jump(&mut ctx, bbs[1], Vec::new(), &[open]);
    let err = ComputeDoms.run(&mut ctx, func).unwrap_err();
    assert!(matches!(
        err,
        IrError::Integrity(IntegrityError::MissingControl { .. })
    ));
}

#[test]
fn test_doms_error_leaves_blocks_alone() {
    let mut ctx = Context::default();

    // 0 -> 1, where 1 has no control, and 2 is unreachable
    let func = wasm_ssa::ir::Func::new(&mut ctx, "broken");
    let bbs: Vec<Block> = (0..3).map(|_| func.new_block(&mut ctx)).collect();
    jump(&mut ctx, bbs[0], Vec::new(), &[bbs[1]]);
    jump(&mut ctx, bbs[2], Vec::new(), &[]);
    func.metadata_mut(&mut ctx).validate(MetaKinds::LIVE_DATA);

    let err = ComputeDoms.run(&mut ctx, func).unwrap_err();
    assert_eq!(err.to_string(), format!("block {} has no control", bbs[1]));

    assert_eq!(func.blocks(&ctx), &bbs[..]);
    assert_eq!(bbs[2].parent(&ctx), Some(func));
    assert!(func.metadata(&ctx).is_valid(MetaKinds::LIVE_DATA));
}

#[test]
fn test_graph_change_invalidates() {
    let mut ctx = Context::default();
    let (func, bbs) = build_cfg(&mut ctx, "edit", &[vec![1], vec![]]);
    ComputeDoms.run(&mut ctx, func).unwrap();
    assert!(func.metadata(&ctx).is_valid(MetaKinds::DOMS));

    jump(&mut ctx, bbs[1], Vec::new(), &[bbs[0]]);
    assert!(!func.metadata(&ctx).is_valid(MetaKinds::DOMS));
    assert!(!func.metadata(&ctx).is_valid(MetaKinds::PREDS));
}

proptest! {
    #[test]
    fn test_doms_match_dominator_sets(succs in arb_cfg(12)) {
        let mut ctx = Context::default();
        let (func, bbs) = build_cfg(&mut ctx, "random", &succs);

        ComputeDoms.run(&mut ctx, func).unwrap();

        let live = reachable(&succs);
        let kept: FxHashSet<Block> = func.blocks(&ctx).iter().copied().collect();
        let expected: FxHashSet<Block> = live.iter().map(|&i| bbs[i]).collect();
        prop_assert_eq!(kept, expected);
        prop_assert_eq!(func.entry(&ctx), Some(bbs[0]));

        let doms = dominator_sets(&succs);
        for &a in &live {
            for &b in &live {
                prop_assert_eq!(
                    bbs[a].dominates(&ctx, bbs[b]),
                    doms[&b].contains(&a),
                    "dominates({}, {})", a, b
                );
            }
        }
    }
}
