use common::build_cfg;
use wasm_ssa::{
    ir::{Block, Context, Func},
    utils::dfs::PreOrder,
};

mod common;

fn pre_order(ctx: &Context, func: Func) -> Vec<Block> { PreOrder::<Block>::new(ctx, func).collect() }

#[test]
fn test_pre_order_first_target_first() {
    let mut ctx = Context::default();

    //   0
    //  / \
    // 1   2
    //  \ /
    //   3
    let (func, bbs) = build_cfg(&mut ctx, "diamond", &[vec![1, 2], vec![3], vec![3], vec![]]);
    assert_eq!(pre_order(&ctx, func), vec![bbs[0], bbs[1], bbs[3], bbs[2]]);

    // the same graph with the branch flipped
    let (func, bbs) = build_cfg(&mut ctx, "flipped", &[vec![2, 1], vec![3], vec![3], vec![]]);
    assert_eq!(pre_order(&ctx, func), vec![bbs[0], bbs[2], bbs[3], bbs[1]]);
}

#[test]
fn test_pre_order_visits_once() {
    let mut ctx = Context::default();

    // 0 -> 1 -> 2 -> 1, 2 -> 0, 3 unreachable
    let (func, bbs) = build_cfg(&mut ctx, "loops", &[vec![1, 1], vec![2], vec![1, 0], vec![0]]);
    assert_eq!(pre_order(&ctx, func), vec![bbs[0], bbs[1], bbs[2]]);
}

#[test]
fn test_pre_order_follows_controls_only() {
    let mut ctx = Context::default();
    let (func, bbs) = build_cfg(&mut ctx, "listed", &[vec![2], vec![], vec![]]);
    // listed second but never branched to
    assert_eq!(pre_order(&ctx, func), vec![bbs[0], bbs[2]]);

    let empty = Func::new(&mut ctx, "empty");
    assert!(pre_order(&ctx, empty).is_empty());
}
