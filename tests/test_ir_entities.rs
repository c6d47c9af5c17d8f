use common::{assign, jump};
use wasm_ssa::{
    collections::ext::{ExtContainer, ExtKey},
    ir::{Config, Constant, Context, Func, Insn, IrError, Op},
};

mod common;

#[test]
fn test_var_names_unique_per_function() {
    let mut ctx = Context::new(Config::default().with_unique_var_names(true));
    let f = Func::new(&mut ctx, "f");
    let g = Func::new(&mut ctx, "g");

    let x0 = f.new_var(&mut ctx, "x");
    let x1 = f.new_var(&mut ctx, "x");
    let y = f.new_var(&mut ctx, "y");
    let gx = g.new_var(&mut ctx, "x");

    assert_eq!(x0.index(&ctx), 0);
    assert_eq!(x1.index(&ctx), 1);
    assert_eq!(y.index(&ctx), 0);
    assert_eq!(gx.index(&ctx), 0);

    assert_eq!(x0.display(&ctx).to_string(), "$x");
    assert_eq!(x1.display(&ctx).to_string(), "$x.1");

    f.clear_var_names(&mut ctx);
    assert_eq!(f.new_var(&mut ctx, "x").index(&ctx), 0);
}

#[test]
fn test_var_names_shared_without_config() {
    let mut ctx = Context::default();
    let f = Func::new(&mut ctx, "f");

    let a = f.new_var(&mut ctx, "x");
    let b = f.new_var(&mut ctx, "x");
    assert_ne!(a, b);
    assert_eq!(a.display(&ctx).to_string(), b.display(&ctx).to_string());
    assert_eq!(f.new_var_with_index(&mut ctx, "x", 3).index(&ctx), 3);
}

#[test]
fn test_function_names_are_unique() {
    let mut ctx = Context::default();
    let f = Func::try_new(&mut ctx, "f").unwrap();

    let err = Func::try_new(&mut ctx, "f").unwrap_err();
    assert!(matches!(err, IrError::IllegalArgument(_)));
    assert_eq!(err.to_string(), "illegal argument: function \"f\" is already defined");

    // the failed attempt registers nothing
    assert_eq!(ctx.funcs(), &[f]);
    assert_eq!(ctx.lookup_func("f"), Some(f));
}

#[test]
#[should_panic(expected = "function \"g\" is already defined")]
fn test_duplicate_function_panics() {
    let mut ctx = Context::default();
    Func::new(&mut ctx, "g");
    Func::new(&mut ctx, "g");
}

#[test]
fn test_display_function() {
    let mut ctx = Context::default();
    let func = Func::new(&mut ctx, "main");
    let bb0 = func.new_block(&mut ctx);
    let bb1 = func.new_block(&mut ctx);
    let x = func.new_var(&mut ctx, "x");

    assign(&mut ctx, bb0, Op::constant(Constant::I32(7)), vec![], vec![x]);
    jump(&mut ctx, bb0, vec![], &[bb1]);
    jump(&mut ctx, bb1, vec![x], &[]);

    let expected = format!(
        "func @main {{\n{bb0}:\n  $x = const 7i32\n  br -> {bb1}\n{bb1}:\n  return $x\n}}"
    );
    assert_eq!(func.display(&ctx).to_string(), expected);
    assert_eq!(ctx.display().to_string(), format!("{expected}\n"));
}

#[test]
fn test_display_open_block() {
    let mut ctx = Context::default();
    let func = Func::new(&mut ctx, "open");
    let bb = func.new_block(&mut ctx);
    assert_eq!(bb.display(&ctx).to_string(), format!("{bb}:\n  <no control>"));
}

struct Note;

impl ExtKey for Note {
    type Value = &'static str;

    const NAME: &'static str = "NOTE";
}

#[test]
fn test_ext_lookup_falls_back_to_insn_and_op() {
    let mut ctx = Context::default();
    let func = Func::new(&mut ctx, "exts");
    let bb = func.new_block(&mut ctx);

    let mut op = Op::identity();
    op.exts_mut().attach::<Note>("from op");
    let insn = Insn::new(&mut ctx, op, vec![]);
    let effect = insn.assign_to(&mut ctx, vec![]);
    bb.push_effect(&mut ctx, effect);

    assert_eq!(effect.get_ext::<Note>(&ctx), Some(&"from op"));

    insn.attach_ext::<Note>(&mut ctx, "from insn");
    assert_eq!(effect.get_ext::<Note>(&ctx), Some(&"from insn"));

    effect.attach_ext::<Note>(&mut ctx, "from effect");
    assert_eq!(effect.get_ext::<Note>(&ctx), Some(&"from effect"));
    assert_eq!(insn.get_ext::<Note>(&ctx), Some(&"from insn"));

    effect.remove_ext::<Note>(&mut ctx);
    insn.remove_ext::<Note>(&mut ctx);
    assert_eq!(effect.get_ext::<Note>(&ctx), Some(&"from op"));

    // blocks do not delegate
    assert_eq!(bb.get_ext_or_err::<Note>(&ctx).unwrap_err().name, "NOTE");
}
