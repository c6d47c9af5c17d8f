use core::fmt;

use super::{Block, FieldRef, JType, MethodRef, RawInsn};
use crate::collections::ext::ExtMap;

/// The dispatch key of an operator.
///
/// The first group is the target independent vocabulary, the second the
/// JVM-flavoured one. [OpKey::Custom] is left for lowering layers built on
/// top of this crate; no analysis here knows how to type it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKey {
    Identity,
    Const,
    Phi,
    Arg,
    Br,
    BrIf,
    BrTable,
    Return,
    Trap,

    This,
    GetField,
    PutField,
    ArrayGet,
    ArraySet,
    Invoke,
    Insns,
    Select,
    /// Materialize a branch condition as an int.
    BoolSelect,
    Drop,
    HandleOf,
    /// The exception caught on entry to a handler block.
    Catch,
    /// A runtime helper, replaced by a call before types are inferred.
    Intrinsic,

    Custom(&'static str),
}

impl OpKey {
    pub fn name(self) -> &'static str {
        match self {
            OpKey::Identity => "id",
            OpKey::Const => "const",
            OpKey::Phi => "phi",
            OpKey::Arg => "arg",
            OpKey::Br => "br",
            OpKey::BrIf => "br_if",
            OpKey::BrTable => "br_table",
            OpKey::Return => "return",
            OpKey::Trap => "trap",
            OpKey::This => "this",
            OpKey::GetField => "get_field",
            OpKey::PutField => "put_field",
            OpKey::ArrayGet => "array_get",
            OpKey::ArraySet => "array_set",
            OpKey::Invoke => "invoke",
            OpKey::Insns => "insns",
            OpKey::Select => "select",
            OpKey::BoolSelect => "bool_select",
            OpKey::Drop => "drop",
            OpKey::HandleOf => "handle_of",
            OpKey::Catch => "catch",
            OpKey::Intrinsic => "intrinsic",
            OpKey::Custom(name) => name,
        }
    }

    /// Operators without side effects, removable when their results are
    /// unused.
    pub fn is_pure(self) -> bool {
        matches!(
            self,
            OpKey::Identity | OpKey::Const | OpKey::Phi | OpKey::Arg | OpKey::This
        )
    }

    /// Operators that may only appear in a control.
    pub fn is_terminator(self) -> bool {
        matches!(
            self,
            OpKey::Br | OpKey::BrIf | OpKey::BrTable | OpKey::Return | OpKey::Trap
        )
    }
}

impl fmt::Display for OpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.name()) }
}

/// A constant loaded by [OpKey::Const].
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Null,
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    /// A class literal.
    Class(JType),
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Null => write!(f, "null"),
            Constant::I32(v) => write!(f, "{v}i32"),
            Constant::I64(v) => write!(f, "{v}i64"),
            Constant::F32(v) => write!(f, "{v:?}f32"),
            Constant::F64(v) => write!(f, "{v:?}f64"),
            Constant::Str(s) => write!(f, "{s:?}"),
            Constant::Class(ty) => write!(f, "{ty}.class"),
        }
    }
}

/// The operator-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub enum OpArg {
    None,
    Const(Constant),
    /// Argument index of [OpKey::Arg].
    Index(u32),
    /// The predecessors of a phi, parallel to its arguments.
    Blocks(Vec<Block>),
    Message(String),
    Field(FieldRef),
    Method(MethodRef),
    Insns(Vec<RawInsn>),
    /// The exception type of [OpKey::Catch].
    Type(JType),
}

/// An operator: a key for dispatch plus its payload.
///
/// Operators carry their own exts, which instructions and effects fall back
/// to on lookup.
#[derive(Debug)]
pub struct Op {
    pub key: OpKey,
    pub arg: OpArg,
    pub(super) exts: ExtMap,
}

impl Op {
    pub fn new(key: OpKey, arg: OpArg) -> Self {
        Self {
            key,
            arg,
            exts: ExtMap::default(),
        }
    }

    pub fn simple(key: OpKey) -> Self { Self::new(key, OpArg::None) }

    pub fn identity() -> Self { Self::simple(OpKey::Identity) }

    pub fn constant(value: Constant) -> Self { Self::new(OpKey::Const, OpArg::Const(value)) }

    pub fn phi(preds: Vec<Block>) -> Self { Self::new(OpKey::Phi, OpArg::Blocks(preds)) }

    pub fn arg(index: u32) -> Self { Self::new(OpKey::Arg, OpArg::Index(index)) }

    pub fn this() -> Self { Self::simple(OpKey::This) }

    pub fn br() -> Self { Self::simple(OpKey::Br) }

    pub fn br_if() -> Self { Self::simple(OpKey::BrIf) }

    pub fn br_table() -> Self { Self::simple(OpKey::BrTable) }

    pub fn ret() -> Self { Self::simple(OpKey::Return) }

    pub fn trap(message: impl Into<String>) -> Self {
        Self::new(OpKey::Trap, OpArg::Message(message.into()))
    }

    pub fn get_field(field: FieldRef) -> Self { Self::new(OpKey::GetField, OpArg::Field(field)) }

    pub fn put_field(field: FieldRef) -> Self { Self::new(OpKey::PutField, OpArg::Field(field)) }

    pub fn array_get() -> Self { Self::simple(OpKey::ArrayGet) }

    pub fn array_set() -> Self { Self::simple(OpKey::ArraySet) }

    pub fn invoke(method: MethodRef) -> Self { Self::new(OpKey::Invoke, OpArg::Method(method)) }

    pub fn insns(insns: Vec<RawInsn>) -> Self { Self::new(OpKey::Insns, OpArg::Insns(insns)) }

    pub fn select() -> Self { Self::simple(OpKey::Select) }

    pub fn bool_select() -> Self { Self::simple(OpKey::BoolSelect) }

    pub fn catch(exception: JType) -> Self { Self::new(OpKey::Catch, OpArg::Type(exception)) }

    pub fn intrinsic(name: impl Into<String>) -> Self {
        Self::new(OpKey::Intrinsic, OpArg::Message(name.into()))
    }

    pub fn drop() -> Self { Self::simple(OpKey::Drop) }

    pub fn handle_of(method: MethodRef) -> Self {
        Self::new(OpKey::HandleOf, OpArg::Method(method))
    }

    pub fn exts(&self) -> &ExtMap { &self.exts }

    pub fn exts_mut(&mut self) -> &mut ExtMap { &mut self.exts }

    /// The predecessors of a phi, empty for other operators.
    pub fn phi_preds(&self) -> &[Block] {
        match (&self.key, &self.arg) {
            (OpKey::Phi, OpArg::Blocks(preds)) => preds,
            _ => &[],
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)?;
        match &self.arg {
            OpArg::None => Ok(()),
            OpArg::Const(c) => write!(f, " {c}"),
            OpArg::Index(i) => write!(f, " {i}"),
            OpArg::Blocks(blocks) => {
                write!(f, " [")?;
                for (i, block) in blocks.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{block}")?;
                }
                write!(f, "]")
            }
            OpArg::Message(msg) => write!(f, " {msg:?}"),
            OpArg::Field(field) => write!(f, " {field}"),
            OpArg::Method(method) => write!(f, " {method}"),
            OpArg::Type(ty) => write!(f, " {ty}"),
            OpArg::Insns(insns) => {
                write!(f, " {{")?;
                for (i, insn) in insns.iter().enumerate() {
                    if i != 0 {
                        write!(f, ";")?;
                    }
                    write!(f, " {insn}")?;
                }
                write!(f, " }}")
            }
        }
    }
}
