//! Raw JVM instruction sequences embedded in the IR.
//!
//! An [OpKey::Insns](super::OpKey::Insns) operator carries a short sequence of
//! stack-machine instructions that consume the operator's arguments from the
//! operand stack and leave its results on it.

use core::fmt;

use super::{FieldRef, JType, MethodRef};

macro_rules! opcodes {
    ($($variant:ident => $mnemonic:literal),* $(,)?) => {
        /// The opcodes that can appear in a raw instruction sequence.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Opcode {
            $($variant),*
        }

        impl Opcode {
            pub fn mnemonic(self) -> &'static str {
                match self {
                    $(Opcode::$variant => $mnemonic),*
                }
            }
        }
    };
}

opcodes! {
    Nop => "nop",
    Pop => "pop",
    DupX1 => "dup_x1",
    Swap => "swap",

    AconstNull => "aconst_null",
    IconstM1 => "iconst_m1",
    Iconst0 => "iconst_0",
    Iconst1 => "iconst_1",
    Iconst2 => "iconst_2",
    Iconst3 => "iconst_3",
    Iconst4 => "iconst_4",
    Iconst5 => "iconst_5",
    Lconst0 => "lconst_0",
    Lconst1 => "lconst_1",
    Fconst0 => "fconst_0",
    Fconst1 => "fconst_1",
    Fconst2 => "fconst_2",
    Dconst0 => "dconst_0",
    Dconst1 => "dconst_1",
    Bipush => "bipush",
    Sipush => "sipush",

    I2l => "i2l",
    I2f => "i2f",
    I2d => "i2d",
    L2i => "l2i",
    L2f => "l2f",
    L2d => "l2d",
    F2i => "f2i",
    F2l => "f2l",
    F2d => "f2d",
    D2i => "d2i",
    D2l => "d2l",
    D2f => "d2f",
    I2b => "i2b",
    I2c => "i2c",
    I2s => "i2s",

    Ineg => "ineg",
    Lneg => "lneg",
    Fneg => "fneg",
    Dneg => "dneg",

    Iaload => "iaload",
    Laload => "laload",
    Faload => "faload",
    Daload => "daload",
    Aaload => "aaload",
    Baload => "baload",
    Caload => "caload",
    Saload => "saload",
    Iastore => "iastore",
    Lastore => "lastore",
    Fastore => "fastore",
    Dastore => "dastore",
    Aastore => "aastore",
    Bastore => "bastore",
    Castore => "castore",
    Sastore => "sastore",

    Lcmp => "lcmp",
    Fcmpl => "fcmpl",
    Fcmpg => "fcmpg",
    Dcmpl => "dcmpl",
    Dcmpg => "dcmpg",

    Iadd => "iadd",
    Isub => "isub",
    Imul => "imul",
    Idiv => "idiv",
    Irem => "irem",
    Iand => "iand",
    Ior => "ior",
    Ixor => "ixor",
    Ishl => "ishl",
    Ishr => "ishr",
    Iushr => "iushr",
    Ladd => "ladd",
    Lsub => "lsub",
    Lmul => "lmul",
    Ldiv => "ldiv",
    Lrem => "lrem",
    Land => "land",
    Lor => "lor",
    Lxor => "lxor",
    Lshl => "lshl",
    Lshr => "lshr",
    Lushr => "lushr",
    Fadd => "fadd",
    Fsub => "fsub",
    Fmul => "fmul",
    Fdiv => "fdiv",
    Frem => "frem",
    Dadd => "dadd",
    Dsub => "dsub",
    Dmul => "dmul",
    Ddiv => "ddiv",
    Drem => "drem",

    Getstatic => "getstatic",
    Putstatic => "putstatic",
    Getfield => "getfield",
    Invokevirtual => "invokevirtual",
    Invokespecial => "invokespecial",
    Invokestatic => "invokestatic",
    Invokeinterface => "invokeinterface",
    Invokedynamic => "invokedynamic",

    New => "new",
    Newarray => "newarray",
    Anewarray => "anewarray",
    Arraylength => "arraylength",
    Checkcast => "checkcast",
    Instanceof => "instanceof",
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.mnemonic()) }
}

/// The immediate operand of a raw instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum RawOperand {
    None,
    /// `bipush`/`sipush` values and `newarray` element types.
    Int(i32),
    /// The class of `new`, `checkcast`, `anewarray` and `instanceof`.
    Class(String),
    Field(FieldRef),
    Method(MethodRef),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawInsn {
    pub opcode: Opcode,
    pub operand: RawOperand,
}

impl RawInsn {
    pub fn simple(opcode: Opcode) -> Self {
        Self {
            opcode,
            operand: RawOperand::None,
        }
    }

    pub fn int(opcode: Opcode, value: i32) -> Self {
        Self {
            opcode,
            operand: RawOperand::Int(value),
        }
    }

    pub fn class(opcode: Opcode, internal_name: impl Into<String>) -> Self {
        Self {
            opcode,
            operand: RawOperand::Class(internal_name.into()),
        }
    }

    pub fn field(opcode: Opcode, field: FieldRef) -> Self {
        Self {
            opcode,
            operand: RawOperand::Field(field),
        }
    }

    pub fn method(opcode: Opcode, method: MethodRef) -> Self {
        Self {
            opcode,
            operand: RawOperand::Method(method),
        }
    }
}

impl fmt::Display for RawInsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        match &self.operand {
            RawOperand::None => Ok(()),
            RawOperand::Int(value) => write!(f, " {value}"),
            RawOperand::Class(name) => write!(f, " {name}"),
            RawOperand::Field(field) => write!(f, " {field}"),
            RawOperand::Method(method) => write!(f, " {method}"),
        }
    }
}

/// `newarray` element type codes.
pub mod array_type {
    pub const T_BOOLEAN: i32 = 4;
    pub const T_CHAR: i32 = 5;
    pub const T_FLOAT: i32 = 6;
    pub const T_DOUBLE: i32 = 7;
    pub const T_BYTE: i32 = 8;
    pub const T_SHORT: i32 = 9;
    pub const T_INT: i32 = 10;
    pub const T_LONG: i32 = 11;
}

/// The element type of a `newarray` type code.
pub fn newarray_elem(code: i32) -> Option<JType> {
    use array_type::*;
    Some(match code {
        T_BOOLEAN => JType::Boolean,
        T_CHAR => JType::Char,
        T_FLOAT => JType::Float,
        T_DOUBLE => JType::Double,
        T_BYTE => JType::Byte,
        T_SHORT => JType::Short,
        T_INT => JType::Int,
        T_LONG => JType::Long,
        _ => return None,
    })
}
