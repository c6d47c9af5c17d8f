//! # The SSA IR
//!
//! A [Func] is a list of [Block]s, the first being the entry. A block is a list
//! of [Effect]s terminated by one [Control]. Effects bind the results of an
//! [Insn] to [Var]s, controls branch to their target blocks. Every entity lives
//! in the [Context] and is referred to by a `Copy` handle.
//!
//! Analyses in [passes] annotate blocks and variables with derived facts, whose
//! validity is tracked per function by a [MetadataState].

mod block;
mod config;
mod context;
mod control;
mod effect;
mod error;
mod func;
mod insn;
mod jtype;
mod metadata;
mod name_alloc;
mod op;
mod raw;
mod var;

pub mod passes;
pub mod passman;

pub use block::{Block, BlockData, DisplayBlock, LiveData};
pub use config::Config;
pub use context::{Context, DisplayContext};
pub use control::{Control, ControlData, DisplayControl};
pub use effect::{DisplayEffect, Effect, EffectData};
pub use error::{IntegrityError, IrError, IrResult};
pub use func::{DisplayFunc, Func, FuncData};
pub use insn::{DisplayInsn, Insn, InsnData, InsnOwner};
pub use jtype::{FieldRef, JType, MethodRef};
pub use metadata::{MetaKinds, MetadataState};
pub use op::{Constant, Op, OpArg, OpKey};
pub use raw::{array_type, newarray_elem, Opcode, RawInsn, RawOperand};
pub use var::{DisplayVar, Var, VarData};
