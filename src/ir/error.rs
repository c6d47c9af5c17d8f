use thiserror::Error;

use crate::collections::ext::MissingExt;

/// Structural invariants of a function that the verifier checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("function {func} has no blocks")]
    EmptyFunction { func: String },

    #[error("function {func} contains block {block} more than once")]
    DuplicateBlock { func: String, block: String },

    #[error("block {block} is listed in function {func} but owned by {owner}")]
    BlockNotOwned {
        func: String,
        block: String,
        owner: String,
    },

    #[error("block {block} has no control")]
    MissingControl { block: String },

    #[error("phi references block not in function\n  referenced: {referenced}\n  instruction: {insn}\n  in block: {block}")]
    DanglingPhiPred {
        referenced: String,
        insn: String,
        block: String,
    },

    #[error("phi not at block start\n  instruction: {insn}\n  in block: {block}")]
    PhiNotAtStart { insn: String, block: String },

    #[error("effect not owned by block\n  effect: {effect}\n  block: {block}")]
    EffectNotOwned { effect: String, block: String },

    #[error("control not owned by block\n  control: {control}\n  block: {block}")]
    ControlNotOwned { control: String, block: String },

    #[error("branch targets block not in function\n  referenced: {referenced}\n  control: {control}\n  in block: {block}")]
    DanglingTarget {
        referenced: String,
        control: String,
        block: String,
    },
}

#[derive(Debug, Error)]
pub enum IrError {
    /// A fact was demanded but never computed, usually a skipped pass.
    #[error("missing metadata: {what} on {entity}")]
    MissingMetadata { what: &'static str, entity: String },

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error("type mismatch: expected {expected} at index {index}, got {actual}")]
    TypeMismatch {
        expected: String,
        index: usize,
        actual: String,
    },

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    /// The type of one effect could not be inferred.
    #[error("error inferring {effect}; in block {block}{}", .created_at.as_deref().map(|bt| format!("\ninstruction created at:\n{bt}")).unwrap_or_default())]
    InferenceFailed {
        effect: String,
        block: String,
        created_at: Option<String>,
        #[source]
        source: Box<IrError>,
    },
}

impl IrError {
    pub fn missing(what: &'static str, entity: impl ToString) -> Self {
        IrError::MissingMetadata {
            what,
            entity: entity.to_string(),
        }
    }

    pub fn from_missing_ext(err: MissingExt, entity: impl ToString) -> Self {
        Self::missing(err.name, entity)
    }

    pub fn illegal(msg: impl Into<String>) -> Self { IrError::IllegalArgument(msg.into()) }

    pub fn unsupported(msg: impl Into<String>) -> Self { IrError::Unsupported(msg.into()) }

    /// Strip [IrError::InferenceFailed] wrappers to the error that caused it.
    pub fn root_cause(&self) -> &IrError {
        let mut err = self;
        while let IrError::InferenceFailed { source, .. } = err {
            err = source;
        }
        err
    }
}

pub type IrResult<T> = Result<T, IrError>;
