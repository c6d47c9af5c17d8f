//! # Collection of Basic Data Structures
//!
//! - `storage`: Arena-based storage for the linked structures of the IR.
//! - `ext`: Typed side-tables that passes attach to IR entities.

pub mod ext;
pub mod storage;
