#![forbid(unsafe_code)]

//! SSA construction and analysis infrastructure for compiling WebAssembly to
//! the JVM.
//!
//! - [collections]: arena storage and the typed metadata store.
//! - [ir]: the IR itself, its analyses and the pass manager.
//! - [utils]: graph traversal over the IR.

pub mod collections;
pub mod ir;
pub mod utils;
