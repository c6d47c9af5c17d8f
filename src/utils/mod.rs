//! # General Utilities
//!
//! Graph abstractions shared by the analyses: the control flow traits and a
//! depth-first walker over them.

pub mod cfg;
pub mod dfs;
