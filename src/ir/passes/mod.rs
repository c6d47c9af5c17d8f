//! The analyses over the IR.
//!
//! Each analysis stores its facts on the IR and marks them valid in the
//! [MetadataState](super::MetadataState) of the function.

mod compute_dom_frontier;
mod compute_doms;
mod compute_live_vars;
mod compute_preds;
mod compute_uses;
pub mod infer_types;
mod verify_integrity;

pub use self::{
    compute_dom_frontier::ComputeDomFrontier,
    compute_doms::ComputeDoms,
    compute_live_vars::ComputeLiveVars,
    compute_preds::ComputePreds,
    compute_uses::ComputeUses,
    infer_types::{
        FuncType,
        FunctionMethod,
        InferTypes,
        JavaTypes,
        Signature,
        TypeOf,
        TypeSystem,
    },
    verify_integrity::VerifyIntegrity,
};
