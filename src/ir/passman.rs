//! # Pass Manager
//!
//! Passes are registered by name and run as a [Pipeline] over every function
//! of a context. Between stages the manager can verify the integrity of the
//! IR, see [Config::verify_between_passes](super::Config).

use rustc_hash::FxHashMap;
use thiserror::Error;

use super::{
    passes::{
        ComputeDomFrontier,
        ComputeDoms,
        ComputeLiveVars,
        ComputePreds,
        ComputeUses,
        InferTypes,
        VerifyIntegrity,
    },
    Context,
    Func,
    IrError,
    IrResult,
};

/// How a failed pass is reported, chosen when the pass is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PassErrorKind {
    /// A pass computing metadata, all passes of
    /// [with_analyses](PassManager::with_analyses) but verification.
    #[error("analysis error")]
    AnalysisError,

    /// A pass rewriting the IR. None is built in, transforms are registered
    /// with [register](PassManager::register) by the user of the crate.
    #[error("transform error")]
    TransformError,

    #[error("verification error")]
    VerificationError,

    /// Anything else, including a pipeline naming an unknown pass.
    #[error("other error")]
    Other,
}

#[derive(Debug, Error)]
#[error("{kind} on {pass_name} in {func}: {err}")]
pub struct PassError {
    pub kind: PassErrorKind,
    pub pass_name: String,
    pub func: String,
    #[source]
    pub err: IrError,
}

pub type PassResult<T> = Result<T, PassError>;

impl PassError {
    pub fn new(
        kind: PassErrorKind,
        pass_name: impl Into<String>,
        func: impl Into<String>,
        err: IrError,
    ) -> Self {
        Self {
            kind,
            pass_name: pass_name.into(),
            func: func.into(),
            err,
        }
    }
}

/// A pass that can be run on a function and modify it.
pub trait LocalPassMut {
    /// The output of the pass.
    type Output;

    /// Run the pass on the given function and maybe modify it.
    ///
    /// # Returns
    ///
    /// A tuple of the output of the pass and a boolean indicating whether the
    /// IR has been modified.
    fn run(&mut self, ctx: &mut Context, func: Func) -> IrResult<(Self::Output, bool)>;
}

struct Registered {
    kind: PassErrorKind,
    pass: Box<dyn LocalPassMut<Output = ()>>,
}

#[derive(Default)]
pub struct PassManager {
    passes: FxHashMap<String, Registered>,
}

/// An ordered list of pass names.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    passes: Vec<String>,
}

impl Pipeline {
    pub fn add_pass(&mut self, name: impl Into<String>) { self.passes.push(name.into()); }

    pub fn passes(&self) -> &[String] { &self.passes }
}

impl<S: Into<String>> FromIterator<S> for Pipeline {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            passes: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl PassManager {
    pub const COMPUTE_PREDS: &'static str = "compute-preds";
    pub const COMPUTE_DOMS: &'static str = "compute-doms";
    pub const COMPUTE_DOM_FRONTIER: &'static str = "compute-dom-frontier";
    pub const COMPUTE_LIVE_VARS: &'static str = "compute-live-vars";
    pub const COMPUTE_USES: &'static str = "compute-uses";
    pub const INFER_TYPES: &'static str = "infer-types";
    pub const VERIFY_INTEGRITY: &'static str = "verify-integrity";

    pub fn new() -> Self { Self::default() }

    /// A manager with the analyses of this crate registered.
    pub fn with_analyses() -> Self {
        let mut passman = Self::new();
        passman.register(Self::COMPUTE_PREDS, PassErrorKind::AnalysisError, ComputePreds);
        passman.register(Self::COMPUTE_DOMS, PassErrorKind::AnalysisError, ComputeDoms);
        passman.register(
            Self::COMPUTE_DOM_FRONTIER,
            PassErrorKind::AnalysisError,
            ComputeDomFrontier,
        );
        passman.register(Self::COMPUTE_LIVE_VARS, PassErrorKind::AnalysisError, ComputeLiveVars);
        passman.register(Self::COMPUTE_USES, PassErrorKind::AnalysisError, ComputeUses);
        passman.register(Self::INFER_TYPES, PassErrorKind::AnalysisError, InferTypes::java());
        passman.register(
            Self::VERIFY_INTEGRITY,
            PassErrorKind::VerificationError,
            VerifyIntegrity,
        );
        passman
    }

    /// Register a pass, replacing any pass with the same name.
    pub fn register<P>(&mut self, name: impl Into<String>, kind: PassErrorKind, pass: P)
    where
        P: LocalPassMut<Output = ()> + 'static,
    {
        self.passes.insert(
            name.into(),
            Registered {
                kind,
                pass: Box::new(pass),
            },
        );
    }

    pub fn gather_pass_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.passes.keys().cloned().collect();
        names.sort();
        names
    }

    /// Run one pass on one function, returning whether it changed the IR.
    pub fn run_pass(&mut self, ctx: &mut Context, name: &str, func: Func) -> PassResult<bool> {
        let Some(registered) = self.passes.get_mut(name) else {
            return Err(PassError::new(
                PassErrorKind::Other,
                name,
                func.name(ctx),
                IrError::unsupported(format!("no pass named {name}")),
            ));
        };
        log::debug!("running {} on {}", name, func.name(ctx));
        match registered.pass.run(ctx, func) {
            Ok(((), changed)) => Ok(changed),
            Err(err) => Err(PassError::new(registered.kind, name, func.name(ctx), err)),
        }
    }

    /// Run the pipeline on every function of the context, in order.
    ///
    /// With verification configured, every function is verified before the
    /// first pass and after each pass.
    pub fn run_pipeline(&mut self, ctx: &mut Context, pipeline: &Pipeline) -> PassResult<()> {
        let verify = ctx.config().verify_between_passes;
        let funcs = ctx.funcs().to_vec();
        for func in funcs {
            if verify {
                Self::verify(ctx, func, "<start>")?;
            }
            for name in pipeline.passes() {
                let changed = self.run_pass(ctx, name, func)?;
                if verify {
                    Self::verify(ctx, func, name)?;
                }
                log::trace!("{} on {}: changed = {}", name, func.name(ctx), changed);
            }
        }
        Ok(())
    }

    fn verify(ctx: &mut Context, func: Func, after: &str) -> PassResult<()> {
        VerifyIntegrity.run(ctx, func).map(|_| ()).map_err(|err| {
            PassError::new(
                PassErrorKind::VerificationError,
                format!("{} after {}", Self::VERIFY_INTEGRITY, after),
                func.name(ctx),
                err,
            )
        })
    }
}
