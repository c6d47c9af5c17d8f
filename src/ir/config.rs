use std::env;

/// Diagnostic switches of a [Context](super::Context).
///
/// None of them changes a computed result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Give variables with the same name distinct indices within a function.
    pub unique_var_names: bool,
    /// Capture a backtrace when an instruction is created, shown when its
    /// type inference fails.
    pub track_insn_creations: bool,
    /// Run [VerifyIntegrity](super::passes::VerifyIntegrity) between pipeline
    /// stages.
    pub verify_between_passes: bool,
}

impl Config {
    pub const UNIQUE_VAR_NAMES: &'static str = "WASM_SSA_UNIQUE_VAR_NAMES";
    pub const TRACK_INSN_CREATIONS: &'static str = "WASM_SSA_TRACK_INSN_CREATIONS";
    pub const VERIFY: &'static str = "WASM_SSA_VERIFY";

    /// Read the switches from the environment; a set variable enables.
    pub fn from_env() -> Self {
        Self {
            unique_var_names: env::var_os(Self::UNIQUE_VAR_NAMES).is_some(),
            track_insn_creations: env::var_os(Self::TRACK_INSN_CREATIONS).is_some(),
            verify_between_passes: env::var_os(Self::VERIFY).is_some(),
        }
    }

    pub fn with_unique_var_names(mut self, enabled: bool) -> Self {
        self.unique_var_names = enabled;
        self
    }

    pub fn with_insn_tracking(mut self, enabled: bool) -> Self {
        self.track_insn_creations = enabled;
        self
    }

    pub fn with_verification(mut self, enabled: bool) -> Self {
        self.verify_between_passes = enabled;
        self
    }
}
