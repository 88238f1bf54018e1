use std::io;

use famiview_core::Error;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Core(#[from] Error),
    #[error("frame assembler stopped before the emulation finished")]
    AssemblerStopped,
    #[error("failed to spawn {name} thread")]
    Spawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },
}

impl RuntimeError {
    /// `true` when the run ended on hardware behavior that is not modeled.
    pub fn is_unsupported_feature(&self) -> bool {
        matches!(self, RuntimeError::Core(err) if err.is_unsupported_feature())
    }
}
