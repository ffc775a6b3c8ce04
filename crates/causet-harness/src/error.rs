//! Harness error type.

use causet_core::CausetError;
use thiserror::Error;

use crate::structured_log::Stage;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Core failure outside a pipeline run (single CLI commands).
    #[error(transparent)]
    Causet(#[from] CausetError),
    /// Core failure attributed to a pipeline stage.
    #[error("fixture '{fixture}' failed at stage {stage}: {source}")]
    Core {
        fixture: String,
        stage: Stage,
        #[source]
        source: CausetError,
    },
    #[error("fixture '{fixture}' has no adjacency matrix and no separations + coordinates pair")]
    MissingInput { fixture: String },
}

impl HarnessError {
    /// Stage that failed, when the error came from a pipeline run.
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Core { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
