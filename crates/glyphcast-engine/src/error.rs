use std::path::PathBuf;

/// Errors produced by the rendering core.
///
/// Each variant is reported synchronously by the call that caused it. The one
/// exception is [`RenderError::AsyncReadout`], which surfaces from the
/// readback half of a compute dispatch.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Mesh text could not be turned into a triangle mesh. No partial mesh is returned.
    #[error("malformed mesh at line {line}: {reason}")]
    MalformedMesh { line: usize, reason: String },

    /// Camera basis collapsed (zero-length axis during normalisation).
    #[error("degenerate camera basis: {0}")]
    DegenerateCamera(&'static str),

    /// No compute adapter/device could be acquired.
    #[error("compute device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The compute program or its binding layout failed device validation.
    #[error("compute program rejected: {0}")]
    InvalidProgram(String),

    /// Copy/map of compute results failed.
    #[error("compute readback failed: {0}")]
    AsyncReadout(String),

    /// Operation not permitted in the compute engine's current stage.
    #[error("`{operation}` is not allowed while the compute engine is {stage}")]
    InvalidStage {
        operation: &'static str,
        stage: &'static str,
    },

    #[error("invalid render configuration: {0}")]
    InvalidConfig(String),

    /// The presentation sink rejected a completed frame.
    #[error("failed to present frame: {0}")]
    Present(#[source] std::io::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RenderError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedMesh {
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;
