use std::fmt;

use crate::error::{RenderError, Result};

/// Lifecycle of the compute engine.
///
/// `Uninitialized` is the state before [`super::ComputeEngine::new`] returns
/// and is not represented here.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum EngineStage {
    /// Pipelines and uniform buffers exist; no mesh bound.
    Initialized,
    /// Mesh buffers, output buffers and the bind group are ready.
    MeshAttached,
    /// Work submitted; results not yet consumed.
    Dispatched,
    /// Last dispatch was read back (or discarded).
    Read,
}

impl EngineStage {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineStage::Initialized => "initialized",
            EngineStage::MeshAttached => "mesh-attached",
            EngineStage::Dispatched => "dispatched",
            EngineStage::Read => "read",
        }
    }
}

impl fmt::Display for EngineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transition rules, kept separate from the GPU objects they guard.
#[derive(Debug, Clone)]
pub(crate) struct StageTracker {
    stage: EngineStage,
    uniforms_written: bool,
}

impl StageTracker {
    pub fn new() -> Self {
        Self {
            stage: EngineStage::Initialized,
            uniforms_written: false,
        }
    }

    #[inline]
    pub fn stage(&self) -> EngineStage {
        self.stage
    }

    fn reject(&self, operation: &'static str) -> RenderError {
        RenderError::InvalidStage {
            operation,
            stage: self.stage.as_str(),
        }
    }

    fn enter(&mut self, next: EngineStage) {
        if self.stage != next {
            log::trace!("compute engine: {} -> {}", self.stage, next);
        }
        self.stage = next;
    }

    /// A new mesh may not replace buffers that an unread dispatch still owns.
    pub fn attach(&mut self) -> Result<()> {
        if self.stage == EngineStage::Dispatched {
            return Err(self.reject("attach_mesh"));
        }
        self.enter(EngineStage::MeshAttached);
        self.uniforms_written = false;
        Ok(())
    }

    pub fn write_uniforms(&mut self) -> Result<()> {
        match self.stage {
            EngineStage::MeshAttached | EngineStage::Read => {
                self.uniforms_written = true;
                Ok(())
            }
            _ => Err(self.reject("update_uniforms")),
        }
    }

    /// At most one outstanding dispatch; uniforms must be refreshed before each.
    pub fn dispatch(&mut self) -> Result<()> {
        match self.stage {
            EngineStage::MeshAttached | EngineStage::Read if self.uniforms_written => {
                self.enter(EngineStage::Dispatched);
                self.uniforms_written = false;
                Ok(())
            }
            EngineStage::MeshAttached | EngineStage::Read => Err(RenderError::InvalidStage {
                operation: "dispatch",
                stage: "awaiting uniforms",
            }),
            _ => Err(self.reject("dispatch")),
        }
    }

    pub fn require_dispatched(&self, operation: &'static str) -> Result<()> {
        if self.stage == EngineStage::Dispatched {
            Ok(())
        } else {
            Err(self.reject(operation))
        }
    }

    /// Marks the outstanding dispatch consumed, whether it was read or dropped.
    pub fn complete(&mut self) {
        if self.stage == EngineStage::Dispatched {
            self.enter(EngineStage::Read);
        }
    }
}
