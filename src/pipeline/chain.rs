//! Ordered stage list bound to a transport

use super::types::{Context, Next, Stage};
use crate::error::Result;
use crate::http::{Request, Response, Transport};
use std::sync::Arc;

/// An explicit, ordered list of stages around one transport.
///
/// Stages are listed outermost first. Cloning is cheap and shares stages
/// and transport.
#[derive(Clone)]
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
    transport: Arc<dyn Transport>,
}

impl Pipeline {
    /// A pipeline with no stages: every call goes straight to `transport`
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            stages: Vec::new(),
            transport,
        }
    }

    /// Append a stage inside all existing ones
    #[must_use]
    pub fn with_stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Append an already shared stage inside all existing ones
    pub fn push(&mut self, stage: Arc<dyn Stage>) {
        self.stages.push(stage);
    }

    /// Stage names, outermost first
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// The transport at the bottom of the pipeline
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Run `request` through every stage and the transport
    pub async fn execute(&self, request: Request, ctx: &mut Context) -> Result<Response> {
        Next::new(&self.stages, self.transport.as_ref())
            .run(request, ctx)
            .await
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish_non_exhaustive()
    }
}
