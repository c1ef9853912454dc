//! Mock content renderer for testing
//!
//! Records every command the session issues so tests can assert on the exact
//! sequence, and can be told to reject commands to exercise failure paths.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use url::Url;

use crate::renderer::traits::{ContentRenderer, RendererConfig, SurfaceHandle};
use crate::renderer::types::{VisitAction, VisitId};
use crate::Error;

/// Command received by the mock renderer
#[derive(Debug, Clone, PartialEq)]
pub enum RendererCommand {
    Initialize(RendererConfig),
    LoadFullContent {
        visit_id: VisitId,
        location: Url,
    },
    PerformInPageTransition {
        visit_id: VisitId,
        location: Url,
        action: VisitAction,
        restoration_identifier: Option<String>,
    },
    CompleteTransition(VisitId),
    Abort(VisitId),
}

/// Mock content renderer
#[derive(Debug, Default)]
pub struct MockRenderer {
    surface: SurfaceHandle,
    commands: Arc<Mutex<Vec<RendererCommand>>>,
    reject_loads: AtomicBool,
}

impl MockRenderer {
    /// Create a new mock renderer
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands received so far
    pub fn commands(&self) -> Vec<RendererCommand> {
        self.commands.lock().clone()
    }

    /// Forget recorded commands
    pub fn clear(&self) {
        self.commands.lock().clear();
    }

    /// Make load and transition commands fail
    pub fn reject_loads(&self, reject: bool) {
        self.reject_loads.store(reject, Ordering::Relaxed);
    }

    /// Visit ids passed to `load_full_content`
    pub fn full_loads(&self) -> Vec<VisitId> {
        self.commands
            .lock()
            .iter()
            .filter_map(|c| match c {
                RendererCommand::LoadFullContent { visit_id, .. } => Some(*visit_id),
                _ => None,
            })
            .collect()
    }

    /// Visit ids passed to `perform_in_page_transition`
    pub fn transitions(&self) -> Vec<VisitId> {
        self.commands
            .lock()
            .iter()
            .filter_map(|c| match c {
                RendererCommand::PerformInPageTransition { visit_id, .. } => Some(*visit_id),
                _ => None,
            })
            .collect()
    }

    /// Visit ids passed to `abort`
    pub fn aborts(&self) -> Vec<VisitId> {
        self.commands
            .lock()
            .iter()
            .filter_map(|c| match c {
                RendererCommand::Abort(visit_id) => Some(*visit_id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, command: RendererCommand) {
        tracing::debug!("Mock renderer: {:?}", command);
        self.commands.lock().push(command);
    }
}

#[async_trait]
impl ContentRenderer for MockRenderer {
    fn surface(&self) -> SurfaceHandle {
        self.surface.clone()
    }

    async fn initialize(&self, config: &RendererConfig) -> Result<(), Error> {
        self.record(RendererCommand::Initialize(config.clone()));
        Ok(())
    }

    async fn load_full_content(&self, visit_id: VisitId, location: &Url) -> Result<(), Error> {
        self.record(RendererCommand::LoadFullContent {
            visit_id,
            location: location.clone(),
        });
        if self.reject_loads.load(Ordering::Relaxed) {
            return Err(Error::renderer("content load rejected"));
        }
        Ok(())
    }

    async fn perform_in_page_transition(
        &self,
        visit_id: VisitId,
        location: &Url,
        action: VisitAction,
        restoration_identifier: Option<&str>,
    ) -> Result<(), Error> {
        self.record(RendererCommand::PerformInPageTransition {
            visit_id,
            location: location.clone(),
            action,
            restoration_identifier: restoration_identifier.map(str::to_string),
        });
        if self.reject_loads.load(Ordering::Relaxed) {
            return Err(Error::renderer("transition rejected"));
        }
        Ok(())
    }

    async fn complete_transition(&self, visit_id: VisitId) -> Result<(), Error> {
        self.record(RendererCommand::CompleteTransition(visit_id));
        Ok(())
    }

    async fn abort(&self, visit_id: VisitId) -> Result<(), Error> {
        self.record(RendererCommand::Abort(visit_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_commands() {
        let renderer = MockRenderer::new();
        let id = VisitId::new();
        let location = Url::parse("https://example.com/one").unwrap();

        renderer.load_full_content(id, &location).await.unwrap();
        renderer.abort(id).await.unwrap();

        assert_eq!(renderer.full_loads(), vec![id]);
        assert_eq!(renderer.aborts(), vec![id]);
        assert_eq!(renderer.commands().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_rejects_loads() {
        let renderer = MockRenderer::new();
        renderer.reject_loads(true);

        let location = Url::parse("https://example.com/").unwrap();
        let result = renderer.load_full_content(VisitId::new(), &location).await;
        assert!(matches!(result, Err(Error::Renderer(_))));

        // Rejected commands are still recorded
        assert_eq!(renderer.full_loads().len(), 1);
    }

    #[test]
    fn test_surface_is_stable() {
        let renderer = MockRenderer::new();
        assert_eq!(renderer.surface(), renderer.surface());
    }
}
