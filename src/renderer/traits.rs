//! Content renderer traits
//!
//! This module defines the abstract interface the session drives the shared renderer through.

use async_trait::async_trait;
use url::Url;
use uuid::Uuid;

use crate::renderer::types::{VisitAction, VisitId};

/// Renderer configuration
///
/// Built from [`crate::config::Config`] and handed to the session delegate for
/// amendment before the renderer is constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Appended to the renderer's user agent
    pub user_agent_suffix: String,
    /// Script message handler the content bridge posts to
    pub bridge_handler_name: String,
    /// Extra scripts injected at document start
    pub user_scripts: Vec<String>,
}

/// Native view handle of the renderer
///
/// Attaching it to a visitable moves the single rendering surface into that container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceHandle {
    id: Uuid,
}

impl SurfaceHandle {
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Default for SurfaceHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Content renderer trait
///
/// Every command returns once it has been issued; results arrive later as
/// [`crate::renderer::RendererEvent`]s.
#[async_trait]
pub trait ContentRenderer: Send + Sync + std::fmt::Debug {
    /// Handle of the rendering surface
    fn surface(&self) -> SurfaceHandle;

    /// Apply configuration before first use
    async fn initialize(&self, config: &RendererConfig) -> Result<(), crate::Error>;

    /// Load a location from scratch
    async fn load_full_content(&self, visit_id: VisitId, location: &Url) -> Result<(), crate::Error>;

    /// Transition to a location inside the already loaded content
    async fn perform_in_page_transition(
        &self,
        visit_id: VisitId,
        location: &Url,
        action: VisitAction,
        restoration_identifier: Option<&str>,
    ) -> Result<(), crate::Error>;

    /// Let a deferred transition render now that the native transition finished
    async fn complete_transition(&self, visit_id: VisitId) -> Result<(), crate::Error>;

    /// Abort the in-flight operation for a visit
    async fn abort(&self, visit_id: VisitId) -> Result<(), crate::Error>;
}
