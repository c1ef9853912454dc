//! Session collaborator traits
//!
//! This module defines the contracts of the native view containers the session
//! binds the renderer to, and of the delegate it reports to.

use std::sync::Arc;
use url::Url;

use crate::error::VisitFailure;
use crate::renderer::{ContentRenderer, RendererConfig, SurfaceHandle, VisitAction};

/// Visitable trait
///
/// A native view container that can host the shared renderer. Presentation
/// mutators are only ever called by the session. Hooks default to no-ops.
pub trait Visitable: Send + Sync + std::fmt::Debug {
    /// Stable identity of the container
    fn id(&self) -> &str;

    /// Target location, `None` while the container is not navigable
    fn location(&self) -> Option<Url>;

    /// Show the snapshot placeholder over the container
    fn show_snapshot(&self);

    /// Hide the snapshot placeholder
    fn hide_snapshot(&self);

    /// Capture the currently rendered content into the snapshot placeholder
    fn update_snapshot(&self);

    fn show_activity_indicator(&self);

    fn hide_activity_indicator(&self);

    /// Move the renderer surface into this container
    fn attach_renderer(&self, surface: &SurfaceHandle);

    /// Remove the renderer surface from this container
    fn detach_renderer(&self);

    /// A response was loaded into the renderer for this container
    fn on_response_loaded(&self) {}

    /// A restore visit was served from cache
    fn on_snapshot_restored(&self) {}

    /// A user initiated refresh is about to start
    fn on_will_refresh(&self) {}

    /// The refresh finished
    fn on_refreshed(&self) {}
}

/// Session delegate trait
///
/// The application-level seam: routing of proposed navigations and handling of
/// request failures are decided here, not in the session.
pub trait SessionDelegate: Send + Sync {
    /// Amend the renderer configuration before the renderer is built
    fn on_prepare_renderer_config(&self, _config: &mut RendererConfig) {}

    /// The renderer completed a full content load and can serve fast visits
    fn on_renderer_initialized(&self, _renderer: &Arc<dyn ContentRenderer>) {}

    /// The user activated a link inside the content
    fn on_proposed_navigation(&self, location: &Url, action: VisitAction);

    fn on_request_started(&self) {}

    fn on_request_finished(&self) {}

    /// A visit's request failed
    fn on_request_failed(&self, visitable: &Arc<dyn Visitable>, failure: &VisitFailure);

    /// A link should leave the application
    fn on_open_external_location(&self, _location: &Url) {}
}
