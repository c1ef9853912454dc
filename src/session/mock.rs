//! Mock session collaborators for testing
//!
//! This module provides recording implementations of [`Visitable`] and
//! [`SessionDelegate`] for development and testing.

use parking_lot::Mutex;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

use super::traits::{SessionDelegate, Visitable};
use crate::error::VisitFailure;
use crate::renderer::{ContentRenderer, RendererConfig, SurfaceHandle, VisitAction};

/// Presentation call received by a mock visitable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitableCall {
    ShowSnapshot,
    HideSnapshot,
    UpdateSnapshot,
    ShowActivityIndicator,
    HideActivityIndicator,
    AttachRenderer,
    DetachRenderer,
    ResponseLoaded,
    SnapshotRestored,
    WillRefresh,
    Refreshed,
}

#[derive(Debug, Default)]
struct VisitableState {
    location: Option<Url>,
    snapshot_shown: bool,
    activity_indicator_shown: bool,
    surface: Option<SurfaceHandle>,
    calls: Vec<VisitableCall>,
}

/// Mock visitable
#[derive(Debug)]
pub struct MockVisitable {
    id: String,
    state: Mutex<VisitableState>,
}

impl MockVisitable {
    /// Create a mock visitable for a location
    ///
    /// An unparsable location yields a visitable that is not navigable.
    pub fn new(location: &str) -> Arc<Self> {
        Self::with_location(Url::parse(location).ok())
    }

    /// Create a mock visitable without a location
    pub fn unlocated() -> Arc<Self> {
        Self::with_location(None)
    }

    fn with_location(location: Option<Url>) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4().to_string(),
            state: Mutex::new(VisitableState {
                location,
                ..Default::default()
            }),
        })
    }

    pub fn set_location(&self, location: Option<Url>) {
        self.state.lock().location = location;
    }

    pub fn is_snapshot_shown(&self) -> bool {
        self.state.lock().snapshot_shown
    }

    pub fn is_activity_indicator_shown(&self) -> bool {
        self.state.lock().activity_indicator_shown
    }

    /// Whether the renderer surface currently lives in this container
    pub fn has_renderer(&self) -> bool {
        self.state.lock().surface.is_some()
    }

    pub fn calls(&self) -> Vec<VisitableCall> {
        self.state.lock().calls.clone()
    }

    /// Number of times `call` was received
    pub fn count(&self, call: &VisitableCall) -> usize {
        self.state.lock().calls.iter().filter(|c| *c == call).count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    fn record(&self, call: VisitableCall) {
        self.state.lock().calls.push(call);
    }
}

impl Visitable for MockVisitable {
    fn id(&self) -> &str {
        &self.id
    }

    fn location(&self) -> Option<Url> {
        self.state.lock().location.clone()
    }

    fn show_snapshot(&self) {
        let mut state = self.state.lock();
        state.snapshot_shown = true;
        state.calls.push(VisitableCall::ShowSnapshot);
    }

    fn hide_snapshot(&self) {
        let mut state = self.state.lock();
        state.snapshot_shown = false;
        state.calls.push(VisitableCall::HideSnapshot);
    }

    fn update_snapshot(&self) {
        self.record(VisitableCall::UpdateSnapshot);
    }

    fn show_activity_indicator(&self) {
        let mut state = self.state.lock();
        state.activity_indicator_shown = true;
        state.calls.push(VisitableCall::ShowActivityIndicator);
    }

    fn hide_activity_indicator(&self) {
        let mut state = self.state.lock();
        state.activity_indicator_shown = false;
        state.calls.push(VisitableCall::HideActivityIndicator);
    }

    fn attach_renderer(&self, surface: &SurfaceHandle) {
        let mut state = self.state.lock();
        state.surface = Some(surface.clone());
        state.calls.push(VisitableCall::AttachRenderer);
    }

    fn detach_renderer(&self) {
        let mut state = self.state.lock();
        state.surface = None;
        state.calls.push(VisitableCall::DetachRenderer);
    }

    fn on_response_loaded(&self) {
        self.record(VisitableCall::ResponseLoaded);
    }

    fn on_snapshot_restored(&self) {
        self.record(VisitableCall::SnapshotRestored);
    }

    fn on_will_refresh(&self) {
        self.record(VisitableCall::WillRefresh);
    }

    fn on_refreshed(&self) {
        self.record(VisitableCall::Refreshed);
    }
}

/// Call received by a mock delegate
#[derive(Debug, Clone, PartialEq)]
pub enum DelegateCall {
    PrepareRendererConfig,
    RendererInitialized,
    ProposedNavigation(Url, VisitAction),
    RequestStarted,
    RequestFinished,
    RequestFailed {
        visitable_id: String,
        failure: VisitFailure,
    },
    OpenExternalLocation(Url),
}

/// Mock session delegate
#[derive(Debug, Default)]
pub struct MockDelegate {
    calls: Mutex<Vec<DelegateCall>>,
    extra_user_script: Option<String>,
}

impl MockDelegate {
    /// Create a new mock delegate
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create a mock delegate that injects a user script into the renderer config
    pub fn with_user_script(script: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            extra_user_script: Some(script.to_string()),
        })
    }

    pub fn calls(&self) -> Vec<DelegateCall> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Failures reported so far
    pub fn failures(&self) -> Vec<VisitFailure> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                DelegateCall::RequestFailed { failure, .. } => Some(failure.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: DelegateCall) {
        self.calls.lock().push(call);
    }
}

impl SessionDelegate for MockDelegate {
    fn on_prepare_renderer_config(&self, config: &mut RendererConfig) {
        if let Some(script) = &self.extra_user_script {
            config.user_scripts.push(script.clone());
        }
        self.record(DelegateCall::PrepareRendererConfig);
    }

    fn on_renderer_initialized(&self, _renderer: &Arc<dyn ContentRenderer>) {
        self.record(DelegateCall::RendererInitialized);
    }

    fn on_proposed_navigation(&self, location: &Url, action: VisitAction) {
        self.record(DelegateCall::ProposedNavigation(location.clone(), action));
    }

    fn on_request_started(&self) {
        self.record(DelegateCall::RequestStarted);
    }

    fn on_request_finished(&self) {
        self.record(DelegateCall::RequestFinished);
    }

    fn on_request_failed(&self, visitable: &Arc<dyn Visitable>, failure: &VisitFailure) {
        self.record(DelegateCall::RequestFailed {
            visitable_id: visitable.id().to_string(),
            failure: failure.clone(),
        });
    }

    fn on_open_external_location(&self, location: &Url) {
        self.record(DelegateCall::OpenExternalLocation(location.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_visitable_flags() {
        let visitable = MockVisitable::new("https://example.com/");
        assert!(!visitable.is_snapshot_shown());

        visitable.show_snapshot();
        visitable.show_activity_indicator();
        assert!(visitable.is_snapshot_shown());
        assert!(visitable.is_activity_indicator_shown());

        visitable.hide_snapshot();
        assert!(!visitable.is_snapshot_shown());
        assert_eq!(visitable.count(&VisitableCall::ShowSnapshot), 1);
    }

    #[test]
    fn test_mock_visitable_renderer_binding() {
        let visitable = MockVisitable::new("https://example.com/");
        visitable.attach_renderer(&SurfaceHandle::new());
        assert!(visitable.has_renderer());

        visitable.detach_renderer();
        assert!(!visitable.has_renderer());
    }

    #[test]
    fn test_unlocated_visitable() {
        let visitable = MockVisitable::unlocated();
        assert!(visitable.location().is_none());

        visitable.set_location(Url::parse("https://example.com/later").ok());
        assert!(visitable.location().is_some());
    }

    #[test]
    fn test_mock_delegate_amends_config() {
        let delegate = MockDelegate::with_user_script("window.native = true");
        let mut config = crate::config::Config::default().renderer_config();

        delegate.on_prepare_renderer_config(&mut config);
        assert_eq!(config.user_scripts, vec!["window.native = true".to_string()]);
        assert_eq!(delegate.calls(), vec![DelegateCall::PrepareRendererConfig]);
    }
}
