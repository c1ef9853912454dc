//! Session controller
//!
//! Owns the shared renderer and the visits issued against it, and reconciles
//! visit lifecycles with native appearance events.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::renderer::{
    ContentRenderer, NavigationKind, NavigationPolicy, NavigationRequest, RendererConfig,
    RendererEvent, ScriptMessage, VisitAction,
};
use crate::session::traits::{SessionDelegate, Visitable};
use crate::session::visit::{Visit, VisitCallback, VisitKind, VisitState};
use crate::Result;

/// Navigation session
///
/// All methods take `&mut self`: the session is driven from one sequential
/// stream of native and renderer events.
pub struct Session {
    config: Config,
    renderer: Arc<dyn ContentRenderer>,
    delegate: Arc<dyn SessionDelegate>,
    initialized: bool,
    refreshing: bool,
    current_visitable: Option<Weak<dyn Visitable>>,
    last_issued_visit: Option<Arc<Visit>>,
    topmost_visit: Option<Arc<Visit>>,
    restoration_identifiers: HashMap<String, (Weak<dyn Visitable>, String)>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("initialized", &self.initialized)
            .field("refreshing", &self.refreshing)
            .field("last_issued_visit", &self.last_issued_visit.as_ref().map(|v| v.id()))
            .field("topmost_visit", &self.topmost_visit.as_ref().map(|v| v.id()))
            .finish()
    }
}

impl Session {
    /// Create a new session
    ///
    /// The delegate may amend the renderer configuration before `factory`
    /// builds the renderer; the renderer is configured before this returns.
    pub async fn new<F>(
        config: Config,
        delegate: Arc<dyn SessionDelegate>,
        factory: F,
    ) -> Result<Self>
    where
        F: FnOnce(&RendererConfig) -> Result<Arc<dyn ContentRenderer>>,
    {
        let mut renderer_config = config.renderer_config();
        delegate.on_prepare_renderer_config(&mut renderer_config);

        let renderer = factory(&renderer_config)?;
        renderer.initialize(&renderer_config).await?;

        info!(
            "Session created with renderer surface {}",
            renderer.surface().id()
        );

        Ok(Self {
            config,
            renderer,
            delegate,
            initialized: false,
            refreshing: false,
            current_visitable: None,
            last_issued_visit: None,
            topmost_visit: None,
            restoration_identifiers: HashMap::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn renderer(&self) -> &Arc<dyn ContentRenderer> {
        &self.renderer
    }

    /// Whether the renderer completed a full content load
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether a user initiated refresh is outstanding
    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    /// Visitable the renderer is currently bound to
    pub fn current_visitable(&self) -> Option<Arc<dyn Visitable>> {
        self.current_visitable.as_ref().and_then(Weak::upgrade)
    }

    pub fn last_issued_visit(&self) -> Option<Arc<Visit>> {
        self.last_issued_visit.clone()
    }

    pub fn topmost_visit(&self) -> Option<Arc<Visit>> {
        self.topmost_visit.clone()
    }

    /// Visitable of the topmost visit
    pub fn topmost_visitable(&self) -> Option<Arc<dyn Visitable>> {
        self.topmost_visit.as_ref().and_then(|v| v.visitable())
    }

    /// Restoration identifier recorded for a visitable
    pub fn restoration_identifier_for(&self, visitable: &dyn Visitable) -> Option<String> {
        self.restoration_identifiers
            .get(visitable.id())
            .filter(|(weak, _)| weak.strong_count() > 0)
            .map(|(_, identifier)| identifier.clone())
    }

    /// Issue an advance visit for a visitable
    #[instrument(skip(self, visitable), fields(visitable = visitable.id()))]
    pub async fn visit(&mut self, visitable: &Arc<dyn Visitable>) {
        self.issue_visit(visitable, VisitAction::Advance).await;
    }

    /// Reload the current visitable with a cold boot visit
    #[instrument(skip(self))]
    pub async fn reload(&mut self) {
        let Some(visitable) = self.current_visitable() else {
            debug!("Nothing to reload: no current visitable");
            return;
        };

        self.initialized = false;
        if let Some(visit) = self.issue_visit(&visitable, VisitAction::Advance).await {
            let failed = visit.has_failed();
            self.topmost_visit = Some(visit);
            if !failed {
                self.activate_visitable(&visitable);
            }
        }
    }

    async fn issue_visit(
        &mut self,
        visitable: &Arc<dyn Visitable>,
        action: VisitAction,
    ) -> Option<Arc<Visit>> {
        let Some(location) = visitable.location() else {
            debug!("Visitable {} has no location, not visiting", visitable.id());
            return None;
        };

        let kind = if self.initialized {
            VisitKind::Fast
        } else {
            VisitKind::ColdBoot
        };
        let restoration_identifier = match kind {
            VisitKind::Fast => self.restoration_identifier_for(visitable.as_ref()),
            VisitKind::ColdBoot => None,
        };

        let renderer = self.renderer.clone();
        if let Some(previous) = self.last_issued_visit.take() {
            previous.cancel(renderer.as_ref()).await;
        }

        let visit = Arc::new(Visit::new(
            kind,
            action,
            visitable,
            location,
            restoration_identifier,
        ));
        self.last_issued_visit = Some(visit.clone());

        visit
            .start(renderer.as_ref(), &mut |callback| {
                self.apply_visit_callback(&visit, callback)
            })
            .await;

        Some(visit)
    }

    fn apply_visit_callback(&mut self, visit: &Visit, callback: VisitCallback) {
        let Some(visitable) = visit.visitable() else {
            debug!("Dropping {:?}: visitable of visit {} released", callback, visit.id());
            return;
        };

        match callback {
            VisitCallback::RendererInitialized => {
                info!("Renderer initialized by visit {}", visit.id());
                self.initialized = true;
                self.delegate.on_renderer_initialized(&self.renderer);
                visitable.on_response_loaded();
            }
            VisitCallback::WillStart => {
                visitable.show_snapshot();
                self.activate_visitable(&visitable);
            }
            VisitCallback::Started { has_snapshot } => {
                if !has_snapshot {
                    visitable.show_activity_indicator();
                }
            }
            VisitCallback::SnapshotRestored => {
                visitable.hide_snapshot();
                visitable.hide_activity_indicator();
                visitable.on_snapshot_restored();
            }
            VisitCallback::ResponseLoaded => visitable.on_response_loaded(),
            VisitCallback::Completed {
                restoration_identifier,
            } => {
                visitable.hide_snapshot();
                visitable.hide_activity_indicator();
                if let Some(identifier) = restoration_identifier {
                    self.store_restoration_identifier(&visitable, identifier);
                }
                self.finish_refresh(&visitable);
            }
            VisitCallback::Failed => {
                visitable.hide_snapshot();
                visitable.hide_activity_indicator();
                self.deactivate_visitable(&visitable);
                self.finish_refresh(&visitable);
            }
            VisitCallback::RequestStarted => self.delegate.on_request_started(),
            VisitCallback::RequestFinished => self.delegate.on_request_finished(),
            VisitCallback::RequestFailed(failure) => {
                warn!("Visit {} to {} failed: {}", visit.id(), visit.location(), failure);
                self.delegate.on_request_failed(&visitable, &failure);
            }
        }
    }

    fn finish_refresh(&mut self, visitable: &Arc<dyn Visitable>) {
        if self.refreshing {
            self.refreshing = false;
            visitable.on_refreshed();
        }
    }

    fn store_restoration_identifier(&mut self, visitable: &Arc<dyn Visitable>, identifier: String) {
        self.restoration_identifiers
            .retain(|_, (weak, _)| weak.strong_count() > 0);
        self.restoration_identifiers.insert(
            visitable.id().to_string(),
            (Arc::downgrade(visitable), identifier),
        );
    }

    fn is_current(&self, visitable: &dyn Visitable) -> bool {
        self.current_visitable()
            .is_some_and(|current| current.id() == visitable.id())
    }

    /// Move the renderer into `visitable`, freezing the previous container on a snapshot
    fn activate_visitable(&mut self, visitable: &Arc<dyn Visitable>) {
        if self.is_current(visitable.as_ref()) {
            return;
        }

        if let Some(previous) = self.current_visitable() {
            previous.update_snapshot();
            previous.show_snapshot();
            previous.detach_renderer();
        }

        visitable.attach_renderer(&self.renderer.surface());
        self.current_visitable = Some(Arc::downgrade(visitable));
        debug!("Renderer relocated to visitable {}", visitable.id());
    }

    fn deactivate_visitable(&mut self, visitable: &Arc<dyn Visitable>) {
        if self.is_current(visitable.as_ref()) {
            visitable.detach_renderer();
            self.current_visitable = None;
            debug!("Renderer detached from visitable {}", visitable.id());
        }
    }

    /// Handle a renderer change notification
    pub async fn handle_renderer_event(&mut self, event: RendererEvent) {
        match event {
            RendererEvent::ProposedNavigation { location, action } => {
                debug!("Proposed {} visit to {}", action, location);
                self.delegate.on_proposed_navigation(&location, action);
            }
            RendererEvent::PageInvalidated => self.page_invalidated().await,
            RendererEvent::ScriptEvaluationFailed { message } => {
                self.script_evaluation_failed(&message).await
            }
            RendererEvent::Visit { visit_id, event } => {
                let Some(visit) = self
                    .last_issued_visit
                    .clone()
                    .filter(|visit| visit.id() == visit_id)
                else {
                    debug!("Dropping {:?} for superseded visit {}", event, visit_id);
                    return;
                };

                for callback in visit.handle(event) {
                    self.apply_visit_callback(&visit, callback);
                }
            }
        }
    }

    /// Handle a raw message posted by the content bridge
    pub async fn handle_script_message(&mut self, body: &str) -> Result<()> {
        let message = ScriptMessage::parse(body)?;
        let cold_boot = self
            .last_issued_visit
            .as_ref()
            .filter(|visit| visit.kind() == VisitKind::ColdBoot && !visit.state().is_terminal())
            .map(|visit| visit.id());

        for event in message.into_events(cold_boot)? {
            self.handle_renderer_event(event).await;
        }
        Ok(())
    }

    async fn page_invalidated(&mut self) {
        let Some(visitable) = self.current_visitable() else {
            debug!("Page invalidated without a current visitable");
            return;
        };

        info!("Page invalidated, reloading {}", visitable.id());
        visitable.update_snapshot();
        visitable.show_snapshot();
        if let Some(topmost) = self.topmost_visit.clone() {
            topmost.cancel(self.renderer.as_ref()).await;
        }
        visitable.show_activity_indicator();
        self.reload().await;
    }

    async fn script_evaluation_failed(&mut self, message: &str) {
        warn!("Script evaluation failed: {}", message);
        if !self.initialized {
            return;
        }
        let Some(visit) = self.last_issued_visit.clone() else {
            debug!("No visit to recover after script failure");
            return;
        };
        let Some(visitable) = visit.visitable() else {
            debug!("Visitable of visit {} released, not recovering", visit.id());
            return;
        };

        self.initialized = false;
        visit.cancel(self.renderer.as_ref()).await;
        self.issue_visit(&visitable, VisitAction::Advance).await;
    }

    /// Decide whether the renderer may perform a navigation on its own
    pub async fn decide_navigation_policy(
        &mut self,
        request: &NavigationRequest,
    ) -> NavigationPolicy {
        if !request.main_frame {
            return NavigationPolicy::Allow;
        }

        match request.kind {
            NavigationKind::LinkActivated => {
                if self.config.open_external_links {
                    info!("Opening {} externally", request.location);
                    self.delegate.on_open_external_location(&request.location);
                }
                NavigationPolicy::Cancel
            }
            NavigationKind::Reload => {
                self.reload().await;
                NavigationPolicy::Cancel
            }
            NavigationKind::Other => NavigationPolicy::Allow,
        }
    }

    /// A visitable's container is about to appear
    ///
    /// `reentering` is set when it re-enters because a back gesture was canceled.
    #[instrument(skip(self, visitable), fields(visitable = visitable.id()))]
    pub async fn visitable_will_appear(&mut self, visitable: &Arc<dyn Visitable>, reentering: bool) {
        if let Some(topmost) = self
            .topmost_visit
            .clone()
            .filter(|topmost| reentering && topmost.belongs_to(visitable.as_ref()))
        {
            if topmost.state() == VisitState::Completed {
                info!("Back gesture canceled, staying on {}", visitable.id());
                if let Some(last) = self.last_issued_visit.clone() {
                    last.cancel(self.renderer.as_ref()).await;
                }
            } else {
                info!("Back gesture canceled before load finished, revisiting {}", visitable.id());
                self.issue_visit(visitable, VisitAction::Advance).await;
            }
            return;
        }

        let needs_restore = match &self.last_issued_visit {
            None => true,
            Some(last) => {
                !last.belongs_to(visitable.as_ref()) || last.state() == VisitState::Canceled
            }
        };
        if needs_restore {
            self.issue_visit(visitable, VisitAction::Restore).await;
        }
    }

    /// A visitable's container finished appearing
    #[instrument(skip(self, visitable), fields(visitable = visitable.id()))]
    pub async fn visitable_did_appear(&mut self, visitable: &Arc<dyn Visitable>) {
        if let Some(last) = self.last_issued_visit.clone().filter(|last| {
            last.belongs_to(visitable.as_ref()) && last.state() != VisitState::Canceled
        }) {
            self.topmost_visit = Some(last);
        }

        let topmost = self
            .topmost_visit
            .clone()
            .filter(|topmost| topmost.belongs_to(visitable.as_ref()));

        if !topmost.as_ref().is_some_and(|visit| visit.has_failed()) {
            self.activate_visitable(visitable);
        }

        if let Some(topmost) = topmost {
            if topmost.state() == VisitState::Completed {
                visitable.hide_snapshot();
                visitable.hide_activity_indicator();
            } else {
                topmost.complete_navigation(self.renderer.as_ref()).await;
            }
        }
    }

    /// A visitable's container is about to disappear
    pub fn visitable_will_disappear(&mut self, visitable: &Arc<dyn Visitable>) {
        visitable.update_snapshot();
        visitable.show_snapshot();
    }

    /// The user asked to refresh a visitable
    #[instrument(skip(self, visitable), fields(visitable = visitable.id()))]
    pub async fn visitable_did_request_refresh(&mut self, visitable: &Arc<dyn Visitable>) {
        if !self.is_current(visitable.as_ref()) {
            debug!("Ignoring refresh request from non-current visitable");
            return;
        }

        self.refreshing = true;
        visitable.on_will_refresh();
        self.reload().await;
    }

    /// The view layer asked to reload a visitable
    pub async fn visitable_did_request_reload(&mut self, visitable: &Arc<dyn Visitable>) {
        if self.is_current(visitable.as_ref()) {
            self.reload().await;
        }
    }
}
