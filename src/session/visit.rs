//! Visit state machine
//!
//! A visit is one navigation attempt. Cold boot and fast visits share the same
//! lifecycle; only the renderer command issued on start differs.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::VisitFailure;
use crate::renderer::{ContentRenderer, VisitAction, VisitEvent, VisitId};
use crate::session::traits::Visitable;

/// How a visit drives the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitKind {
    /// Full content load
    ColdBoot,
    /// In-page transition on an initialized renderer
    Fast,
}

/// Visit lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitState {
    Initialized,
    Started,
    Completed,
    Canceled,
}

impl VisitState {
    /// Completed and Canceled are final
    pub fn is_terminal(self) -> bool {
        matches!(self, VisitState::Completed | VisitState::Canceled)
    }
}

/// Effect a visit asks the session to apply
#[derive(Debug, Clone, PartialEq)]
pub enum VisitCallback {
    RendererInitialized,
    WillStart,
    Started { has_snapshot: bool },
    SnapshotRestored,
    ResponseLoaded,
    RequestStarted,
    RequestFinished,
    RequestFailed(VisitFailure),
    Failed,
    Completed { restoration_identifier: Option<String> },
}

#[derive(Debug)]
struct Progress {
    state: VisitState,
    has_snapshot: bool,
    failed: bool,
    navigation_completed: bool,
}

/// One navigation attempt
#[derive(Debug)]
pub struct Visit {
    id: VisitId,
    kind: VisitKind,
    action: VisitAction,
    location: Url,
    visitable: Weak<dyn Visitable>,
    visitable_id: String,
    restoration_identifier: Option<String>,
    created_at: DateTime<Utc>,
    progress: Mutex<Progress>,
}

impl Visit {
    /// Create a new visit in the Initialized state
    pub fn new(
        kind: VisitKind,
        action: VisitAction,
        visitable: &Arc<dyn Visitable>,
        location: Url,
        restoration_identifier: Option<String>,
    ) -> Self {
        Self {
            id: VisitId::new(),
            kind,
            action,
            location,
            visitable: Arc::downgrade(visitable),
            visitable_id: visitable.id().to_string(),
            restoration_identifier,
            created_at: Utc::now(),
            progress: Mutex::new(Progress {
                state: VisitState::Initialized,
                has_snapshot: false,
                failed: false,
                navigation_completed: false,
            }),
        }
    }

    pub fn id(&self) -> VisitId {
        self.id
    }

    pub fn kind(&self) -> VisitKind {
        self.kind
    }

    pub fn action(&self) -> VisitAction {
        self.action
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> VisitState {
        self.progress.lock().state
    }

    /// Whether the renderer reported a cached snapshot for this visit
    pub fn has_snapshot(&self) -> bool {
        self.progress.lock().has_snapshot
    }

    /// Whether a request failure was reported
    pub fn has_failed(&self) -> bool {
        self.progress.lock().failed
    }

    /// Restoration identifier the visit was issued with
    pub fn restoration_identifier(&self) -> Option<&str> {
        self.restoration_identifier.as_deref()
    }

    /// Owning visitable, if it is still alive
    pub fn visitable(&self) -> Option<Arc<dyn Visitable>> {
        self.visitable.upgrade()
    }

    pub fn visitable_id(&self) -> &str {
        &self.visitable_id
    }

    /// Whether this visit was issued for `visitable`
    pub fn belongs_to(&self, visitable: &dyn Visitable) -> bool {
        self.visitable_id == visitable.id()
    }

    /// Start the visit
    ///
    /// `WillStart` reaches `sink` before any renderer work is issued. A cold boot
    /// then reports itself started and its request in flight. A renderer command
    /// that fails surfaces as a transport failure; the visit stays Started.
    pub async fn start(
        &self,
        renderer: &dyn ContentRenderer,
        sink: &mut (dyn FnMut(VisitCallback) + Send),
    ) {
        {
            let mut progress = self.progress.lock();
            if progress.state != VisitState::Initialized {
                debug!("Visit {} already {:?}, not starting", self.id, progress.state);
                return;
            }
            progress.state = VisitState::Started;
        }

        info!(
            "Starting {:?} visit {} ({}) to {}",
            self.kind, self.id, self.action, self.location
        );
        sink(VisitCallback::WillStart);

        // The session may have canceled us while handling WillStart
        if self.state() != VisitState::Started {
            return;
        }

        let result = match self.kind {
            VisitKind::ColdBoot => renderer.load_full_content(self.id, &self.location).await,
            VisitKind::Fast => {
                renderer
                    .perform_in_page_transition(
                        self.id,
                        &self.location,
                        self.action,
                        self.restoration_identifier.as_deref(),
                    )
                    .await
            }
        };

        match result {
            Ok(()) if self.kind == VisitKind::ColdBoot => {
                // The page has no bridge yet; report the load as the request
                if self.state() == VisitState::Started {
                    sink(VisitCallback::Started { has_snapshot: false });
                    sink(VisitCallback::RequestStarted);
                }
            }
            Ok(()) => {}
            Err(e) => {
                warn!("Renderer rejected visit {}: {}", self.id, e);
                for callback in self.fail(VisitFailure::from(e)) {
                    sink(callback);
                }
            }
        }
    }

    /// Cancel the visit
    ///
    /// Returns `false` if the visit was already terminal. Abort is best effort:
    /// the visit is inert afterwards whatever the renderer does.
    pub async fn cancel(&self, renderer: &dyn ContentRenderer) -> bool {
        let was_started = {
            let mut progress = self.progress.lock();
            if progress.state.is_terminal() {
                return false;
            }
            let was_started = progress.state == VisitState::Started;
            progress.state = VisitState::Canceled;
            was_started
        };

        info!("Canceled visit {} to {}", self.id, self.location);

        if was_started {
            if let Err(e) = renderer.abort(self.id).await {
                warn!("Renderer failed to abort visit {}: {}", self.id, e);
            }
        }
        true
    }

    /// Let a deferred transition finish rendering
    ///
    /// Only the first call on a Started visit reaches the renderer.
    pub async fn complete_navigation(&self, renderer: &dyn ContentRenderer) -> bool {
        {
            let mut progress = self.progress.lock();
            if progress.state != VisitState::Started || progress.navigation_completed {
                return false;
            }
            progress.navigation_completed = true;
        }

        if self.kind == VisitKind::Fast {
            if let Err(e) = renderer.complete_transition(self.id).await {
                warn!("Renderer failed to complete transition for visit {}: {}", self.id, e);
            }
        }
        true
    }

    /// Translate a renderer callback into session effects
    ///
    /// Nothing is delivered once the visit is terminal, before it started, or
    /// after its visitable was released.
    pub fn handle(&self, event: VisitEvent) -> Vec<VisitCallback> {
        if self.visitable.strong_count() == 0 {
            debug!("Dropping {:?} for visit {}: visitable released", event, self.id);
            return vec![];
        }

        let mut progress = self.progress.lock();
        if progress.state != VisitState::Started {
            debug!(
                "Dropping {:?} for visit {} in state {:?}",
                event, self.id, progress.state
            );
            return vec![];
        }

        match event {
            VisitEvent::RendererInitialized => {
                if self.kind != VisitKind::ColdBoot {
                    warn!("Fast visit {} reported renderer initialization", self.id);
                    return vec![];
                }
                vec![VisitCallback::RendererInitialized]
            }
            VisitEvent::Started { has_snapshot } => {
                progress.has_snapshot = has_snapshot;
                vec![VisitCallback::Started { has_snapshot }]
            }
            VisitEvent::SnapshotRestored => vec![VisitCallback::SnapshotRestored],
            VisitEvent::ResponseLoaded => vec![VisitCallback::ResponseLoaded],
            VisitEvent::RequestStarted => vec![VisitCallback::RequestStarted],
            VisitEvent::RequestFinished => vec![VisitCallback::RequestFinished],
            VisitEvent::RequestFailed(failure) => {
                progress.failed = true;
                vec![VisitCallback::RequestFailed(failure), VisitCallback::Failed]
            }
            VisitEvent::PageLoadFailed => {
                progress.failed = true;
                vec![
                    VisitCallback::RequestFailed(VisitFailure::PageLoad),
                    VisitCallback::Failed,
                ]
            }
            VisitEvent::Completed {
                restoration_identifier,
            } => {
                progress.state = VisitState::Completed;
                let elapsed = Utc::now().signed_duration_since(self.created_at);
                info!(
                    "Completed visit {} to {} in {}ms",
                    self.id,
                    self.location,
                    elapsed.num_milliseconds()
                );
                vec![VisitCallback::Completed {
                    restoration_identifier,
                }]
            }
        }
    }

    fn fail(&self, failure: VisitFailure) -> Vec<VisitCallback> {
        let mut progress = self.progress.lock();
        if progress.state != VisitState::Started {
            return vec![];
        }
        progress.failed = true;
        vec![VisitCallback::RequestFailed(failure), VisitCallback::Failed]
    }
}
