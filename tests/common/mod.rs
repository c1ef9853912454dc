//! Common test utilities
//!
//! This module provides shared helpers for driving a session through its
//! public API in integration tests.

#![allow(dead_code)]

use navstack::config::Config;
use navstack::renderer::{ContentRenderer, MockRenderer, RendererEvent, VisitEvent};
use navstack::session::{MockDelegate, MockVisitable, Session, Visit, Visitable};
use std::sync::Arc;

/// Session wired to recording mocks
pub struct TestSession {
    pub session: Session,
    pub renderer: Arc<MockRenderer>,
    pub delegate: Arc<MockDelegate>,
}

/// Create a session backed by a mock renderer and delegate
pub async fn setup_session(config: Config) -> Result<TestSession, Box<dyn std::error::Error>> {
    let renderer = Arc::new(MockRenderer::new());
    let delegate = MockDelegate::new();
    let shared = renderer.clone();

    let session = Session::new(config, delegate.clone(), move |_| {
        Ok(shared as Arc<dyn ContentRenderer>)
    })
    .await?;

    Ok(TestSession {
        session,
        renderer,
        delegate,
    })
}

/// Create a mock visitable and its trait object handle
pub fn visitable(location: &str) -> (Arc<MockVisitable>, Arc<dyn Visitable>) {
    let mock = MockVisitable::new(location);
    let handle: Arc<dyn Visitable> = mock.clone();
    (mock, handle)
}

/// Renderer event for one visit
pub fn visit_event(visit: &Visit, event: VisitEvent) -> RendererEvent {
    RendererEvent::Visit {
        visit_id: visit.id(),
        event,
    }
}

/// Bridge message body for a visit-scoped callback
pub fn bridge_message(name: &str, visit: &Visit) -> String {
    serde_json::json!({ "name": name, "data": { "identifier": visit.id().to_string() } }).to_string()
}
