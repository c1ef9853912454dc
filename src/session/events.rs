//! Session event loop
//!
//! Native view events and renderer notifications are serialized onto one
//! channel and processed in order by [`Session::run`].

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::renderer::RendererEvent;
use crate::session::controller::Session;
use crate::session::traits::Visitable;
use crate::{Error, Result};

/// Event raised by the native view container layer
#[derive(Debug, Clone)]
pub enum ViewEvent {
    /// Explicit advance visit
    Visit(Arc<dyn Visitable>),
    /// Explicit reload of the current visitable
    Reload,
    WillAppear {
        visitable: Arc<dyn Visitable>,
        reentering: bool,
    },
    DidAppear(Arc<dyn Visitable>),
    WillDisappear(Arc<dyn Visitable>),
    RefreshRequested(Arc<dyn Visitable>),
    ReloadRequested(Arc<dyn Visitable>),
}

/// Event processed by the session
#[derive(Debug, Clone)]
pub enum SessionEvent {
    View(ViewEvent),
    Renderer(RendererEvent),
    /// Raw JSON posted by the content bridge
    ScriptMessage(String),
}

/// Create the channel feeding [`Session::run`]
pub fn event_channel(config: &Config) -> (SessionSender, mpsc::Receiver<SessionEvent>) {
    let (tx, rx) = mpsc::channel(config.event_channel_capacity);
    (SessionSender { tx }, rx)
}

/// Sending half of the session event channel
#[derive(Debug, Clone)]
pub struct SessionSender {
    tx: mpsc::Sender<SessionEvent>,
}

impl SessionSender {
    /// Queue an event for the session
    pub async fn send(&self, event: SessionEvent) -> Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| Error::EventChannelClosed)
    }

    pub async fn view(&self, event: ViewEvent) -> Result<()> {
        self.send(SessionEvent::View(event)).await
    }

    pub async fn renderer(&self, event: RendererEvent) -> Result<()> {
        self.send(SessionEvent::Renderer(event)).await
    }

    pub async fn script_message<S: Into<String>>(&self, body: S) -> Result<()> {
        self.send(SessionEvent::ScriptMessage(body.into())).await
    }
}

impl Session {
    /// Handle a single event
    pub async fn dispatch(&mut self, event: SessionEvent) -> Result<()> {
        match event {
            SessionEvent::View(view) => match view {
                ViewEvent::Visit(visitable) => self.visit(&visitable).await,
                ViewEvent::Reload => self.reload().await,
                ViewEvent::WillAppear {
                    visitable,
                    reentering,
                } => self.visitable_will_appear(&visitable, reentering).await,
                ViewEvent::DidAppear(visitable) => self.visitable_did_appear(&visitable).await,
                ViewEvent::WillDisappear(visitable) => self.visitable_will_disappear(&visitable),
                ViewEvent::RefreshRequested(visitable) => {
                    self.visitable_did_request_refresh(&visitable).await
                }
                ViewEvent::ReloadRequested(visitable) => {
                    self.visitable_did_request_reload(&visitable).await
                }
            },
            SessionEvent::Renderer(event) => self.handle_renderer_event(event).await,
            SessionEvent::ScriptMessage(body) => self.handle_script_message(&body).await?,
        }
        Ok(())
    }

    /// Process events until every sender is dropped
    ///
    /// Event errors are logged and do not stop the loop. Returns the session so
    /// its final state can be inspected.
    pub async fn run(mut self, mut events: mpsc::Receiver<SessionEvent>) -> Self {
        info!("Session event loop started");
        while let Some(event) = events.recv().await {
            debug!("Dispatching {:?}", event);
            if let Err(e) = self.dispatch(event).await {
                warn!("Session event failed: {}", e);
            }
        }
        info!("Session event loop stopped");
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{ContentRenderer, MockRenderer};
    use crate::session::mock::{MockDelegate, MockVisitable};

    async fn session() -> Session {
        Session::new(Config::default(), MockDelegate::new(), |_| {
            Ok(Arc::new(MockRenderer::new()) as Arc<dyn ContentRenderer>)
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_run_processes_events_in_order() {
        let (sender, rx) = event_channel(&Config::default());
        let handle = tokio::spawn(session().await.run(rx));

        let visitable: Arc<dyn Visitable> = MockVisitable::new("https://example.com/a");
        sender.view(ViewEvent::Visit(visitable.clone())).await.unwrap();
        sender.view(ViewEvent::DidAppear(visitable.clone())).await.unwrap();
        drop(sender);

        let session = handle.await.unwrap();
        let current = session.current_visitable().unwrap();
        assert_eq!(current.id(), visitable.id());
        assert!(session.topmost_visit().unwrap().belongs_to(visitable.as_ref()));
    }

    #[tokio::test]
    async fn test_run_survives_bad_script_message() {
        let (sender, rx) = event_channel(&Config::default());
        let handle = tokio::spawn(session().await.run(rx));

        sender.script_message("{not json").await.unwrap();
        sender.view(ViewEvent::Reload).await.unwrap();
        drop(sender);

        let session = handle.await.unwrap();
        assert!(session.last_issued_visit().is_none());
    }

    #[tokio::test]
    async fn test_dispatch_reports_bridge_errors() {
        let mut session = session().await;
        let result = session
            .dispatch(SessionEvent::ScriptMessage("{\"name\":\"nope\"}".to_string()))
            .await;
        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let (sender, rx) = event_channel(&Config::default());
        drop(rx);

        let result = sender.view(ViewEvent::Reload).await;
        assert!(matches!(result, Err(Error::EventChannelClosed)));
    }
}
