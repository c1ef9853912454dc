//! # Navstack 演示入口
//!
//! 使用脚本化渲染器驱动一次完整的导航会话，展示会话事件循环的工作方式。
//!
//! ## 主要功能
//! - 从环境变量加载配置并初始化日志
//! - 创建共享渲染器与会话，并将渲染器回调接入会话事件流
//! - 按脚本执行：冷启动首页、推入新页面、开始返回手势后取消
//! - 支持 Ctrl+C 优雅关闭
//!
//! ## 环境变量
//! - `RUST_LOG`: 日志过滤（优先于 `NAVSTACK_LOG_LEVEL`）
//! - `NAVSTACK_APPLICATION_NAME`: 应用名称（默认: navstack）
//! - `NAVSTACK_EVENT_CAPACITY`: 事件通道容量（默认: 256）
//! - `NAVSTACK_OPEN_EXTERNAL_LINKS`: 是否在外部打开链接（默认: true）

use async_trait::async_trait;
use navstack::{
    config::Config,
    renderer::{ContentRenderer, RendererConfig, SurfaceHandle, VisitAction, VisitId},
    session::{event_channel, MockVisitable, Session, SessionDelegate, SessionSender, ViewEvent, Visitable},
    VisitFailure,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use url::Url;

/// Delay before the scripted content answers a renderer command
const RESPONSE_DELAY: Duration = Duration::from_millis(20);

/// Pause between scripted navigation steps
const STEP_DELAY: Duration = Duration::from_millis(200);

/// Renderer whose content answers every command through the script bridge
#[derive(Debug)]
struct ScriptedRenderer {
    surface: SurfaceHandle,
    sender: SessionSender,
}

impl ScriptedRenderer {
    fn new(sender: SessionSender) -> Self {
        Self {
            surface: SurfaceHandle::new(),
            sender,
        }
    }

    /// Post bridge messages back to the session, one per delay tick
    fn post(&self, messages: Vec<serde_json::Value>) {
        let sender = self.sender.clone();
        tokio::spawn(async move {
            for message in messages {
                tokio::time::sleep(RESPONSE_DELAY).await;
                if let Err(e) = sender.script_message(message.to_string()).await {
                    warn!("Dropping bridge message: {}", e);
                    return;
                }
            }
        });
    }
}

#[async_trait]
impl ContentRenderer for ScriptedRenderer {
    fn surface(&self) -> SurfaceHandle {
        self.surface.clone()
    }

    async fn initialize(&self, config: &RendererConfig) -> navstack::Result<()> {
        info!(
            "Renderer configured: user agent suffix '{}', bridge '{}'",
            config.user_agent_suffix, config.bridge_handler_name
        );
        Ok(())
    }

    async fn load_full_content(&self, visit_id: VisitId, location: &Url) -> navstack::Result<()> {
        info!("Loading {} for visit {}", location, visit_id);
        self.post(vec![json!({
            "name": "pageLoaded",
            "data": { "restorationIdentifier": format!("boot-{}", visit_id) }
        })]);
        Ok(())
    }

    async fn perform_in_page_transition(
        &self,
        visit_id: VisitId,
        location: &Url,
        action: VisitAction,
        restoration_identifier: Option<&str>,
    ) -> navstack::Result<()> {
        info!(
            "Transition to {} ({}) for visit {}, restoring {:?}",
            location, action, visit_id, restoration_identifier
        );

        let identifier = visit_id.to_string();
        let restore = action == VisitAction::Restore;
        let mut messages = vec![json!({
            "name": "visitStarted",
            "data": { "identifier": identifier, "hasCachedSnapshot": restore }
        })];
        if restore {
            messages.push(json!({ "name": "visitSnapshotRestored", "data": { "identifier": identifier } }));
        } else {
            for name in ["visitRequestStarted", "visitRequestCompleted", "visitRequestFinished"] {
                messages.push(json!({ "name": name, "data": { "identifier": identifier } }));
            }
        }
        messages.push(json!({
            "name": "visitCompleted",
            "data": { "identifier": identifier, "restorationIdentifier": format!("page-{}", visit_id) }
        }));

        self.post(messages);
        Ok(())
    }

    async fn complete_transition(&self, visit_id: VisitId) -> navstack::Result<()> {
        info!("Completing transition for visit {}", visit_id);
        Ok(())
    }

    async fn abort(&self, visit_id: VisitId) -> navstack::Result<()> {
        info!("Aborting visit {}", visit_id);
        Ok(())
    }
}

/// Delegate that only reports what the session asks of the application
struct LoggingDelegate;

impl SessionDelegate for LoggingDelegate {
    fn on_renderer_initialized(&self, renderer: &Arc<dyn ContentRenderer>) {
        info!("Renderer {} ready for fast visits", renderer.surface().id());
    }

    fn on_proposed_navigation(&self, location: &Url, action: VisitAction) {
        info!("Content proposed {} visit to {}", action, location);
    }

    fn on_request_failed(&self, visitable: &Arc<dyn Visitable>, failure: &VisitFailure) {
        error!("Visit for {} failed: {}", visitable.id(), failure);
    }

    fn on_open_external_location(&self, location: &Url) {
        info!("Opening {} outside the app", location);
    }
}

/// Drive a push followed by a canceled back gesture
async fn run_script(sender: SessionSender) -> anyhow::Result<()> {
    let home: Arc<dyn Visitable> = MockVisitable::new("https://example.com/");
    let orders: Arc<dyn Visitable> = MockVisitable::new("https://example.com/orders");

    info!("Step 1: cold boot home");
    sender.view(ViewEvent::Visit(home.clone())).await?;
    sender.view(ViewEvent::DidAppear(home.clone())).await?;
    tokio::time::sleep(STEP_DELAY).await;

    info!("Step 2: push orders");
    sender.view(ViewEvent::Visit(orders.clone())).await?;
    sender.view(ViewEvent::WillDisappear(home.clone())).await?;
    sender
        .view(ViewEvent::WillAppear {
            visitable: orders.clone(),
            reentering: false,
        })
        .await?;
    sender.view(ViewEvent::DidAppear(orders.clone())).await?;
    tokio::time::sleep(STEP_DELAY).await;

    info!("Step 3: back gesture begins, then is canceled");
    sender.view(ViewEvent::WillDisappear(orders.clone())).await?;
    sender
        .view(ViewEvent::WillAppear {
            visitable: home.clone(),
            reentering: false,
        })
        .await?;
    sender
        .view(ViewEvent::WillAppear {
            visitable: orders.clone(),
            reentering: true,
        })
        .await?;
    sender.view(ViewEvent::DidAppear(orders.clone())).await?;
    tokio::time::sleep(STEP_DELAY).await;

    info!("Step 4: pull to refresh orders");
    sender.view(ViewEvent::RefreshRequested(orders.clone())).await?;
    tokio::time::sleep(STEP_DELAY).await;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Initialize tracing - RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Navstack demo v{}", navstack::VERSION);
    info!(
        "Configuration loaded: application={}, event capacity={}",
        config.application_name, config.event_channel_capacity
    );

    let (sender, mut events) = event_channel(&config);

    let renderer_sender = sender.clone();
    let mut session = Session::new(config, Arc::new(LoggingDelegate), move |_| {
        Ok(Arc::new(ScriptedRenderer::new(renderer_sender)) as Arc<dyn ContentRenderer>)
    })
    .await?;

    // Setup graceful shutdown
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        tokio::select! {
            result = run_script(sender) => {
                if let Err(e) = result {
                    error!("Navigation script failed: {}", e);
                }
                info!("Navigation script finished");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C signal");
            }
        }
        let _ = shutdown_tx.send(());
    });

    // The renderer keeps a sender alive, so the loop ends on shutdown rather than on close
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => {
                    if let Err(e) = session.dispatch(event).await {
                        warn!("Session event failed: {}", e);
                    }
                }
                None => break,
            },
            _ = &mut shutdown_rx => {
                info!("Shutdown signal received, stopping session...");
                break;
            }
        }
    }

    info!(
        "Session finished: initialized={}, refreshing={}, topmost={:?}",
        session.is_initialized(),
        session.is_refreshing(),
        session.topmost_visitable().map(|v| v.id().to_string())
    );
    Ok(())
}
