//! # 会话管理层
//!
//! 管理导航会话：决定每个导航请求是执行完整加载（Cold Boot）还是轻量级页内过渡（Fast），
//! 跟踪每次访问（Visit）的生命周期，并将其与原生视图的出现/消失事件进行协调。
//!
//! ## 主要功能
//! - **访问调度**: 渲染器已初始化时发起 Fast 访问，否则发起 Cold Boot 访问
//! - **取消语义**: 发起新访问前总是取消上一次访问，已取消的访问不再产生任何回调
//! - **渲染器迁移**: 唯一的渲染表面在 Visitable 之间移动，任意时刻至多绑定一个
//! - **手势协调**: 处理开始后又被取消的返回手势
//! - **事件循环**: 原生事件与渲染器回调串行化到同一个事件流
//!
//! ## 核心概念
//! - **Visit**: 一次导航尝试，Cold Boot 与 Fast 共享同一个状态机
//! - **Visitable**: 可承载渲染器的原生视图容器
//! - **SessionDelegate**: 面向应用层的路由与错误处理接口
//!
//! ## 模块结构
//! - `traits`: `Visitable` 与 `SessionDelegate` trait 定义
//! - `visit`: 访问状态机
//! - `controller`: 会话实现
//! - `events`: 事件类型与事件循环
//! - `mock`: 用于测试的 Mock 实现
//!
//! ## 使用示例
//! ```rust,no_run
//! use navstack::config::Config;
//! use navstack::renderer::{ContentRenderer, MockRenderer};
//! use navstack::session::{MockDelegate, MockVisitable, Session, Visitable};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = Session::new(Config::default(), MockDelegate::new(), |_| {
//!     Ok(Arc::new(MockRenderer::new()) as Arc<dyn ContentRenderer>)
//! })
//! .await?;
//!
//! let home: Arc<dyn Visitable> = MockVisitable::new("https://example.com/");
//! session.visit(&home).await;
//! session.visitable_did_appear(&home).await;
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub mod visit;
pub mod controller;
pub mod events;
pub mod mock;


pub use traits::{SessionDelegate, Visitable};
pub use visit::{Visit, VisitCallback, VisitKind, VisitState};
pub use controller::Session;
pub use events::{event_channel, SessionEvent, SessionSender, ViewEvent};

// Re-export mock implementations for testing
pub use mock::{DelegateCall, MockDelegate, MockVisitable, VisitableCall};
