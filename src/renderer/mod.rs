//! # 内容渲染层
//!
//! 定义会话所驱动的共享内容渲染器（Content Renderer）的抽象接口，以及渲染器发出的变更通知。
//!
//! ## 主要功能
//! - **渲染器命令**: 完整加载、页内过渡、完成过渡、中止
//! - **变更通知**: 导航提议、页面失效、访问级回调
//! - **脚本桥**: 将内容侧发送的 JSON 消息解析为渲染器事件
//! - **导航策略**: 描述渲染器请求许可的导航
//!
//! ## 模块结构
//! - `traits`: `ContentRenderer` trait 与渲染器配置
//! - `types`: 访问标识、导航方向与事件类型
//! - `bridge`: 脚本桥消息解析
//! - `mock`: 用于测试的记录型 Mock 渲染器
//!
//! ## 使用示例
//! ```rust,no_run
//! use navstack::renderer::{ContentRenderer, MockRenderer, VisitId};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let renderer = MockRenderer::new();
//! let location = url::Url::parse("https://example.com")?;
//! renderer.load_full_content(VisitId::new(), &location).await?;
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub mod types;
pub mod bridge;
pub mod mock;


pub use traits::{ContentRenderer, RendererConfig, SurfaceHandle};
pub use types::{
    NavigationKind, NavigationPolicy, NavigationRequest, RendererEvent, VisitAction,
    VisitEvent, VisitId,
};
pub use bridge::ScriptMessage;
pub use mock::{MockRenderer, RendererCommand};
