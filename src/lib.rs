//! # Bulk Sender
//!
//! 按联系人列表顺序群发模板消息，支持暂停 / 继续 / 停止，并自动控制发送节奏
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `browser/` - 连接或启动浏览器
//! - `infrastructure/` - `JsExecutor`，唯一的 page owner
//!
//! ### ② 消息通道（Channel）
//! - `channel/` - `MessagingChannel` 抽象：握手 / 发送 / 结束
//! - `WhatsAppWebChannel` - 基于浏览器页面的实现
//!
//! ### ③ 业务能力层（Services）
//! - `template` - `{nome}` 模板渲染
//! - `backoff` - 发送节奏策略
//! - `failure_ledger` - 失败记录
//!
//! ### ④ 流程层（Workflow）
//! - `SendFlow` - 单个联系人：校验 → 渲染 → 上报 → 发送
//!
//! ### ⑤ 编排层（Orchestration）
//! - `DispatchController` - 状态机与发送循环
//! - `App` - 控制端与资源管理
//!
//! ## 模块结构

pub mod browser;
pub mod channel;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use channel::{HandshakeEvent, MessagingChannel, RecipientFormat, WhatsAppWebChannel};
pub use config::Config;
pub use error::{ChannelError, ConfigError, DispatchError, DispatchResult, SendFailure};
pub use models::{load_contacts, parse_contacts, ContactRecord, ContactSource, DispatchJob};
pub use orchestrator::{
    App, DispatchController, DispatchEvent, DispatchOptions, Phase, RunControl, RunOutcome,
    RunSnapshot, RunSummary,
};
pub use services::{render, BackoffPolicy, Delay, FailureLedger, FailureRecord};
