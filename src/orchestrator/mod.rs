//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用
//! - 管理应用生命周期（初始化、运行、清理）
//! - 持有浏览器资源
//! - 充当控制端：读取 pause / resume / stop 命令，输出状态事件
//!
//! ### `dispatcher` - 发送调度器
//! - 状态机：Idle → Running ⇄ Paused → Stopping → Completed / Stopped
//! - 顺序遍历联系人（Vec<ContactRecord>）
//! - 节奏控制、失败记录、最终报告
//!
//! ### `control` - 阶段控制
//! - 原子阶段标志，控制端只改标志
//!
//! ## 层次关系
//!
//! ```text
//! app (控制端 + 资源)
//!     ↓
//! dispatcher (处理 Vec<ContactRecord>)
//!     ↓
//! workflow::SendFlow (处理单个联系人)
//!     ↓
//! channel (消息通道：握手 / 发送 / 结束)
//!     ↓
//! infrastructure (基础设施：JsExecutor)
//! ```

pub mod app;
pub mod control;
pub mod dispatcher;

pub use app::App;
pub use control::{DispatchEvent, EventReceiver, EventSender, Phase, RunControl, RunSnapshot};
pub use dispatcher::{
    build_final_report, DispatchController, DispatchOptions, RunOutcome, RunSummary,
};
