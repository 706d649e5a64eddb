use std::path::PathBuf;

use thiserror::Error;

use crate::orchestrator::control::Phase;

/// 调度器错误
///
/// 只有这里的错误会中止整个发送任务；单个联系人的失败会进入失败记录，不会以 `Err` 返回。
#[derive(Debug, Error)]
pub enum DispatchError {
    /// 联系人文件无法读取；文本直接作为状态消息，路径只写日志
    #[error("Error reading file: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 已有任务在运行
    #[error("a dispatch run is already active (phase: {phase})")]
    AlreadyRunning { phase: Phase },

    /// 消息通道握手失败
    #[error("messaging channel handshake failed: {0}")]
    Handshake(#[source] ChannelError),
}

/// 消息通道错误（发送失败、超时、会话未就绪等）
#[derive(Debug, Error)]
pub enum ChannelError {
    /// 操作超时
    #[error("timed out after {secs}s while {action}")]
    Timeout { action: String, secs: u64 },

    /// 服务端拒绝（号码无效等）
    #[error("{0}")]
    Rejected(String),

    /// 会话尚未就绪
    #[error("channel session is not ready")]
    NotReady,

    /// 浏览器操作失败
    #[error("browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    /// 页面脚本结果无法解析
    #[error("unexpected script result: {0}")]
    Script(#[from] serde_json::Error),
}

impl ChannelError {
    /// 创建超时错误
    pub fn timeout(action: impl Into<String>, secs: u64) -> Self {
        ChannelError::Timeout {
            action: action.into(),
            secs,
        }
    }

    /// 创建拒绝错误
    pub fn rejected(message: impl Into<String>) -> Self {
        ChannelError::Rejected(message.into())
    }
}

/// 单个联系人的发送失败
///
/// 只进入失败记录，发送任务继续。
#[derive(Debug, Error)]
pub enum SendFailure {
    /// 电话字段为空，未尝试发送
    #[error("empty phone number")]
    EmptyPhone,

    /// 通道拒绝或超时
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件读取失败
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML 解析失败
    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// 环境变量解析失败
    #[error("environment variable {var_name} has invalid value '{value}' (expected {expected_type})")]
    EnvVar {
        var_name: String,
        value: String,
        expected_type: String,
    },

    /// 配置值不合法
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

/// 调度结果类型
pub type DispatchResult<T> = Result<T, DispatchError>;
