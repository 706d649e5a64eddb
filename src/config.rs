use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 联系人文件（每行 `姓名;电话`）
    pub contacts_file: PathBuf,
    /// 消息模板，`{nome}` 会被替换为联系人姓名
    pub message_template: String,
    /// 消息模板文件，设置后优先于 `message_template`
    pub template_file: Option<PathBuf>,
    /// 浏览器调试端口，未设置时自行启动浏览器
    pub browser_debug_port: Option<u16>,
    /// 浏览器可执行文件路径
    pub browser_executable: Option<PathBuf>,
    /// 浏览器用户数据目录（保存登录会话）
    pub browser_user_data_dir: PathBuf,
    /// WhatsApp Web 地址
    pub target_url: String,
    /// 国家区号
    pub country_code: String,
    /// 收件人标识的域名后缀
    pub recipient_domain: String,
    // --- 发送节奏 ---
    pub base_delay_secs: u64,
    pub long_pause_secs: u64,
    pub long_pause_every: usize,
    pub failure_delay_secs: u64,
    pub pause_poll_secs: u64,
    /// 单条消息发送超时
    pub send_timeout_secs: u64,
    /// 等待扫码登录的超时
    pub handshake_timeout_secs: u64,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            contacts_file: PathBuf::from("contatos.csv"),
            message_template: "Olá {nome}!".to_string(),
            template_file: None,
            browser_debug_port: None,
            browser_executable: None,
            browser_user_data_dir: PathBuf::from(".wwebjs_session"),
            target_url: "https://web.whatsapp.com".to_string(),
            country_code: "55".to_string(),
            recipient_domain: "c.us".to_string(),
            base_delay_secs: 15,
            long_pause_secs: 60,
            long_pause_every: 50,
            failure_delay_secs: 5,
            pause_poll_secs: 1,
            send_timeout_secs: 60,
            handshake_timeout_secs: 300,
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从默认值 + 环境变量加载
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载，再用环境变量覆盖
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.with_env_overrides()
    }

    fn with_env_overrides(self) -> Result<Self, ConfigError> {
        let config = Self {
            contacts_file: env_string("CONTACTS_FILE").map(PathBuf::from).unwrap_or(self.contacts_file),
            message_template: env_string("MESSAGE_TEMPLATE").unwrap_or(self.message_template),
            template_file: env_string("TEMPLATE_FILE").map(PathBuf::from).or(self.template_file),
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT", "u16")?.or(self.browser_debug_port),
            browser_executable: env_string("BROWSER_EXECUTABLE").map(PathBuf::from).or(self.browser_executable),
            browser_user_data_dir: env_string("BROWSER_USER_DATA_DIR").map(PathBuf::from).unwrap_or(self.browser_user_data_dir),
            target_url: env_string("TARGET_URL").unwrap_or(self.target_url),
            country_code: env_string("COUNTRY_CODE").unwrap_or(self.country_code),
            recipient_domain: env_string("RECIPIENT_DOMAIN").unwrap_or(self.recipient_domain),
            base_delay_secs: env_parse("BASE_DELAY_SECS", "u64")?.unwrap_or(self.base_delay_secs),
            long_pause_secs: env_parse("LONG_PAUSE_SECS", "u64")?.unwrap_or(self.long_pause_secs),
            long_pause_every: env_parse("LONG_PAUSE_EVERY", "usize")?.unwrap_or(self.long_pause_every),
            failure_delay_secs: env_parse("FAILURE_DELAY_SECS", "u64")?.unwrap_or(self.failure_delay_secs),
            pause_poll_secs: env_parse("PAUSE_POLL_SECS", "u64")?.unwrap_or(self.pause_poll_secs),
            send_timeout_secs: env_parse("SEND_TIMEOUT_SECS", "u64")?.unwrap_or(self.send_timeout_secs),
            handshake_timeout_secs: env_parse("HANDSHAKE_TIMEOUT_SECS", "u64")?.unwrap_or(self.handshake_timeout_secs),
            output_log_file: env_string("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            verbose_logging: env_parse("VERBOSE_LOGGING", "bool")?.unwrap_or(self.verbose_logging),
        };
        config.validate()?;
        Ok(config)
    }

    /// 检查取值范围
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 轮询间隔为0时暂停等待会空转
        if self.pause_poll_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "pause_poll_secs".to_string(),
                reason: "must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    pub fn pause_poll(&self) -> Duration {
        Duration::from_secs(self.pause_poll_secs)
    }
}

fn env_string(var_name: &str) -> Option<String> {
    std::env::var(var_name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError> {
    match env_string(var_name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVar {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_send_rhythm() {
        let config = Config::default();
        assert_eq!(config.base_delay_secs, 15);
        assert_eq!(config.long_pause_secs, 60);
        assert_eq!(config.long_pause_every, 50);
        assert_eq!(config.failure_delay_secs, 5);
        assert_eq!(config.pause_poll(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            contacts_file = "lista.csv"
            message_template = "Oi {nome}"
            base_delay_secs = 20
            "#,
        )
        .unwrap();

        assert_eq!(config.contacts_file, PathBuf::from("lista.csv"));
        assert_eq!(config.message_template, "Oi {nome}");
        assert_eq!(config.base_delay_secs, 20);
        assert_eq!(config.long_pause_secs, 60);
        assert_eq!(config.country_code, "55");
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let err = Config::load(Path::new("definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_zero_pause_poll_is_rejected() {
        let config = Config {
            pause_poll_secs: 0,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "pause_poll_secs"));
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_load_rejects_zero_pause_poll() {
        let path = std::env::temp_dir().join(format!("bulk_sender_zero_poll_{}.toml", std::process::id()));
        std::fs::write(&path, "pause_poll_secs = 0\n").unwrap();

        let result = Config::load(&path);
        let _ = std::fs::remove_file(&path);

        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}
