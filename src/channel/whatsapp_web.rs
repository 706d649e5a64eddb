//! WhatsApp Web 通道
//!
//! 通过浏览器页面完成扫码握手和消息发送

use std::sync::Mutex;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::channel::{HandshakeEvent, MessagingChannel, RecipientFormat};
use crate::config::Config;
use crate::error::ChannelError;
use crate::infrastructure::JsExecutor;

/// 页面状态轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(500);
/// 点击发送后等待消息离开输入框的时间
const AFTER_SEND_SETTLE: Duration = Duration::from_secs(2);

const SESSION_STATE_JS: &str = r#"
(() => {
    if (document.querySelector('#pane-side')) {
        return { state: 'ready' };
    }
    const qr = document.querySelector('div[data-ref]');
    if (qr && qr.getAttribute('data-ref')) {
        return { state: 'challenge', data: qr.getAttribute('data-ref') };
    }
    return { state: 'loading' };
})()
"#;

const COMPOSE_STATE_JS: &str = r#"
(() => {
    const popup = document.querySelector('[data-animate-modal-popup="true"]');
    if (popup && popup.innerText && popup.innerText.trim().length > 0) {
        const text = popup.innerText.trim();
        if (/inv[aá]lid|not on whatsapp|n[aã]o est[aá]/i.test(text)) {
            return { state: 'rejected', message: text };
        }
    }
    const icon = document.querySelector('span[data-icon="send"]')
        || document.querySelector('button[aria-label="Send"]')
        || document.querySelector('button[aria-label="Enviar"]');
    if (icon) {
        (icon.closest('button') || icon).click();
        return { state: 'sent' };
    }
    return { state: 'pending' };
})()
"#;

#[derive(Debug, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
enum SessionState {
    Ready,
    Challenge { data: String },
    Loading,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
enum ComposeState {
    Sent,
    Rejected { message: String },
    Pending,
}

/// WhatsApp Web 消息通道
///
/// 持有 JsExecutor；发送时打开 `/send?phone=..&text=..` 并点击发送按钮。
/// 超时由调度器统一控制。
pub struct WhatsAppWebChannel {
    executor: JsExecutor,
    recipients: RecipientFormat,
    base_url: String,
    /// 上一次转发的二维码数据，相同的挑战不重复上报
    last_challenge: Mutex<Option<String>>,
}

impl WhatsAppWebChannel {
    pub fn new(executor: JsExecutor, config: &Config) -> Self {
        Self {
            executor,
            recipients: RecipientFormat::new(&config.country_code, &config.recipient_domain),
            base_url: config.target_url.trim_end_matches('/').to_string(),
            last_challenge: Mutex::new(None),
        }
    }

    fn compose_url(&self, phone: &str, text: &str) -> Result<Url, ChannelError> {
        Url::parse_with_params(
            &format!("{}/send", self.base_url),
            &[("phone", phone), ("text", text)],
        )
        .map_err(|e| ChannelError::rejected(format!("invalid send url: {}", e)))
    }

    /// 记录新的挑战数据，返回是否与上次不同
    fn remember_challenge(&self, data: &str) -> bool {
        let mut last = self
            .last_challenge
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if last.as_deref() == Some(data) {
            return false;
        }
        *last = Some(data.to_string());
        true
    }
}

impl MessagingChannel for WhatsAppWebChannel {
    async fn next_handshake_event(&self) -> Result<HandshakeEvent, ChannelError> {
        loop {
            match self.executor.eval_as::<SessionState>(SESSION_STATE_JS).await? {
                SessionState::Ready => {
                    info!("✓ WhatsApp Web 会话已就绪");
                    return Ok(HandshakeEvent::Ready);
                }
                SessionState::Challenge { data } => {
                    if self.remember_challenge(&data) {
                        info!("📱 等待扫码登录...");
                        return Ok(HandshakeEvent::Challenge(data));
                    }
                }
                SessionState::Loading => debug!("页面加载中..."),
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    fn recipient_id(&self, raw_phone: &str) -> String {
        self.recipients.format(raw_phone)
    }

    async fn send(&self, recipient_id: &str, text: &str) -> Result<(), ChannelError> {
        let phone = self.recipients.phone_part(recipient_id);
        let url = self.compose_url(phone, text)?;
        debug!("打开会话: {}", phone);
        self.executor.goto(url.as_str()).await?;

        loop {
            match self.executor.eval_as::<ComposeState>(COMPOSE_STATE_JS).await? {
                ComposeState::Sent => {
                    sleep(AFTER_SEND_SETTLE).await;
                    return Ok(());
                }
                ComposeState::Rejected { message } => {
                    warn!("号码被拒绝 {}: {}", phone, message);
                    return Err(ChannelError::rejected(message));
                }
                ComposeState::Pending => sleep(POLL_INTERVAL).await,
            }
        }
    }

    async fn terminate(&self) -> Result<(), ChannelError> {
        info!("🔌 关闭 WhatsApp Web 页面");
        self.executor.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_deserialize() {
        let state: SessionState =
            serde_json::from_value(serde_json::json!({ "state": "challenge", "data": "2@abc" }))
                .unwrap();
        assert!(matches!(state, SessionState::Challenge { data } if data == "2@abc"));

        let state: SessionState =
            serde_json::from_value(serde_json::json!({ "state": "ready" })).unwrap();
        assert!(matches!(state, SessionState::Ready));
    }

    #[test]
    fn test_compose_state_deserialize() {
        let state: ComposeState = serde_json::from_value(
            serde_json::json!({ "state": "rejected", "message": "Phone number shared via url is invalid." }),
        )
        .unwrap();
        assert!(matches!(state, ComposeState::Rejected { .. }));
    }
}
