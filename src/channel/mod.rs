//! 消息通道 - 外部协作方
//!
//! 调度器只依赖这里的抽象能力：
//! - 握手：先给出零次或多次配对挑战（二维码），最后给出就绪
//! - 发送：`send(收件人标识, 文本)`，成功或失败
//! - 结束：释放会话
//!
//! 消息实际怎么送达（浏览器自动化、HTTP、短信网关）由具体实现决定。

pub mod whatsapp_web;

use std::future::Future;

use crate::error::ChannelError;

pub use whatsapp_web::WhatsAppWebChannel;

/// 握手事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeEvent {
    /// 需要操作员处理的配对数据（原样转发给控制端）
    Challenge(String),
    /// 通道已可发送
    Ready,
}

/// 消息通道能力
pub trait MessagingChannel: Send + Sync + 'static {
    /// 等待下一个握手事件
    fn next_handshake_event(
        &self,
    ) -> impl Future<Output = Result<HandshakeEvent, ChannelError>> + Send;

    /// 将原始电话转换为通道使用的收件人标识
    fn recipient_id(&self, raw_phone: &str) -> String;

    /// 发送一条消息
    fn send(
        &self,
        recipient_id: &str,
        text: &str,
    ) -> impl Future<Output = Result<(), ChannelError>> + Send;

    /// 释放会话
    fn terminate(&self) -> impl Future<Output = Result<(), ChannelError>> + Send;
}

/// 收件人标识格式：`<区号><电话>@<域名>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientFormat {
    pub country_code: String,
    pub domain: String,
}

impl RecipientFormat {
    pub fn new(country_code: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            country_code: country_code.into(),
            domain: domain.into(),
        }
    }

    pub fn format(&self, raw_phone: &str) -> String {
        format!("{}{}@{}", self.country_code, raw_phone, self.domain)
    }

    /// 从收件人标识中取回号码部分
    pub fn phone_part<'a>(&self, recipient_id: &'a str) -> &'a str {
        recipient_id
            .split_once('@')
            .map_or(recipient_id, |(phone, _)| phone)
    }
}

impl Default for RecipientFormat {
    fn default() -> Self {
        Self::new("55", "c.us")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_format() {
        let format = RecipientFormat::default();
        let id = format.format("11999990000");

        assert_eq!(id, "5511999990000@c.us");
        assert_eq!(format.phone_part(&id), "5511999990000");
        assert_eq!(format.phone_part("5511"), "5511");
    }
}
