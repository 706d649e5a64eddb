//! 单个联系人的发送流程 - 流程层
//!
//! 流程顺序：
//! 1. 校验电话字段
//! 2. 渲染消息
//! 3. 上报进度
//! 4. 通过消息通道发送（带超时）
//!
//! 等待、暂停、失败记录都由调度器决定，这里只返回结果。

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::info;

use crate::channel::MessagingChannel;
use crate::error::{ChannelError, SendFailure};
use crate::models::ContactRecord;
use crate::orchestrator::control::{DispatchEvent, RunControl};
use crate::services::template;
use crate::utils::logging::truncate_text;
use crate::workflow::ContactCtx;

pub struct SendFlow<C> {
    channel: Arc<C>,
    control: Arc<RunControl>,
    send_timeout: Duration,
    verbose_logging: bool,
}

impl<C: MessagingChannel> SendFlow<C> {
    pub fn new(
        channel: Arc<C>,
        control: Arc<RunControl>,
        send_timeout: Duration,
        verbose_logging: bool,
    ) -> Self {
        Self {
            channel,
            control,
            send_timeout,
            verbose_logging,
        }
    }

    pub async fn run(
        &self,
        contact: &ContactRecord,
        message_template: &str,
        ctx: &ContactCtx,
    ) -> Result<(), SendFailure> {
        if contact.raw_phone.is_empty() {
            return Err(SendFailure::EmptyPhone);
        }

        let text = template::render(message_template, &contact.display_name);

        self.control.emit(DispatchEvent::Status(format!(
            "({}/{}) Sending to: {}",
            ctx.line_index, ctx.source_lines, contact.display_name
        )));
        info!("{} 📤 正在发送给 {}", ctx, contact.display_name);

        let recipient = self.channel.recipient_id(&contact.raw_phone);

        // 详细日志（如果启用）
        if self.verbose_logging {
            self.log_message_detail(ctx, contact, &recipient, &text);
        }

        match timeout(self.send_timeout, self.channel.send(&recipient, &text)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ChannelError::timeout("sending message", self.send_timeout.as_secs()).into())
            }
        }

        info!("{} ✓ 发送成功", ctx);
        Ok(())
    }

    fn log_message_detail(
        &self,
        ctx: &ContactCtx,
        contact: &ContactRecord,
        recipient: &str,
        text: &str,
    ) {
        info!("{} 收件人: {} ({})", ctx, recipient, contact);
        info!("{} 消息: {}", ctx, truncate_text(text, 60));
    }
}
