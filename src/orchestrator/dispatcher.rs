//! 发送调度器 - 编排层
//!
//! ## 职责
//!
//! 1. **启动**：同一时间最多一个任务，`start` 在非 Idle 阶段直接拒绝
//! 2. **握手**：等待消息通道就绪，转发二维码挑战
//! 3. **顺序发送**：按联系人顺序逐个发送，任何时候只有一条在途消息
//! 4. **节奏控制**：每次尝试之后按发送节奏策略等待
//! 5. **暂停 / 停止**：停止只在迭代开始和暂停等待中生效，不打断在途发送
//! 6. **报告**：正常结束时生成最终报告；被停止时不生成
//!
//! 单个联系人失败只进入失败记录，不会中止整个任务。

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};

use crate::channel::{HandshakeEvent, MessagingChannel};
use crate::config::Config;
use crate::error::{ChannelError, DispatchError, DispatchResult};
use crate::models::{load_contacts, DispatchJob};
use crate::orchestrator::control::{DispatchEvent, EventSender, Phase, RunControl, RunSnapshot};
use crate::services::{BackoffPolicy, Delay, FailureLedger, FailureRecord};
use crate::workflow::{ContactCtx, SendFlow};

/// 调度器的时间参数
#[derive(Debug, Clone, Copy)]
pub struct DispatchOptions {
    /// 暂停等待的轮询间隔
    pub pause_poll: Duration,
    /// 单条消息的发送超时
    pub send_timeout: Duration,
    /// 等待通道就绪的超时
    pub handshake_timeout: Duration,
    /// 是否输出每个联系人的详细日志
    pub verbose_logging: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            pause_poll: Duration::from_secs(1),
            send_timeout: Duration::from_secs(60),
            handshake_timeout: Duration::from_secs(300),
            verbose_logging: false,
        }
    }
}

impl DispatchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            pause_poll: config.pause_poll(),
            send_timeout: config.send_timeout(),
            handshake_timeout: config.handshake_timeout(),
            verbose_logging: config.verbose_logging,
        }
    }
}

/// 任务结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// 联系人全部处理完
    Completed,
    /// 被用户停止
    Stopped,
    /// 通道握手失败，未发送任何消息
    Aborted,
}

/// 任务结果
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub success_count: usize,
    pub failures: Vec<FailureRecord>,
    /// 只有正常结束时才有最终报告
    pub report: Option<String>,
}

/// 发送循环内部状态，只由循环自己修改
#[derive(Debug, Default)]
struct RunState {
    success_count: usize,
    current_index: usize,
    ledger: FailureLedger,
}

/// 发送调度器
pub struct DispatchController<C> {
    channel: Arc<C>,
    policy: BackoffPolicy,
    options: DispatchOptions,
    control: Arc<RunControl>,
}

impl<C: MessagingChannel> DispatchController<C> {
    pub fn new(
        channel: Arc<C>,
        policy: BackoffPolicy,
        options: DispatchOptions,
        events: EventSender,
    ) -> Self {
        Self {
            channel,
            policy,
            options,
            control: Arc::new(RunControl::new(events)),
        }
    }

    /// 控制句柄，可交给控制端在其他任务中暂停 / 继续 / 停止
    pub fn control(&self) -> Arc<RunControl> {
        self.control.clone()
    }

    pub fn phase(&self) -> Phase {
        self.control.phase()
    }

    pub fn snapshot(&self) -> RunSnapshot {
        self.control.snapshot()
    }

    pub fn pause(&self) -> bool {
        self.control.pause()
    }

    pub fn resume(&self) -> bool {
        self.control.resume()
    }

    pub fn stop(&self) -> bool {
        self.control.stop()
    }

    /// 启动一个已解析好的任务
    ///
    /// 非 Idle 阶段返回 [`DispatchError::AlreadyRunning`]，不影响正在进行的任务。
    pub fn start(&self, job: DispatchJob) -> DispatchResult<JoinHandle<RunSummary>> {
        self.control.begin()?;
        Ok(self.spawn_run(job))
    }

    /// 读取联系人文件并启动任务
    ///
    /// 文件无法读取时在发送任何消息之前中止，阶段回到 Idle。
    pub async fn start_from_source(
        &self,
        source: &Path,
        message_template: &str,
    ) -> DispatchResult<JoinHandle<RunSummary>> {
        self.control.begin()?;

        let parsed = match load_contacts(source).await {
            Ok(parsed) => parsed,
            Err(e) => {
                error!("❌ 联系人文件读取失败 {}: {}", source.display(), e);
                self.control.emit(DispatchEvent::Status(e.to_string()));
                self.control.reset();
                return Err(e);
            }
        };

        info!(
            "✓ 读取 {} 行，{} 个联系人",
            parsed.line_count,
            parsed.contacts.len()
        );
        // 与进度 (i/N) 的 N 一致，按非空行计数
        self.control.emit(DispatchEvent::Status(format!(
            "File read. {} contacts found. Starting sends...",
            parsed.line_count
        )));

        Ok(self.spawn_run(DispatchJob::from_source(parsed, message_template)))
    }

    fn spawn_run(&self, job: DispatchJob) -> JoinHandle<RunSummary> {
        let run = RunLoop {
            channel: self.channel.clone(),
            flow: SendFlow::new(
                self.channel.clone(),
                self.control.clone(),
                self.options.send_timeout,
                self.options.verbose_logging,
            ),
            policy: self.policy,
            options: self.options,
            control: self.control.clone(),
        };
        tokio::spawn(run.run(job))
    }
}

/// 一次任务的发送循环
struct RunLoop<C> {
    channel: Arc<C>,
    flow: SendFlow<C>,
    policy: BackoffPolicy,
    options: DispatchOptions,
    control: Arc<RunControl>,
}

impl<C: MessagingChannel> RunLoop<C> {
    async fn run(self, job: DispatchJob) -> RunSummary {
        let mut state = RunState::default();

        let outcome = match self.await_session().await {
            Ok(()) => {
                self.dispatch_all(&job, &mut state).await;
                match self.control.finish() {
                    Phase::Stopped => RunOutcome::Stopped,
                    _ => RunOutcome::Completed,
                }
            }
            Err(e) => {
                error!("❌ {}", e);
                self.control.emit(DispatchEvent::Status(e.to_string()));
                RunOutcome::Aborted
            }
        };

        let report = match outcome {
            RunOutcome::Completed => {
                let report = build_final_report(state.success_count, state.ledger.all());
                info!("✅ 全部联系人处理完成");
                self.control.emit(DispatchEvent::FinalReport(report.clone()));
                Some(report)
            }
            RunOutcome::Stopped | RunOutcome::Aborted => {
                if let Err(e) = self.channel.terminate().await {
                    warn!("⚠️ 关闭消息通道失败: {}", e);
                }
                None
            }
        };

        self.control.reset();

        RunSummary {
            outcome,
            success_count: state.success_count,
            failures: state.ledger.into_records(),
            report,
        }
    }

    /// 等待通道就绪；握手期间收到停止请求时直接返回，由循环顶部处理停止
    async fn await_session(&self) -> DispatchResult<()> {
        let limit = self.options.handshake_timeout;
        tokio::select! {
            result = timeout(limit, self.handshake()) => match result {
                Ok(result) => result.map_err(DispatchError::Handshake),
                Err(_) => Err(DispatchError::Handshake(ChannelError::timeout(
                    "waiting for the messaging session",
                    limit.as_secs(),
                ))),
            },
            _ = self.control.stopped() => {
                info!("握手期间收到停止请求");
                Ok(())
            }
        }
    }

    async fn handshake(&self) -> Result<(), ChannelError> {
        loop {
            match self.channel.next_handshake_event().await? {
                HandshakeEvent::Challenge(data) => {
                    self.control.emit(DispatchEvent::QrChallenge(data));
                }
                HandshakeEvent::Ready => {
                    self.control.emit(DispatchEvent::SessionReady);
                    return Ok(());
                }
            }
        }
    }

    async fn dispatch_all(&self, job: &DispatchJob, state: &mut RunState) {
        let total = job.contacts.len();

        for (index, contact) in job.contacts.iter().enumerate() {
            if self.control.is_stopping() {
                info!("⏹️ 已停止，剩余 {} 个联系人未处理", total - index);
                break;
            }

            let ctx = ContactCtx::new(index + 1, total, contact.line_index, job.source_lines);
            state.current_index = ctx.position;
            self.control
                .publish_progress(state.current_index, state.success_count);

            match self.flow.run(contact, &job.message_template, &ctx).await {
                Ok(()) => {
                    state.success_count += 1;
                    self.control
                        .publish_progress(state.current_index, state.success_count);

                    self.wait_while_paused().await;
                    if self.control.is_stopping() {
                        info!("⏹️ 暂停期间被停止");
                        break;
                    }

                    let delay = self.policy.after_success(state.success_count, ctx.has_more());
                    if let Delay::LongPause(pause) = delay {
                        info!("☕ 已发送 {} 条，长暂停 {}s", state.success_count, pause.as_secs());
                        self.control.emit(DispatchEvent::Status(format!(
                            "Pausing for {} seconds... ({} sent)",
                            pause.as_secs(),
                            state.success_count
                        )));
                    }
                    sleep(delay.duration()).await;
                }
                Err(e) => {
                    warn!("{} ⚠️ 发送给 {} 失败: {}", ctx, contact.display_name, e);
                    state.ledger.record(contact, &e);
                    self.control.emit(DispatchEvent::Status(format!(
                        "Error sending to {}. Skipping...",
                        contact.display_name
                    )));
                    sleep(self.policy.after_failure().duration()).await;
                }
            }
        }
    }

    /// 暂停等待：不消耗联系人，直到继续或停止
    async fn wait_while_paused(&self) {
        while self.control.is_paused() {
            sleep(self.options.pause_poll).await;
        }
    }
}

/// 生成最终报告
///
/// 第一行为成功数量；有失败时附加失败列表，每行一个联系人。
pub fn build_final_report(success_count: usize, failures: &[FailureRecord]) -> String {
    let mut report = format!("{} messages sent successfully.", success_count);
    if !failures.is_empty() {
        report.push_str("\n\n--- FAILURE REPORT ---\n");
        let lines: Vec<String> = failures.iter().map(ToString::to_string).collect();
        report.push_str(&lines.join("\n"));
    }
    report
}
