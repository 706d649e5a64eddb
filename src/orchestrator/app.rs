//! 应用 - 编排层
//!
//! ## 核心功能
//!
//! 1. **初始化**：日志文件、连接浏览器、创建 WhatsApp Web 通道和调度器
//! 2. **启动任务**：读取模板和联系人文件
//! 3. **控制端**：从标准输入读取 `pause` / `resume` / `stop`
//! 4. **事件输出**：状态写日志，二维码数据打印到终端，最终报告写入日志文件

use std::sync::Arc;

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::browser;
use crate::channel::WhatsAppWebChannel;
use crate::config::Config;
use crate::infrastructure::JsExecutor;
use crate::orchestrator::control::{DispatchEvent, EventReceiver, RunControl};
use crate::orchestrator::dispatcher::{DispatchController, DispatchOptions, RunSummary};
use crate::services::BackoffPolicy;
use crate::utils::logging::{append_log, init_log_file, log_startup, print_final_stats};

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    controller: DispatchController<WhatsAppWebChannel>,
    events: EventReceiver,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        init_log_file(&config.output_log_file)?;
        log_startup(&config);

        let (browser, page) = browser::open_session_page(&config).await?;
        let channel = WhatsAppWebChannel::new(JsExecutor::new(page), &config);

        let (tx, events) = mpsc::unbounded_channel();
        let controller = DispatchController::new(
            Arc::new(channel),
            BackoffPolicy::from_config(&config),
            DispatchOptions::from_config(&config),
            tx,
        );

        Ok(Self {
            config,
            _browser: browser,
            controller,
            events,
        })
    }

    /// 运行一次发送任务，直到完成或被停止
    pub async fn run(mut self) -> Result<RunSummary> {
        let template = self.load_template().await?;

        let start = self
            .controller
            .start_from_source(&self.config.contacts_file, &template)
            .await;
        // 读取失败的状态事件也要写进日志
        drain_events(&mut self.events, &self.config.output_log_file);
        let mut handle = start?;

        info!("💡 输入 pause / resume / stop 控制发送");
        let control = self.controller.control();
        let mut commands = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;

        let summary = loop {
            tokio::select! {
                result = &mut handle => break result.context("发送任务异常退出")?,
                Some(event) = self.events.recv() => handle_event(&self.config.output_log_file, event),
                line = commands.next_line(), if stdin_open => match line {
                    Ok(Some(line)) => handle_command(&control, line.trim()),
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        warn!("⚠️ 读取控制命令失败: {}", e);
                        stdin_open = false;
                    }
                },
            }
        };
        drain_events(&mut self.events, &self.config.output_log_file);

        print_final_stats(&summary, &self.config.output_log_file);
        Ok(summary)
    }

    async fn load_template(&self) -> Result<String> {
        match &self.config.template_file {
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("无法读取模板文件: {}", path.display())),
            None => Ok(self.config.message_template.clone()),
        }
    }
}

fn drain_events(events: &mut EventReceiver, log_file: &str) {
    while let Ok(event) = events.try_recv() {
        handle_event(log_file, event);
    }
}

fn handle_event(log_file: &str, event: DispatchEvent) {
    let log_line = match event {
        DispatchEvent::Status(text) => {
            info!("📢 {}", text);
            text
        }
        DispatchEvent::QrChallenge(data) => {
            info!("📱 请用手机扫描二维码登录 WhatsApp");
            println!("QR: {}", data);
            return;
        }
        DispatchEvent::SessionReady => {
            info!("✓ 会话就绪，开始发送");
            return;
        }
        DispatchEvent::FinalReport(report) => {
            for line in report.lines() {
                info!("{}", line);
            }
            report
        }
    };

    if let Err(e) = append_log(log_file, &log_line) {
        warn!("⚠️ 写入日志文件失败: {}", e);
    }
}

fn handle_command(control: &RunControl, command: &str) {
    let accepted = match command {
        "pause" | "p" => control.pause(),
        "resume" | "r" => control.resume(),
        "stop" | "s" => control.stop(),
        "" => return,
        other => {
            warn!("未知命令: {} (可用: pause / resume / stop)", other);
            return;
        }
    };
    if !accepted {
        info!("命令 {} 在当前阶段 ({}) 无效", command, control.phase());
    }
}
