use anyhow::{Context, Result};
/// 日志工具模块
///
/// 提供运行日志文件和统计输出的辅助函数
use std::fs::{self, OpenOptions};
use std::io::Write;
use tracing::info;

use crate::config::Config;
use crate::orchestrator::{RunOutcome, RunSummary};

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n群发日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path))?;
    Ok(())
}

/// 追加一段内容到日志文件
pub fn append_log(log_file_path: &str, text: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .with_context(|| format!("无法打开日志文件: {}", log_file_path))?;
    writeln!(
        file,
        "[{}]\n{}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        text
    )?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 顺序群发模式");
    info!("📄 联系人文件: {}", config.contacts_file.display());
    info!(
        "⏱️ 发送间隔: {}s / 每 {} 条暂停 {}s / 失败后 {}s",
        config.base_delay_secs,
        config.long_pause_every,
        config.long_pause_secs,
        config.failure_delay_secs
    );
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(summary: &RunSummary, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 发送结束统计 ({:?})", summary.outcome);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}", summary.success_count);
    info!("❌ 失败: {}", summary.failures.len());
    if summary.outcome == RunOutcome::Stopped {
        info!("⏹️ 已被用户停止");
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("Olá João", 3), "Olá...");
        assert_eq!(truncate_text("curto", 10), "curto");
    }
}
