//! 运行阶段控制
//!
//! 控制端（暂停 / 继续 / 停止）只改阶段标志；计数和失败记录只由发送循环自己写。
//! 标志用原子量保存，不需要加锁。

use std::fmt::Display;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use tokio::sync::{mpsc, Notify};
use tracing::info;

use crate::error::{DispatchError, DispatchResult};

/// 运行阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    Idle = 0,
    Running = 1,
    Paused = 2,
    Stopping = 3,
    Completed = 4,
    Stopped = 5,
}

impl Phase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Phase::Running,
            2 => Phase::Paused,
            3 => Phase::Stopping,
            4 => Phase::Completed,
            5 => Phase::Stopped,
            _ => Phase::Idle,
        }
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Running => "running",
            Phase::Paused => "paused",
            Phase::Stopping => "stopping",
            Phase::Completed => "completed",
            Phase::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// 发给控制端的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchEvent {
    /// 进度 / 状态文本
    Status(String),
    /// 通道握手给出的配对数据，原样转发
    QrChallenge(String),
    /// 通道已就绪
    SessionReady,
    /// 正常结束时的最终报告
    FinalReport(String),
}

pub type EventSender = mpsc::UnboundedSender<DispatchEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<DispatchEvent>;

/// 运行进度快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSnapshot {
    pub phase: Phase,
    /// 正在处理的联系人序号（从1开始，0 表示尚未开始）
    pub current_index: usize,
    pub success_count: usize,
}

/// 共享的运行控制
pub struct RunControl {
    phase: AtomicU8,
    current_index: AtomicUsize,
    success_count: AtomicUsize,
    stop_signal: Notify,
    events: EventSender,
}

impl RunControl {
    pub fn new(events: EventSender) -> Self {
        Self {
            phase: AtomicU8::new(Phase::Idle as u8),
            current_index: AtomicUsize::new(0),
            success_count: AtomicUsize::new(0),
            stop_signal: Notify::new(),
            events,
        }
    }

    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            phase: self.phase(),
            current_index: self.current_index.load(Ordering::Acquire),
            success_count: self.success_count.load(Ordering::Acquire),
        }
    }

    /// Running → Paused，其他阶段忽略
    pub fn pause(&self) -> bool {
        let changed = self.transition(Phase::Running, Phase::Paused);
        if changed {
            info!("⏸️ 发送已暂停");
            self.emit(DispatchEvent::Status("Sending paused!".to_string()));
        }
        changed
    }

    /// Paused → Running，其他阶段忽略
    pub fn resume(&self) -> bool {
        let changed = self.transition(Phase::Paused, Phase::Running);
        if changed {
            info!("▶️ 发送已继续");
            self.emit(DispatchEvent::Status("Sending resumed!".to_string()));
        }
        changed
    }

    /// Running | Paused → Stopping
    ///
    /// 发送循环在下一个迭代边界或暂停等待中看到这个标志后退出。
    pub fn stop(&self) -> bool {
        let changed = self
            .phase
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                match Phase::from_u8(current) {
                    Phase::Running | Phase::Paused => Some(Phase::Stopping as u8),
                    _ => None,
                }
            })
            .is_ok();
        if changed {
            info!("⏹️ 收到停止请求");
            self.stop_signal.notify_one();
            self.emit(DispatchEvent::Status("Sending stopped by user.".to_string()));
        }
        changed
    }

    pub(crate) fn is_stopping(&self) -> bool {
        self.phase() == Phase::Stopping
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.phase() == Phase::Paused
    }

    /// Idle → Running，同时清空上一次的进度
    pub(crate) fn begin(&self) -> DispatchResult<()> {
        self.phase
            .compare_exchange(
                Phase::Idle as u8,
                Phase::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|current| DispatchError::AlreadyRunning {
                phase: Phase::from_u8(current),
            })?;
        self.publish_progress(0, 0);
        Ok(())
    }

    /// 进入终态：停止中 → Stopped，其余 → Completed
    pub(crate) fn finish(&self) -> Phase {
        let previous = self
            .phase
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                match Phase::from_u8(current) {
                    Phase::Stopping => Some(Phase::Stopped as u8),
                    _ => Some(Phase::Completed as u8),
                }
            })
            .unwrap_or_else(|current| current);
        if Phase::from_u8(previous) == Phase::Stopping {
            Phase::Stopped
        } else {
            Phase::Completed
        }
    }

    /// 回到 Idle，允许下一次启动
    pub(crate) fn reset(&self) {
        self.phase.store(Phase::Idle as u8, Ordering::Release);
    }

    pub(crate) fn publish_progress(&self, current_index: usize, success_count: usize) {
        self.current_index.store(current_index, Ordering::Release);
        self.success_count.store(success_count, Ordering::Release);
    }

    /// 等待停止请求
    pub(crate) async fn stopped(&self) {
        // 残留的通知只会触发一次重新检查
        while !self.is_stopping() {
            self.stop_signal.notified().await;
        }
    }

    /// 控制端已断开时静默丢弃
    pub(crate) fn emit(&self, event: DispatchEvent) {
        let _ = self.events.send(event);
    }

    fn transition(&self, from: Phase, to: Phase) -> bool {
        self.phase
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control() -> (RunControl, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (RunControl::new(tx), rx)
    }

    #[test]
    fn test_commands_ignored_while_idle() {
        let (control, mut rx) = control();

        assert!(!control.pause());
        assert!(!control.resume());
        assert!(!control.stop());
        assert_eq!(control.phase(), Phase::Idle);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_pause_resume_cycle() {
        let (control, mut rx) = control();
        control.begin().unwrap();

        assert!(control.pause());
        assert!(!control.pause());
        assert_eq!(control.phase(), Phase::Paused);
        assert!(control.resume());
        assert!(!control.resume());
        assert_eq!(control.phase(), Phase::Running);

        assert_eq!(
            rx.try_recv().unwrap(),
            DispatchEvent::Status("Sending paused!".to_string())
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            DispatchEvent::Status("Sending resumed!".to_string())
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_begin_rejects_second_run() {
        let (control, _rx) = control();
        control.begin().unwrap();
        control.pause();

        let err = control.begin().unwrap_err();
        assert!(matches!(
            err,
            DispatchError::AlreadyRunning {
                phase: Phase::Paused
            }
        ));
        assert_eq!(control.phase(), Phase::Paused);
    }

    #[test]
    fn test_stop_from_paused_then_finish() {
        let (control, _rx) = control();
        control.begin().unwrap();
        control.pause();

        assert!(control.stop());
        assert_eq!(control.phase(), Phase::Stopping);
        // 停止中不能再暂停或继续
        assert!(!control.pause());
        assert!(!control.resume());

        assert_eq!(control.finish(), Phase::Stopped);
        control.reset();
        assert_eq!(control.phase(), Phase::Idle);
    }

    #[test]
    fn test_finish_without_stop_is_completed() {
        let (control, _rx) = control();
        control.begin().unwrap();
        assert_eq!(control.finish(), Phase::Completed);
        assert_eq!(control.phase(), Phase::Completed);
    }

    #[tokio::test]
    async fn test_stopped_returns_after_stop() {
        let (control, _rx) = control();
        control.begin().unwrap();
        control.stop();
        // 通知已经存储，等待立即返回
        control.stopped().await;
    }
}
