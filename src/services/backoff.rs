//! 发送节奏策略
//!
//! 每次发送尝试之后决定等待多久：
//! - 成功：基础间隔；每累计 N 条成功且还有剩余联系人时改为长暂停
//! - 失败：短暂恢复间隔
//!
//! 策略本身无状态，只根据调用方给出的成功计数做判断，也从不决定停止。

use std::time::Duration;

use crate::config::Config;

/// 发送后的等待
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delay {
    /// 常规间隔
    Base(Duration),
    /// 每 N 条成功后的长暂停
    LongPause(Duration),
    /// 失败后的恢复间隔
    Recovery(Duration),
}

impl Delay {
    pub fn duration(&self) -> Duration {
        match self {
            Delay::Base(d) | Delay::LongPause(d) | Delay::Recovery(d) => *d,
        }
    }
}

/// 发送节奏策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base_delay: Duration,
    pub long_pause: Duration,
    /// 每多少条成功触发一次长暂停
    pub long_pause_every: usize,
    pub failure_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(15),
            long_pause: Duration::from_secs(60),
            long_pause_every: 50,
            failure_delay: Duration::from_secs(5),
        }
    }
}

impl BackoffPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_delay: Duration::from_secs(config.base_delay_secs),
            long_pause: Duration::from_secs(config.long_pause_secs),
            long_pause_every: config.long_pause_every,
            failure_delay: Duration::from_secs(config.failure_delay_secs),
        }
    }

    /// 成功发送后的等待
    ///
    /// # 参数
    /// - `success_count`: 包含本次在内的累计成功数
    /// - `has_more`: 后面是否还有联系人
    pub fn after_success(&self, success_count: usize, has_more: bool) -> Delay {
        let escalate = self.long_pause_every > 0
            && success_count > 0
            && success_count % self.long_pause_every == 0
            && has_more;

        if escalate {
            Delay::LongPause(self.long_pause)
        } else {
            Delay::Base(self.base_delay)
        }
    }

    /// 失败后的等待
    pub fn after_failure(&self) -> Delay {
        Delay::Recovery(self.failure_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_delay_between_sends() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.after_success(1, true), Delay::Base(Duration::from_secs(15)));
        assert_eq!(policy.after_success(49, true), Delay::Base(Duration::from_secs(15)));
        assert_eq!(policy.after_success(51, true), Delay::Base(Duration::from_secs(15)));
    }

    #[test]
    fn test_long_pause_on_every_fiftieth_success() {
        let policy = BackoffPolicy::default();
        for s in [50, 100, 150, 500] {
            assert_eq!(
                policy.after_success(s, true),
                Delay::LongPause(Duration::from_secs(60)),
                "success_count = {}",
                s
            );
        }
    }

    #[test]
    fn test_no_long_pause_after_last_contact() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.after_success(50, false), Delay::Base(Duration::from_secs(15)));
    }

    #[test]
    fn test_zero_successes_never_escalate() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.after_success(0, true), Delay::Base(Duration::from_secs(15)));
    }

    #[test]
    fn test_failure_uses_recovery_delay() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.after_failure(), Delay::Recovery(Duration::from_secs(5)));
        assert_eq!(policy.after_failure().duration(), Duration::from_secs(5));
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            base_delay_secs: 3,
            long_pause_secs: 30,
            long_pause_every: 10,
            failure_delay_secs: 1,
            ..Config::default()
        };
        let policy = BackoffPolicy::from_config(&config);

        assert_eq!(policy.after_success(10, true), Delay::LongPause(Duration::from_secs(30)));
        assert_eq!(policy.after_success(9, true), Delay::Base(Duration::from_secs(3)));
        assert_eq!(policy.after_failure(), Delay::Recovery(Duration::from_secs(1)));
    }
}
