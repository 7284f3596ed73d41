//! 有界重试组合子

use std::future::Future;
use std::time::Duration;

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// 总尝试次数（含首次），至少为1
    pub max_attempts: u32,
    /// 首次重试前的等待时间
    pub initial_delay: Duration,
    /// 每次重试后等待时间的放大倍数
    pub backoff_factor: u32,
}

impl RetryPolicy {
    /// 立即重试，不等待
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            backoff_factor: 1,
        }
    }

    /// 固定间隔重试
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay: delay,
            backoff_factor: 1,
        }
    }

    /// 指数退避重试，每次等待时间翻倍
    pub fn exponential(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            backoff_factor: 2,
        }
    }

    fn delay_before(&self, retry: u32) -> Duration {
        self.initial_delay * self.backoff_factor.saturating_pow(retry.saturating_sub(1))
    }
}

/// 按策略执行异步操作，成功即返回；全部失败时返回最后一次的错误
pub async fn retry_with_backoff<T, E, F, Fut>(policy: RetryPolicy, label: &str, operation: F) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_with_backoff_if(policy, label, |_| true, operation).await
}

/// 同`retry_with_backoff`，但`should_retry`返回false的错误会立即返回
pub async fn retry_with_backoff_if<T, E, F, Fut, P>(
    policy: RetryPolicy,
    label: &str,
    should_retry: P,
    operation: F,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) => {
                if !should_retry(&err) {
                    tracing::warn!("❌ {} 失败，错误不可重试: {}", label, err);
                    return Err(err);
                }
                if attempt >= max_attempts {
                    tracing::warn!(
                        "❌ {} 失败，已尝试 {} / {} 次: {}",
                        label,
                        attempt,
                        max_attempts,
                        err
                    );
                    return Err(err);
                }
                tracing::warn!(
                    "⚠️ {} 出错，重试中 (第 {} / {} 次尝试): {}",
                    label,
                    attempt,
                    max_attempts,
                    err
                );
                let delay = policy.delay_before(attempt);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
