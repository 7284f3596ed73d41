//! 错误分类

use std::time::Duration;
use thiserror::Error;

/// 调研流程中的错误
///
/// 只有 `InvalidInput` 会终止一次调研；其余错误都在单个候选工具的范围内被降级处理。
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoutError {
    /// 查询为空或格式不合法
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// 搜索或抓取失败
    #[error("fetch failed for {target}: {reason}")]
    Fetch { target: String, reason: String },

    /// 模型的结构化输出无法通过schema校验
    #[error("structured output rejected: {0}")]
    SchemaValidation(String),

    /// 外部服务不可用
    #[error("collaborator unavailable: {0}")]
    Collaborator(String),

    /// 调用超时
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// 配置错误，仅在启动阶段出现
    #[error("invalid configuration:\n{0}")]
    Config(String),
}

impl ScoutError {
    pub fn fetch(target: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        ScoutError::Fetch {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    /// 是否可以在局部降级处理
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ScoutError::InvalidInput(_) | ScoutError::Config(_))
    }
}

pub type ScoutResult<T> = std::result::Result<T, ScoutError>;
