// 分析错误定义
//
// 区分用户输入错误、传输错误和数据格式错误，过期响应不属于错误，直接丢弃

use std::time::Duration;
use thiserror::Error;

/// 分析流程中可能出现的错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// 未选择图片就请求分析
    #[error("未选择图片")]
    NoImageSelected,

    /// 已有分析在进行中
    #[error("分析正在进行中")]
    AlreadyRunning,

    /// 网络层错误（连接失败、连接中断等）
    #[error("网络请求失败: {0}")]
    Transport(String),

    /// 服务返回非 2xx 状态码
    #[error("分析服务返回错误状态 {status}: {body}")]
    Status { status: u16, body: String },

    /// 请求超时
    #[error("分析请求超时（{}）", format_duration(.0))]
    Timeout(Duration),

    /// 响应体不是结构化对象
    #[error("响应数据格式错误: {0}")]
    MalformedPayload(String),

    /// 分析会话Actor已停止
    #[error("分析会话已停止")]
    SessionUnavailable,
}

impl AnalysisError {
    /// 是否可以在保留当前图片的情况下重试
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Status { .. } | Self::Timeout(_) | Self::MalformedPayload(_)
        )
    }

    /// 面向用户的提示文案
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NoImageSelected => "请先选择一张图片",
            Self::AlreadyRunning => "分析正在进行中，请稍候",
            Self::SessionUnavailable => "分析服务不可用，请重启应用",
            Self::Transport(_) | Self::Status { .. } | Self::Timeout(_) | Self::MalformedPayload(_) => {
                "分析失败，请重试"
            }
        }
    }
}

/// 整秒显示为秒，否则显示为毫秒
fn format_duration(duration: &Duration) -> String {
    if duration.subsec_nanos() == 0 {
        format!("{}秒", duration.as_secs())
    } else {
        format!("{}毫秒", duration.as_millis())
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(err: reqwest::Error) -> Self {
        AnalysisError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_failures_are_retryable() {
        assert!(AnalysisError::Transport("connection refused".into()).is_retryable());
        assert!(AnalysisError::Status { status: 500, body: String::new() }.is_retryable());
        assert!(AnalysisError::Timeout(Duration::from_secs(60)).is_retryable());
        assert!(AnalysisError::MalformedPayload("空响应".into()).is_retryable());

        assert!(!AnalysisError::NoImageSelected.is_retryable());
        assert!(!AnalysisError::AlreadyRunning.is_retryable());
    }

    #[test]
    fn test_remote_failures_share_generic_message() {
        let status = AnalysisError::Status { status: 502, body: "bad gateway".into() };
        let timeout = AnalysisError::Timeout(Duration::from_secs(5));
        assert_eq!(status.user_message(), timeout.user_message());
        assert_ne!(status.user_message(), AnalysisError::NoImageSelected.user_message());
    }

    #[test]
    fn test_timeout_message_keeps_sub_second_limits() {
        assert_eq!(
            AnalysisError::Timeout(Duration::from_secs(60)).to_string(),
            "分析请求超时（60秒）"
        );
        assert_eq!(
            AnalysisError::Timeout(Duration::from_millis(500)).to_string(),
            "分析请求超时（500毫秒）"
        );
    }
}
