// 数据模型模块 - 定义配置相关的数据结构

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::analysis::PacingConfig;

/// 配置更新（所有字段可选，只更新提供的字段）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 分析服务地址
    pub endpoint: Option<String>,
    /// 请求超时（秒），0 表示不限制
    pub request_timeout_secs: Option<u64>,
    /// 进度节奏
    pub pacing: Option<PacingConfig>,
    /// 日志级别
    pub log_level: Option<String>,
    /// 结果图片导出目录
    pub export_dir: Option<String>,
}

/// 持久化的应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedAppConfig {
    /// 分析服务地址
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// 请求超时（秒）
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// 进度节奏
    #[serde(default)]
    pub pacing: PacingConfig,
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 结果图片导出目录
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<String>,
}

fn default_endpoint() -> String {
    crate::inference::http::DEFAULT_ENDPOINT.to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for PersistedAppConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_secs: default_request_timeout_secs(),
            pacing: PacingConfig::default(),
            log_level: default_log_level(),
            export_dir: None,
        }
    }
}

impl PersistedAppConfig {
    /// 请求超时，0 表示不限制
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}
