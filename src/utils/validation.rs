//! 输入验证工具函数
//!
//! 图片检查只产生提示，不阻止分析；服务端才是最终判断者

use crate::analysis::{PacingConfig, SelectedImage, MAX_STAGE_DELAY_MS, MAX_STEPS_PER_STAGE};
use anyhow::{bail, Result};
use reqwest::Url;

/// 建议的图片大小上限
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// 常见的可上传图片类型
const ACCEPTED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// 检查选中的图片，返回提示信息列表
///
/// # 参数
/// - `image`: 选中的图片
///
/// # 返回
/// - 空列表表示没有需要提示的问题
pub fn advisory_image_warnings(image: &SelectedImage) -> Vec<String> {
    let mut warnings = Vec::new();

    match image.mime_type.as_deref() {
        Some(mime) if ACCEPTED_MIME_TYPES.contains(&mime) => {}
        Some(mime) => warnings.push(format!("图片格式 {} 可能不被分析服务支持", mime)),
        None => warnings.push("无法识别图片格式".to_string()),
    }

    if image.size == 0 {
        warnings.push("图片文件为空".to_string());
    } else if image.size > MAX_IMAGE_BYTES {
        warnings.push(format!(
            "图片大小 {:.2} MB 超过建议上限 10 MB",
            image.size_mb()
        ));
    }

    warnings
}

/// 验证分析服务地址
pub fn validate_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint.trim())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("不支持的服务地址协议: {}", other),
    }
}

/// 验证日志级别
pub fn validate_log_level(level: &str) -> Result<()> {
    match level.to_ascii_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => bail!("无效的日志级别: {}", level),
    }
}

/// 验证进度节奏配置
pub fn validate_pacing(pacing: &PacingConfig) -> Result<()> {
    if !(1..=MAX_STEPS_PER_STAGE).contains(&pacing.steps_per_stage) {
        bail!(
            "每阶段步数 {} 超出范围 1..={}",
            pacing.steps_per_stage,
            MAX_STEPS_PER_STAGE
        );
    }
    if let Some(delay) = pacing
        .stage_delays_ms
        .iter()
        .find(|delay| **delay > MAX_STAGE_DELAY_MS)
    {
        bail!("阶段时长 {}ms 超过上限 {}ms", delay, MAX_STAGE_DELAY_MS);
    }
    Ok(())
}
