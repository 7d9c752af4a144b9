//! 文件系统操作工具
//!
//! 提供跨平台的日志/数据目录，以及结果图片导出

use crate::analysis::AnalysisResult;
use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 获取日志目录路径（跨平台）
///
/// - macOS: ~/Library/Logs/wheat-vision
/// - Windows: %APPDATA%/wheat-vision/logs
/// - Linux: ~/.local/share/wheat-vision/logs
pub fn get_log_dir() -> PathBuf {
    if cfg!(target_os = "macos") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join("Library/Logs/wheat-vision")
    } else if cfg!(target_os = "windows") {
        let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(appdata).join("wheat-vision").join("logs")
    } else {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".local/share/wheat-vision/logs")
    }
}

/// 获取数据目录路径（配置文件所在目录）
pub fn get_data_dir() -> PathBuf {
    if cfg!(target_os = "macos") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join("Library/Application Support/wheat-vision")
    } else if cfg!(target_os = "windows") {
        let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(appdata).join("wheat-vision")
    } else {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".local/share/wheat-vision")
    }
}

/// 解析 `data:<mime>;base64,<payload>` 形式的图片
///
/// 普通URL返回 None
pub fn decode_data_uri(uri: &str) -> Option<Result<(String, Vec<u8>)>> {
    let rest = uri.strip_prefix("data:")?;
    Some(decode_data_payload(rest))
}

fn decode_data_payload(rest: &str) -> Result<(String, Vec<u8>)> {
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| anyhow!("data URI 缺少数据部分"))?;
    let mime = meta
        .strip_suffix(";base64")
        .ok_or_else(|| anyhow!("仅支持 base64 编码的 data URI"))?;
    let bytes = general_purpose::STANDARD
        .decode(payload.trim())
        .context("base64 解码失败")?;
    Ok((mime.to_string(), bytes))
}

/// 根据MIME类型推断文件扩展名
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/bmp" => "bmp",
        _ => "jpg",
    }
}

/// 导出结果中的内嵌图片
///
/// 只导出 data URI 形式的图片，普通URL跳过
///
/// # 返回
/// - 写入的文件路径列表
pub async fn export_result_images(result: &AnalysisResult, dir: &Path) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("创建导出目录失败: {:?}", dir))?;

    let images = [
        ("original", &result.original_image),
        ("mask", &result.mask_image),
        ("highlighted", &result.highlighted_image),
    ];

    let mut written = Vec::new();
    for (label, image) in images {
        let Some(uri) = image.as_deref() else {
            continue;
        };
        let Some(decoded) = decode_data_uri(uri) else {
            debug!("{} 图片不是 data URI，跳过导出", label);
            continue;
        };
        let (mime, bytes) = decoded.with_context(|| format!("{} 图片解析失败", label))?;

        let path = dir.join(format!("{}.{}", label, extension_for_mime(&mime)));
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("写入图片失败: {:?}", path))?;
        info!("已导出 {} 图片: {:?} ({} 字节)", label, path, bytes.len());
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn data_uri(mime: &str, bytes: &[u8]) -> String {
        format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(bytes))
    }

    #[test]
    fn test_decode_data_uri() {
        let (mime, bytes) = decode_data_uri(&data_uri("image/png", b"png-bytes"))
            .unwrap()
            .unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, b"png-bytes");

        assert!(decode_data_uri("https://example.com/mask.png").is_none());
        assert!(decode_data_uri("data:image/png,raw").unwrap().is_err());
        assert!(decode_data_uri("data:image/png;base64,@@@").unwrap().is_err());
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime("image/png"), "png");
        assert_eq!(extension_for_mime("image/jpeg"), "jpg");
        assert_eq!(extension_for_mime("application/octet-stream"), "jpg");
    }

    #[tokio::test]
    async fn test_export_skips_plain_urls() {
        let dir = TempDir::new().unwrap();
        let result = AnalysisResult {
            predicted_class: "Healthy".to_string(),
            healthy_percent: 100.0,
            infected_percent: 0.0,
            original_image: Some(data_uri("image/jpeg", b"jpeg")),
            mask_image: Some("https://example.com/mask.png".to_string()),
            highlighted_image: Some(data_uri("image/png", b"png")),
        };

        let written = export_result_images(&result, dir.path()).await.unwrap();
        assert_eq!(
            written,
            vec![
                dir.path().join("original.jpg"),
                dir.path().join("highlighted.png")
            ]
        );
        assert_eq!(std::fs::read(dir.path().join("highlighted.png")).unwrap(), b"png");
    }

    #[test]
    fn test_dirs_use_app_name() {
        assert!(get_log_dir().to_string_lossy().contains("wheat-vision"));
        assert!(get_data_dir().to_string_lossy().contains("wheat-vision"));
    }
}
