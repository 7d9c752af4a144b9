// 图片采集模块 - 读取用户选择的本地图片
//
// 格式和大小只做提示性检查，最终由分析服务判断能否处理

use crate::analysis::SelectedImage;
use crate::utils::validation::advisory_image_warnings;
use anyhow::{bail, Context, Result};
use image::ImageFormat;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

/// 从磁盘读取图片
///
/// # 参数
/// - `path`: 图片路径，文件名作为上传时的名称
pub async fn load_image(path: &Path) -> Result<SelectedImage> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("无法访问图片: {:?}", path))?;
    if !metadata.is_file() {
        bail!("不是文件: {:?}", path);
    }

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("读取图片失败: {:?}", path))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string());

    let image = from_bytes(name, bytes);
    info!(
        "已读取图片: {} ({:.2} MB, {})",
        image.name,
        image.size_mb(),
        image.mime_type.as_deref().unwrap_or("未知格式")
    );
    for warning in advisory_image_warnings(&image) {
        warn!("{}", warning);
    }

    Ok(image)
}

/// 由内存数据构造图片，并嗅探MIME类型
pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> SelectedImage {
    let mime = sniff_mime(&bytes);
    if let Some((width, height)) = dimensions(&bytes) {
        debug!("图片尺寸: {}x{}", width, height);
    }

    let image = SelectedImage::new(name, bytes);
    match mime {
        Some(mime) => image.with_mime_type(mime),
        None => image,
    }
}

/// 根据文件头判断图片类型
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    let format = image::guess_format(bytes).ok()?;
    let mime = match format {
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Png => "image/png",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Gif => "image/gif",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        ImageFormat::Ico => "image/x-icon",
        _ => "application/octet-stream",
    };
    Some(mime)
}

fn dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}
