//! 分析控制命令
//!
//! 提供图片选择和分析流程的控制接口，包括：
//! - 选择/清除图片
//! - 开始分析、重置
//! - 状态查询与结果导出

use crate::analysis::RunState;
use crate::capture;
use crate::utils::file_system;
use crate::AppState;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// 选择图片
pub async fn select_image(state: &AppState, path: &Path) -> Result<RunState, String> {
    let image = capture::load_image(path).await.map_err(|e| {
        error!("读取图片失败: {:#}", e);
        e.to_string()
    })?;

    state.analysis.select(image).await.map_err(|e| e.to_string())
}

/// 清除图片
pub async fn clear_image(state: &AppState) -> Result<RunState, String> {
    state.analysis.clear().await.map_err(|e| e.to_string())
}

/// 开始分析，返回运行ID
///
/// 结果通过事件总线异步送达
pub async fn analyze(state: &AppState) -> Result<u64, String> {
    state.analysis.analyze().await.map_err(|e| e.to_string())
}

/// 重置分析
pub async fn reset_analysis(state: &AppState) -> Result<RunState, String> {
    state.analysis.reset().await.map_err(|e| e.to_string())
}

/// 获取当前状态
pub async fn get_run_state(state: &AppState) -> Result<RunState, String> {
    state.analysis.state().await.map_err(|e| e.to_string())
}

/// 导出结果图片
///
/// 未指定目录时使用配置中的导出目录，再退回到数据目录下的 exports
pub async fn export_result_images(
    state: &AppState,
    dir: Option<PathBuf>,
) -> Result<Vec<PathBuf>, String> {
    let run_state = state.analysis.state().await.map_err(|e| e.to_string())?;
    let result = run_state
        .result
        .ok_or_else(|| "暂无分析结果".to_string())?;

    let dir = match dir {
        Some(dir) => dir,
        None => match state.settings.get().await.export_dir {
            Some(dir) => PathBuf::from(dir),
            None => file_system::get_data_dir().join("exports"),
        },
    };

    let written = file_system::export_result_images(&result, &dir)
        .await
        .map_err(|e| format!("导出结果图片失败: {:#}", e))?;
    info!("共导出 {} 张结果图片到 {:?}", written.len(), dir);
    Ok(written)
}
