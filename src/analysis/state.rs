//! 分析会话状态
//!
//! `RunState` 是每个会话唯一的状态聚合，只由分析会话Actor持有和修改。
//! 这里的方法只负责字段层面的变更，是否允许某个迁移由 `SessionPhase` 判断。

use super::stage::{AnalysisStage, PacingFrame};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// 用户选中的图片
///
/// 创建后不可修改，重新选择时整体替换
#[derive(Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedImage {
    /// 唯一ID
    pub id: Uuid,
    /// 显示名称（上传时作为文件名）
    pub name: String,
    /// 字节数
    pub size: u64,
    /// 嗅探得到的MIME类型
    pub mime_type: Option<String>,
    #[serde(skip)]
    bytes: Arc<Vec<u8>>,
}

impl SelectedImage {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            size: bytes.len() as u64,
            mime_type: None,
            bytes: Arc::new(bytes),
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// 原始图片数据
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 以MB为单位的大小
    pub fn size_mb(&self) -> f64 {
        self.size as f64 / 1024.0 / 1024.0
    }
}

impl fmt::Debug for SelectedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedImage")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("size", &self.size)
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// 一次成功分析的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// 病害类别
    pub predicted_class: String,
    /// 健康区域占比
    pub healthy_percent: f64,
    /// 感染区域占比
    pub infected_percent: f64,
    /// 原图（URL 或 data URI）
    pub original_image: Option<String>,
    /// 感染区域掩码图
    pub mask_image: Option<String>,
    /// 高亮标注图
    pub highlighted_image: Option<String>,
}

/// 由 `RunState` 推导出的会话阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// 未选择图片
    Idle,
    /// 已选择图片，未在分析
    Ready,
    /// 分析中
    Running,
    /// 分析成功，结果可展示
    Succeeded,
    /// 分析失败，保留图片可重试
    Failed,
}

impl SessionPhase {
    /// 判断迁移是否合法
    pub fn can_transition_to(self, next: SessionPhase) -> bool {
        use SessionPhase::*;
        match (self, next) {
            // 清除/重置在任何时候都允许
            (_, Idle) => true,
            // 选择图片（运行中选择会使当前运行失效）
            (_, Ready) => true,
            (Ready | Succeeded | Failed, Running) => true,
            (Running, Succeeded | Failed) => true,
            _ => false,
        }
    }
}

/// 会话状态聚合
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    pub is_analyzing: bool,
    pub stage: AnalysisStage,
    pub progress: f64,
    pub result: Option<AnalysisResult>,
    pub selection: Option<SelectedImage>,
    /// 最近一次失败的错误信息
    pub last_error: Option<String>,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            is_analyzing: false,
            stage: AnalysisStage::Uploading,
            progress: 0.0,
            result: None,
            selection: None,
            last_error: None,
        }
    }
}

impl RunState {
    pub fn phase(&self) -> SessionPhase {
        if self.is_analyzing {
            SessionPhase::Running
        } else if self.result.is_some() {
            SessionPhase::Succeeded
        } else if self.selection.is_none() {
            SessionPhase::Idle
        } else if self.last_error.is_some() {
            SessionPhase::Failed
        } else {
            SessionPhase::Ready
        }
    }

    /// 替换选中图片，并清除旧结果
    pub(crate) fn select(&mut self, image: SelectedImage) {
        *self = Self {
            selection: Some(image),
            ..Self::default()
        };
    }

    /// 回到初始状态
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn begin_run(&mut self) {
        self.is_analyzing = true;
        self.stage = AnalysisStage::Uploading;
        self.progress = 0.0;
        self.result = None;
        self.last_error = None;
    }

    /// 应用一帧进度，拒绝回退
    pub(crate) fn apply_frame(&mut self, frame: &PacingFrame) -> bool {
        if !self.is_analyzing || frame.stage < self.stage || frame.progress < self.progress {
            return false;
        }
        self.stage = frame.stage;
        self.progress = frame.progress.clamp(0.0, 100.0);
        true
    }

    pub(crate) fn succeed(&mut self, result: AnalysisResult) {
        self.is_analyzing = false;
        self.stage = AnalysisStage::Complete;
        self.progress = 100.0;
        self.result = Some(result);
        self.last_error = None;
    }

    /// 失败时保留图片和阶段，便于直接重试
    pub(crate) fn fail(&mut self, message: String) {
        self.is_analyzing = false;
        self.result = None;
        self.last_error = Some(message);
    }
}
