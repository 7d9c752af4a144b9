// 推理服务模块 - 封装远程病害分类接口

pub mod http;

#[cfg(test)]
pub(crate) mod fake;

pub use http::{build_http_client, HttpInferenceClient};

use crate::analysis::SelectedImage;
use crate::error::AnalysisError;
use async_trait::async_trait;
use serde_json::Value;

/// 远程推理服务接口
///
/// 实现只负责传输：上传图片并返回弱类型的响应体，
/// 字段默认值由结果投影统一处理
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// 服务名称（用于日志）
    fn name(&self) -> &str;

    /// 上传图片并获取分析响应
    ///
    /// # 参数
    /// * `image` - 选中的图片
    ///
    /// # 返回
    /// * 响应体 JSON；非 2xx、网络错误、空响应都返回错误
    async fn analyze(&self, image: &SelectedImage) -> Result<Value, AnalysisError>;
}
