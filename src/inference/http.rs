// HTTP 推理客户端 - 通过 multipart 表单上传图片

use super::InferenceClient;
use crate::analysis::{parse_body, SelectedImage};
use crate::error::AnalysisError;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 默认分析服务地址
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/analyze";

/// 创建共享的 HTTP 客户端
///
/// 只设置连接超时，整体请求超时由分析会话控制
pub fn build_http_client() -> Result<Client> {
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    Ok(client)
}

/// 基于 reqwest 的推理客户端
pub struct HttpInferenceClient {
    client: Client,
    endpoint: String,
}

impl HttpInferenceClient {
    /// 创建客户端（接受共享的HTTP客户端以复用连接池）
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// 构建只包含 `file` 字段的 multipart 表单
    fn build_form(image: &SelectedImage) -> Result<multipart::Form, AnalysisError> {
        let mut part = multipart::Part::bytes(image.bytes().to_vec()).file_name(image.name.clone());
        if let Some(mime) = &image.mime_type {
            part = part.mime_str(mime)?;
        }
        Ok(multipart::Form::new().part("file", part))
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn analyze(&self, image: &SelectedImage) -> Result<Value, AnalysisError> {
        info!(
            "上传图片到分析服务: {} ({} 字节) -> {}",
            image.name, image.size, self.endpoint
        );

        let form = Self::build_form(image)?;
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("分析服务返回错误状态 {}: {}", status, body);
            return Err(AnalysisError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        debug!("收到分析响应: {} 字节", body.len());
        parse_body(&body)
    }
}
