// 测试用推理客户端 - 每次调用的响应由测试通过 oneshot 放行

use super::InferenceClient;
use crate::analysis::SelectedImage;
use crate::error::AnalysisError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::oneshot;

type Response = Result<Value, AnalysisError>;

/// 可控的假推理客户端
#[derive(Default)]
pub(crate) struct FakeInferenceClient {
    gates: Mutex<VecDeque<oneshot::Receiver<Response>>>,
    calls: AtomicUsize,
    uploaded: Mutex<Vec<String>>,
}

impl FakeInferenceClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// 为下一次调用准备一个闸门，返回用于放行响应的发送端
    pub(crate) fn push_gate(&self) -> oneshot::Sender<Response> {
        let (tx, rx) = oneshot::channel();
        self.gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(rx);
        tx
    }

    /// 下一次调用立即返回给定响应
    pub(crate) fn push_ready(&self, response: Response) {
        let _ = self.push_gate().send(response);
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 已上传的图片名称
    pub(crate) fn uploaded(&self) -> Vec<String> {
        self.uploaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl InferenceClient for FakeInferenceClient {
    fn name(&self) -> &str {
        "fake"
    }

    async fn analyze(&self, image: &SelectedImage) -> Result<Value, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.uploaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(image.name.clone());

        let gate = self
            .gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(AnalysisError::Transport("闸门已关闭".to_string()))),
            None => Err(AnalysisError::Transport("未准备响应".to_string())),
        }
    }
}
