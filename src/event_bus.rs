// 事件总线 - 用于会话状态与展示层解耦
//
// 实现发布/订阅模式，展示层只订阅事件，不直接读取会话内部状态
// 使用 tokio::sync::broadcast 实现高效的事件分发

use crate::analysis::{AnalysisResult, AnalysisStage};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// 提示级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

/// 面向用户的短暂提示（toast）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// 应用事件枚举 - 定义所有可能的会话事件
#[derive(Debug, Clone)]
pub enum AppEvent {
    // --- 选择事件 ---

    /// 图片已选择
    ImageSelected {
        image_id: Uuid,
        name: String,
        size: u64,
    },

    /// 图片已清除（包括重置）
    SelectionCleared,

    // --- 分析事件 ---

    /// 分析开始事件
    AnalysisStarted {
        run_id: u64,
    },

    /// 阶段/进度推进
    StageAdvanced {
        run_id: u64,
        stage: AnalysisStage,
        progress: f64,
    },

    /// 分析完成事件
    AnalysisCompleted {
        run_id: u64,
        result: AnalysisResult,
    },

    /// 分析失败事件
    AnalysisFailed {
        run_id: u64,
        error: String,
    },

    // --- 提示事件 ---

    /// 用户提示
    Notification(Notification),
}

/// 事件总线
///
/// 使用 broadcast channel 实现发布/订阅模式
/// 支持多个订阅者同时接收事件
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl EventBus {
    /// 创建新的事件总线
    ///
    /// # 参数
    /// - `capacity`: 事件缓冲区大小，每次分析默认约80个进度事件，建议不小于256
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// 发布事件
    ///
    /// 如果没有订阅者，事件会被丢弃（这是正常的）
    pub fn publish(&self, event: AppEvent) {
        match self.sender.send(event) {
            Ok(receiver_count) => {
                tracing::trace!("事件已发布，订阅者数量: {}", receiver_count);
            }
            Err(_) => {
                tracing::trace!("事件已发布但无订阅者");
            }
        }
    }

    /// 发布用户提示
    pub fn notify(&self, notification: Notification) {
        self.publish(AppEvent::Notification(notification));
    }

    /// 订阅事件
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// 获取当前订阅者数量
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_basic() {
        let bus = EventBus::new(16);

        let mut receiver = bus.subscribe();
        bus.publish(AppEvent::AnalysisStarted { run_id: 1 });

        match receiver.recv().await {
            Ok(AppEvent::AnalysisStarted { run_id }) => {
                assert_eq!(run_id, 1);
            }
            _ => panic!("未收到预期事件"),
        }
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new(16);

        let mut receiver1 = bus.subscribe();
        let mut receiver2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.notify(Notification::success("图片已选择"));

        assert!(receiver1.try_recv().is_ok());
        assert!(receiver2.try_recv().is_ok());
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new(4);
        bus.publish(AppEvent::SelectionCleared);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
