// 小麦病害分析客户端 - 主库

// 声明模块
pub mod actors;
pub mod analysis;
pub mod app;
pub mod capture;
pub mod commands;
pub mod error;
pub mod event_bus;
pub mod inference;
pub mod logger;
pub mod models;
pub mod render;
pub mod settings;
pub mod utils;

use std::sync::Arc;

use actors::AnalysisHandle;
use event_bus::EventBus;
use settings::SettingsManager;

pub use app::{run, run_with, Cli};
pub use error::AnalysisError;

/// 应用状态
///
/// - 分析会话：唯一持有并修改会话状态的 Actor 的句柄
/// - 事件总线：展示层通过它订阅进度和提示
/// - 设置管理：持久化配置
#[derive(Clone)]
pub struct AppState {
    /// 分析会话句柄
    pub analysis: AnalysisHandle,
    /// 事件总线
    pub event_bus: Arc<EventBus>,
    /// 设置管理器
    pub settings: Arc<SettingsManager>,
}

impl AppState {
    pub fn new(
        analysis: AnalysisHandle,
        event_bus: Arc<EventBus>,
        settings: Arc<SettingsManager>,
    ) -> Self {
        Self {
            analysis,
            event_bus,
            settings,
        }
    }
}
