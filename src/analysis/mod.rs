//! 分析核心模块
//!
//! 负责分析流程的数据模型，包括：
//! - 阶段与进度节奏
//! - 会话状态聚合
//! - 远程响应的结果投影

pub mod projection;
pub mod stage;
pub mod state;

// 重新导出常用结构体和函数
pub use projection::{parse_body, project_result, UNKNOWN_CLASS};
pub use stage::{
    pacing_frames, AnalysisStage, PacingConfig, PacingFrame, MAX_STAGE_DELAY_MS,
    MAX_STEPS_PER_STAGE,
};
pub use state::{AnalysisResult, RunState, SelectedImage, SessionPhase};
