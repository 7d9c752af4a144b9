//! 分析阶段与进度节奏
//!
//! 进度节奏只用于展示，与远程请求的实际完成时间无关：
//! - 四个非终止阶段按固定顺序推进
//! - 每个阶段有固定的目标进度（20 / 40 / 80 / 100）
//! - `generating` 的最后一步（100）只在分析成功时给出

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

/// 分析阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStage {
    #[default]
    Uploading,
    Preprocessing,
    Analyzing,
    Generating,
    Complete,
}

impl AnalysisStage {
    /// 需要节奏推进的阶段（按顺序）
    pub const PACED: [AnalysisStage; 4] = [
        AnalysisStage::Uploading,
        AnalysisStage::Preprocessing,
        AnalysisStage::Analyzing,
        AnalysisStage::Generating,
    ];

    /// 阶段结束时的目标进度
    pub fn target_progress(self) -> f64 {
        match self {
            Self::Uploading => 20.0,
            Self::Preprocessing => 40.0,
            Self::Analyzing => 80.0,
            Self::Generating | Self::Complete => 100.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uploading => "uploading",
            Self::Preprocessing => "preprocessing",
            Self::Analyzing => "analyzing",
            Self::Generating => "generating",
            Self::Complete => "complete",
        }
    }

    /// 展示用标题
    pub fn title(self) -> &'static str {
        match self {
            Self::Uploading => "上传图片",
            Self::Preprocessing => "预处理",
            Self::Analyzing => "AI 分析",
            Self::Generating => "生成结果",
            Self::Complete => "分析完成",
        }
    }

    /// 展示用说明
    pub fn description(self) -> &'static str {
        match self {
            Self::Uploading => "正在准备小麦叶片图片...",
            Self::Preprocessing => "正在优化图像质量并提取特征...",
            Self::Analyzing => "ResNeSt50d 模型正在识别病害特征...",
            Self::Generating => "正在生成 HSV 可视化和分析报告...",
            Self::Complete => "结果已就绪！",
        }
    }
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 每个阶段插值步数上限
pub const MAX_STEPS_PER_STAGE: u32 = 1000;
/// 单个阶段时长上限（毫秒）
pub const MAX_STAGE_DELAY_MS: u64 = 60_000;

/// 进度节奏配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingConfig {
    /// 每个阶段的时长（毫秒），顺序同 `AnalysisStage::PACED`
    pub stage_delays_ms: [u64; 4],
    /// 每个阶段内的插值步数
    pub steps_per_stage: u32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            stage_delays_ms: [1000, 1500, 3000, 1000],
            steps_per_stage: 20,
        }
    }
}

impl PacingConfig {
    /// 不等待的节奏（所有帧立即推进）
    pub fn immediate() -> Self {
        Self {
            stage_delays_ms: [0; 4],
            steps_per_stage: 1,
        }
    }
}

/// 一帧进度：在 `delay` 之后把状态推进到 (stage, progress)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacingFrame {
    pub stage: AnalysisStage,
    pub progress: f64,
    pub delay: Duration,
}

/// 生成一次分析的全部节奏帧
///
/// 每个阶段先以上一阶段的目标值进入（无延迟），再分 `steps_per_stage`
/// 步插值到本阶段目标值。`generating` 不包含最后一步。
/// 步数限制在 1..=`MAX_STEPS_PER_STAGE`。
pub fn pacing_frames(config: &PacingConfig) -> VecDeque<PacingFrame> {
    let steps = config.steps_per_stage.clamp(1, MAX_STEPS_PER_STAGE);
    let mut frames = VecDeque::new();
    let mut start = 0.0;

    for (index, stage) in AnalysisStage::PACED.iter().copied().enumerate() {
        let target = stage.target_progress();
        let step_delay = Duration::from_millis(config.stage_delays_ms[index]) / steps;

        frames.push_back(PacingFrame {
            stage,
            progress: start,
            delay: Duration::ZERO,
        });

        let last_step = if stage == AnalysisStage::Generating {
            steps - 1
        } else {
            steps
        };
        for step in 1..=last_step {
            let progress = start + (target - start) * f64::from(step) / f64::from(steps);
            frames.push_back(PacingFrame {
                stage,
                progress,
                delay: step_delay,
            });
        }

        start = target;
    }

    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_step_frames_follow_stage_table() {
        let config = PacingConfig {
            stage_delays_ms: [100, 200, 300, 400],
            steps_per_stage: 1,
        };
        let frames: Vec<(AnalysisStage, f64)> = pacing_frames(&config)
            .into_iter()
            .map(|f| (f.stage, f.progress))
            .collect();

        assert_eq!(
            frames,
            vec![
                (AnalysisStage::Uploading, 0.0),
                (AnalysisStage::Uploading, 20.0),
                (AnalysisStage::Preprocessing, 20.0),
                (AnalysisStage::Preprocessing, 40.0),
                (AnalysisStage::Analyzing, 40.0),
                (AnalysisStage::Analyzing, 80.0),
                (AnalysisStage::Generating, 80.0),
            ]
        );
    }

    #[test]
    fn test_frames_are_monotonic_and_never_reach_100() {
        let frames = pacing_frames(&PacingConfig::default());

        let mut last_stage = AnalysisStage::Uploading;
        let mut last_progress = 0.0;
        for frame in &frames {
            assert!(frame.stage >= last_stage, "阶段不应回退");
            assert!(frame.progress >= last_progress, "进度不应回退");
            assert!(frame.progress < 100.0);
            last_stage = frame.stage;
            last_progress = frame.progress;
        }
        assert_eq!(last_stage, AnalysisStage::Generating);
    }

    #[test]
    fn test_step_delays_split_stage_duration() {
        let config = PacingConfig {
            stage_delays_ms: [1000, 1500, 3000, 1000],
            steps_per_stage: 20,
        };
        let frames = pacing_frames(&config);

        let uploading_total: Duration = frames
            .iter()
            .filter(|f| f.stage == AnalysisStage::Uploading)
            .map(|f| f.delay)
            .sum();
        assert_eq!(uploading_total, Duration::from_millis(1000));

        // generating 少一步
        let generating_steps = frames
            .iter()
            .filter(|f| f.stage == AnalysisStage::Generating && !f.delay.is_zero())
            .count();
        assert_eq!(generating_steps, 19);
    }

    #[test]
    fn test_zero_steps_treated_as_one() {
        let config = PacingConfig {
            stage_delays_ms: [0; 4],
            steps_per_stage: 0,
        };
        assert_eq!(pacing_frames(&config).len(), 7);
    }

    #[test]
    fn test_steps_are_capped() {
        let config = PacingConfig {
            stage_delays_ms: [0; 4],
            steps_per_stage: u32::MAX,
        };
        let frames = pacing_frames(&config);
        assert_eq!(frames.len(), 4 + 4 * MAX_STEPS_PER_STAGE as usize - 1);
    }

    #[test]
    fn test_stage_serializes_lowercase() {
        let json = serde_json::to_string(&AnalysisStage::Preprocessing).unwrap();
        assert_eq!(json, "\"preprocessing\"");
    }
}
