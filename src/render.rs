// 终端展示 - 订阅会话事件并渲染进度与结果
//
// 只依赖事件总线上的事件和状态快照，不读取会话内部状态

use crate::analysis::AnalysisResult;
use crate::event_bus::{AppEvent, Notification, NotificationLevel};
use indicatif::{ProgressBar, ProgressStyle};

/// 图片缺失时的占位文字
pub const IMAGE_PLACEHOLDER: &str = "暂无图片";

/// 终端渲染器
pub struct TerminalRenderer {
    bar: ProgressBar,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::new(100))
    }

    /// 不输出到终端的渲染器
    #[cfg(test)]
    fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_length(100);
        Self { bar }
    }

    /// 处理一个会话事件
    pub fn on_event(&self, event: &AppEvent) {
        match event {
            AppEvent::ImageSelected { name, size, .. } => {
                self.bar
                    .println(format!("已选择: {} ({:.2} MB)", name, *size as f64 / 1024.0 / 1024.0));
            }
            AppEvent::SelectionCleared => {
                self.bar.reset();
                self.bar.set_message("");
            }
            AppEvent::AnalysisStarted { .. } => {
                self.bar.reset();
                self.bar.enable_steady_tick(std::time::Duration::from_millis(120));
            }
            AppEvent::StageAdvanced {
                stage, progress, ..
            } => {
                self.bar.set_position(progress.round() as u64);
                self.bar
                    .set_message(format!("{} - {}", stage.title(), stage.description()));
            }
            AppEvent::AnalysisCompleted { .. } => {
                self.bar.finish_with_message("分析完成");
            }
            AppEvent::AnalysisFailed { .. } => {
                self.bar.abandon();
            }
            AppEvent::Notification(notification) => {
                self.bar.println(format_notification(notification));
            }
        }
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn format_notification(notification: &Notification) -> String {
    let tag = match notification.level {
        NotificationLevel::Success => "✓",
        NotificationLevel::Info => "i",
        NotificationLevel::Error => "✗",
    };
    format!("[{}] {}", tag, notification.message)
}

fn describe_image(image: &Option<String>) -> String {
    match image.as_deref() {
        Some(uri) if uri.starts_with("data:") => {
            let mime = uri
                .strip_prefix("data:")
                .and_then(|rest| rest.split([';', ',']).next())
                .unwrap_or("");
            format!("内嵌图片 ({}, {} 字符)", mime, uri.len())
        }
        Some(url) => url.to_string(),
        None => IMAGE_PLACEHOLDER.to_string(),
    }
}

/// 格式化分析结果
pub fn format_result(result: &AnalysisResult) -> String {
    [
        format!("预测类别: {}", result.predicted_class),
        format!("健康比例: {:.1}%", result.healthy_percent),
        format!("感染比例: {:.1}%", result.infected_percent),
        format!("原始图片: {}", describe_image(&result.original_image)),
        format!("病害掩码: {}", describe_image(&result.mask_image)),
        format!("高亮图片: {}", describe_image(&result.highlighted_image)),
    ]
    .join("\n")
}
