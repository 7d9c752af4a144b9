// Analysis Session Actor - 分析流程状态机
//
// 会话状态只由本Actor持有，选择/清除/分析/重置都通过消息完成。
// 事件循环同时等待三类输入：外部命令、远程请求结果、进度节奏的下一帧。
// 每次运行分配新的代数，结果回传时代数不匹配即视为过期并丢弃。

use crate::analysis::{
    pacing_frames, project_result, AnalysisResult, AnalysisStage, PacingConfig, PacingFrame,
    RunState, SelectedImage, SessionPhase,
};
use crate::error::AnalysisError;
use crate::event_bus::{AppEvent, EventBus, Notification};
use crate::inference::InferenceClient;
use crate::models::PersistedAppConfig;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// 分析会话命令
pub enum AnalysisCommand {
    /// 选择图片
    Select {
        image: SelectedImage,
        reply: oneshot::Sender<RunState>,
    },

    /// 清除图片
    Clear { reply: oneshot::Sender<RunState> },

    /// 重置分析（回到未选择状态）
    Reset { reply: oneshot::Sender<RunState> },

    /// 开始分析，成功时返回运行ID
    Analyze {
        reply: oneshot::Sender<Result<u64, AnalysisError>>,
    },

    /// 获取状态快照
    GetState { reply: oneshot::Sender<RunState> },

    /// 更新会话参数（下一次运行生效）
    Configure {
        options: SessionOptions,
        reply: oneshot::Sender<()>,
    },

    /// 健康检查（Ping）
    HealthCheck { reply: oneshot::Sender<()> },
}

/// 远程请求完成后回传的结果
struct RemoteOutcome {
    run_id: u64,
    outcome: Result<Value, AnalysisError>,
}

/// 会话参数
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// 进度节奏
    pub pacing: PacingConfig,
    /// 远程请求超时，None 表示不限制
    pub request_timeout: Option<Duration>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            pacing: PacingConfig::default(),
            request_timeout: Some(Duration::from_secs(60)),
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &PersistedAppConfig) -> Self {
        Self {
            pacing: config.pacing.clone(),
            request_timeout: config.request_timeout(),
        }
    }
}

/// 分析会话Actor（状态无需锁）
pub struct AnalysisSessionActor {
    receiver: mpsc::Receiver<AnalysisCommand>,
    outcome_tx: mpsc::UnboundedSender<RemoteOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<RemoteOutcome>,
    client: Arc<dyn InferenceClient>,
    event_bus: Arc<EventBus>,
    options: SessionOptions,
    state: RunState,
    /// 当前运行代数，重置/选择/新运行时递增
    generation: u64,
    /// 剩余的进度帧
    pacing: VecDeque<PacingFrame>,
    /// 下一帧的到期时间
    next_frame_at: Option<Instant>,
    /// 节奏未走完时先到达的结果
    pending_result: Option<AnalysisResult>,
}

impl AnalysisSessionActor {
    /// 创建新的Actor
    pub fn new(
        client: Arc<dyn InferenceClient>,
        event_bus: Arc<EventBus>,
        options: SessionOptions,
    ) -> (Self, AnalysisHandle) {
        let (sender, receiver) = mpsc::channel(32);
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let actor = Self {
            receiver,
            outcome_tx,
            outcome_rx,
            client,
            event_bus,
            options,
            state: RunState::default(),
            generation: 0,
            pacing: VecDeque::new(),
            next_frame_at: None,
            pending_result: None,
        };
        let handle = AnalysisHandle { sender };
        (actor, handle)
    }

    /// 运行Actor（在单独的任务中运行）
    pub async fn run(mut self) {
        info!("分析会话 Actor 已启动 (推理服务: {})", self.client.name());

        loop {
            let deadline = self.next_frame_at;
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                Some(outcome) = self.outcome_rx.recv() => self.handle_outcome(outcome),
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.advance_pacing();
                }
            }
        }

        info!("分析会话 Actor 已停止");
    }

    fn handle_command(&mut self, cmd: AnalysisCommand) {
        match cmd {
            AnalysisCommand::Select { image, reply } => {
                self.select(image);
                let _ = reply.send(self.state.clone());
            }

            AnalysisCommand::Clear { reply } => {
                self.clear("清除图片");
                let _ = reply.send(self.state.clone());
            }

            AnalysisCommand::Reset { reply } => {
                self.clear("重置分析");
                let _ = reply.send(self.state.clone());
            }

            AnalysisCommand::Analyze { reply } => {
                let result = self.start_analysis();
                let _ = reply.send(result);
            }

            AnalysisCommand::GetState { reply } => {
                let _ = reply.send(self.state.clone());
            }

            AnalysisCommand::Configure { options, reply } => {
                info!("会话参数已更新: {:?}", options);
                self.options = options;
                let _ = reply.send(());
            }

            AnalysisCommand::HealthCheck { reply } => {
                let _ = reply.send(());
            }
        }
    }

    /// 检查迁移是否合法，不合法时记录并拒绝
    fn check_transition(&self, next: SessionPhase) -> bool {
        let current = self.state.phase();
        if current.can_transition_to(next) {
            true
        } else {
            warn!("拒绝非法状态迁移: {:?} -> {:?}", current, next);
            false
        }
    }

    /// 使进行中的运行失效
    fn invalidate_run(&mut self) {
        self.generation += 1;
        self.pacing.clear();
        self.next_frame_at = None;
        self.pending_result = None;
    }

    fn select(&mut self, image: SelectedImage) {
        if self.state.is_analyzing {
            info!("分析进行中选择了新图片，运行 {} 作废", self.generation);
        }
        self.invalidate_run();

        info!("已选择图片: {} ({:.2} MB)", image.name, image.size_mb());
        self.event_bus.publish(AppEvent::ImageSelected {
            image_id: image.id,
            name: image.name.clone(),
            size: image.size,
        });
        self.state.select(image);
        self.event_bus.notify(Notification::success("图片选择成功"));
    }

    fn clear(&mut self, reason: &str) {
        let was_running = self.state.is_analyzing;
        if was_running {
            info!("{}: 中止运行 {}", reason, self.generation);
        } else {
            info!("{}", reason);
        }
        self.invalidate_run();
        self.state.clear();
        self.event_bus.publish(AppEvent::SelectionCleared);
        if was_running {
            self.event_bus.notify(Notification::info("已取消当前分析"));
        }
    }

    fn start_analysis(&mut self) -> Result<u64, AnalysisError> {
        if self.state.is_analyzing {
            warn!("分析正在进行中 (运行 {})，忽略重复请求", self.generation);
            return Err(AnalysisError::AlreadyRunning);
        }

        let Some(image) = self.state.selection.clone() else {
            warn!("未选择图片，拒绝分析请求");
            let err = AnalysisError::NoImageSelected;
            self.event_bus.notify(Notification::error(err.user_message()));
            return Err(err);
        };

        if !self.check_transition(SessionPhase::Running) {
            return Err(AnalysisError::AlreadyRunning);
        }

        self.invalidate_run();
        let run_id = self.generation;
        self.state.begin_run();
        self.pacing = pacing_frames(&self.options.pacing);
        self.next_frame_at = Some(Instant::now());

        info!("开始分析 (运行 {}): {}", run_id, image.name);
        self.event_bus.publish(AppEvent::AnalysisStarted { run_id });
        self.spawn_request(run_id, image);

        Ok(run_id)
    }

    /// 发起远程请求，每次运行只发起一次
    fn spawn_request(&self, run_id: u64, image: SelectedImage) {
        let client = Arc::clone(&self.client);
        let outcome_tx = self.outcome_tx.clone();
        let timeout = self.options.request_timeout;

        tokio::spawn(async move {
            let request = client.analyze(&image);
            let outcome = match timeout {
                Some(limit) => match tokio::time::timeout(limit, request).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(AnalysisError::Timeout(limit)),
                },
                None => request.await,
            };
            // Actor已停止时无需回传
            let _ = outcome_tx.send(RemoteOutcome { run_id, outcome });
        });
    }

    fn advance_pacing(&mut self) {
        let Some(deadline) = self.next_frame_at.take() else {
            return;
        };
        let Some(frame) = self.pacing.pop_front() else {
            return;
        };

        if self.state.apply_frame(&frame) {
            debug!(
                "进度推进 (运行 {}): {} {:.1}%",
                self.generation, frame.stage, frame.progress
            );
            self.event_bus.publish(AppEvent::StageAdvanced {
                run_id: self.generation,
                stage: frame.stage,
                progress: frame.progress,
            });
        }

        if let Some(next) = self.pacing.front() {
            self.next_frame_at = Some(deadline + next.delay);
        } else if let Some(result) = self.pending_result.take() {
            self.complete_run(result);
        } else {
            debug!("进度节奏已结束，等待分析服务响应 (运行 {})", self.generation);
        }
    }

    fn handle_outcome(&mut self, remote: RemoteOutcome) {
        let RemoteOutcome { run_id, outcome } = remote;
        if run_id != self.generation || !self.state.is_analyzing {
            debug!(
                "丢弃过期的分析响应: 运行 {}，当前代数 {}",
                run_id, self.generation
            );
            return;
        }

        match outcome.and_then(|payload| project_result(&payload)) {
            Ok(result) if self.pacing.is_empty() => self.complete_run(result),
            Ok(result) => {
                debug!("分析服务已响应，等待进度节奏结束 (运行 {})", run_id);
                self.pending_result = Some(result);
            }
            Err(err) => self.fail_run(err),
        }
    }

    fn complete_run(&mut self, result: AnalysisResult) {
        if !self.check_transition(SessionPhase::Succeeded) {
            return;
        }
        let run_id = self.generation;
        info!(
            "分析完成 (运行 {}): {}，健康 {:.1}%，感染 {:.1}%",
            run_id, result.predicted_class, result.healthy_percent, result.infected_percent
        );

        self.state.succeed(result.clone());
        self.event_bus.publish(AppEvent::StageAdvanced {
            run_id,
            stage: AnalysisStage::Complete,
            progress: 100.0,
        });
        self.event_bus.notify(Notification::success("分析完成"));
        self.event_bus
            .publish(AppEvent::AnalysisCompleted { run_id, result });
    }

    fn fail_run(&mut self, err: AnalysisError) {
        if !self.check_transition(SessionPhase::Failed) {
            return;
        }
        let run_id = self.generation;
        error!("分析失败 (运行 {}): {}", run_id, err);
        if err.is_retryable() {
            info!("已保留图片，可直接重试");
        }

        self.pacing.clear();
        self.next_frame_at = None;
        self.pending_result = None;
        self.state.fail(err.to_string());

        self.event_bus.notify(Notification::error(err.user_message()));
        self.event_bus.publish(AppEvent::AnalysisFailed {
            run_id,
            error: err.to_string(),
        });
    }
}

/// 分析会话Handle（用于与Actor通信，可克隆）
#[derive(Clone)]
pub struct AnalysisHandle {
    sender: mpsc::Sender<AnalysisCommand>,
}

impl AnalysisHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> AnalysisCommand,
    ) -> Result<T, AnalysisError> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(build(reply))
            .await
            .map_err(|_| AnalysisError::SessionUnavailable)?;
        rx.await.map_err(|_| AnalysisError::SessionUnavailable)
    }

    /// 选择图片，替换当前图片并清除旧结果
    pub async fn select(&self, image: SelectedImage) -> Result<RunState, AnalysisError> {
        self.request(|reply| AnalysisCommand::Select { image, reply })
            .await
    }

    /// 清除图片
    pub async fn clear(&self) -> Result<RunState, AnalysisError> {
        self.request(|reply| AnalysisCommand::Clear { reply }).await
    }

    /// 重置分析
    pub async fn reset(&self) -> Result<RunState, AnalysisError> {
        self.request(|reply| AnalysisCommand::Reset { reply }).await
    }

    /// 开始分析
    ///
    /// 未选择图片返回 `NoImageSelected`，分析中返回 `AlreadyRunning`
    pub async fn analyze(&self) -> Result<u64, AnalysisError> {
        self.request(|reply| AnalysisCommand::Analyze { reply })
            .await?
    }

    /// 获取状态快照
    pub async fn state(&self) -> Result<RunState, AnalysisError> {
        self.request(|reply| AnalysisCommand::GetState { reply })
            .await
    }

    /// 更新会话参数，正在进行的运行不受影响
    pub async fn configure(&self, options: SessionOptions) -> Result<(), AnalysisError> {
        self.request(|reply| AnalysisCommand::Configure { options, reply })
            .await
    }

    /// 健康检查
    /// 返回true表示Actor正常运行，false表示Actor无响应或已停止
    /// 超时时间为5秒
    pub async fn health_check(&self) -> bool {
        let (reply, rx) = oneshot::channel();

        if self
            .sender
            .send(AnalysisCommand::HealthCheck { reply })
            .await
            .is_err()
        {
            tracing::warn!("分析会话 Actor 健康检查失败: 通道已关闭");
            return false;
        }

        match tokio::time::timeout(Duration::from_secs(5), rx).await {
            Ok(Ok(())) => {
                tracing::debug!("分析会话 Actor 健康检查成功");
                true
            }
            Ok(Err(_)) => {
                tracing::warn!("分析会话 Actor 健康检查失败: Actor已停止");
                false
            }
            Err(_) => {
                tracing::warn!("分析会话 Actor 健康检查失败: 超时(5秒)");
                false
            }
        }
    }
}
