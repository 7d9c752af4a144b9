//! 应用程序初始化和启动
//!
//! 负责命令行客户端的完整启动流程，包括：
//! - 配置加载
//! - 日志系统初始化
//! - 推理客户端与分析会话 Actor 启动
//! - 事件订阅与终端渲染

use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::actors::{AnalysisSessionActor, SessionOptions};
use crate::analysis::{AnalysisResult, PacingConfig};
use crate::commands;
use crate::event_bus::{AppEvent, EventBus};
use crate::inference::{build_http_client, HttpInferenceClient, InferenceClient};
use crate::logger;
use crate::render::{format_result, TerminalRenderer};
use crate::settings::SettingsManager;
use crate::utils::file_system::get_data_dir;
use crate::utils::validation::validate_endpoint;
use crate::AppState;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "wheat-vision")]
#[command(about = "小麦叶片病害分析客户端", long_about = None)]
#[command(version)]
pub struct Cli {
    /// 要分析的叶片图片
    pub image: PathBuf,

    /// 分析服务地址（覆盖配置文件）
    #[arg(long, env = "WHEAT_VISION_ENDPOINT")]
    pub endpoint: Option<String>,

    /// 结果图片导出目录
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// 配置文件路径
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// 跳过进度动画
    #[arg(long)]
    pub no_pacing: bool,

    /// 输出调试日志到终端
    #[arg(short, long)]
    pub verbose: bool,
}

/// 应用程序入口点
pub async fn run() -> Result<()> {
    run_with(Cli::parse()).await
}

/// 按给定参数运行一次分析
///
/// 启动顺序：
/// 1. 配置加载
/// 2. 日志系统初始化
/// 3. 推理客户端创建
/// 4. 分析会话 Actor 启动
/// 5. 选择图片并开始分析
pub async fn run_with(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| get_data_dir().join("config.json"));
    let settings = Arc::new(SettingsManager::new(config_path).await?);
    let config = settings.get().await;

    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.log_level.clone()
    };
    let log_dir = logger::init(&level, cli.verbose)?;
    info!("初始化小麦病害分析客户端...");
    info!("日志目录: {:?}，配置文件: {:?}", log_dir, settings.path());

    let endpoint = cli.endpoint.clone().unwrap_or_else(|| config.endpoint.clone());
    validate_endpoint(&endpoint)?;

    let mut options = SessionOptions::from_config(&config);
    if cli.no_pacing {
        options.pacing = PacingConfig::immediate();
    }

    let http_client = build_http_client()?;
    let client: Arc<dyn InferenceClient> =
        Arc::new(HttpInferenceClient::new(http_client, endpoint.clone()));
    info!("分析服务地址: {}", endpoint);

    let event_bus = Arc::new(EventBus::new(256));
    let (actor, handle) = AnalysisSessionActor::new(client, event_bus.clone(), options);
    tokio::spawn(actor.run());

    let state = AppState::new(handle, event_bus, settings);
    if !state.analysis.health_check().await {
        bail!("分析会话启动失败");
    }

    let renderer = TerminalRenderer::new();
    let mut events = state.event_bus.subscribe();

    commands::select_image(&state, &cli.image)
        .await
        .map_err(anyhow::Error::msg)?;
    if let Err(e) = commands::analyze(&state).await {
        drain_events(&renderer, &mut events);
        bail!(e);
    }

    let Some(result) = wait_for_outcome(&state, &renderer, &mut events).await? else {
        let run_state = commands::get_run_state(&state)
            .await
            .map_err(anyhow::Error::msg)?;
        return match run_state.last_error {
            Some(error) => bail!(error),
            None => Ok(()),
        };
    };

    println!("{}", format_result(&result));

    if cli.export_dir.is_some() || config.export_dir.is_some() {
        let written = commands::export_result_images(&state, cli.export_dir.clone())
            .await
            .map_err(anyhow::Error::msg)?;
        for path in written {
            println!("已导出: {}", path.display());
        }
    }

    Ok(())
}

/// 渲染事件直到本次分析结束
///
/// 成功返回结果；失败或被中断返回 None
async fn wait_for_outcome(
    state: &AppState,
    renderer: &TerminalRenderer,
    events: &mut tokio::sync::broadcast::Receiver<AppEvent>,
) -> Result<Option<AnalysisResult>> {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    renderer.on_event(&event);
                    match event {
                        AppEvent::AnalysisCompleted { result, .. } => return Ok(Some(result)),
                        AppEvent::AnalysisFailed { .. } => return Ok(None),
                        _ => {}
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("事件处理落后，跳过 {} 个事件", skipped);
                }
                Err(RecvError::Closed) => bail!("事件总线已关闭"),
            },
            _ = &mut ctrl_c => {
                info!("收到中断信号，重置分析");
                commands::reset_analysis(state)
                    .await
                    .map_err(anyhow::Error::msg)?;
                return Ok(None);
            }
        }
    }
}

fn drain_events(
    renderer: &TerminalRenderer,
    events: &mut tokio::sync::broadcast::Receiver<AppEvent>,
) {
    while let Ok(event) = events.try_recv() {
        renderer.on_event(&event);
    }
}
