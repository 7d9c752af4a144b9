//! 配置管理命令
//!
//! 提供应用配置的读取和更新接口。
//! 进度节奏和超时对下一次分析生效，服务地址在下次启动时生效。

use crate::actors::SessionOptions;
use crate::models::{AppConfig, PersistedAppConfig};
use crate::AppState;
use tracing::info;

/// 获取应用配置
pub async fn get_config(state: &AppState) -> Result<PersistedAppConfig, String> {
    Ok(state.settings.get().await)
}

/// 更新配置
pub async fn update_config(
    state: &AppState,
    config: AppConfig,
) -> Result<PersistedAppConfig, String> {
    let session_changed = config.pacing.is_some() || config.request_timeout_secs.is_some();
    let endpoint_changed = config.endpoint.is_some();

    let updated_config = state
        .settings
        .update(config)
        .await
        .map_err(|e| e.to_string())?;

    if session_changed {
        state
            .analysis
            .configure(SessionOptions::from_config(&updated_config))
            .await
            .map_err(|e| e.to_string())?;
    }

    if endpoint_changed {
        info!("分析服务地址已更新为 {}，重启后生效", updated_config.endpoint);
    }

    Ok(updated_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::PacingConfig;
    use crate::commands::test_support::test_state;

    #[tokio::test]
    async fn test_update_config_persists_patch() {
        let (state, _client, _dir) = test_state().await;

        let updated = update_config(
            &state,
            AppConfig {
                request_timeout_secs: Some(0),
                pacing: Some(PacingConfig::immediate()),
                ..AppConfig::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.request_timeout_secs, 0);
        assert_eq!(get_config(&state).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_config_rejects_bad_endpoint() {
        let (state, _client, _dir) = test_state().await;
        let before = get_config(&state).await.unwrap();

        let result = update_config(
            &state,
            AppConfig {
                endpoint: Some("localhost".to_string()),
                ..AppConfig::default()
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(get_config(&state).await.unwrap(), before);
    }
}
