use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::sync::RwLock;
use tracing::warn;

use crate::analysis::PacingConfig;
use crate::models::{AppConfig, PersistedAppConfig};
use crate::utils::validation::{validate_endpoint, validate_log_level, validate_pacing};

pub struct SettingsManager {
    path: PathBuf,
    data: RwLock<PersistedAppConfig>,
}

impl SettingsManager {
    pub async fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut initial = match tokio::fs::read(&path).await {
            Ok(bytes) if !bytes.is_empty() => {
                serde_json::from_slice::<PersistedAppConfig>(&bytes).unwrap_or_else(|e| {
                    warn!("配置文件解析失败，使用默认配置: {}", e);
                    PersistedAppConfig::default()
                })
            }
            _ => {
                let default = PersistedAppConfig::default();
                let json = serde_json::to_string_pretty(&default)?;
                tokio::fs::write(&path, json).await?;
                default
            }
        };

        if let Err(e) = validate_pacing(&initial.pacing) {
            warn!("进度节奏配置无效，使用默认值: {}", e);
            initial.pacing = PacingConfig::default();
        }

        Ok(Self {
            path,
            data: RwLock::new(initial),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self) -> PersistedAppConfig {
        self.data.read().await.clone()
    }

    pub async fn update(&self, update: AppConfig) -> Result<PersistedAppConfig> {
        if let Some(endpoint) = &update.endpoint {
            validate_endpoint(endpoint)?;
        }
        if let Some(level) = &update.log_level {
            validate_log_level(level)?;
        }
        if let Some(pacing) = &update.pacing {
            validate_pacing(pacing)?;
        }

        let mut config = self.data.write().await;

        if let Some(endpoint) = update.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(timeout) = update.request_timeout_secs {
            config.request_timeout_secs = timeout;
        }
        if let Some(pacing) = update.pacing {
            config.pacing = pacing;
        }
        if let Some(level) = update.log_level {
            config.log_level = level;
        }
        if let Some(dir) = update.export_dir {
            config.export_dir = (!dir.trim().is_empty()).then_some(dir);
        }

        self.save(&config).await?;
        Ok(config.clone())
    }

    async fn save(&self, config: &PersistedAppConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}
