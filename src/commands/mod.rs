//! 命令模块
//!
//! 展示层调用的所有命令接口，按功能分组：
//! - control: 图片选择与分析控制命令
//! - config: 配置管理命令
//!
//! 命令统一返回 `Result<T, String>`，错误信息可直接展示给用户

pub mod config;
pub mod control;

// 重新导出所有命令
pub use config::*;
pub use control::*;
