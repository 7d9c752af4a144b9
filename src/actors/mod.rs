// Actor模块 - 使用Actor模式管理会话状态
//
// 分析会话的状态只在Actor任务内修改，外部通过Handle发送消息
// 不需要 Arc<Mutex<T>>，也不存在并发写入同一状态的问题

pub mod analysis_session;

pub use analysis_session::{AnalysisCommand, AnalysisHandle, AnalysisSessionActor, SessionOptions};
