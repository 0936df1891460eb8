// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod config; // 运行参数与持久化配置
pub mod console; // 操作台界面 (macroquad + egui)
pub mod control; // 指令分发
pub mod detect; // 检测能力边界
pub mod processor; // 帧处理核心
pub mod sched; // 协作式调度器
pub mod source; // 视频输入能力边界
pub mod state; // 会话状态
pub mod telemetry; // 遥测采样

pub use crate::config::{Args, ConsoleConfig};
pub use crate::detect::{ClassFilter, Detection, Detector, TrackId};
pub use crate::processor::{FrameProcessor, FrameUpdate};
pub use crate::sched::{Scheduler, TaskId};
pub use crate::source::{Frame, FrameSource};
pub use crate::state::SessionState;

// ========== 公共常量 ==========

pub const WINDOW_WIDTH: i32 = 800;
pub const WINDOW_HEIGHT: i32 = 600;

/// 遥测刷新周期默认值 (毫秒)
pub const TELEMETRY_INTERVAL_MS: u64 = 500;

/// 检测跳帧间隔默认值: 每2帧执行一次检测
pub const SKIP_INTERVAL: u64 = 2;
