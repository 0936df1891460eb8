/// 检测能力边界 (Detection Capability Boundary)
///
/// 推理由外部检测/追踪库完成, 本模块只定义:
/// - Detector: 统一接口 (帧 + 可选类别限制 → 叠加帧 + 结构化检测)
/// - 边界数据结构与类别过滤
pub mod detector;
pub mod types;

pub use detector::{draw_overlay, Detector, StubDetector};
pub use types::{class_label, BBox, ClassFilter, Detection, TrackId, CLASS_NAMES};
