use std::collections::HashMap;

use crate::detect::{BBox, ClassFilter, Detection};

/// 会话状态 (Session State)
///
/// 控制面板与处理管线共享的单实例可变状态。应用持有唯一一份,
/// 以 `&mut` 显式传入调度循环与指令处理, 不存在全局变量;
/// 两侧运行在同一线程上, 严格交错, 无需加锁。
pub struct SessionState {
    /// 当前生效的检测类别 (写: 指令处理; 读: 帧处理)
    selected_class: ClassFilter,
    /// 最近一次检测通过的分组结果 (键为类别过滤名)
    pub last_detections: HashMap<&'static str, Vec<Detection>>,
    /// 显示循环tick计数, 每tick恰好加一 (与是否执行检测无关)
    pub frame_counter: u64,
    /// 追踪ID → 最近一次出现的检测框 (后写覆盖, 不做插值或过期淘汰)
    pub tracked_positions: HashMap<u32, BBox>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            selected_class: ClassFilter::Default,
            last_detections: HashMap::new(),
            frame_counter: 0,
            tracked_positions: HashMap::new(),
        }
    }

    pub fn get_selected_class(&self) -> ClassFilter {
        self.selected_class
    }

    /// 切换检测类别, 返回是否发生了变化
    ///
    /// 未知名称与重复选择都按无操作处理 (不报错, 显示循环保持运行);
    /// 真正切换时原子替换并清空过期的分组缓存, 新过滤在下一处理周期生效。
    pub fn set_selected_class(&mut self, name: &str) -> bool {
        let Some(filter) = ClassFilter::from_name(name) else {
            log::warn!("忽略未知检测类别: {name}");
            return false;
        };
        if filter == self.selected_class {
            return false;
        }
        self.selected_class = filter;
        self.last_detections.clear();
        true
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::TrackId;

    fn sample_detection() -> Detection {
        Detection::new(
            BBox {
                x1: 0.0,
                y1: 0.0,
                x2: 10.0,
                y2: 10.0,
            },
            0.9,
            0,
            TrackId::Id(1),
        )
    }

    #[test]
    fn test_unknown_class_is_noop() {
        let mut state = SessionState::new();
        state.set_selected_class("Person");
        state.last_detections.insert("Person", vec![sample_detection()]);

        assert!(!state.set_selected_class("Spaceship"));
        assert_eq!(state.get_selected_class(), ClassFilter::Person);
        assert_eq!(state.last_detections.len(), 1);
    }

    #[test]
    fn test_same_class_keeps_cache() {
        let mut state = SessionState::new();
        state.set_selected_class("Person");
        state.last_detections.insert("Person", vec![sample_detection()]);

        assert!(!state.set_selected_class("Person"));
        assert_eq!(state.last_detections.len(), 1);
    }

    #[test]
    fn test_class_change_clears_stale_cache() {
        let mut state = SessionState::new();
        state.last_detections.insert("Default", vec![sample_detection()]);

        assert!(state.set_selected_class("Car"));
        assert_eq!(state.get_selected_class(), ClassFilter::Car);
        assert!(state.last_detections.is_empty());
    }
}
