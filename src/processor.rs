use std::collections::HashMap;
use std::time::Instant;

use ab_glyph::{FontArc, PxScale};
use anyhow::Result;
use image::{ImageBuffer, Rgba};
use imageproc::drawing::draw_text_mut;

use crate::detect::{Detection, Detector, TrackId};
use crate::source::{Frame, FrameSource};
use crate::state::SessionState;

/// 帧处理核心 (Frame Processor)
///
/// 把一帧原始画面变成可渲染的叠加帧 + 按类别分组的检测表,
/// 由跳帧间隔限流: 检测调用频率与源帧率解耦。

/// FPS文字叠加位置与样式
const FPS_POS: (i32, i32) = (10, 10);
const FPS_SCALE: f32 = 24.0;
const FPS_COLOR: Rgba<u8> = Rgba([0, 220, 60, 255]);

/// 一次处理的结果
pub enum FrameUpdate {
    /// 完成了一次检测通过
    Rendered {
        frame: Frame,
        detections: HashMap<&'static str, Vec<Detection>>,
    },
    /// 被跳帧限流挡下, 本tick无更新 (既非错误也非帧)
    Skipped,
    /// 帧源报告流结束; 是否停止或重开由调用方决定
    EndOfStream,
}

pub struct FrameProcessor {
    /// 每 skip_interval 个tick执行一次检测 (>= 1)
    skip_interval: u64,
    /// 上一次成功检测通过的时间戳
    last_pass: Option<Instant>,
    last_fps: f64,
    font: Option<FontArc>,
}

impl FrameProcessor {
    pub fn new(skip_interval: u64, font: Option<FontArc>) -> Self {
        Self {
            skip_interval: skip_interval.max(1),
            last_pass: None,
            last_fps: 0.0,
            font,
        }
    }

    /// 最近一次检测通过的FPS (首次通过为 0)
    pub fn fps(&self) -> f64 {
        self.last_fps
    }

    /// 处理一个显示tick
    ///
    /// `now` 由调度循环传入, 同时作为FPS测量的时间基准。
    /// 类别过滤读取自会话状态, 切换在下一周期生效, 不影响在途帧。
    pub fn process(
        &mut self,
        source: &mut dyn FrameSource,
        detector: &mut dyn Detector,
        state: &mut SessionState,
        now: Instant,
    ) -> Result<FrameUpdate> {
        // 1. tick计数, 无论是否执行检测都恰好加一
        state.frame_counter += 1;

        // 2. 跳帧限流
        if state.frame_counter % self.skip_interval != 0 {
            return Ok(FrameUpdate::Skipped);
        }

        // 3. 拉取下一帧
        let Some(frame) = source.next_frame()? else {
            return Ok(FrameUpdate::EndOfStream);
        };

        // 4.-5. 解析类别限制并调用检测库
        let selected = state.get_selected_class();
        let (mut overlay, raw_detections) = detector.infer(&frame, selected.class_indices())?;

        // 6. FPS = 与上一次成功检测通过的墙钟间隔的倒数
        let fps = match self.last_pass {
            Some(prev) => {
                let dt = now.duration_since(prev).as_secs_f64();
                if dt > 0.0 {
                    1.0 / dt
                } else {
                    0.0
                }
            }
            None => 0.0,
        };
        self.last_pass = Some(now);
        self.last_fps = fps;
        self.stamp_fps(&mut overlay, fps);

        // 7. 过滤并按当前类别名分组
        let kept: Vec<Detection> = raw_detections
            .into_iter()
            .filter(|d| selected.matches(d.class_id))
            .collect();

        // 8. 追踪位置后写覆盖; 无追踪ID的检测不进表
        for det in &kept {
            if let TrackId::Id(id) = det.track {
                state.tracked_positions.insert(id, det.bbox);
            }
        }

        // 9. 写回会话状态并返回
        let mut detections = HashMap::new();
        detections.insert(selected.name(), kept);
        state.last_detections = detections.clone();

        Ok(FrameUpdate::Rendered {
            frame: overlay,
            detections,
        })
    }

    /// 把FPS文字印到帧的固定位置; 无字体时不叠加
    fn stamp_fps(&self, frame: &mut Frame, fps: f64) {
        let Some(font) = &self.font else {
            return;
        };
        let (width, height) = (frame.width, frame.height);
        let Some(mut canvas) = ImageBuffer::<Rgba<u8>, &mut [u8]>::from_raw(
            width,
            height,
            frame.rgba_data.as_mut_slice(),
        ) else {
            // 检测库返回的帧缓冲不完整, 放弃叠加
            return;
        };
        draw_text_mut(
            &mut canvas,
            FPS_COLOR,
            FPS_POS.0,
            FPS_POS.1,
            PxScale::from(FPS_SCALE),
            font,
            &format!("FPS: {:.1}", fps),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BBox;
    use std::time::Duration;

    /// 计数帧源: 记录拉取与释放次数
    struct FakeSource {
        pulls: u64,
        exhausted: bool,
    }

    impl FakeSource {
        fn new() -> Self {
            Self {
                pulls: 0,
                exhausted: false,
            }
        }
    }

    impl FrameSource for FakeSource {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn next_frame(&mut self) -> Result<Option<Frame>> {
            if self.exhausted {
                return Ok(None);
            }
            self.pulls += 1;
            Ok(Some(Frame::black(32, 32)))
        }

        fn release(&mut self) {}
    }

    /// 脚本检测器: 每次调用返回预设的检测列表
    struct FakeDetector {
        script: Vec<Vec<Detection>>,
        calls: u64,
    }

    impl FakeDetector {
        fn new(script: Vec<Vec<Detection>>) -> Self {
            Self { script, calls: 0 }
        }
    }

    impl Detector for FakeDetector {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn infer(
            &mut self,
            frame: &Frame,
            _class_filter: Option<&[u32]>,
        ) -> Result<(Frame, Vec<Detection>)> {
            let idx = self.calls as usize;
            self.calls += 1;
            let dets = self.script.get(idx).cloned().unwrap_or_default();
            Ok((frame.clone(), dets))
        }
    }

    fn det(class_id: u32, track: TrackId, x1: f32) -> Detection {
        Detection::new(
            BBox {
                x1,
                y1: 0.0,
                x2: x1 + 10.0,
                y2: 10.0,
            },
            0.9,
            class_id,
            track,
        )
    }

    #[test]
    fn test_detection_runs_only_on_skip_interval() {
        let mut source = FakeSource::new();
        let mut detector = FakeDetector::new(vec![]);
        let mut state = SessionState::new();
        let mut processor = FrameProcessor::new(2, None);
        let t0 = Instant::now();

        let mut pattern = Vec::new();
        for i in 0..4u64 {
            let update = processor
                .process(&mut source, &mut detector, &mut state, t0 + Duration::from_millis(i))
                .unwrap();
            pattern.push(matches!(update, FrameUpdate::Rendered { .. }));
        }

        // skip_interval=2: tick 1,2,3,4 → 检测只在 2 和 4 执行
        assert_eq!(pattern, vec![false, true, false, true]);
        assert_eq!(detector.calls, 2);
        assert_eq!(source.pulls, 2);
        assert_eq!(state.frame_counter, 4);
    }

    #[test]
    fn test_skipped_tick_leaves_cache_untouched() {
        let mut source = FakeSource::new();
        let mut detector = FakeDetector::new(vec![]);
        let mut state = SessionState::new();
        state.last_detections.insert("Default", vec![det(0, TrackId::Id(9), 1.0)]);
        let mut processor = FrameProcessor::new(2, None);

        let update = processor
            .process(&mut source, &mut detector, &mut state, Instant::now())
            .unwrap();

        assert!(matches!(update, FrameUpdate::Skipped));
        assert_eq!(state.last_detections["Default"].len(), 1);
        assert_eq!(source.pulls, 0);
    }

    #[test]
    fn test_end_of_stream_still_counts_ticks() {
        let mut source = FakeSource::new();
        source.exhausted = true;
        let mut detector = FakeDetector::new(vec![]);
        let mut state = SessionState::new();
        let mut processor = FrameProcessor::new(1, None);

        let update = processor
            .process(&mut source, &mut detector, &mut state, Instant::now())
            .unwrap();

        assert!(matches!(update, FrameUpdate::EndOfStream));
        assert_eq!(state.frame_counter, 1);
        assert_eq!(processor.fps(), 0.0);
    }

    #[test]
    fn test_fps_zero_then_reciprocal_of_delta() {
        let mut source = FakeSource::new();
        let mut detector = FakeDetector::new(vec![]);
        let mut state = SessionState::new();
        let mut processor = FrameProcessor::new(1, None);
        let t1 = Instant::now();
        let t2 = t1 + Duration::from_millis(250);

        processor
            .process(&mut source, &mut detector, &mut state, t1)
            .unwrap();
        assert_eq!(processor.fps(), 0.0);

        processor
            .process(&mut source, &mut detector, &mut state, t2)
            .unwrap();
        assert!((processor.fps() - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_person_filter_groups_matching_detections() {
        // 检测库返回类别 [0, 2, 0], Person=[0] → 分组结果恰好2条
        let script = vec![vec![
            det(0, TrackId::Id(1), 0.0),
            det(2, TrackId::Id(2), 20.0),
            det(0, TrackId::Id(3), 40.0),
        ]];
        let mut source = FakeSource::new();
        let mut detector = FakeDetector::new(script);
        let mut state = SessionState::new();
        state.set_selected_class("Person");
        let mut processor = FrameProcessor::new(1, None);

        let update = processor
            .process(&mut source, &mut detector, &mut state, Instant::now())
            .unwrap();

        let FrameUpdate::Rendered { detections, .. } = update else {
            panic!("expected a rendered update");
        };
        assert_eq!(detections["Person"].len(), 2);
        assert!(detections["Person"].iter().all(|d| d.class_id == 0));
        assert_eq!(state.last_detections["Person"].len(), 2);
    }

    #[test]
    fn test_class_change_is_not_retroactive() {
        let script = vec![vec![det(0, TrackId::Id(1), 0.0)]];
        let mut source = FakeSource::new();
        let mut detector = FakeDetector::new(script);
        let mut state = SessionState::new();
        state.set_selected_class("Person");
        let mut processor = FrameProcessor::new(1, None);

        let update = processor
            .process(&mut source, &mut detector, &mut state, Instant::now())
            .unwrap();
        let FrameUpdate::Rendered { detections, .. } = update else {
            panic!("expected a rendered update");
        };

        // 换类别后, 已经分组输出的上一轮结果保持原样
        state.set_selected_class("Car");
        assert_eq!(detections["Person"].len(), 1);
        assert_eq!(detections["Person"][0].class_id, 0);
    }

    #[test]
    fn test_tracked_positions_last_write_wins() {
        // 同一追踪ID两帧出现 + 同帧重复 + 无追踪ID
        let script = vec![
            vec![
                det(0, TrackId::Id(5), 0.0),
                det(0, TrackId::Id(5), 100.0), // 同帧重复: 后处理者胜
                det(0, TrackId::Untracked, 300.0),
            ],
            vec![det(0, TrackId::Id(5), 200.0)],
        ];
        let mut source = FakeSource::new();
        let mut detector = FakeDetector::new(script);
        let mut state = SessionState::new();
        let mut processor = FrameProcessor::new(1, None);
        let t0 = Instant::now();

        processor.process(&mut source, &mut detector, &mut state, t0).unwrap();
        assert_eq!(state.tracked_positions.len(), 1);
        assert_eq!(state.tracked_positions[&5].x1, 100.0);

        processor
            .process(&mut source, &mut detector, &mut state, t0 + Duration::from_millis(50))
            .unwrap();
        assert_eq!(state.tracked_positions[&5].x1, 200.0);
    }

    #[test]
    fn test_zero_skip_interval_is_clamped() {
        let mut source = FakeSource::new();
        let mut detector = FakeDetector::new(vec![]);
        let mut state = SessionState::new();
        // 0 会导致取模除零, 构造时收敛到 1 (每tick检测)
        let mut processor = FrameProcessor::new(0, None);

        let update = processor
            .process(&mut source, &mut detector, &mut state, Instant::now())
            .unwrap();
        assert!(matches!(update, FrameUpdate::Rendered { .. }));
    }
}
