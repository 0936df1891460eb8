use ab_glyph::{FontArc, PxScale};
use anyhow::{anyhow, Result};
/// 检测器接口与内置桩实现
/// 职责: 输入一帧 → 输出叠加帧 + 结构化检测列表
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use super::types::{BBox, Detection, TrackId};
use crate::source::Frame;

/// 检测能力统一接口
///
/// `class_filter` 为 None 时不限制类别; 否则只返回索引集内的目标。
/// 返回值第一项是已绘制检测框的叠加帧, 第二项是结构化检测列表,
/// 两者对应同一帧 (追踪ID由检测库维护, 本系统不做插值)。
pub trait Detector {
    fn name(&self) -> &'static str;

    fn infer(
        &mut self,
        frame: &Frame,
        class_filter: Option<&[u32]>,
    ) -> Result<(Frame, Vec<Detection>)>;

    /// 释放检测库持有的窗口/显示句柄 (退出时调用, 尽力而为)
    fn close(&mut self) {}
}

// ========== 叠加绘制 ==========

const BOX_COLOR: Rgba<u8> = Rgba([0, 220, 60, 255]);
const LABEL_SCALE: f32 = 18.0;

/// 把检测框与标签绘制到帧像素上, 返回叠加帧
///
/// 无字体时只画框不画标签, 绝不因此报错。
pub fn draw_overlay(frame: &Frame, detections: &[Detection], font: Option<&FontArc>) -> Result<Frame> {
    let mut canvas = RgbaImage::from_raw(frame.width, frame.height, frame.rgba_data.clone())
        .ok_or_else(|| anyhow!("帧缓冲尺寸不匹配: {}x{}", frame.width, frame.height))?;

    for det in detections {
        let x = det.bbox.x1.max(0.0) as i32;
        let y = det.bbox.y1.max(0.0) as i32;
        let w = det.bbox.width().max(1.0) as u32;
        let h = det.bbox.height().max(1.0) as u32;

        // 双层矩形加粗边框
        draw_hollow_rect_mut(&mut canvas, Rect::at(x, y).of_size(w, h), BOX_COLOR);
        if w > 2 && h > 2 {
            draw_hollow_rect_mut(
                &mut canvas,
                Rect::at(x + 1, y + 1).of_size(w - 2, h - 2),
                BOX_COLOR,
            );
        }

        if let Some(font) = font {
            let label = match det.track {
                TrackId::Id(id) => format!("ID:{} {} {:.2}", id, det.class_name, det.confidence),
                TrackId::Untracked => format!("{} {:.2}", det.class_name, det.confidence),
            };
            let ty = (y - LABEL_SCALE as i32 - 2).max(0);
            draw_text_mut(
                &mut canvas,
                BOX_COLOR,
                x,
                ty,
                PxScale::from(LABEL_SCALE),
                font,
                &label,
            );
        }
    }

    Ok(Frame {
        rgba_data: canvas.into_raw(),
        width: frame.width,
        height: frame.height,
    })
}

// ========== 桩检测器 ==========

/// 确定性桩检测器 (Stub Detector)
///
/// 无模型环境下的默认实现: 按帧号生成若干沿固定轨道运动的目标,
/// 追踪ID稳定, 便于联调界面与调度链路。
pub struct StubDetector {
    tick: u64,
    font: Option<FontArc>,
}

impl StubDetector {
    pub fn new(font: Option<FontArc>) -> Self {
        Self { tick: 0, font }
    }

    /// 生成当前帧的全部目标 (过滤前)
    fn targets(&self, width: f32, height: f32) -> Vec<Detection> {
        let t = self.tick as f32 * 0.05;
        let cx = width / 2.0;
        let cy = height / 2.0;

        // 两个绕中心运动的人 + 一辆横向往返的车
        let orbit = |phase: f32, radius: f32| -> (f32, f32) {
            (cx + (t + phase).cos() * radius, cy + (t + phase).sin() * radius * 0.6)
        };
        let (p1x, p1y) = orbit(0.0, width * 0.25);
        let (p2x, p2y) = orbit(2.1, width * 0.35);
        let car_x = cx + (t * 0.7).sin() * width * 0.4;

        vec![
            Detection::new(
                BBox {
                    x1: p1x - 24.0,
                    y1: p1y - 48.0,
                    x2: p1x + 24.0,
                    y2: p1y + 48.0,
                },
                0.82 + 0.1 * (t * 1.3).sin(),
                0,
                TrackId::Id(1),
            ),
            Detection::new(
                BBox {
                    x1: p2x - 20.0,
                    y1: p2y - 44.0,
                    x2: p2x + 20.0,
                    y2: p2y + 44.0,
                },
                0.67 + 0.1 * (t * 0.9).cos(),
                0,
                TrackId::Id(2),
            ),
            Detection::new(
                BBox {
                    x1: car_x - 60.0,
                    y1: height * 0.7 - 26.0,
                    x2: car_x + 60.0,
                    y2: height * 0.7 + 26.0,
                },
                0.91,
                2,
                TrackId::Id(7),
            ),
        ]
    }
}

impl Detector for StubDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn infer(
        &mut self,
        frame: &Frame,
        class_filter: Option<&[u32]>,
    ) -> Result<(Frame, Vec<Detection>)> {
        self.tick += 1;

        let mut detections = self.targets(frame.width as f32, frame.height as f32);
        if let Some(indices) = class_filter {
            detections.retain(|d| indices.contains(&d.class_id));
        }

        let overlay = draw_overlay(frame, &detections, self.font.as_ref())?;
        Ok((overlay, detections))
    }
}
