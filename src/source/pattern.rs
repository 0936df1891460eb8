use anyhow::Result;

use super::{Frame, FrameSource};

/// 内置测试图源 (Synthetic Test Pattern)
///
/// 无摄像头/无FFmpeg环境下的默认帧源: 生成缓慢滚动的网格渐变画面,
/// 帧号驱动, 完全确定。`with_limit` 用于模拟有限长度的视频流。
pub struct PatternSource {
    width: u32,
    height: u32,
    tick: u64,
    limit: Option<u64>,
    released: bool,
}

impl PatternSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tick: 0,
            limit: None,
            released: false,
        }
    }

    /// 产出 `limit` 帧后报告流结束
    pub fn with_limit(width: u32, height: u32, limit: u64) -> Self {
        Self {
            limit: Some(limit),
            ..Self::new(width, height)
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl FrameSource for PatternSource {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if let Some(limit) = self.limit {
            if self.tick >= limit {
                return Ok(None);
            }
        }
        self.tick += 1;

        let shift = (self.tick * 2) as u32;
        let mut frame = Frame::black(self.width, self.height);
        for y in 0..self.height {
            let row = (y * self.width * 4) as usize;
            for x in 0..self.width {
                let i = row + (x * 4) as usize;
                let gx = (x + shift) % 64;
                let gy = (y + shift / 2) % 64;
                // 暗底 + 网格线 + 对角渐变
                let grid = if gx < 2 || gy < 2 { 90 } else { 0 };
                frame.rgba_data[i] = (20 + grid) as u8;
                frame.rgba_data[i + 1] = (28 + grid + (x * 40 / self.width.max(1)) as u32) as u8;
                frame.rgba_data[i + 2] = (36 + grid + (y * 40 / self.height.max(1)) as u32) as u8;
            }
        }
        Ok(Some(frame))
    }

    fn release(&mut self) {
        self.released = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_geometry() {
        let mut src = PatternSource::new(64, 48);
        let frame = src.next_frame().unwrap().unwrap();
        assert_eq!(frame.width, 64);
        assert_eq!(frame.height, 48);
        assert_eq!(frame.rgba_data.len(), 64 * 48 * 4);
    }

    #[test]
    fn test_limited_source_reports_end_of_stream() {
        let mut src = PatternSource::with_limit(16, 16, 2);
        assert!(src.next_frame().unwrap().is_some());
        assert!(src.next_frame().unwrap().is_some());
        assert!(src.next_frame().unwrap().is_none());
        // 结束后保持结束
        assert!(src.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut src = PatternSource::new(16, 16);
        src.release();
        src.release();
        assert!(src.is_released());
    }
}
