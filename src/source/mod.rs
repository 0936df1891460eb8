/// 视频输入能力边界 (Frame Source Capability Boundary)
///
/// 解码由外部库完成, 本模块只定义拉取契约:
/// - PatternSource: 内置测试图源 (默认, 无外部依赖)
/// - FileSource:    文件/RTSP解码源 (feature = "source-ffmpeg")
#[cfg(feature = "source-ffmpeg")]
pub mod file;
pub mod pattern;

#[cfg(feature = "source-ffmpeg")]
pub use file::FileSource;
pub use pattern::PatternSource;

use anyhow::Result;

/// 一帧RGBA像素
#[derive(Clone)]
pub struct Frame {
    pub rgba_data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    /// 分配一帧全黑像素
    pub fn black(width: u32, height: u32) -> Self {
        let mut rgba_data = vec![0u8; (width * height * 4) as usize];
        for px in rgba_data.chunks_exact_mut(4) {
            px[3] = 255;
        }
        Self {
            rgba_data,
            width,
            height,
        }
    }
}

/// 帧源统一接口
pub trait FrameSource {
    fn name(&self) -> &'static str;

    /// 拉取下一帧; Ok(None) 表示流结束
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// 释放底层资源 (幂等, 退出时调用)
    fn release(&mut self);
}
