use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use crossbeam_channel::{Receiver, Sender};
/// 文件/RTSP解码源 (FFmpeg adapter)
/// 解码流水线运行在ez-ffmpeg自己的上下文里, 向有界通道推送RGBA帧;
/// 操作台侧按需拉取, 通道断开即流结束。
use ez_ffmpeg::core::context::null_output::create_null_output;
use ez_ffmpeg::filter::frame_filter::FrameFilter;
use ez_ffmpeg::filter::frame_filter_context::FrameFilterContext;
use ez_ffmpeg::filter::frame_pipeline_builder::FramePipelineBuilder;
use ez_ffmpeg::{AVMediaType, FfmpegContext, Input};

use super::{Frame, FrameSource};

/// 帧缓冲深度: 只保留最新的几帧, 解码快于消费时直接丢弃
const CHANNEL_DEPTH: usize = 2;

/// 解码过滤器: 把RGBA帧从FFmpeg流水线搬进通道
#[derive(Clone)]
struct PushFilter {
    tx: Sender<Frame>,
    stop: Arc<AtomicBool>,
    total_frames: usize,
    dropped_frames: usize,
}

impl FrameFilter for PushFilter {
    fn media_type(&self) -> AVMediaType {
        AVMediaType::AVMEDIA_TYPE_VIDEO
    }

    fn init(&mut self, _ctx: &FrameFilterContext) -> Result<(), String> {
        println!("✅ 解码流水线启动");
        Ok(())
    }

    fn filter_frame(
        &mut self,
        frame: ez_ffmpeg::Frame,
        _ctx: &FrameFilterContext,
    ) -> Result<Option<ez_ffmpeg::Frame>, String> {
        if self.stop.load(Ordering::Relaxed) {
            return Err("source released".to_string());
        }

        unsafe {
            self.total_frames += 1;
            if self.dropped_frames > 0 && self.total_frames % 300 == 0 {
                log::debug!("解码丢帧 {}/{}", self.dropped_frames, self.total_frames);
            }

            if frame.as_ptr().is_null() || frame.is_empty() || frame.is_corrupt() {
                self.dropped_frames += 1;
                return Ok(None);
            }

            let w = (*frame.as_ptr()).width as u32;
            let h = (*frame.as_ptr()).height as u32;
            if w == 0 || h == 0 || w > 4096 || h > 4096 {
                self.dropped_frames += 1;
                return Ok(None);
            }

            // filter_descs 已把像素格式转成RGBA, data[0]为打包数据
            let data = (*frame.as_ptr()).data[0];
            let stride = (*frame.as_ptr()).linesize[0] as usize;
            if data.is_null() || stride < (w * 4) as usize {
                self.dropped_frames += 1;
                return Ok(None);
            }

            let mut rgba_data = Vec::with_capacity((w * h * 4) as usize);
            for row in 0..h as usize {
                let line = std::slice::from_raw_parts(data.add(row * stride), (w * 4) as usize);
                rgba_data.extend_from_slice(line);
            }

            // 消费侧落后时丢弃本帧, 绝不阻塞解码
            if self
                .tx
                .try_send(Frame {
                    rgba_data,
                    width: w,
                    height: h,
                })
                .is_err()
            {
                self.dropped_frames += 1;
            }
        }

        Ok(None)
    }
}

/// 文件/RTSP帧源
pub struct FileSource {
    url: String,
    rx: Receiver<Frame>,
    stop: Arc<AtomicBool>,
    worker: Option<std::thread::JoinHandle<()>>,
    released: bool,
}

impl FileSource {
    /// 打开视频流; 流水线构建失败即返回错误 (启动期致命)
    pub fn open(url: &str) -> Result<Self> {
        let (tx, rx) = crossbeam_channel::bounded(CHANNEL_DEPTH);
        let stop = Arc::new(AtomicBool::new(false));

        let filter = PushFilter {
            tx,
            stop: stop.clone(),
            total_frames: 0,
            dropped_frames: 0,
        };

        let pipe: FramePipelineBuilder = AVMediaType::AVMEDIA_TYPE_VIDEO.into();
        let pipe = pipe.filter("push", Box::new(filter));
        let out = create_null_output().add_frame_pipeline(pipe);

        let input = Input::new(url).set_input_opts(
            [
                ("rtsp_transport", "tcp"),
                ("buffer_size", "67108864"),
                ("rtsp_flags", "prefer_tcp"),
            ]
            .into(),
        );

        let ctx = FfmpegContext::builder()
            .input(input)
            .filter_descs(["format=rgba"].into())
            .output(out)
            .build()
            .map_err(|e| anyhow!("视频流水线构建失败: {}", e))?;

        let sch = ctx.start().map_err(|e| anyhow!("视频流启动失败: {}", e))?;
        println!("🎬 视频源已打开: {}", url);

        // 流水线在ez-ffmpeg自己的运行时里跑完; 这里只等待它收尾
        let worker = std::thread::spawn(move || {
            let _ = sch.wait();
        });

        Ok(Self {
            url: url.to_string(),
            rx,
            stop,
            worker: Some(worker),
            released: false,
        })
    }
}

impl FrameSource for FileSource {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        // 等到一帧或流结束; 之后只保留通道里最新的一帧
        let mut latest = match self.rx.recv() {
            Ok(frame) => frame,
            Err(_) => return Ok(None),
        };
        while let Ok(newer) = self.rx.try_recv() {
            latest = newer;
        }
        Ok(Some(latest))
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        log::info!("视频源已释放: {}", self.url);
    }
}
