/// 天脉操作台 (Sky Pulse Operator Console)
///
/// 遥控侦察/打击设备地面站: 视频画面 + 检测叠加 + 遥测读数 + 手动指令。
///
/// 单逻辑线程协作式调度:
/// 1. 显示更新任务: 帧处理 → 渲染 (每圈事件循环)
/// 2. 遥测任务:     传感器轮询 (独立配速, 默认500ms)
/// 3. 指令处理:     界面事件 → 会话状态/生命周期
/// 三者在同一事件循环上严格交错, 从不并发。
use std::time::{Duration, Instant};

use ab_glyph::FontArc;
use clap::Parser;
use macroquad::prelude::*;
use mimalloc::MiMalloc;

use skypulse::console::Console;
use skypulse::control::{ControlHandler, Flow};
use skypulse::detect::{ClassFilter, Detector, StubDetector};
use skypulse::source::{FrameSource, PatternSource};
use skypulse::telemetry::{Sensor, SimSensor};
use skypulse::{
    Args, ConsoleConfig, FrameProcessor, FrameUpdate, Scheduler, SessionState, WINDOW_HEIGHT,
    WINDOW_WIDTH,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn window_conf() -> Conf {
    Conf {
        window_title: "天脉操作台 - Sky Pulse".to_owned(),
        window_width: WINDOW_WIDTH,
        window_height: WINDOW_HEIGHT,
        ..Default::default()
    }
}

/// 构建帧源; 打开失败属于启动期致命错误
fn build_source(args: &Args, config: &ConsoleConfig) -> anyhow::Result<Box<dyn FrameSource>> {
    if args.source.is_empty() {
        println!("🧪 未指定视频源, 使用内置测试图源");
        return Ok(Box::new(PatternSource::new(
            config.pattern_width,
            config.pattern_height,
        )));
    }

    #[cfg(feature = "source-ffmpeg")]
    {
        Ok(Box::new(skypulse::source::FileSource::open(&args.source)?))
    }

    #[cfg(not(feature = "source-ffmpeg"))]
    {
        anyhow::bail!(
            "视频源 {} 需要启用 source-ffmpeg 特性 (cargo run --features source-ffmpeg)",
            args.source
        )
    }
}

fn load_font(path: &str) -> Option<FontArc> {
    match std::fs::read(path) {
        Ok(bytes) => match FontArc::try_from_vec(bytes) {
            Ok(font) => {
                println!("✅ 叠加字体加载成功: {}", path);
                Some(font)
            }
            Err(e) => {
                eprintln!("⚠️  字体解析失败 ({}): {}, 叠加文字停用", path, e);
                None
            }
        },
        Err(_) => {
            eprintln!("⚠️  字体未找到 ({}), 叠加文字停用", path);
            None
        }
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();
    let args = Args::parse();
    let config = ConsoleConfig::load(&args.config);

    println!("🚀 天脉操作台启动");
    config.print_summary();

    let font = load_font(&config.font_path);

    // 帧源打开失败在进入调度循环之前终止
    let mut source = match build_source(&args, &config) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("❌ 视频源打开失败: {e:#}");
            return;
        }
    };
    let mut detector: Box<dyn Detector> = Box::new(StubDetector::new(font.clone()));

    // 会话状态唯一实例, 显式传入各处理路径
    let mut state = SessionState::new();
    let mut processor = FrameProcessor::new(config.skip_interval, font);
    let handler = ControlHandler;
    let mut sensor = SimSensor::new();

    let mut sched = Scheduler::new();
    let start = Instant::now();
    let display_task = sched.arm(Duration::ZERO, start);
    let telemetry_task = sched.arm(Duration::from_millis(config.telemetry_interval_ms), start);

    let class_names = ClassFilter::ALL.iter().map(|f| f.name()).collect();
    let (mut console, command_rx) = Console::new(class_names);

    println!("✅ 系统就绪, 开始监控... (Tab 切换面板, Esc 退出)\n");

    'event_loop: loop {
        let now = Instant::now();

        // ---------- 指令处理 ----------
        while let Ok(cmd) = command_rx.try_recv() {
            let (flow, status) = handler.handle(cmd, &mut state);
            if let Some(text) = status {
                console.set_status(text);
            }
            if flow == Flow::Shutdown {
                // 协作式关停: 停止调度, 逐项独立释放资源
                sched.cancel(display_task);
                sched.cancel(telemetry_task);
                source.release();
                detector.close();
                break 'event_loop;
            }
        }

        // ---------- 显示更新任务 ----------
        if sched.due(display_task, now) {
            match processor.process(source.as_mut(), detector.as_mut(), &mut state, now) {
                Ok(FrameUpdate::Rendered { frame, detections }) => {
                    console.push_frame(&frame);
                    let selected = state.get_selected_class();
                    let grouped = detections
                        .get(selected.name())
                        .map(|v| v.as_slice())
                        .unwrap_or(&[]);
                    console.push_detections(selected.name(), grouped);
                    console.set_detect_fps(processor.fps());
                }
                // 跳帧tick维持上一帧画面, 画布不清空
                Ok(FrameUpdate::Skipped) => {}
                Ok(FrameUpdate::EndOfStream) => console.mark_stream_ended(),
                // 单帧检测失败跳过本tick, 调度循环继续
                Err(e) => {
                    log::warn!("帧处理失败, 跳过本tick: {e:#}");
                    console.set_status("检测异常, 已跳过当前帧".to_string());
                }
            }
            sched.rearm(display_task, Instant::now());
        }

        // ---------- 遥测任务 ----------
        if sched.due(telemetry_task, now) {
            console.push_telemetry(&sensor.read());
            sched.rearm(telemetry_task, Instant::now());
        }

        // ---------- 渲染与输入 (调度让出点) ----------
        console.handle_input();
        console.draw();
        console.draw_egui();
        next_frame().await;
    }

    println!("👋 操作台已退出");
}
