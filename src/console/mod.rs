use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use egui_macroquad::egui;
use macroquad::prelude::*;

use crate::control::Command;
use crate::detect::{Detection, TrackId};
use crate::source::Frame;
use crate::telemetry::SensorSample;

/// 操作台界面 (Operator Console Surface)
///
/// 渲染视频帧/检测列表/遥测读数, 并把按钮与下拉框操作
/// 转成 `Command` 推入有界队列, 由主循环在同一线程上消费。

/// 攻击方式选项 (纯界面状态, 不进入会话状态)
static ATTACK_METHODS: [&str; 3] = ["直线突击", "之字机动", "盘旋突击"];

/// 指令队列深度
const COMMAND_QUEUE_DEPTH: usize = 8;

pub struct Console {
    command_tx: Sender<Command>,

    // 画面
    last_frame: Option<Texture2D>,

    // 面板数据
    detection_lines: Vec<String>,
    sensor_text: String,
    status_text: String,
    stream_ended: bool,
    detect_fps: f64,

    // 渲染FPS统计
    render_count: u64,
    render_last: Instant,
    render_fps: f64,

    // 面板状态
    show_control_panel: bool,
    class_names: Vec<&'static str>,
    selected_class_index: usize,
    attack_method_index: usize,
}

impl Console {
    pub fn new(class_names: Vec<&'static str>) -> (Self, Receiver<Command>) {
        let (command_tx, command_rx) = crossbeam_channel::bounded(COMMAND_QUEUE_DEPTH);
        let console = Self {
            command_tx,
            last_frame: None,
            detection_lines: Vec::new(),
            sensor_text: String::new(),
            status_text: String::new(),
            stream_ended: false,
            detect_fps: 0.0,
            render_count: 0,
            render_last: Instant::now(),
            render_fps: 0.0,
            show_control_panel: true,
            class_names,
            selected_class_index: 0,
            attack_method_index: 0,
        };
        (console, command_rx)
    }

    /// 接收一帧叠加画面
    ///
    /// 只在分辨率变化时重建纹理, 否则就地更新像素数据,
    /// 避免每帧重新分配GPU内存。
    pub fn push_frame(&mut self, frame: &Frame) {
        let needs_rebuild = match &self.last_frame {
            Some(tex) => {
                tex.width() != frame.width as f32 || tex.height() != frame.height as f32
            }
            None => true,
        };

        if needs_rebuild {
            let texture =
                Texture2D::from_rgba8(frame.width as u16, frame.height as u16, &frame.rgba_data);
            texture.set_filter(FilterMode::Linear);
            self.last_frame = Some(texture);
        } else if let Some(tex) = &self.last_frame {
            let img = Image {
                bytes: frame.rgba_data.clone(),
                width: frame.width as u16,
                height: frame.height as u16,
            };
            tex.update(&img);
        }
    }

    /// 接收一轮分组检测结果
    pub fn push_detections(&mut self, selected: &str, detections: &[Detection]) {
        self.detection_lines.clear();
        for (idx, det) in detections.iter().enumerate() {
            let line = match det.track {
                TrackId::Id(id) => format!(
                    "ID:{} {}{}: 置信度 {:.2}",
                    id,
                    selected,
                    idx + 1,
                    det.confidence
                ),
                TrackId::Untracked => format!(
                    "ID:- {}{}: 置信度 {:.2}",
                    selected,
                    idx + 1,
                    det.confidence
                ),
            };
            self.detection_lines.push(line);
        }
    }

    pub fn set_detect_fps(&mut self, fps: f64) {
        self.detect_fps = fps;
    }

    /// 接收一次遥测采样
    pub fn push_telemetry(&mut self, sample: &SensorSample) {
        self.sensor_text = format!(
            "电压: {:.2} V\n信号: {:.0} %\n高度: {:.1} m",
            sample.value1, sample.value2, sample.value3
        );
    }

    pub fn set_status(&mut self, text: String) {
        self.status_text = text;
    }

    pub fn mark_stream_ended(&mut self) {
        self.stream_ended = true;
    }

    /// 键盘输入: Tab切换面板, Esc退出
    pub fn handle_input(&mut self) {
        if is_key_pressed(KeyCode::Tab) {
            self.show_control_panel = !self.show_control_panel;
        }
        if is_key_pressed(KeyCode::Escape) {
            let _ = self.command_tx.try_send(Command::Exit);
        }
    }

    /// 绘制视频帧 (拉伸铺满窗口, 跳帧tick期间维持上一帧画面)
    pub fn draw(&mut self) {
        clear_background(BLACK);

        if let Some(texture) = &self.last_frame {
            let scale_x = screen_width() / texture.width();
            let scale_y = screen_height() / texture.height();
            let scaled_width = texture.width() * scale_x;
            let scaled_height = texture.height() * scale_y;
            let center_x = (screen_width() - scaled_width) / 2.0;
            let center_y = (screen_height() - scaled_height) / 2.0;

            draw_texture_ex(
                texture,
                center_x,
                center_y,
                WHITE,
                DrawTextureParams {
                    dest_size: Some(vec2(scaled_width, scaled_height)),
                    ..Default::default()
                },
            );
        }

        // 渲染FPS统计
        self.render_count += 1;
        let now = Instant::now();
        if now.duration_since(self.render_last).as_secs() >= 1 {
            self.render_fps =
                self.render_count as f64 / now.duration_since(self.render_last).as_secs_f64();
            self.render_count = 0;
            self.render_last = now;
        }
    }

    /// 绘制控制面板
    pub fn draw_egui(&mut self) {
        egui_macroquad::ui(|egui_ctx| {
            if !self.show_control_panel {
                return;
            }

            egui::Window::new("控制面板")
                .default_pos(egui::pos2(10.0, 10.0))
                .default_size(egui::vec2(300.0, 500.0))
                .resizable(true)
                .show(egui_ctx, |ui| {
                    // --- 系统状态 ---
                    egui::CollapsingHeader::new("📊 系统状态")
                        .default_open(true)
                        .show(ui, |ui| {
                            ui.horizontal(|ui| {
                                ui.label("渲染 FPS:");
                                ui.colored_label(
                                    egui::Color32::GREEN,
                                    format!("{:.1}", self.render_fps),
                                );
                                ui.label("| 检测 FPS:");
                                ui.colored_label(
                                    egui::Color32::YELLOW,
                                    format!("{:.1}", self.detect_fps),
                                );
                            });
                            if self.stream_ended {
                                ui.colored_label(egui::Color32::LIGHT_RED, "⏹ 视频流已结束");
                            }
                            if !self.status_text.is_empty() {
                                ui.label(self.status_text.as_str());
                            }
                        });

                    ui.separator();

                    // --- 检测目标 ---
                    egui::CollapsingHeader::new("🎯 检测目标")
                        .default_open(true)
                        .show(ui, |ui| {
                            if self.detection_lines.is_empty() {
                                ui.label("无目标");
                            } else {
                                for line in &self.detection_lines {
                                    ui.label(line);
                                }
                            }
                        });

                    ui.separator();

                    // --- 遥测数据 ---
                    egui::CollapsingHeader::new("📡 遥测数据")
                        .default_open(true)
                        .show(ui, |ui| {
                            if self.sensor_text.is_empty() {
                                ui.label("等待遥测...");
                            } else {
                                ui.label(self.sensor_text.as_str());
                            }
                        });

                    ui.separator();

                    // --- 控制指令 ---
                    egui::CollapsingHeader::new("🕹 控制指令")
                        .default_open(true)
                        .show(ui, |ui| {
                            ui.label("检测类别:");
                            let mut selected = self.selected_class_index;
                            egui::ComboBox::from_id_salt("class_select")
                                .selected_text(
                                    self.class_names
                                        .get(self.selected_class_index)
                                        .copied()
                                        .unwrap_or("Default"),
                                )
                                .show_ui(ui, |ui| {
                                    for (idx, name) in self.class_names.iter().enumerate() {
                                        ui.selectable_value(&mut selected, idx, *name);
                                    }
                                });
                            if selected != self.selected_class_index {
                                self.selected_class_index = selected;
                                let name = self.class_names[selected].to_string();
                                // 使用 try_send 避免队列满时阻塞界面
                                let _ = self.command_tx.try_send(Command::SelectClass(name));
                            }

                            ui.label("攻击方式:");
                            egui::ComboBox::from_id_salt("attack_method")
                                .selected_text(ATTACK_METHODS[self.attack_method_index])
                                .show_ui(ui, |ui| {
                                    for (idx, name) in ATTACK_METHODS.iter().enumerate() {
                                        ui.selectable_value(
                                            &mut self.attack_method_index,
                                            idx,
                                            *name,
                                        );
                                    }
                                });

                            ui.separator();

                            let zoom = egui::Button::new("接近目标")
                                .fill(egui::Color32::from_rgb(0, 100, 0));
                            if ui.add(zoom).clicked() {
                                let _ = self.command_tx.try_send(Command::Zoom);
                            }
                            let angle = egui::Button::new("切换视角")
                                .fill(egui::Color32::from_rgb(255, 140, 0));
                            if ui.add(angle).clicked() {
                                let _ = self.command_tx.try_send(Command::Angle);
                            }
                            let attack = egui::Button::new("发起打击")
                                .fill(egui::Color32::from_rgb(139, 0, 0));
                            if ui.add(attack).clicked() {
                                let _ = self.command_tx.try_send(Command::Attack);
                            }
                            if ui.button("退出").clicked() {
                                let _ = self.command_tx.try_send(Command::Exit);
                            }
                        });
                });
        });

        egui_macroquad::draw();
    }
}
