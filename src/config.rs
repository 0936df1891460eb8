use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::{SKIP_INTERVAL, TELEMETRY_INTERVAL_MS};

/// 操作台启动参数
#[derive(Parser, Debug)]
#[command(author, version, about = "天脉操作台 - 遥控侦察/打击设备地面站", long_about = None)]
pub struct Args {
    /// 视频源 (文件路径或RTSP地址); 留空使用内置测试图源
    #[arg(short, long, default_value = "")]
    pub source: String,

    /// 配置文件路径
    #[arg(short, long, default_value = "skypulse.json")]
    pub config: String,
}

/// 操作台配置 - 通过JSON文件调整参数
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub skip_interval: u64,         // 检测跳帧间隔 (每N个tick检测一次)
    pub telemetry_interval_ms: u64, // 遥测刷新周期
    pub font_path: String,          // 叠加文字字体
    pub pattern_width: u32,         // 测试图源分辨率
    pub pattern_height: u32,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            skip_interval: SKIP_INTERVAL,
            telemetry_interval_ms: TELEMETRY_INTERVAL_MS,
            font_path: "assets/font/msyh.ttc".to_string(),
            pattern_width: 640,
            pattern_height: 480,
        }
    }
}

impl ConsoleConfig {
    /// 从JSON文件加载配置
    pub fn load(path: &str) -> Self {
        let config = match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<Self>(&json) {
                Ok(config) => {
                    println!("✅ 配置已从 {} 加载", path);
                    config
                }
                Err(e) => {
                    eprintln!("⚠️  配置文件解析失败: {}, 使用默认值", e);
                    Self::default()
                }
            },
            Err(_) => {
                println!("📝 配置文件不存在,创建默认配置...");
                let config = Self::default();
                config.save(path);
                config
            }
        };
        config.sanitized()
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: &str) {
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(path, json) {
                    eprintln!("❌ 保存配置失败: {}", e);
                } else {
                    println!("💾 配置已保存到 {}", path);
                }
            }
            Err(e) => eprintln!("❌ 序列化配置失败: {}", e),
        }
    }

    /// 收敛非法取值 (跳帧间隔取模除零等)
    fn sanitized(mut self) -> Self {
        if self.skip_interval == 0 {
            eprintln!("⚠️  skip_interval=0 非法, 收敛为 1");
            self.skip_interval = 1;
        }
        if self.telemetry_interval_ms == 0 {
            self.telemetry_interval_ms = TELEMETRY_INTERVAL_MS;
        }
        self
    }

    /// 打印当前配置
    pub fn print_summary(&self) {
        println!("\n🎛️  当前操作台配置:");
        println!("  检测跳帧间隔: {}", self.skip_interval);
        println!("  遥测刷新周期: {}ms", self.telemetry_interval_ms);
        println!("  测试图源分辨率: {}x{}", self.pattern_width, self.pattern_height);
        println!("  叠加字体: {}\n", self.font_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ConsoleConfig::default();
        assert_eq!(config.skip_interval, 2);
        assert_eq!(config.telemetry_interval_ms, 500);
    }

    #[test]
    fn test_missing_file_creates_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console.json");
        let path = path.to_str().unwrap();

        let config = ConsoleConfig::load(path);
        assert_eq!(config.skip_interval, ConsoleConfig::default().skip_interval);
        // 默认配置已经写盘, 二次加载走解析路径
        assert!(std::path::Path::new(path).exists());
        let reloaded = ConsoleConfig::load(path);
        assert_eq!(reloaded.skip_interval, config.skip_interval);
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let config = ConsoleConfig::load(path.to_str().unwrap());
        assert_eq!(config.skip_interval, ConsoleConfig::default().skip_interval);
    }

    #[test]
    fn test_zero_skip_interval_is_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zero.json");
        let mut config = ConsoleConfig::default();
        config.skip_interval = 0;
        config.telemetry_interval_ms = 0;
        fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

        let loaded = ConsoleConfig::load(path.to_str().unwrap());
        assert_eq!(loaded.skip_interval, 1);
        assert_eq!(loaded.telemetry_interval_ms, TELEMETRY_INTERVAL_MS);
    }
}
