use rand::Rng;

/// 遥测采样 (Telemetry)
///
/// 与显示更新完全解耦的低频轮询: 传感器读数每个周期新采一次,
/// 不落盘, 不经过检测或帧源。

/// 一次传感器采样 (每次轮询新产生, 不持久化)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SensorSample {
    pub value1: f64,
    pub value2: f64,
    pub value3: f64,
}

/// 传感器能力接口
pub trait Sensor {
    fn read(&mut self) -> SensorSample;
}

/// 模拟传感器: 电压/信号强度/高度的随机游走
///
/// 真实设备链路接入前的占位实现。
pub struct SimSensor {
    rng: rand::rngs::ThreadRng,
    voltage: f64,
    signal: f64,
    altitude: f64,
}

impl SimSensor {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            voltage: 12.2,
            signal: 87.0,
            altitude: 120.0,
        }
    }
}

impl Default for SimSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl Sensor for SimSensor {
    fn read(&mut self) -> SensorSample {
        self.voltage = (self.voltage + self.rng.gen_range(-0.05..0.05)).clamp(10.5, 12.6);
        self.signal = (self.signal + self.rng.gen_range(-2.0..2.0)).clamp(0.0, 100.0);
        self.altitude = (self.altitude + self.rng.gen_range(-1.5..1.5)).clamp(0.0, 500.0);

        SensorSample {
            value1: self.voltage,
            value2: self.signal,
            value3: self.altitude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_stay_in_plausible_ranges() {
        let mut sensor = SimSensor::new();
        for _ in 0..1000 {
            let sample = sensor.read();
            assert!((10.5..=12.6).contains(&sample.value1));
            assert!((0.0..=100.0).contains(&sample.value2));
            assert!((0.0..=500.0).contains(&sample.value3));
        }
    }
}
