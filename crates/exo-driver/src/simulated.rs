//! 模拟设备
//!
//! 以合成的步态波形产生原始传感器读数，经 [`RawSensorFrame::decode`] 解码后返回，
//! 并记录收到的全部电流指令。设备时间戳按采样周期递增，与墙钟无关，
//! 测试结果因此与线程调度无关。
//!
//! 波形（矢状面角速度）：
//!
//! ```text
//! 支撑相 [0, stance)      : -stance_peak · sin(π·t / stance)
//! 摆动相 [stance, stride) : +swing_peak  · sin(π·(t - stance) / (stride - stance))
//! ```

use crate::device::ExoDevice;
use crate::error::DeviceError;
use exo_protocol::frame::{
    ACCEL_LSB_PER_G, ANKLE_DEG_PER_LSB, GYRO_LSB_PER_DEG_S, MOTOR_DEG_PER_TICK,
};
use exo_protocol::{CurrentCommand, LegSide, RawSensorFrame, SensorFrame};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// 电机角相对踝关节角的名义传动比（仅用于生成电机编码器读数）
const NOMINAL_MOTOR_RATIO: f64 = 14.0;

/// 合成步态波形
#[derive(Debug, Clone, PartialEq)]
pub struct GaitWaveform {
    /// 步幅周期（毫秒）
    pub stride_ms: u64,
    /// 支撑相占比
    pub stance_fraction: f64,
    /// 支撑相角速度峰值（rad/s，取负）
    pub stance_peak_rad_s: f64,
    /// 摆动相角速度峰值（rad/s）
    pub swing_peak_rad_s: f64,
    /// 踝关节角摆幅（rad）
    pub ankle_amplitude_rad: f64,
}

impl Default for GaitWaveform {
    fn default() -> Self {
        Self {
            stride_ms: 1000,
            stance_fraction: 0.6,
            stance_peak_rad_s: 100.0,
            swing_peak_rad_s: 300.0,
            ankle_amplitude_rad: 0.1,
        }
    }
}

impl GaitWaveform {
    /// `t_ms` 时刻的矢状面角速度
    pub fn gyro_at(&self, t_ms: u64) -> f64 {
        let stride_ms = self.stride_ms.max(1);
        let stride = stride_ms as f64;
        let t = (t_ms % stride_ms) as f64;
        let stance = stride * self.stance_fraction.clamp(0.05, 0.95);
        if t < stance {
            -self.stance_peak_rad_s * (PI * t / stance).sin()
        } else {
            self.swing_peak_rad_s * (PI * (t - stance) / (stride - stance)).sin()
        }
    }

    /// `t_ms` 时刻的踝关节角（rad）
    pub fn ankle_at(&self, t_ms: u64) -> f64 {
        let stride_ms = self.stride_ms.max(1);
        let phase = (t_ms % stride_ms) as f64 / stride_ms as f64;
        self.ankle_amplitude_rad * (2.0 * PI * phase).sin()
    }
}

/// 已下发指令的共享记录
///
/// 设备移入控制线程后，测试与 CLI 通过此句柄读取指令。
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    inner: Arc<Mutex<Vec<CurrentCommand>>>,
}

impl CommandLog {
    fn lock(&self) -> MutexGuard<'_, Vec<CurrentCommand>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, command: CurrentCommand) {
        self.lock().push(command);
    }

    /// 全部指令的拷贝
    pub fn commands(&self) -> Vec<CurrentCommand> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn last(&self) -> Option<CurrentCommand> {
        self.lock().last().copied()
    }
}

#[derive(Debug)]
struct GyroNoise {
    amplitude: f64,
    rng: StdRng,
}

/// 模拟外骨骼
#[derive(Debug)]
pub struct SimulatedExo {
    side: LegSide,
    waveform: GaitWaveform,
    sample_ms: u64,
    clock_ms: u64,
    noise: Option<GyroNoise>,
    pending_read_failures: u32,
    pending_write_failures: u32,
    last_command: CurrentCommand,
    log: CommandLog,
}

impl SimulatedExo {
    /// 默认波形，2 ms 采样（500 Hz）
    pub fn new(side: LegSide) -> Self {
        Self {
            side,
            waveform: GaitWaveform::default(),
            sample_ms: 2,
            clock_ms: 0,
            noise: None,
            pending_read_failures: 0,
            pending_write_failures: 0,
            last_command: CurrentCommand::ZERO,
            log: CommandLog::default(),
        }
    }

    #[must_use]
    pub fn with_waveform(mut self, waveform: GaitWaveform) -> Self {
        self.waveform = waveform;
        self
    }

    /// 设备时间戳步长（毫秒，至少 1）
    #[must_use]
    pub fn with_sample_period(mut self, sample_ms: u64) -> Self {
        self.sample_ms = sample_ms.max(1);
        self
    }

    /// 叠加 `[-amplitude, amplitude]` 均匀噪声（固定种子，可复现）
    #[must_use]
    pub fn with_gyro_noise(mut self, amplitude: f64, seed: u64) -> Self {
        self.noise = (amplitude > 0.0).then(|| GyroNoise {
            amplitude,
            rng: StdRng::seed_from_u64(seed),
        });
        self
    }

    /// 之后的 `count` 次读取返回超时
    pub fn fail_next_reads(&mut self, count: u32) {
        self.pending_read_failures = count;
    }

    /// 之后的 `count` 次下发返回失败
    pub fn fail_next_writes(&mut self, count: u32) {
        self.pending_write_failures = count;
    }

    /// 下一帧的设备时间戳
    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn waveform(&self) -> &GaitWaveform {
        &self.waveform
    }

    pub fn command_log(&self) -> CommandLog {
        self.log.clone()
    }

    fn raw_frame(&mut self, t_ms: u64) -> RawSensorFrame {
        let mut rate = self.waveform.gyro_at(t_ms);
        if let Some(noise) = self.noise.as_mut() {
            rate += noise.rng.gen_range(-noise.amplitude..=noise.amplitude);
        }

        // 原始读数在设备坐标系，解码时再乘方向符号
        let dir = self.side.direction();
        let ankle_deg = self.waveform.ankle_at(t_ms).to_degrees();

        RawSensorFrame {
            timestamp_ms: t_ms,
            gyro: [0, 0, (rate.to_degrees() * GYRO_LSB_PER_DEG_S).round() as i32],
            accel: [0, 0, ACCEL_LSB_PER_G as i32],
            motor_angle: (ankle_deg * NOMINAL_MOTOR_RATIO * dir / MOTOR_DEG_PER_TICK).round()
                as i32,
            motor_current: self.last_command.milliamps,
            ankle_angle: (ankle_deg * dir / ANKLE_DEG_PER_LSB).round() as i32,
            battery_voltage: 24_000,
            ..Default::default()
        }
    }
}

impl ExoDevice for SimulatedExo {
    fn side(&self) -> LegSide {
        self.side
    }

    fn read_frame(&mut self) -> Result<SensorFrame, DeviceError> {
        let t = self.clock_ms;
        self.clock_ms += self.sample_ms;

        if self.pending_read_failures > 0 {
            self.pending_read_failures -= 1;
            return Err(DeviceError::Timeout);
        }
        Ok(self.raw_frame(t).decode(self.side))
    }

    fn command_current(&mut self, command: CurrentCommand) -> Result<(), DeviceError> {
        if self.pending_write_failures > 0 {
            self.pending_write_failures -= 1;
            return Err(DeviceError::Write("simulated write failure".to_string()));
        }
        self.last_command = command;
        self.log.push(command);
        Ok(())
    }
}
