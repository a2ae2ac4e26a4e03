//! 控制周期性能基准测试
//!
//! 500 Hz 下单个周期预算为 2 ms，双腿计算应远低于此。

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use exo_control::{BilateralController, ControlCycle, LegController, ProfileInput, SharedProfile};
use exo_protocol::{GyroAxis, Rad, RadPerSec, SensorFrame};
use exo_tools::ExoConfig;

/// 一个 1000 ms 步态周期的矢状面角速度（2 ms 采样）
fn gait_waveform() -> Vec<f64> {
    use std::f64::consts::PI;
    (0..500u32)
        .map(|i| {
            let t = f64::from(i) * 2.0;
            if t < 600.0 {
                -100.0 * (PI * t / 600.0).sin()
            } else {
                300.0 * (PI * (t - 600.0) / 400.0).sin()
            }
        })
        .collect()
}

fn bench_bilateral_step(c: &mut Criterion) {
    let config = ExoConfig::default();
    let profile = SharedProfile::from_settings(&config.profile).unwrap();
    let mut both = BilateralController::from_config(&config, profile).unwrap();
    let wave = gait_waveform();
    let mut tick = 0usize;
    let mut next_frame = move || {
        let frame = SensorFrame::new(
            tick as u64 * 2,
            GyroAxis::Z,
            RadPerSec(wave[tick % wave.len()]),
            Rad(0.05),
        );
        tick += 1;
        frame
    };

    // 走两个周期建立时间基准
    for _ in 0..1_000 {
        let frame = next_frame();
        both.step(&frame, &frame);
    }

    c.bench_function("bilateral_step", |b| {
        b.iter(|| {
            let frame = next_frame();
            black_box(both.step(black_box(&frame), black_box(&frame)))
        })
    });
}

fn bench_single_leg_step(c: &mut Criterion) {
    let config = ExoConfig::default();
    let profile = SharedProfile::from_settings(&config.profile).unwrap();
    let mut leg = LegController::from_config(&config, "left", profile).unwrap();
    let frame = SensorFrame::new(0, GyroAxis::Z, RadPerSec(0.0), Rad(0.0));

    c.bench_function("leg_step_no_timebase", |b| {
        b.iter(|| black_box(leg.step(black_box(&frame))))
    });
}

fn bench_profile_torque(c: &mut Criterion) {
    let profile = SharedProfile::from_settings(&ExoConfig::default().profile).unwrap();
    let input = ProfileInput::percent_gait(45.0);

    c.bench_function("shared_profile_torque", |b| {
        b.iter(|| black_box(profile.torque(black_box(&input))))
    });
}

criterion_group!(
    benches,
    bench_bilateral_step,
    bench_single_leg_step,
    bench_profile_torque
);
criterion_main!(benches);
