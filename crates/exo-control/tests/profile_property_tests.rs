//! 力矩曲线与执行器映射的属性测试

use exo_control::profile::{SplineProfile, SpringParams, SpringProfile};
use exo_control::{ActuatorMapper, ControlCycle, LegController, ProfileInput, SharedProfile, TorqueProfile, TransmissionModel};
use exo_protocol::{Amp, GyroAxis, LegSide, NewtonMeter, Rad, RadPerSec, SensorFrame};
use exo_tools::{ExoConfig, SplineSettings};
use proptest::prelude::*;

/// 单调递增的断点 `(t0, t1, t2, t3)`
fn breakpoints() -> impl Strategy<Value = (f64, f64, f64, f64)> {
    (0.0..20.0f64, 1.0..20.0f64, 1.0..30.0f64, 1.0..30.0f64)
        .prop_map(|(t0, d1, d2, d3)| (t0, t0 + d1, t0 + d1 + d2, t0 + d1 + d2 + d3))
}

fn spline(t: (f64, f64, f64, f64), ts: f64, peak: f64) -> SplineProfile {
    let mut profile = SplineProfile::percent_gait();
    profile
        .set_parameters(&SplineSettings {
            t0: Some(t.0),
            t1: Some(t.1),
            t2: Some(t.2),
            t3: Some(t.3),
            onset_torque_nm: Some(ts),
            peak_torque_normalized: Some(peak),
            user_mass_kg: Some(100.0),
        })
        .unwrap();
    profile
}

fn torque(profile: &impl TorqueProfile, input: ProfileInput) -> f64 {
    profile.evaluate(&input).unwrap().0
}

proptest! {
    /// 断点区间外力矩为 0
    #[test]
    fn prop_spline_zero_outside_support(
        t in breakpoints(),
        before in 0.0..1.0f64,
        after in 0.0..1.0f64,
    ) {
        let profile = spline(t, 2.0, 0.2);
        let below = t.0 * before - 1e-3;
        let above = t.3 + (100.0 - t.3) * after + 1e-3;
        prop_assert_eq!(torque(&profile, ProfileInput::percent_gait(below)), 0.0);
        prop_assert_eq!(torque(&profile, ProfileInput::percent_gait(above)), 0.0);
    }

    /// 断点处连续，且两段三次在端点处斜率为 0
    #[test]
    fn prop_spline_continuous_at_breakpoints(t in breakpoints(), ts in 0.0..5.0f64, peak in 0.05..0.4f64) {
        let profile = spline(t, ts, peak);
        let c = *profile.coefficients().unwrap();
        let tol = 1e-6 * (1.0 + c.tp.abs());

        prop_assert!((torque(&profile, ProfileInput::percent_gait(t.1)) - ts).abs() < tol);
        prop_assert!((c.rising.value(t.1) - ts).abs() < tol);
        prop_assert!((c.rising.value(t.2) - c.tp).abs() < tol);
        prop_assert!((c.falling.value(t.2) - c.tp).abs() < tol);
        prop_assert!((c.falling.value(t.3) - ts).abs() < tol);

        let slope_tol = 1e-6 * (1.0 + c.tp.abs()) * 100.0;
        prop_assert!(c.rising.slope(t.1).abs() < slope_tol);
        prop_assert!(c.rising.slope(t.2).abs() < slope_tol);
        prop_assert!(c.falling.slope(t.2).abs() < slope_tol);
        prop_assert!(c.falling.slope(t.3).abs() < slope_tol);
    }

    /// 力矩不越过起始力矩与峰值之间的范围
    #[test]
    fn prop_spline_bounded(t in breakpoints(), phase in 0.0..100.0f64, peak in 0.05..0.4f64) {
        let profile = spline(t, 2.0, peak);
        let tp = 100.0 * peak;
        let value = torque(&profile, ProfileInput::percent_gait(phase));
        prop_assert!(value >= -1e-9);
        prop_assert!(value <= tp.max(2.0) + 1e-9);
    }

    /// 弹簧力矩随关节角单调不增，且在 [0, θ0·ks] 内
    #[test]
    fn prop_spring_monotonic(
        theta0 in 0.01..1.0f64,
        ks in 0.0..200.0f64,
        a in -2.0..2.0f64,
        b in -2.0..2.0f64,
    ) {
        let profile = SpringProfile::with_params(&SpringParams {
            neutral_angle: Some(Rad(theta0)),
            stiffness: Some(ks),
        })
        .unwrap();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let at_lo = torque(&profile, ProfileInput::joint_angle(Rad(lo)));
        let at_hi = torque(&profile, ProfileInput::joint_angle(Rad(hi)));
        prop_assert!(at_lo >= at_hi - 1e-12);
        prop_assert!(at_lo >= 0.0);
        prop_assert!(at_lo <= theta0 * ks + 1e-9);
    }

    /// 传动比不小于 1
    #[test]
    fn prop_ratio_floor(
        coeffs in prop::array::uniform5(-50.0..50.0f64),
        angle in prop::num::f64::ANY,
    ) {
        let model = TransmissionModel::new(coeffs, 0.048, Amp(25.0), LegSide::Left).unwrap();
        prop_assert!(model.ratio_at(Rad(angle)) >= 1.0);
    }

    /// 下发电流不超过限制，方向与腿侧一致
    #[test]
    fn prop_command_within_limit(
        torque_nm in -500.0..500.0f64,
        angle in -1.0..1.0f64,
        limit in 0.5..40.0f64,
        right in any::<bool>(),
    ) {
        let side = if right { LegSide::Right } else { LegSide::Left };
        let model = TransmissionModel::new([0.0, 0.0, -2.0, -6.0, 14.0], 0.048, Amp(limit), side).unwrap();
        let mut mapper = ActuatorMapper::new(model);
        let cmd = mapper.command(NewtonMeter(torque_nm), Rad(angle));

        prop_assert!(f64::from(cmd.command.milliamps.abs()) <= (limit * 1000.0).round());
        if cmd.command.milliamps != 0 {
            let expected_sign = torque_nm.signum() * side.direction();
            prop_assert_eq!(f64::from(cmd.command.milliamps.signum()), expected_sign);
        }
    }

    /// 任意陀螺仪输入（含 NaN/∞）下控制周期不产生 NaN
    #[test]
    fn prop_cycle_never_nan(
        samples in prop::collection::vec(
            (
                1u64..50,
                prop::num::f64::ANY,
                prop_oneof![-3.0..3.0f64, Just(f64::NAN)],
            ),
            1..400,
        )
    ) {
        let config = ExoConfig::default();
        let profile = SharedProfile::from_settings(&config.profile).unwrap();
        let mut leg = LegController::from_config(&config, "left", profile).unwrap();

        let mut now = 0u64;
        for (dt, rate, angle) in samples {
            now += dt;
            let snap = leg.step(&SensorFrame::new(now, GyroAxis::Z, RadPerSec(rate), Rad(angle)));
            prop_assert!(snap.torque_cmd.is_finite());
            prop_assert!(snap.current_cmd.is_finite());
            prop_assert!(!snap.transmission_ratio.is_nan());
            if let Some(p) = snap.percent_gait {
                prop_assert!((0.0..=100.0).contains(&p));
            }
            prop_assert!(snap.command.milliamps.abs() <= 25_000);
        }
    }
}
