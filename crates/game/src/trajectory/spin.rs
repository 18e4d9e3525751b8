use crate::config::TrajectoryConfig;

/// Spin scalar (about the vertical axis) produced by a paddle moving
/// sideways at `lateral_speed`.
///
/// The speed is clamped to `max_lateral_speed` first. Below
/// `spin_threshold_low` no spin is produced; between the two thresholds it
/// ramps linearly to `max_spin`, beyond which it stays capped.
pub fn spin_from_lateral_speed(lateral_speed: f32, config: &TrajectoryConfig) -> f32 {
    if !lateral_speed.is_finite() {
        return 0.0;
    }

    let clamped = lateral_speed.clamp(-config.max_lateral_speed, config.max_lateral_speed);
    let magnitude = clamped.abs();
    if magnitude < config.spin_threshold_low {
        return 0.0;
    }

    let span = (config.spin_threshold_high - config.spin_threshold_low).max(f32::EPSILON);
    let ramp = ((magnitude - config.spin_threshold_low) / span).clamp(0.0, 1.0);
    config.max_spin * ramp * clamped.signum()
}
