use glam::Vec3;

/// Where a ball launched from `origin` with `velocity` next reaches
/// `contact_height` while descending, with the time it takes.
pub fn predict_landing(
    origin: Vec3,
    velocity: Vec3,
    contact_height: f32,
    gravity: f32,
) -> Option<(Vec3, f32)> {
    if gravity <= 0.0 || !origin.is_finite() || !velocity.is_finite() {
        return None;
    }

    // y0 + vy*t - g*t^2/2 = c  =>  t = (vy + sqrt(vy^2 + 2g(y0 - c))) / g
    let discriminant = velocity.y * velocity.y + 2.0 * gravity * (origin.y - contact_height);
    if discriminant < 0.0 {
        return None;
    }
    let time = (velocity.y + discriminant.sqrt()) / gravity;
    if !(time > 0.0) || !time.is_finite() {
        return None;
    }

    let landing = Vec3::new(
        origin.x + velocity.x * time,
        contact_height,
        origin.z + velocity.z * time,
    );
    Some((landing, time))
}

/// Landing point of the arc that follows the first table contact, assuming
/// the vertical speed is reflected with `restitution` and horizontal speed
/// is kept.
pub fn rebound_landing(
    origin: Vec3,
    velocity: Vec3,
    contact_height: f32,
    gravity: f32,
    restitution: f32,
) -> Option<Vec3> {
    let (first, time) = predict_landing(origin, velocity, contact_height, gravity)?;
    let impact_speed = gravity * time - velocity.y;
    let takeoff = impact_speed * restitution;
    if takeoff <= 0.0 {
        return Some(first);
    }
    let second_time = 2.0 * takeoff / gravity;
    Some(Vec3::new(
        first.x + velocity.x * second_time,
        contact_height,
        first.z + velocity.z * second_time,
    ))
}
