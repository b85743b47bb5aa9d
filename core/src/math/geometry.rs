pub struct GeometryHelper;

impl GeometryHelper {
    /// Euclidean distance between two pixel positions.
    pub fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
        let dx = a.0 - b.0;
        let dy = a.1 - b.1;
        (dx * dx + dy * dy).sqrt()
    }

    /// Angle in degrees, clockwise from image "up" (negative y), in `[0, 360)`.
    pub fn clockwise_angle_deg(dx: f64, dy: f64) -> f64 {
        dx.atan2(-dy).to_degrees().rem_euclid(360.0)
    }
}
