use crate::math::{
    equidistant_points_along_curve, ParametricCurve2d, Point2d, QuadraticBezier2d, Vector2d,
};
use cgmath::prelude::*;

/// The centre line of a lane, resampled so it can be sampled by arc length.
#[derive(Clone)]
pub struct LaneCurve {
    scale: f64,
    length: f64,
    segments: Vec<QuadraticBezier2d>,
}

/// The result of sampling a [LaneCurve].
pub struct LaneSample {
    /// The position on the centre line
    pub pos: Point2d,
    /// The tangent unit vector of the lane.
    pub tan: Vector2d,
}

impl LaneCurve {
    /// Creates a new [LaneCurve] from the given parametric curve,
    /// with the default step size.
    pub fn new(curve: &impl ParametricCurve2d) -> Self {
        const LANE_SEGMENT_LEN: f64 = 0.5;
        Self::with_step(curve, LANE_SEGMENT_LEN)
    }

    /// Creates a new [LaneCurve] from the given parametric curve,
    /// with the given step size.
    pub fn with_step(curve: &impl ParametricCurve2d, step: f64) -> Self {
        let (mut points, length) = equidistant_points_along_curve(curve, step);

        // Ensure number of points are odd so they can be evenly divided among segments
        if points.len() % 2 == 0 {
            let p1 = points[points.len() - 2];
            let p2 = points[points.len() - 1];
            let p3 = Point2d::from_vec(Vector2d::lerp(p1.to_vec(), p2.to_vec(), 2.0));
            points.push(p3);
        }

        let segments = points
            .windows(3)
            .step_by(2)
            .map(|points| {
                let [p1, p2, p3]: [_; 3] = points.try_into().unwrap();
                let mid = Vector2d::lerp(p1.to_vec(), p3.to_vec(), 0.5);
                let control = Point2d::from_vec(Vector2d::lerp(p2.to_vec(), mid, -1.0));
                QuadraticBezier2d::new(&[p1, control, p3])
            })
            .collect::<Vec<_>>();

        Self {
            scale: 0.5 / step,
            length,
            segments,
        }
    }

    /// The length of the curve in m.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Samples the centre line and returns the position and tangent unit vector.
    ///
    /// # Parameters
    /// * `pos` - The longitudinal position along the curve
    pub fn sample_centre(&self, pos: f64) -> LaneSample {
        let (segment, t) = self.sample_internal(pos);
        let c = segment.sample(t);
        let c_dp = segment.sample_dt(t);
        LaneSample {
            pos: c,
            tan: c_dp.normalize(),
        }
    }

    /// Finds the segment covering the given longitudinal position,
    /// and the local t-value within it.
    fn sample_internal(&self, pos: f64) -> (&QuadraticBezier2d, f64) {
        let pos = pos * self.scale;

        let idx = usize::min(pos as u32 as _, self.segments.len() - 1);
        let segment = unsafe {
            // SAFETY: The way `idx` is calculated above ensures its within bounds
            self.segments.get_unchecked(idx)
        };

        let t = pos - (idx as f64);

        (segment, t)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn curve_is_arclength_parameterised() {
        let curve = QuadraticBezier2d::new(&[
            Point2d::new(10.0, 10.0),
            Point2d::new(60.0, 40.0),
            Point2d::new(100.0, 45.0),
        ]);
        let curve = LaneCurve::new(&curve);

        let ts = (0..100)
            .map(|i| i as f64 * 0.01 * curve.length())
            .collect::<Vec<_>>();
        for ts in ts.windows(2) {
            let p1 = curve.sample_centre(ts[0]).pos;
            let p2 = curve.sample_centre(ts[1]).pos;
            assert_approx_eq::assert_approx_eq!((p2 - p1).magnitude(), ts[1] - ts[0], 0.01);
        }
    }

    #[test]
    fn endpoints_are_preserved() {
        let curve = QuadraticBezier2d::new(&[
            Point2d::new(-6.0, 2.0),
            Point2d::new(-2.0, 2.0),
            Point2d::new(2.0, 6.0),
        ]);
        let resampled = LaneCurve::new(&curve);

        let start = resampled.sample_centre(0.0).pos;
        let end = resampled.sample_centre(resampled.length()).pos;
        assert!((start - curve.sample(0.0)).magnitude() < 0.05);
        assert!((end - curve.sample(1.0)).magnitude() < 0.05);
    }
}
