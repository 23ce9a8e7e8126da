use cgmath::prelude::*;
use crate::util::Interval;
use super::{Point2d, Vector2d};
use super::curve::ParametricCurve2d;

/// A quadratic bezier curve
#[derive(Copy, Clone)]
pub struct QuadraticBezier2d {
    points: [Point2d; 3]
}

impl QuadraticBezier2d {
    pub const fn new(points: &[Point2d; 3]) -> Self {
        Self { points: *points }
    }
}

impl ParametricCurve2d for QuadraticBezier2d {
    fn sample(&self, t: f64) -> Point2d {
        let t1 = 1.0 - t;
        Point2d::from_vec(t1 * t1 * self.points[0].to_vec()
            + 2.0 * t1 * t * self.points[1].to_vec()
            + t * t * self.points[2].to_vec())
    }

    fn bounds(&self) -> Interval<f64> {
        Interval { min: 0.0, max: 1.0 }
    }

    fn sample_dt(&self, t: f64) -> Vector2d {
        let t1 = 1.0 - t;
        -2.0 * t1 * self.points[0].to_vec()
            + (2.0 - 4.0 * t) * self.points[1].to_vec()
            + 2.0 * t * self.points[2].to_vec()
    }

    fn sample_dt2(&self, _t: f64) -> Vector2d {
        2.0 * self.points[0].to_vec()
            - 4.0 * self.points[1].to_vec()
            + 2.0 * self.points[2].to_vec()
    }
}
