use crate::util::Interval;
use super::{Point2d, Vector2d};
use super::curve::ParametricCurve2d;

/// A straight line segment between two points.
#[derive(Copy, Clone, Debug)]
pub struct LineSegment2d {
    start: Point2d,
    end: Point2d,
}

impl LineSegment2d {
    pub const fn from_ends(start: Point2d, end: Point2d) -> Self {
        Self { start, end }
    }
}

impl ParametricCurve2d for LineSegment2d {
    fn sample(&self, t: f64) -> Point2d {
        self.start + t * (self.end - self.start)
    }

    fn bounds(&self) -> Interval<f64> {
        Interval { min: 0.0, max: 1.0 }
    }

    fn sample_dt(&self, _t: f64) -> Vector2d {
        self.end - self.start
    }

    fn sample_dt2(&self, _t: f64) -> Vector2d {
        Vector2d::new(0.0, 0.0)
    }
}
