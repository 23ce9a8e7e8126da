//! Mathematical structs and functions.

use cgmath::{Point2, Vector2};
pub use util::*;
pub use curve::{equidistant_points_along_curve, ParametricCurve2d};
pub use bezier::QuadraticBezier2d;
pub use segment::LineSegment2d;

mod util;
mod curve;
mod bezier;
mod segment;

/// A 2D point
pub type Point2d = Point2<f64>;

/// A 2D vector
pub type Vector2d = Vector2<f64>;
