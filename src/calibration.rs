//! Control-point calibration.
//!
//! Control points tie image pixels to surveyed world positions. Three
//! non-collinear points are enough to pin down an affine image-to-world map;
//! with more, the map is the least-squares fit.

use nalgebra::{Matrix3, Vector3};
use serde::Serialize;

use crate::site::{Coord, Pixel, SiteConfiguration, World};

/// Control points required before a site can be registered.
pub const MIN_CONTROL_POINTS: usize = 3;

/// Points closer than this to a common line count as collinear.
pub const COLLINEAR_TOLERANCE_PX: f64 = 1.0;

/// Returns true if the points do not all lie on one line.
///
/// Needs at least three points; `tolerance` is the largest distance from the
/// line still treated as "on" it.
pub fn spans_plane<TSpace>(points: &[Coord<TSpace>], tolerance: f64) -> bool {
    let Some(anchor) = points.first() else {
        return false;
    };
    if points.len() < 3 {
        return false;
    }

    let Some(far) = points
        .iter()
        .max_by(|a, b| anchor.distance_to(a).total_cmp(&anchor.distance_to(b)))
    else {
        return false;
    };
    let length = anchor.distance_to(far);
    if length.is_nan() || length <= tolerance {
        return false;
    }

    let (dx, dy) = (far.x - anchor.x, far.y - anchor.y);
    points.iter().any(|p| {
        let cross = dx * (p.y - anchor.y) - dy * (p.x - anchor.x);
        cross.abs() / length > tolerance
    })
}

/// An affine map from image pixels to world coordinates.
///
/// `world = rows * [x, y, 1]^T`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AffineTransform {
    pub rows: [[f64; 3]; 2],
}

impl AffineTransform {
    /// Least-squares fit over (pixel, world) pairs.
    ///
    /// Returns `None` for fewer than [`MIN_CONTROL_POINTS`] pairs, or when the
    /// pixel positions are collinear.
    pub fn fit(pairs: &[(Coord<Pixel>, Coord<World>)]) -> Option<Self> {
        if pairs.len() < MIN_CONTROL_POINTS {
            return None;
        }
        let pixels: Vec<Coord<Pixel>> = pairs.iter().map(|(p, _)| *p).collect();
        if !spans_plane(&pixels, COLLINEAR_TOLERANCE_PX) {
            return None;
        }

        let mut normal = Matrix3::<f64>::zeros();
        let mut rhs_x = Vector3::<f64>::zeros();
        let mut rhs_y = Vector3::<f64>::zeros();
        for (pixel, world) in pairs {
            let v = Vector3::new(pixel.x, pixel.y, 1.0);
            normal += v * v.transpose();
            rhs_x += v * world.x;
            rhs_y += v * world.y;
        }

        let inverse = normal.try_inverse()?;
        let cx = inverse * rhs_x;
        let cy = inverse * rhs_y;
        Some(Self {
            rows: [[cx[0], cx[1], cx[2]], [cy[0], cy[1], cy[2]]],
        })
    }

    /// Maps an image position to world coordinates.
    pub fn apply(&self, pixel: &Coord<Pixel>) -> Coord<World> {
        let [r0, r1] = self.rows;
        Coord::new(
            r0[0] * pixel.x + r0[1] * pixel.y + r0[2],
            r1[0] * pixel.x + r1[1] * pixel.y + r1[2],
        )
    }

    /// Root-mean-square distance between mapped pixels and their world pairs.
    pub fn rms_residual(&self, pairs: &[(Coord<Pixel>, Coord<World>)]) -> f64 {
        if pairs.is_empty() {
            return 0.0;
        }
        let sum: f64 = pairs
            .iter()
            .map(|(pixel, world)| self.apply(pixel).distance_to(world).powi(2))
            .sum();
        (sum / pairs.len() as f64).sqrt()
    }
}

/// What kind of calibration a site's control points support.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Calibration {
    /// Enough surveyed points for an absolute image-to-world map.
    Absolute(AffineTransform),
    /// Positions are only meaningful relative to each other.
    Relative,
}

impl Calibration {
    /// Derives the calibration from the control points that carry world
    /// coordinates.
    pub fn from_site(site: &SiteConfiguration) -> Self {
        let pairs: Vec<(Coord<Pixel>, Coord<World>)> = site
            .control_points()
            .values()
            .filter_map(|cp| cp.world.map(|world| (cp.position, world)))
            .collect();

        match AffineTransform::fit(&pairs) {
            Some(transform) => Calibration::Absolute(transform),
            None => Calibration::Relative,
        }
    }

    pub fn is_absolute(&self) -> bool {
        matches!(self, Calibration::Absolute(_))
    }
}
