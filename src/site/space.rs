//! Coordinate space marker types.
//!
//! These are zero-sized types (ZSTs) used as type parameters to distinguish
//! between image coordinates and real-world coordinates at compile time.

use std::fmt;

/// Marker type for pixel coordinates within the reference image.
///
/// (0, 0) is the top-left corner of the image; x grows to the right and y
/// grows downwards.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Marker type for real-world coordinates supplied by the operator.
///
/// World coordinates are planar site-local values (easting, northing) in
/// metres. Their origin is whatever the operator surveyed against.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum World {}

impl fmt::Debug for Pixel {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {} // This is unreachable since Pixel has no variants
    }
}

impl fmt::Debug for World {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {} // This is unreachable since World has no variants
    }
}
