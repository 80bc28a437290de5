//! Site configuration data model.
//!
//! Everything the operator defines during setup lives here: the reference
//! image, the parking-space rectangles drawn over it and the control points
//! that tie image pixels to surveyed positions.
//!
//! # Design Principles
//!
//! 1. **Type Safety**: newtype ids and coordinate-space markers keep pixel
//!    positions, world positions and the different kinds of id apart.
//!
//! 2. **Guarded Mutation**: [`SiteConfiguration`] only changes through
//!    methods that check its invariants (image present, no duplicate or
//!    degenerate spaces, ids never reused, frozen after registration).
//!
//! 3. **Permissive Loading**: a hand-edited site file may still contain
//!    invalid entries; [`crate::validation`] reports them instead of the
//!    loader refusing the file.
//!
//! # Example
//!
//! ```
//! use pipark_setup::site::{Rect, ReferenceImage, SiteConfiguration, SpaceId};
//!
//! let mut site = SiteConfiguration::with_image(
//!     ReferenceImage::new("setup.jpeg", 640, 480, vec![0xff, 0xd8]),
//! );
//! let id = site.add_space(Rect::from_xyxy(10.0, 10.0, 110.0, 60.0)).unwrap();
//! assert_eq!(id, SpaceId(1));
//! ```

mod coord;
mod ids;
pub mod io_json;
mod model;
mod rect;
mod space;

// Re-export core types for convenient access
pub use coord::Coord;
pub use ids::{ControlPointId, SiteId, SpaceId};
pub use model::{ClearedEntries, ControlPoint, ParkingSpace, ReferenceImage, SiteConfiguration};
pub use rect::Rect;
pub use space::{Pixel, World};
