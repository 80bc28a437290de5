//! Site configuration model.
//!
//! [`SiteConfiguration`] is the aggregate root the whole setup session works
//! on: one reference image, the parking spaces drawn over it, and the
//! control points used to calibrate it. All mutation goes through methods
//! that enforce the model's invariants, so an invalid configuration can only
//! come from a hand-edited site file (which validation then reports).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::coord::Coord;
use super::ids::{ControlPointId, SiteId, SpaceId};
use super::rect::Rect;
use super::space::{Pixel, World};
use crate::error::SetupError;

/// The still photo that all regions and control points are defined against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceImage {
    /// Where the still is stored on disk.
    pub file_name: String,

    /// Width of the image in pixels.
    pub width: u32,

    /// Height of the image in pixels.
    pub height: u32,

    /// Encoded image bytes as produced by the camera.
    ///
    /// Not persisted in the site file; the still lives at `file_name`.
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl ReferenceImage {
    /// Creates a new reference image.
    pub fn new(file_name: impl Into<String>, width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            width,
            height,
            data,
        }
    }

    /// Returns true if the image has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns true if the point lies within the image, edges included.
    pub fn contains(&self, point: &Coord<Pixel>) -> bool {
        point.x >= 0.0
            && point.y >= 0.0
            && point.x <= f64::from(self.width)
            && point.y <= f64::from(self.height)
    }
}

/// One monitored parking spot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParkingSpace {
    pub id: SpaceId,

    /// Bounding rectangle in image pixels.
    pub rect: Rect<Pixel>,
}

/// A calibration landmark.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub id: ControlPointId,

    /// Position in image pixels.
    pub position: Coord<Pixel>,

    /// Surveyed real-world position, if the operator supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world: Option<Coord<World>>,
}

/// Number of entries a new reference image swept away.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClearedEntries {
    pub spaces: usize,
    pub control_points: usize,
}

/// The persistent configuration of one car park.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteConfiguration {
    /// Optional human-readable name of the car park.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    site_id: Option<SiteId>,

    #[serde(default)]
    image: Option<ReferenceImage>,

    #[serde(default)]
    spaces: BTreeMap<SpaceId, ParkingSpace>,

    #[serde(default)]
    control_points: BTreeMap<ControlPointId, ControlPoint>,

    /// Highest space id ever issued; never decreases.
    #[serde(default)]
    last_space_id: u64,

    /// Highest control point id ever issued; never decreases.
    #[serde(default)]
    last_control_point_id: u64,

    #[serde(skip)]
    frozen: bool,
}

impl SiteConfiguration {
    /// Creates an empty configuration with no image.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration seeded with a reference image.
    pub fn with_image(image: ReferenceImage) -> Self {
        Self {
            image: Some(image),
            ..Self::default()
        }
    }

    /// Sets the site name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn image(&self) -> Option<&ReferenceImage> {
        self.image.as_ref()
    }

    pub fn spaces(&self) -> &BTreeMap<SpaceId, ParkingSpace> {
        &self.spaces
    }

    pub fn space(&self, id: SpaceId) -> Option<&ParkingSpace> {
        self.spaces.get(&id)
    }

    pub fn control_points(&self) -> &BTreeMap<ControlPointId, ControlPoint> {
        &self.control_points
    }

    pub fn control_point(&self, id: ControlPointId) -> Option<&ControlPoint> {
        self.control_points.get(&id)
    }

    /// The identifier assigned by the registration server, if registered.
    pub fn site_id(&self) -> Option<&SiteId> {
        self.site_id.as_ref()
    }

    /// Returns true while spaces and control points may not be changed.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Returns true if any space or control point has been defined.
    pub fn has_entries(&self) -> bool {
        !self.spaces.is_empty() || !self.control_points.is_empty()
    }

    /// Replaces the reference image and drops every space and control point.
    ///
    /// Regions are meaningless against a different photo, so both
    /// collections are cleared together. Id counters are kept so that ids
    /// stay unique for the whole session.
    pub fn replace_image(&mut self, image: ReferenceImage) -> Result<ClearedEntries, SetupError> {
        if self.frozen {
            return Err(SetupError::state(
                "the site is registered; its reference image can no longer change",
            ));
        }
        if image.is_empty() {
            return Err(SetupError::camera("captured image is empty"));
        }

        let cleared = ClearedEntries {
            spaces: self.spaces.len(),
            control_points: self.control_points.len(),
        };
        self.spaces.clear();
        self.control_points.clear();
        self.image = Some(image);
        Ok(cleared)
    }

    /// Adds a parking space and returns its freshly allocated id.
    ///
    /// # Errors
    /// `State` if there is no image or the site is frozen; `Validation` if the
    /// rectangle is degenerate, leaves the image or duplicates an existing
    /// space.
    pub fn add_space(&mut self, rect: Rect<Pixel>) -> Result<SpaceId, SetupError> {
        let image = self.editable_image("parking spaces")?;

        if !rect.is_finite() {
            return Err(SetupError::validation("parking space coordinates must be finite"));
        }
        if rect.is_degenerate() {
            return Err(SetupError::validation(format!(
                "parking space {} must have non-zero width and height",
                rect
            )));
        }
        if !rect.is_within(f64::from(image.width), f64::from(image.height)) {
            return Err(SetupError::validation(format!(
                "parking space {} extends outside the {}x{} image",
                rect, image.width, image.height
            )));
        }
        if let Some(existing) = self.spaces.values().find(|space| space.rect == rect) {
            return Err(SetupError::validation(format!(
                "parking space {} duplicates space {}",
                rect, existing.id
            )));
        }

        self.last_space_id = self
            .last_space_id
            .checked_add(1)
            .ok_or_else(|| SetupError::validation("parking space ids are exhausted"))?;
        let id = SpaceId::new(self.last_space_id);
        self.spaces.insert(id, ParkingSpace { id, rect });
        Ok(id)
    }

    /// Removes a parking space.
    pub fn remove_space(&mut self, id: SpaceId) -> Result<ParkingSpace, SetupError> {
        self.editable_image("parking spaces")?;
        self.spaces
            .remove(&id)
            .ok_or_else(|| SetupError::validation(format!("no parking space with id {}", id)))
    }

    /// Returns the most recently created space containing the point.
    ///
    /// The returned id is the map key, so it can always be passed to
    /// [`remove_space`](Self::remove_space).
    pub fn space_at(&self, point: &Coord<Pixel>) -> Option<SpaceId> {
        // Ids are allocated in increasing order, so the map's last match is
        // the newest space.
        self.spaces
            .iter()
            .rev()
            .find(|(_, space)| space.rect.contains(point))
            .map(|(id, _)| *id)
    }

    /// Adds a control point without a world coordinate.
    pub fn add_control_point(
        &mut self,
        position: Coord<Pixel>,
    ) -> Result<ControlPointId, SetupError> {
        let image = self.editable_image("control points")?;

        if !position.is_finite() {
            return Err(SetupError::validation("control point coordinates must be finite"));
        }
        if !image.contains(&position) {
            return Err(SetupError::validation(format!(
                "control point {} lies outside the {}x{} image",
                position, image.width, image.height
            )));
        }

        self.last_control_point_id = self
            .last_control_point_id
            .checked_add(1)
            .ok_or_else(|| SetupError::validation("control point ids are exhausted"))?;
        let id = ControlPointId::new(self.last_control_point_id);
        self.control_points.insert(
            id,
            ControlPoint {
                id,
                position,
                world: None,
            },
        );
        Ok(id)
    }

    /// Sets (or clears) the real-world coordinate of a control point.
    pub fn set_world_coordinate(
        &mut self,
        id: ControlPointId,
        world: Option<Coord<World>>,
    ) -> Result<(), SetupError> {
        self.editable_image("control points")?;

        if let Some(world) = &world {
            if !world.is_finite() {
                return Err(SetupError::validation("world coordinates must be finite"));
            }
        }

        let point = self
            .control_points
            .get_mut(&id)
            .ok_or_else(|| SetupError::validation(format!("no control point with id {}", id)))?;
        point.world = world;
        Ok(())
    }

    /// Removes a control point.
    pub fn remove_control_point(
        &mut self,
        id: ControlPointId,
    ) -> Result<ControlPoint, SetupError> {
        self.editable_image("control points")?;
        self.control_points
            .remove(&id)
            .ok_or_else(|| SetupError::validation(format!("no control point with id {}", id)))
    }

    /// Returns the control point nearest to `point` within `radius` pixels.
    ///
    /// Ties on distance go to the lowest id.
    pub fn nearest_control_point(
        &self,
        point: &Coord<Pixel>,
        radius: f64,
    ) -> Option<ControlPointId> {
        self.control_points
            .iter()
            .map(|(id, cp)| (cp.position.distance_to(point), *id))
            .filter(|(distance, _)| *distance <= radius)
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, id)| id)
    }

    pub(crate) fn freeze(&mut self) {
        self.frozen = true;
    }

    pub(crate) fn unfreeze(&mut self) {
        if self.site_id.is_none() {
            self.frozen = false;
        }
    }

    /// Records the server-assigned id; the configuration stays frozen.
    pub(crate) fn finalize(&mut self, site_id: SiteId) {
        self.site_id = Some(site_id);
        self.frozen = true;
    }

    /// Re-establishes in-memory state after deserializing a site file.
    pub(crate) fn restore_after_load(&mut self) {
        self.frozen = self.site_id.is_some();
        let space_ids = self
            .spaces
            .iter()
            .flat_map(|(key, space)| [key.as_u64(), space.id.as_u64()]);
        self.last_space_id = space_ids.fold(self.last_space_id, u64::max);
        let control_point_ids = self
            .control_points
            .iter()
            .flat_map(|(key, cp)| [key.as_u64(), cp.id.as_u64()]);
        self.last_control_point_id = control_point_ids.fold(self.last_control_point_id, u64::max);
    }

    fn editable_image(&self, what: &str) -> Result<&ReferenceImage, SetupError> {
        if self.frozen {
            return Err(SetupError::state(format!(
                "the site is registered; {} can no longer be edited",
                what
            )));
        }
        match &self.image {
            Some(image) if !image.is_empty() => Ok(image),
            _ => Err(SetupError::state(format!(
                "take a setup image before editing {}",
                what
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteConfiguration {
        SiteConfiguration::with_image(ReferenceImage::new("setup.jpeg", 640, 480, vec![1, 2, 3]))
    }

    #[test]
    fn test_add_space_allocates_sequential_ids() {
        let mut site = site();
        let a = site.add_space(Rect::from_xyxy(10.0, 10.0, 110.0, 60.0)).unwrap();
        let b = site.add_space(Rect::from_xyxy(200.0, 10.0, 300.0, 60.0)).unwrap();
        assert_eq!(a, SpaceId(1));
        assert_eq!(b, SpaceId(2));
    }

    #[test]
    fn test_removed_ids_are_not_reused() {
        let mut site = site();
        let a = site.add_space(Rect::from_xyxy(10.0, 10.0, 110.0, 60.0)).unwrap();
        site.remove_space(a).unwrap();
        let b = site.add_space(Rect::from_xyxy(10.0, 10.0, 110.0, 60.0)).unwrap();
        assert_eq!(b, SpaceId(2));
    }

    #[test]
    fn test_duplicate_space_rejected() {
        let mut site = site();
        site.add_space(Rect::from_xyxy(10.0, 10.0, 110.0, 60.0)).unwrap();
        let err = site
            .add_space(Rect::from_xyxy(110.0, 60.0, 10.0, 10.0))
            .unwrap_err();
        assert!(matches!(err, SetupError::Validation { .. }));
        assert_eq!(site.spaces().len(), 1);
    }

    #[test]
    fn test_degenerate_space_rejected() {
        let mut site = site();
        let err = site
            .add_space(Rect::from_xyxy(10.0, 10.0, 10.0, 60.0))
            .unwrap_err();
        assert!(matches!(err, SetupError::Validation { .. }));
        assert!(site.spaces().is_empty());
    }

    #[test]
    fn test_space_outside_image_rejected() {
        let mut site = site();
        let err = site
            .add_space(Rect::from_xyxy(600.0, 400.0, 700.0, 500.0))
            .unwrap_err();
        assert!(matches!(err, SetupError::Validation { .. }));
    }

    #[test]
    fn test_edit_without_image_is_state_error() {
        let mut site = SiteConfiguration::new();
        let err = site
            .add_space(Rect::from_xyxy(10.0, 10.0, 110.0, 60.0))
            .unwrap_err();
        assert!(matches!(err, SetupError::State { .. }));

        let err = site.add_control_point(Coord::new(5.0, 5.0)).unwrap_err();
        assert!(matches!(err, SetupError::State { .. }));
    }

    #[test]
    fn test_space_at_prefers_newest() {
        let mut site = site();
        site.add_space(Rect::from_xyxy(0.0, 0.0, 100.0, 100.0)).unwrap();
        let newer = site.add_space(Rect::from_xyxy(50.0, 50.0, 150.0, 150.0)).unwrap();
        assert_eq!(site.space_at(&Coord::new(75.0, 75.0)), Some(newer));
        assert_eq!(site.space_at(&Coord::new(10.0, 10.0)), Some(SpaceId(1)));
        assert_eq!(site.space_at(&Coord::new(300.0, 300.0)), None);
    }

    #[test]
    fn test_nearest_control_point_tie_goes_to_lowest_id() {
        let mut site = site();
        let a = site.add_control_point(Coord::new(100.0, 100.0)).unwrap();
        let _b = site.add_control_point(Coord::new(110.0, 100.0)).unwrap();
        assert_eq!(site.nearest_control_point(&Coord::new(105.0, 100.0), 10.0), Some(a));
        assert_eq!(site.nearest_control_point(&Coord::new(300.0, 300.0), 10.0), None);
    }

    #[test]
    fn test_replace_image_clears_entries_and_keeps_counters() {
        let mut site = site();
        site.add_space(Rect::from_xyxy(10.0, 10.0, 110.0, 60.0)).unwrap();
        site.add_control_point(Coord::new(5.0, 5.0)).unwrap();

        let cleared = site
            .replace_image(ReferenceImage::new("new.jpeg", 800, 600, vec![9]))
            .unwrap();
        assert_eq!(
            cleared,
            ClearedEntries {
                spaces: 1,
                control_points: 1
            }
        );
        assert!(!site.has_entries());

        let id = site.add_space(Rect::from_xyxy(10.0, 10.0, 110.0, 60.0)).unwrap();
        assert_eq!(id, SpaceId(2));
    }

    #[test]
    fn test_frozen_site_rejects_mutation() {
        let mut site = site();
        let space = site.add_space(Rect::from_xyxy(10.0, 10.0, 110.0, 60.0)).unwrap();
        site.finalize(SiteId::new("abc"));

        assert!(matches!(
            site.remove_space(space),
            Err(SetupError::State { .. })
        ));
        assert!(matches!(
            site.add_control_point(Coord::new(1.0, 1.0)),
            Err(SetupError::State { .. })
        ));
        site.unfreeze();
        assert!(site.is_frozen());
    }

    #[test]
    fn test_exhausted_ids_are_rejected() {
        let json = r#"{
            "image": {"file_name": "setup.jpeg", "width": 640, "height": 480},
            "spaces": {
                "18446744073709551615": {
                    "id": 18446744073709551615,
                    "rect": {"xmin": 0, "ymin": 0, "xmax": 10, "ymax": 10}
                }
            },
            "last_control_point_id": 18446744073709551615
        }"#;
        let mut site = crate::site::io_json::from_json_str(json).expect("parse");

        let err = site
            .add_space(Rect::from_xyxy(20.0, 20.0, 30.0, 30.0))
            .unwrap_err();
        assert!(matches!(err, SetupError::Validation { .. }));
        assert_eq!(site.spaces().len(), 1);
        assert!(site.space(SpaceId(u64::MAX)).is_some());

        let err = site.add_control_point(Coord::new(5.0, 5.0)).unwrap_err();
        assert!(matches!(err, SetupError::Validation { .. }));
        assert!(site.control_points().is_empty());
    }

    #[test]
    fn test_hit_tests_return_removable_keys() {
        let json = r#"{
            "image": {"file_name": "setup.jpeg", "width": 640, "height": 480},
            "spaces": {
                "5": {"id": 2, "rect": {"xmin": 0, "ymin": 0, "xmax": 10, "ymax": 10}}
            },
            "control_points": {
                "4": {"id": 9, "position": {"x": 100, "y": 100}}
            }
        }"#;
        let mut site = crate::site::io_json::from_json_str(json).expect("parse");

        let space = site.space_at(&Coord::new(5.0, 5.0)).expect("hit");
        assert_eq!(space, SpaceId(5));
        site.remove_space(space).expect("remove space");

        let cp = site
            .nearest_control_point(&Coord::new(101.0, 100.0), 10.0)
            .expect("hit");
        assert_eq!(cp, ControlPointId(4));
        site.remove_control_point(cp).expect("remove control point");

        // counters cover both keys and inner ids
        let id = site.add_control_point(Coord::new(1.0, 1.0)).unwrap();
        assert_eq!(id, ControlPointId(10));
    }

    #[test]
    fn test_set_world_coordinate() {
        let mut site = site();
        let id = site.add_control_point(Coord::new(5.0, 5.0)).unwrap();
        site.set_world_coordinate(id, Some(Coord::new(12.5, -3.0)))
            .unwrap();
        assert_eq!(
            site.control_point(id).unwrap().world,
            Some(Coord::new(12.5, -3.0))
        );

        let err = site
            .set_world_coordinate(ControlPointId(99), None)
            .unwrap_err();
        assert!(matches!(err, SetupError::Validation { .. }));
    }
}
