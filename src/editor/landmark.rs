//! Control-point placement.
//!
//! A press drops a new control point; a press with the remove modifier
//! deletes the nearest point within the pick radius. Releases do nothing.

use tracing::debug;

use super::PointerEvent;
use crate::error::SetupError;
use crate::site::{ControlPointId, SiteConfiguration};

/// How close (in image pixels) a remove-press must be to a control point.
pub const DEFAULT_PICK_RADIUS: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LandmarkOutcome {
    Added(ControlPointId),
    Removed(ControlPointId),
    Ignored,
}

#[derive(Clone, Debug)]
pub struct LandmarkEditor {
    pick_radius: f64,
}

impl Default for LandmarkEditor {
    fn default() -> Self {
        Self::new(DEFAULT_PICK_RADIUS)
    }
}

impl LandmarkEditor {
    pub fn new(pick_radius: f64) -> Self {
        Self { pick_radius }
    }

    pub fn pick_radius(&self) -> f64 {
        self.pick_radius
    }

    /// Applies one pointer event to the site's control points.
    ///
    /// A new point has no world coordinate yet; the caller asks the operator
    /// for one.
    ///
    /// # Errors
    /// `State` if the site has no image or is frozen, `Validation` if the
    /// press lies outside the image.
    pub fn handle(
        &mut self,
        site: &mut SiteConfiguration,
        event: &PointerEvent,
    ) -> Result<LandmarkOutcome, SetupError> {
        if site.image().map_or(true, |image| image.is_empty()) {
            return Err(SetupError::state(
                "take a setup image before editing control points",
            ));
        }
        if site.is_frozen() {
            return Err(SetupError::state(
                "the site is registered; control points can no longer be edited",
            ));
        }
        if !event.is_primary_press() {
            return Ok(LandmarkOutcome::Ignored);
        }

        if event.remove {
            return match site.nearest_control_point(&event.position, self.pick_radius) {
                Some(id) => {
                    site.remove_control_point(id)?;
                    debug!(control_point = %id, "removed control point");
                    Ok(LandmarkOutcome::Removed(id))
                }
                None => Ok(LandmarkOutcome::Ignored),
            };
        }

        let id = site.add_control_point(event.position)?;
        debug!(control_point = %id, position = %event.position, "added control point");
        Ok(LandmarkOutcome::Added(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{Coord, ReferenceImage};

    fn site() -> SiteConfiguration {
        SiteConfiguration::with_image(ReferenceImage::new("setup.jpeg", 640, 480, vec![1]))
    }

    #[test]
    fn test_press_adds_point_without_world_coordinate() {
        let mut site = site();
        let mut editor = LandmarkEditor::default();

        let outcome = editor
            .handle(&mut site, &PointerEvent::press(50.0, 60.0))
            .unwrap();
        assert_eq!(outcome, LandmarkOutcome::Added(ControlPointId(1)));
        let cp = site.control_point(ControlPointId(1)).unwrap();
        assert_eq!(cp.position, Coord::new(50.0, 60.0));
        assert!(cp.world.is_none());
    }

    #[test]
    fn test_release_is_ignored() {
        let mut site = site();
        let mut editor = LandmarkEditor::default();
        let outcome = editor
            .handle(&mut site, &PointerEvent::release(50.0, 60.0))
            .unwrap();
        assert_eq!(outcome, LandmarkOutcome::Ignored);
        assert!(site.control_points().is_empty());
    }

    #[test]
    fn test_remove_press_picks_nearest_within_radius() {
        let mut site = site();
        let mut editor = LandmarkEditor::new(10.0);
        editor.handle(&mut site, &PointerEvent::press(100.0, 100.0)).unwrap();
        editor.handle(&mut site, &PointerEvent::press(108.0, 100.0)).unwrap();

        let outcome = editor
            .handle(&mut site, &PointerEvent::remove_press(106.0, 100.0))
            .unwrap();
        assert_eq!(outcome, LandmarkOutcome::Removed(ControlPointId(2)));

        let outcome = editor
            .handle(&mut site, &PointerEvent::remove_press(300.0, 300.0))
            .unwrap();
        assert_eq!(outcome, LandmarkOutcome::Ignored);
        assert_eq!(site.control_points().len(), 1);
    }

    #[test]
    fn test_press_outside_image_is_validation_error() {
        let mut site = site();
        let mut editor = LandmarkEditor::default();
        let err = editor
            .handle(&mut site, &PointerEvent::press(700.0, 10.0))
            .unwrap_err();
        assert!(matches!(err, SetupError::Validation { .. }));
    }

    #[test]
    fn test_without_image_is_state_error() {
        let mut site = SiteConfiguration::new();
        let err = LandmarkEditor::default()
            .handle(&mut site, &PointerEvent::press(1.0, 1.0))
            .unwrap_err();
        assert!(matches!(err, SetupError::State { .. }));
    }
}
