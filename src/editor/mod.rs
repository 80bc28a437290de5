//! Interactive editing of spaces and control points.
//!
//! Editors are plain state machines fed with [`PointerEvent`]s in image
//! coordinates. Whatever draws the image (a GUI canvas, a terminal script,
//! a test) only has to translate its input into these events.

pub mod landmark;
pub mod region;

pub use landmark::{LandmarkEditor, LandmarkOutcome, DEFAULT_PICK_RADIUS};
pub use region::{RegionEditor, RegionOutcome, RegionState};

use crate::site::{Coord, Pixel};

/// Pointer buttons the editors distinguish.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Button {
    Primary,
    Secondary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerAction {
    Press,
    Release,
}

/// A pointer press or release over the displayed image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub action: PointerAction,
    pub button: Button,
    pub position: Coord<Pixel>,
    /// The "remove" modifier (CTRL on a desktop) is held.
    pub remove: bool,
}

impl PointerEvent {
    /// Primary-button press.
    pub fn press(x: f64, y: f64) -> Self {
        Self {
            action: PointerAction::Press,
            button: Button::Primary,
            position: Coord::new(x, y),
            remove: false,
        }
    }

    /// Primary-button press with the remove modifier held.
    pub fn remove_press(x: f64, y: f64) -> Self {
        Self {
            remove: true,
            ..Self::press(x, y)
        }
    }

    /// Primary-button release.
    pub fn release(x: f64, y: f64) -> Self {
        Self {
            action: PointerAction::Release,
            ..Self::press(x, y)
        }
    }

    pub(crate) fn is_primary_press(&self) -> bool {
        self.action == PointerAction::Press && self.button == Button::Primary
    }
}
