//! Parking-space drawing.
//!
//! Press to anchor the first corner, release to close the rectangle.
//! Pressing with the remove modifier deletes the space under the pointer;
//! where spaces overlap, the newest one goes.

use tracing::debug;

use super::{Button, PointerAction, PointerEvent};
use crate::error::SetupError;
use crate::site::{Coord, Pixel, Rect, SiteConfiguration, SpaceId};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum RegionState {
    #[default]
    Idle,
    Drawing {
        first_corner: Coord<Pixel>,
    },
}

/// What an event did to the site.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionOutcome {
    /// A first corner was recorded.
    Started,
    Added(SpaceId),
    /// The pending rectangle was invalid and dropped.
    Discarded,
    Removed(SpaceId),
    /// The event had no effect.
    Ignored,
}

#[derive(Clone, Debug, Default)]
pub struct RegionEditor {
    state: RegionState,
}

impl RegionEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RegionState {
        self.state
    }

    /// Drops any half-drawn rectangle.
    pub fn reset(&mut self) {
        self.state = RegionState::Idle;
    }

    /// Applies one pointer event to the site's parking spaces.
    ///
    /// # Errors
    /// `State` if the site has no image or is frozen. An invalid rectangle is
    /// not an error: it is discarded and reported as [`RegionOutcome::Discarded`].
    pub fn handle(
        &mut self,
        site: &mut SiteConfiguration,
        event: &PointerEvent,
    ) -> Result<RegionOutcome, SetupError> {
        if site.image().map_or(true, |image| image.is_empty()) {
            self.reset();
            return Err(SetupError::state(
                "take a setup image before editing parking spaces",
            ));
        }
        if site.is_frozen() {
            self.reset();
            return Err(SetupError::state(
                "the site is registered; parking spaces can no longer be edited",
            ));
        }
        if event.button != Button::Primary {
            return Ok(RegionOutcome::Ignored);
        }

        match (self.state, event.action) {
            (RegionState::Idle, PointerAction::Press) if event.remove => {
                match site.space_at(&event.position) {
                    Some(id) => {
                        site.remove_space(id)?;
                        debug!(space = %id, "removed parking space");
                        Ok(RegionOutcome::Removed(id))
                    }
                    None => Ok(RegionOutcome::Ignored),
                }
            }
            // A press while drawing means the release was lost; start over.
            (_, PointerAction::Press) => {
                self.state = RegionState::Drawing {
                    first_corner: event.position,
                };
                Ok(RegionOutcome::Started)
            }
            (RegionState::Drawing { first_corner }, PointerAction::Release) => {
                self.state = RegionState::Idle;
                let rect = Rect::from_corners(first_corner, event.position);
                match site.add_space(rect) {
                    Ok(id) => {
                        debug!(space = %id, %rect, "added parking space");
                        Ok(RegionOutcome::Added(id))
                    }
                    Err(SetupError::Validation { message }) => {
                        debug!(%rect, reason = %message, "discarded pending parking space");
                        Ok(RegionOutcome::Discarded)
                    }
                    Err(other) => Err(other),
                }
            }
            (RegionState::Idle, PointerAction::Release) => Ok(RegionOutcome::Ignored),
        }
    }
}
