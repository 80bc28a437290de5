//! The person driving the setup session.
//!
//! The controller asks questions and reports progress through [`Operator`];
//! it never talks to a terminal or widget toolkit directly.

use crate::site::{ControlPointId, Coord, Pixel, World};

pub trait Operator {
    /// Asks a yes/no question. Returns `true` only on an explicit yes.
    fn confirm(&mut self, prompt: &str) -> bool;

    /// Asks for the real-world coordinate of a freshly placed control point.
    /// `None` leaves it unset.
    fn request_world_coordinate(
        &mut self,
        id: ControlPointId,
        position: Coord<Pixel>,
    ) -> Option<Coord<World>>;

    /// Shows an informational message.
    fn notify(&mut self, message: &str);
}

/// Answers every question the same way and collects notices.
///
/// Used for non-interactive runs and in tests.
#[derive(Clone, Debug, Default)]
pub struct ScriptedOperator {
    pub answer: bool,
    pub world_coordinates: Vec<Option<Coord<World>>>,
    pub prompts: Vec<String>,
    pub notices: Vec<String>,
}

impl ScriptedOperator {
    pub fn agreeing() -> Self {
        Self {
            answer: true,
            ..Self::default()
        }
    }

    pub fn refusing() -> Self {
        Self::default()
    }

    /// Queues world coordinates handed out in order, one per new control point.
    pub fn with_world_coordinates(mut self, coords: Vec<Option<Coord<World>>>) -> Self {
        self.world_coordinates = coords;
        self
    }
}

impl Operator for ScriptedOperator {
    fn confirm(&mut self, prompt: &str) -> bool {
        self.prompts.push(prompt.to_string());
        self.answer
    }

    fn request_world_coordinate(
        &mut self,
        _id: ControlPointId,
        _position: Coord<Pixel>,
    ) -> Option<Coord<World>> {
        if self.world_coordinates.is_empty() {
            None
        } else {
            self.world_coordinates.remove(0)
        }
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}
