use nalgebra_glm as glm;

/// A pointer transition, with positions given as logical pixel offsets from
/// the center of the canvas.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PointerEvent {
    Pressed(glm::Vec2),
    Moved(glm::Vec2),
    Released,
    Cancelled,
}

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum TargetState {
    #[default]
    Idle,
    Active,
}

/// The point every ball is attracted to.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GravityTarget {
    pub position: glm::Vec3,
    pub state: TargetState,
    pub pixels_per_unit: f32,
    pub track_while_held: bool,
}

impl Default for GravityTarget {
    fn default() -> Self {
        Self {
            position: glm::Vec3::zeros(),
            state: TargetState::Idle,
            pixels_per_unit: 100.0,
            track_while_held: false,
        }
    }
}

impl GravityTarget {
    pub fn new(pixels_per_unit: f32, track_while_held: bool) -> Self {
        Self {
            pixels_per_unit,
            track_while_held,
            ..Default::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == TargetState::Active
    }

    pub fn receive_pointer_event(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Pressed(offset) => self.press(offset),
            PointerEvent::Moved(offset) => {
                if self.track_while_held && self.is_active() {
                    self.steer(offset);
                }
            }
            PointerEvent::Released | PointerEvent::Cancelled => self.release(),
        }
    }

    /// Moves the target in the horizontal plane. Screen right maps to +X and
    /// screen up maps to +Z; the Y coordinate is kept.
    pub fn press(&mut self, offset_from_center: glm::Vec2) {
        self.steer(offset_from_center);
        self.state = TargetState::Active;
    }

    pub fn release(&mut self) {
        self.position = glm::Vec3::zeros();
        self.state = TargetState::Idle;
    }

    fn steer(&mut self, offset_from_center: glm::Vec2) {
        let scale = self.pixels_per_unit.max(f32::EPSILON);
        self.position.x = offset_from_center.x / scale;
        self.position.z = -offset_from_center.y / scale;
    }
}
