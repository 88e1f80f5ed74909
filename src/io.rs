use crate::{config::InputModel, gravity::PointerEvent};

/// Tracks the cursor relative to the window center in logical pixels, so a
/// press lands at the same place in the world on any display density.
pub struct Io {
    /// Window center in physical pixels
    pub window_center: nalgebra_glm::Vec2,
    pub scale_factor: f32,
    /// Cursor position relative to the window center, +Y pointing down
    pub cursor_offset: nalgebra_glm::Vec2,
}

impl Default for Io {
    fn default() -> Self {
        Self {
            window_center: nalgebra_glm::Vec2::zeros(),
            scale_factor: 1.0,
            cursor_offset: nalgebra_glm::Vec2::zeros(),
        }
    }
}

impl Io {
    pub fn receive_event<T>(
        &mut self,
        event: &winit::event::Event<T>,
        window_center: nalgebra_glm::Vec2,
        scale_factor: f32,
    ) {
        self.window_center = window_center;
        self.scale_factor = scale_factor;
        if let winit::event::Event::WindowEvent {
            event: winit::event::WindowEvent::CursorMoved { position, .. },
            ..
        } = event
        {
            self.cursor_offset = self.offset_from_center(*position);
        }
    }

    /// Translates a window event into a pointer transition for the given
    /// input model. Call after [`Io::receive_event`] so the cursor is current.
    pub fn pointer_event(
        &self,
        event: &winit::event::WindowEvent,
        input_model: InputModel,
    ) -> Option<PointerEvent> {
        match event {
            winit::event::WindowEvent::MouseInput { state, .. } => Some(match state {
                winit::event::ElementState::Pressed => PointerEvent::Pressed(self.cursor_offset),
                winit::event::ElementState::Released => PointerEvent::Released,
            }),
            winit::event::WindowEvent::CursorMoved { .. } => {
                Some(PointerEvent::Moved(self.cursor_offset))
            }
            winit::event::WindowEvent::Touch(winit::event::Touch {
                phase, location, ..
            }) => {
                let offset = self.offset_from_center(*location);
                match phase {
                    winit::event::TouchPhase::Started => Some(PointerEvent::Pressed(offset)),
                    winit::event::TouchPhase::Moved => Some(PointerEvent::Moved(offset)),
                    winit::event::TouchPhase::Ended => Some(PointerEvent::Released),
                    winit::event::TouchPhase::Cancelled => match input_model {
                        InputModel::Pointer => Some(PointerEvent::Cancelled),
                        InputModel::Mouse => None,
                    },
                }
            }
            _ => None,
        }
    }

    fn offset_from_center(
        &self,
        position: winit::dpi::PhysicalPosition<f64>,
    ) -> nalgebra_glm::Vec2 {
        let position = nalgebra_glm::vec2(position.x as f32, position.y as f32);
        (position - self.window_center) / self.scale_factor.max(f32::EPSILON)
    }
}
