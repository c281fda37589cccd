use egui::{Key, Modifiers, PointerButton, Pos2, Vec2};

use crate::surface::DisplaySurface;

/// Where a pointer event happened, in both coordinate frames the selectors
/// need: the surface's data space and raw screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerLocation {
    pub data: Pos2,
    pub pixel: Pos2,
}

impl PointerLocation {
    pub fn from_pixel(surface: &DisplaySurface, pixel: Pos2) -> Self {
        Self {
            data: surface.pixel_to_data(pixel),
            pixel,
        }
    }

    pub fn from_data(surface: &DisplaySurface, data: Pos2) -> Self {
        Self {
            data,
            pixel: surface.data_to_pixel(data),
        }
    }
}

/// Pointer/keyboard events dispatched to the interactive selectors.
#[derive(Debug, Clone)]
pub enum PointerEvent {
    Press {
        location: PointerLocation,
        modifiers: Modifiers,
    },
    Move {
        location: PointerLocation,
        modifiers: Modifiers,
    },
    Release {
        location: PointerLocation,
        modifiers: Modifiers,
    },
    Scroll {
        delta: Vec2,
    },
    Key {
        key: Key,
        pressed: bool,
        modifiers: Modifiers,
    },
}

/// Gesture modifiers active during a drag: Shift forces a square shape,
/// Ctrl/Cmd grows the shape from its center, Alt moves the existing shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DragModifiers {
    pub square: bool,
    pub center: bool,
    pub move_shape: bool,
}

impl From<Modifiers> for DragModifiers {
    fn from(m: Modifiers) -> Self {
        Self {
            square: m.shift,
            center: m.command || m.ctrl,
            move_shape: m.alt,
        }
    }
}

/// Converts raw egui input into [`PointerEvent`]s carrying data-space
/// coordinates for one surface.
#[derive(Debug, Default)]
pub struct InputTranslator {
    last_pointer_pos: Option<Pos2>,
}

impl InputTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_input(
        &mut self,
        ctx: &egui::Context,
        surface: &DisplaySurface,
    ) -> Vec<PointerEvent> {
        let mut events = Vec::new();
        ctx.input(|input| {
            let modifiers = input.modifiers;
            let hover = input.pointer.hover_pos();

            if let Some(pos) = hover {
                if Some(pos) != self.last_pointer_pos {
                    events.push(PointerEvent::Move {
                        location: PointerLocation::from_pixel(surface, pos),
                        modifiers,
                    });
                }
                self.last_pointer_pos = Some(pos);
            }

            if input.pointer.button_pressed(PointerButton::Primary) {
                if let Some(pos) = hover.or(self.last_pointer_pos) {
                    events.push(PointerEvent::Press {
                        location: PointerLocation::from_pixel(surface, pos),
                        modifiers,
                    });
                }
            }
            if input.pointer.button_released(PointerButton::Primary) {
                if let Some(pos) = hover.or(self.last_pointer_pos) {
                    events.push(PointerEvent::Release {
                        location: PointerLocation::from_pixel(surface, pos),
                        modifiers,
                    });
                }
            }

            if input.raw_scroll_delta != Vec2::ZERO {
                events.push(PointerEvent::Scroll {
                    delta: input.raw_scroll_delta,
                });
            }

            for event in &input.raw.events {
                if let egui::Event::Key {
                    key,
                    pressed,
                    modifiers,
                    ..
                } = event
                {
                    events.push(PointerEvent::Key {
                        key: *key,
                        pressed: *pressed,
                        modifiers: *modifiers,
                    });
                }
            }
        });
        events
    }
}
