use crate::geometry::ShapeKind;
use crate::input::PointerEvent;
use crate::selector::{SelectionResult, ShapeSelector};
use crate::surface::{ShapeStyle, SurfaceHandle};

/// Region-of-interest selector: owns at most one [`ShapeSelector`] on a
/// surface and remembers the last completed selection.
///
/// Selecting a new shape replaces the previous one.
#[derive(Debug)]
pub struct RoiSelector {
    surface: SurfaceHandle,
    selector: Option<ShapeSelector>,
    last: Option<SelectionResult>,
}

impl RoiSelector {
    pub fn new(surface: SurfaceHandle) -> Self {
        Self {
            surface,
            selector: None,
            last: None,
        }
    }

    /// Start selecting a shape of the given kind, optionally seeded with a
    /// stored geometry. Any previous shape is removed first.
    pub fn select(
        &mut self,
        kind: ShapeKind,
        style: ShapeStyle,
        x: Option<[f32; 2]>,
        y: Option<[f32; 2]>,
    ) {
        self.clear();
        self.selector = Some(ShapeSelector::new(
            kind,
            self.surface.clone(),
            style,
            x,
            y,
        ));
    }

    /// x values of the two defining points, if a shape exists.
    pub fn x(&self) -> Option<[f32; 2]> {
        self.selector.as_ref().map(|s| s.x())
    }

    /// y values of the two defining points, if a shape exists.
    pub fn y(&self) -> Option<[f32; 2]> {
        self.selector.as_ref().map(|s| s.y())
    }

    pub fn is_active(&self) -> bool {
        self.selector.as_ref().is_some_and(|s| s.is_active())
    }

    pub fn set_active(&mut self, active: bool) {
        if let Some(selector) = &mut self.selector {
            selector.set_active(active);
        }
    }

    /// Remove the current shape entirely.
    pub fn clear(&mut self) {
        if let Some(mut selector) = self.selector.take() {
            selector.dispose();
        }
        self.last = None;
    }

    /// The last completed selection, if any drag has finished.
    pub fn selection(&self) -> Option<&SelectionResult> {
        self.last.as_ref()
    }

    pub fn handle_event(&mut self, event: &PointerEvent) -> Option<SelectionResult> {
        let result = self.selector.as_mut()?.handle_event(event);
        if let Some(result) = result {
            self.last = Some(result);
        }
        result
    }
}
