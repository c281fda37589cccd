//! Interactive shape selectors.
//!
//! A [`ShapeSelector`] owns one draggable shape overlay on a
//! [`DisplaySurface`](crate::surface::DisplaySurface) and runs the drag state
//! machine: press picks a handle (or starts a new shape), move resizes,
//! translates or redraws, release reports the final selection.

pub mod roi;

use egui::Key;
use log::trace;

use crate::geometry::{CORNER_ORDER, Extent, Handle, ShapeKind, render_shape};
use crate::input::{DragModifiers, PointerEvent, PointerLocation};
use crate::surface::{HandleSet, ShapeStyle, ShapeVisual, SurfaceHandle};

/// Pixel radius within which a corner handle responds. The center handle
/// responds within twice this radius.
const HANDLE_HIT_DISTANCE: f32 = 10.0;

/// Completed selection: the two defining points of the shape, in both
/// coordinate frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionResult {
    pub start: PointerLocation,
    pub end: PointerLocation,
}

/// A draggable shape selector bound to one surface.
#[derive(Debug)]
pub struct ShapeSelector {
    kind: ShapeKind,
    surface: SurfaceHandle,
    shape_id: u64,
    extent: Extent,
    visible: bool,
    active: bool,
    hit_distance: f32,
    style: ShapeStyle,
    active_handle: Option<Handle>,
    extent_on_press: Option<Extent>,
    press: Option<PointerLocation>,
}

impl ShapeSelector {
    pub fn new(
        kind: ShapeKind,
        surface: SurfaceHandle,
        style: ShapeStyle,
        x: Option<[f32; 2]>,
        y: Option<[f32; 2]>,
    ) -> Self {
        let extent = Extent::from_ranges(x.unwrap_or([0.0, 0.0]), y.unwrap_or([0.0, 0.0]));
        let shape_id = surface.write().allocate_shape();
        let mut selector = Self {
            kind,
            surface,
            shape_id,
            extent,
            // A zero extent means "nothing selected yet": stay hidden until
            // the first drag begins.
            visible: !extent.is_zero(),
            active: true,
            hit_distance: HANDLE_HIT_DISTANCE,
            style,
            active_handle: None,
            extent_on_press: None,
            press: None,
        };
        selector.sync_visual();
        selector
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn x(&self) -> [f32; 2] {
        self.extent.x()
    }

    pub fn y(&self) -> [f32; 2] {
        self.extent.y()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Activate or deactivate the selector. Inactive selectors ignore input
    /// and draw white handle markers instead of red.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        self.sync_visual();
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.sync_visual();
    }

    /// Replace the shape geometry directly, e.g. when restoring a stored
    /// selection.
    pub fn set_extent(&mut self, extent: Extent) {
        self.extent = extent;
        self.sync_visual();
    }

    /// Remove the shape overlay from the surface.
    pub fn dispose(&mut self) {
        self.surface.write().remove_shape(self.shape_id);
    }

    /// Feed one input event through the drag state machine. Returns the
    /// completed selection when a drag finishes.
    pub fn handle_event(&mut self, event: &PointerEvent) -> Option<SelectionResult> {
        if !self.active {
            return None;
        }
        match event {
            PointerEvent::Press {
                location,
                modifiers,
            } => {
                self.begin_drag(*location, DragModifiers::from(*modifiers));
                None
            }
            PointerEvent::Move {
                location,
                modifiers,
            } => {
                if self.press.is_some() {
                    self.update_drag(*location, DragModifiers::from(*modifiers));
                }
                None
            }
            PointerEvent::Release { .. } => {
                if self.press.is_some() {
                    Some(self.end_drag())
                } else {
                    None
                }
            }
            PointerEvent::Key {
                key: Key::Escape,
                pressed: true,
                ..
            } => {
                self.set_visible(false);
                None
            }
            _ => None,
        }
    }

    pub fn begin_drag(&mut self, location: PointerLocation, modifiers: DragModifiers) {
        if self.visible {
            self.set_active_handle(location, modifiers);
        } else {
            self.active_handle = None;
            self.extent_on_press = None;
        }
        self.press = Some(location);
        self.visible = true;
        self.sync_visual();
    }

    /// Pick the handle under the pointer, if any, and snapshot the extent for
    /// the drag.
    ///
    /// The center handle is tested first at twice the corner hit radius; a
    /// held move modifier grabs the center handle unconditionally. When the
    /// initial-point handle is picked, the snapshot is stored with the two
    /// defining points exchanged so a move only ever rewrites the second
    /// point.
    fn set_active_handle(&mut self, location: PointerLocation, modifiers: DragModifiers) {
        let (corner_px, center_px) = {
            let surface = self.surface.read();
            (
                [
                    surface.data_to_pixel(self.extent.first()),
                    surface.data_to_pixel(self.extent.second()),
                ],
                surface.data_to_pixel(self.extent.center()),
            )
        };
        let distances = corner_px.map(|p| p.distance(location.pixel));
        let (c_idx, c_dist) = if distances[0] <= distances[1] {
            (0, distances[0])
        } else {
            (1, distances[1])
        };
        let m_dist = center_px.distance(location.pixel);

        if modifiers.move_shape {
            self.active_handle = Some(Handle::Center);
        } else if m_dist < self.hit_distance * 2.0 {
            self.active_handle = Some(Handle::Center);
        } else if c_dist > self.hit_distance {
            self.active_handle = None;
            self.extent_on_press = None;
            return;
        } else {
            self.active_handle = Some(CORNER_ORDER[c_idx]);
        }
        trace!("picked handle {:?} at {:?}", self.active_handle, location.data);

        let mut snapshot = self.extent;
        if self.active_handle == Some(Handle::Initial) {
            snapshot = Extent::new(snapshot.x1, location.data.x, snapshot.y1, location.data.y);
        }
        self.extent_on_press = Some(snapshot);
    }

    pub fn update_drag(&mut self, location: PointerLocation, modifiers: DragModifiers) {
        let Some(press) = self.press else {
            return;
        };

        // Ellipsoids and circles are defined center-first, so dragging the
        // initial point degrades to a translation: re-exchange the snapshot
        // back into definition order and treat it as a center drag.
        if matches!(self.kind, ShapeKind::Ellipsoid | ShapeKind::Circle)
            && self.active_handle == Some(Handle::Initial)
        {
            self.active_handle = Some(Handle::Center);
            if let Some(snapshot) = self.extent_on_press {
                self.extent_on_press = Some(snapshot.swapped());
            }
        }

        let extent = match (self.active_handle, self.extent_on_press) {
            // Resize: the snapshot pins the first point, the pointer drives
            // the second.
            (Some(handle), Some(snapshot)) if handle != Handle::Center => {
                Extent::new(snapshot.x0, location.data.x, snapshot.y0, location.data.y)
            }
            // Translate the whole shape.
            (Some(Handle::Center), Some(snapshot)) => {
                snapshot.translated(location.data - press.data)
            }
            // Draw a new shape around the press point.
            _ => {
                let center = press.data;
                let mut dx = (location.data.x - center.x) / 2.0;
                let mut dy = (location.data.y - center.y) / 2.0;

                if modifiers.square {
                    // Squaring works on screen pixels so the result looks
                    // square regardless of the data aspect ratio.
                    let dx_pix = (location.pixel.x - press.pixel.x).abs();
                    let dy_pix = (location.pixel.y - press.pixel.y).abs();
                    if dx_pix == 0.0 {
                        return;
                    }
                    let maxd = dx_pix.max(dy_pix);
                    if dx_pix < maxd {
                        dx *= maxd / (dx_pix + 1e-6);
                    }
                    if dy_pix < maxd {
                        dy *= maxd / (dy_pix + 1e-6);
                    }
                }

                let (mut cx, mut cy) = (center.x, center.y);
                if modifiers.center {
                    dx *= 2.0;
                    dy *= 2.0;
                } else {
                    cx += dx;
                    cy += dy;
                }
                Extent::new(cx - dx, cx + dx, cy - dy, cy + dy)
            }
        };
        self.set_extent(extent);
    }

    pub fn end_drag(&mut self) -> SelectionResult {
        self.press = None;
        self.active_handle = None;
        self.extent_on_press = None;
        let surface = self.surface.read();
        let result = SelectionResult {
            start: PointerLocation::from_data(&surface, self.extent.first()),
            end: PointerLocation::from_data(&surface, self.extent.second()),
        };
        trace!("selection finished: {:?} -> {:?}", result.start.data, result.end.data);
        result
    }

    fn sync_visual(&mut self) {
        let mut surface = self.surface.write();
        let primitive = render_shape(self.kind, self.extent, &surface);
        surface.put_shape(
            self.shape_id,
            ShapeVisual {
                primitive,
                handles: Some(HandleSet {
                    corners: [self.extent.first(), self.extent.second()],
                    center: self.extent.center(),
                    active: self.active,
                }),
                visible: self.visible,
                style: self.style.clone(),
            },
        );
    }
}
