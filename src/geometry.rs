use egui::{Pos2, Rect, Vec2, pos2, vec2};
use serde::{Deserialize, Serialize};

use crate::surface::DisplaySurface;

/// Bounding geometry of a shape in data coordinates: always exactly four
/// scalars. What each pair means depends on the shape kind (line endpoints,
/// rectangle diagonal, circle center + edge point).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub x0: f32,
    pub x1: f32,
    pub y0: f32,
    pub y1: f32,
}

impl Extent {
    pub const ZERO: Extent = Extent {
        x0: 0.0,
        x1: 0.0,
        y0: 0.0,
        y1: 0.0,
    };

    pub fn new(x0: f32, x1: f32, y0: f32, y1: f32) -> Self {
        Self { x0, x1, y0, y1 }
    }

    pub fn from_ranges(x: [f32; 2], y: [f32; 2]) -> Self {
        Self::new(x[0], x[1], y[0], y[1])
    }

    /// First point of the defining pair, `(x0, y0)`.
    pub fn first(&self) -> Pos2 {
        pos2(self.x0, self.y0)
    }

    /// Second point of the defining pair, `(x1, y1)`.
    pub fn second(&self) -> Pos2 {
        pos2(self.x1, self.y1)
    }

    pub fn center(&self) -> Pos2 {
        pos2((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    pub fn x(&self) -> [f32; 2] {
        [self.x0, self.x1]
    }

    pub fn y(&self) -> [f32; 2] {
        [self.y0, self.y1]
    }

    pub fn translated(&self, delta: Vec2) -> Self {
        Self::new(
            self.x0 + delta.x,
            self.x1 + delta.x,
            self.y0 + delta.y,
            self.y1 + delta.y,
        )
    }

    /// Exchange the two defining points.
    pub fn swapped(&self) -> Self {
        Self::new(self.x1, self.x0, self.y1, self.y0)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// The closed set of selectable shape kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    Line,
    Rectangle,
    Ellipsoid,
    Circle,
}

/// Draggable control points of a shape selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    /// The initial point of the defining pair.
    Initial,
    /// The end point of the defining pair.
    End,
    /// The center marker; dragging it translates the whole shape.
    Center,
}

/// Corner handle order used for nearest-handle hit testing.
pub const CORNER_ORDER: [Handle; 2] = [Handle::Initial, Handle::End];

/// Resolved drawing primitive for one shape, produced by the per-kind
/// geometry rules below.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPrimitive {
    /// Line between the two extent points, data coordinates.
    Line { start: Pos2, end: Pos2 },
    /// Normalized rectangle clipped to the visible data range.
    Rect(Rect),
    /// Ellipse centered on the first point with per-axis radii
    /// `(x1 - x0, y1 - y0)`, data coordinates. Radii may be negative.
    Ellipse { center: Pos2, radius: Vec2 },
    /// Circle in display-inch space so non-square axis scaling does not
    /// distort it.
    Circle { center: Pos2, radius: f32 },
}

/// Per-kind geometry rule: turn an extent into the primitive to draw.
pub fn render_shape(kind: ShapeKind, extent: Extent, surface: &DisplaySurface) -> RenderPrimitive {
    match kind {
        ShapeKind::Line => RenderPrimitive::Line {
            start: extent.first(),
            end: extent.second(),
        },
        ShapeKind::Rectangle => {
            let (xlo, xhi) = surface.x_range();
            let (ylo, yhi) = surface.y_range();
            let xmin = extent.x0.min(extent.x1).max(xlo);
            let ymin = extent.y0.min(extent.y1).max(ylo);
            let xmax = extent.x0.max(extent.x1).min(xhi);
            let ymax = extent.y0.max(extent.y1).min(yhi);
            RenderPrimitive::Rect(Rect::from_min_max(pos2(xmin, ymin), pos2(xmax, ymax)))
        }
        ShapeKind::Ellipsoid => RenderPrimitive::Ellipse {
            center: extent.first(),
            radius: vec2(extent.x1 - extent.x0, extent.y1 - extent.y0),
        },
        ShapeKind::Circle => {
            // The radius is measured between the two points in inch space so
            // the drawn circle stays round under unequal data-to-pixel
            // scaling.
            let p1 = surface.pixel_to_inch(surface.data_to_pixel(extent.first()));
            let p2 = surface.pixel_to_inch(surface.data_to_pixel(extent.second()));
            RenderPrimitive::Circle {
                center: p1,
                radius: p1.distance(p2),
            }
        }
    }
}
