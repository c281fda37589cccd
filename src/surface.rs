use std::collections::BTreeMap;
use std::sync::Arc;

use egui::{Color32, Pos2, Rect, Stroke, pos2, vec2};
use parking_lot::RwLock;

use crate::geometry::RenderPrimitive;
use crate::signal::Signal2d;

/// Shared handle to the display surface of one job. Created once per job and
/// passed by reference to every component that needs to draw.
pub type SurfaceHandle = Arc<RwLock<DisplaySurface>>;

/// Drawing properties of a shape overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeStyle {
    pub color: Color32,
    pub stroke_width: f32,
    pub fill: bool,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            color: Color32::BLACK,
            stroke_width: 2.0,
            fill: false,
        }
    }
}

/// Handle markers of an interactive shape, in data coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct HandleSet {
    pub corners: [Pos2; 2],
    pub center: Pos2,
    /// Active selectors draw filled red markers, inactive ones white.
    pub active: bool,
}

/// One retained shape overlay on the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeVisual {
    pub primitive: RenderPrimitive,
    pub handles: Option<HandleSet>,
    pub visible: bool,
    pub style: ShapeStyle,
}

/// The mutable display surface shared by all selectors of a job.
///
/// Holds the pixel area on screen, the data range mapped onto it, the pixel
/// density used for inch-space geometry, and the retained shape overlays
/// which [`paint`](DisplaySurface::paint) replays onto an `egui::Painter`.
#[derive(Debug)]
pub struct DisplaySurface {
    pixel_area: Rect,
    data_bounds: Rect,
    dots_per_inch: f32,
    next_shape_id: u64,
    shapes: BTreeMap<u64, ShapeVisual>,
}

impl DisplaySurface {
    pub fn new(pixel_area: Rect, data_bounds: Rect, dots_per_inch: f32) -> Self {
        Self {
            pixel_area,
            data_bounds,
            dots_per_inch,
            next_shape_id: 0,
            shapes: BTreeMap::new(),
        }
    }

    /// Surface showing a full signal: data coordinates are pixel indices of
    /// the signal array.
    pub fn for_signal(signal: &Signal2d, pixel_area: Rect, dots_per_inch: f32) -> Self {
        let data_bounds = Rect::from_min_max(
            pos2(0.0, 0.0),
            pos2(signal.cols() as f32, signal.rows() as f32),
        );
        Self::new(pixel_area, data_bounds, dots_per_inch)
    }

    pub fn into_handle(self) -> SurfaceHandle {
        Arc::new(RwLock::new(self))
    }

    pub fn pixel_area(&self) -> Rect {
        self.pixel_area
    }

    /// Reposition the surface on screen, e.g. after a window resize.
    pub fn set_pixel_area(&mut self, pixel_area: Rect) {
        self.pixel_area = pixel_area;
    }

    pub fn data_bounds(&self) -> Rect {
        self.data_bounds
    }

    pub fn dots_per_inch(&self) -> f32 {
        self.dots_per_inch
    }

    /// Visible x range in data coordinates, sorted.
    pub fn x_range(&self) -> (f32, f32) {
        let (a, b) = (self.data_bounds.min.x, self.data_bounds.max.x);
        (a.min(b), a.max(b))
    }

    /// Visible y range in data coordinates, sorted.
    pub fn y_range(&self) -> (f32, f32) {
        let (a, b) = (self.data_bounds.min.y, self.data_bounds.max.y);
        (a.min(b), a.max(b))
    }

    pub fn data_to_pixel(&self, p: Pos2) -> Pos2 {
        let tx = (p.x - self.data_bounds.min.x) / self.data_bounds.width();
        let ty = (p.y - self.data_bounds.min.y) / self.data_bounds.height();
        pos2(
            self.pixel_area.min.x + tx * self.pixel_area.width(),
            self.pixel_area.min.y + ty * self.pixel_area.height(),
        )
    }

    pub fn pixel_to_data(&self, p: Pos2) -> Pos2 {
        let tx = (p.x - self.pixel_area.min.x) / self.pixel_area.width();
        let ty = (p.y - self.pixel_area.min.y) / self.pixel_area.height();
        pos2(
            self.data_bounds.min.x + tx * self.data_bounds.width(),
            self.data_bounds.min.y + ty * self.data_bounds.height(),
        )
    }

    /// Pixel-density transform into physical display inches.
    pub fn pixel_to_inch(&self, p: Pos2) -> Pos2 {
        pos2(p.x / self.dots_per_inch, p.y / self.dots_per_inch)
    }

    pub fn inch_to_pixel(&self, p: Pos2) -> Pos2 {
        pos2(p.x * self.dots_per_inch, p.y * self.dots_per_inch)
    }

    /// Reserve an id for a new shape overlay.
    pub fn allocate_shape(&mut self) -> u64 {
        let id = self.next_shape_id;
        self.next_shape_id += 1;
        id
    }

    /// Insert or replace the overlay for `id`.
    pub fn put_shape(&mut self, id: u64, visual: ShapeVisual) {
        self.shapes.insert(id, visual);
    }

    pub fn remove_shape(&mut self, id: u64) {
        self.shapes.remove(&id);
    }

    pub fn shape(&self, id: u64) -> Option<&ShapeVisual> {
        self.shapes.get(&id)
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Replay all visible overlays onto an egui painter.
    pub fn paint(&self, painter: &egui::Painter) {
        for visual in self.shapes.values() {
            if !visual.visible {
                continue;
            }
            self.paint_primitive(painter, &visual.primitive, &visual.style);
            if let Some(handles) = &visual.handles {
                self.paint_handles(painter, handles);
            }
        }
    }

    fn paint_primitive(
        &self,
        painter: &egui::Painter,
        primitive: &RenderPrimitive,
        style: &ShapeStyle,
    ) {
        let stroke = Stroke::new(style.stroke_width, style.color);
        let fill = if style.fill {
            style.color.gamma_multiply(0.2)
        } else {
            Color32::TRANSPARENT
        };
        match primitive {
            RenderPrimitive::Line { start, end } => {
                painter.line_segment(
                    [self.data_to_pixel(*start), self.data_to_pixel(*end)],
                    stroke,
                );
            }
            RenderPrimitive::Rect(rect) => {
                let rect = Rect::from_min_max(
                    self.data_to_pixel(rect.min),
                    self.data_to_pixel(rect.max),
                );
                if style.fill {
                    painter.rect_filled(rect, 0.0, fill);
                }
                painter.rect_stroke(rect, 0.0, stroke);
            }
            RenderPrimitive::Ellipse { center, radius } => {
                let sx = self.pixel_area.width() / self.data_bounds.width();
                let sy = self.pixel_area.height() / self.data_bounds.height();
                let shape = egui::epaint::EllipseShape {
                    center: self.data_to_pixel(*center),
                    radius: vec2((radius.x * sx).abs(), (radius.y * sy).abs()),
                    fill,
                    stroke,
                };
                painter.add(egui::Shape::Ellipse(shape));
            }
            RenderPrimitive::Circle { center, radius } => {
                let center = self.inch_to_pixel(*center);
                painter.circle(center, radius * self.dots_per_inch, fill, stroke);
            }
        }
    }

    fn paint_handles(&self, painter: &egui::Painter, handles: &HandleSet) {
        let face = if handles.active {
            Color32::RED
        } else {
            Color32::WHITE
        };
        let edge = Stroke::new(1.0, Color32::RED);
        for corner in handles.corners {
            let p = self.data_to_pixel(corner);
            painter.circle(p, 4.0, face, edge);
        }
        // Center marker is square, matching the corner/center distinction of
        // the handle hit test.
        let c = self.data_to_pixel(handles.center);
        let rect = Rect::from_center_size(c, vec2(6.0, 6.0));
        painter.rect_filled(rect, 0.0, face);
        painter.rect_stroke(rect, 0.0, edge);
    }
}
