use std::sync::Arc;

use egui::Color32;
use egui_plot::{Legend, Line, Plot, PlotPoints};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, Result};
use crate::geometry::ShapeKind;
use crate::input::PointerEvent;
use crate::selector::SelectionResult;
use crate::selector::roi::RoiSelector;
use crate::signal::{Profile1d, Signal2d};
use crate::surface::{ShapeStyle, SurfaceHandle};

/// Cycle of line colors assigned to profiles by index.
const LINE_PALETTE: [Color32; 6] = [
    Color32::from_rgb(255, 100, 100),
    Color32::from_rgb(100, 255, 100),
    Color32::from_rgb(100, 100, 255),
    Color32::from_rgb(255, 255, 100),
    Color32::from_rgb(255, 100, 255),
    Color32::from_rgb(100, 255, 255),
];

pub fn palette_color(index: usize) -> Color32 {
    LINE_PALETTE[index % LINE_PALETTE.len()]
}

/// Drawing style of one profile line, both on the image overlay and in the
/// profile plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: Color32,
    pub width: f32,
    pub label: Option<String>,
}

impl LineStyle {
    pub fn for_index(index: usize) -> Self {
        Self {
            color: palette_color(index),
            width: 2.0,
            label: None,
        }
    }

    fn shape_style(&self) -> ShapeStyle {
        ShapeStyle {
            color: self.color,
            stroke_width: self.width,
            fill: false,
        }
    }
}

/// A width-extended line region in physical units, ready to be sampled from
/// a signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRegion {
    pub x: [f64; 2],
    pub y: [f64; 2],
    pub width: f64,
}

impl LineRegion {
    pub fn sample(&self, signal: &Signal2d) -> Profile1d {
        signal.sample_line(self.x[0], self.y[0], self.x[1], self.y[1], self.width)
    }
}

/// Derives one line profile from a 2D signal.
///
/// The line can come from an interactive [`RoiSelector`] drag or from
/// explicit pixel coordinates; either way the geometry is converted to
/// physical units with the x axis calibration and sampled lazily.
#[derive(Debug)]
pub struct LineProfile {
    signal: Arc<Signal2d>,
    surface: SurfaceHandle,
    selector: Option<RoiSelector>,
    width: Option<f32>,
    style: Option<LineStyle>,
    x: Option<[f32; 2]>,
    y: Option<[f32; 2]>,
    region: Option<LineRegion>,
    profile: Option<Profile1d>,
    scale: f64,
    unit: String,
}

impl LineProfile {
    pub const DEFAULT_WIDTH: f32 = 5.0;

    pub fn new(signal: Arc<Signal2d>, surface: SurfaceHandle) -> Self {
        let scale = signal.axis(0).scale;
        let unit = signal.axis(0).unit.clone();
        Self {
            signal,
            surface,
            selector: None,
            width: None,
            style: None,
            x: None,
            y: None,
            region: None,
            profile: None,
            scale,
            unit,
        }
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn style(&self) -> Option<&LineStyle> {
        self.style.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.selector.as_ref().is_some_and(|s| s.is_active())
    }

    pub fn set_active(&mut self, active: bool) {
        if let Some(selector) = &mut self.selector {
            selector.set_active(active);
        }
    }

    /// Remove the interactive selection and forget all derived state.
    pub fn clear_roi_selection(&mut self) {
        if let Some(selector) = &mut self.selector {
            selector.clear();
        }
        self.selector = None;
        self.width = None;
        self.style = None;
        self.x = None;
        self.y = None;
        self.region = None;
        self.profile = None;
    }

    pub fn width_in_px(&self) -> Option<f32> {
        self.width
    }

    pub fn width_in_unit(&self) -> Option<f64> {
        self.width.map(|w| w as f64 * self.scale)
    }

    /// x endpoints in pixel coordinates. Freezes the live selector geometry
    /// on first read.
    pub fn x_in_px(&mut self) -> Option<[f32; 2]> {
        if self.x.is_none() {
            if let Some(selector) = &self.selector {
                self.x = selector.x();
            }
        }
        self.x
    }

    /// y endpoints in pixel coordinates, frozen like [`x_in_px`](Self::x_in_px).
    pub fn y_in_px(&mut self) -> Option<[f32; 2]> {
        if self.y.is_none() {
            if let Some(selector) = &self.selector {
                self.y = selector.y();
            }
        }
        self.y
    }

    /// Put the line selector on the surface, optionally seeded with stored
    /// coordinates when (re)drawing an inactive line.
    pub fn plot_roi(&mut self, x: Option<[f32; 2]>, y: Option<[f32; 2]>, active: bool) {
        if self.selector.is_none() {
            self.selector = Some(RoiSelector::new(self.surface.clone()));
        }
        let (mut x, mut y) = (x, y);
        if !active {
            x = x.or_else(|| self.x_in_px());
            y = y.or_else(|| self.y_in_px());
        }
        let style = self
            .style
            .clone()
            .map(|s| s.shape_style())
            .unwrap_or_else(|| ShapeStyle {
                stroke_width: self.width.unwrap_or(Self::DEFAULT_WIDTH),
                ..ShapeStyle::default()
            });
        if let Some(selector) = &mut self.selector {
            selector.select(ShapeKind::Line, style, x, y);
            selector.set_active(active);
        }
    }

    /// Begin an interactive line selection with the given width in pixels.
    pub fn select_roi(
        &mut self,
        width: f32,
        style: Option<LineStyle>,
        x: Option<[f32; 2]>,
        y: Option<[f32; 2]>,
    ) {
        self.width = Some(width);
        if style.is_some() {
            self.style = style;
        }
        self.plot_roi(x, y, true);
    }

    /// Freeze the line geometry into a physical-unit region.
    ///
    /// Explicit arguments override the selector; parameters left `None` are
    /// read from the live selector. Both axes are converted with the x axis
    /// scale, each with its own offset.
    pub fn calc_roi(
        &mut self,
        x_px: Option<[f32; 2]>,
        y_px: Option<[f32; 2]>,
        width_px: Option<f32>,
    ) -> Result<()> {
        if (x_px.is_none() || y_px.is_none() || width_px.is_none()) && self.selector.is_none() {
            return Err(ProfileError::State(
                "One parameter not provided and no active roi selector.".to_owned(),
            ));
        }
        self.profile = None;

        self.x = x_px.or_else(|| self.selector.as_ref().and_then(|s| s.x()));
        self.y = y_px.or_else(|| self.selector.as_ref().and_then(|s| s.y()));
        if width_px.is_some() {
            self.width = width_px;
        }
        let (Some(x), Some(y)) = (self.x, self.y) else {
            return Err(ProfileError::State(
                "One parameter not provided and no active roi selector.".to_owned(),
            ));
        };
        let Some(width) = self.width else {
            return Err(ProfileError::State("no line width set".to_owned()));
        };

        let x_off = self.signal.axis(0).offset;
        let y_off = self.signal.axis(1).offset;
        let region = LineRegion {
            x: [x[0] as f64 * self.scale + x_off, x[1] as f64 * self.scale + x_off],
            y: [y[0] as f64 * self.scale + y_off, y[1] as f64 * self.scale + y_off],
            width: width as f64 * self.scale,
        };
        debug!(
            "line region frozen: x={:?} y={:?} width={}",
            region.x, region.y, region.width
        );
        self.region = Some(region);
        Ok(())
    }

    pub fn region(&self) -> Option<&LineRegion> {
        self.region.as_ref()
    }

    /// The sampled intensity profile, derived (and cached) on first access.
    pub fn derived_line_profile(&mut self) -> Result<&Profile1d> {
        if self.profile.is_none() {
            if self.region.is_none() {
                self.calc_roi(None, None, None)?;
            }
            let region = self
                .region
                .as_ref()
                .ok_or_else(|| ProfileError::State("no line region available".to_owned()))?;
            self.profile = Some(region.sample(&self.signal));
        }
        self.profile
            .as_ref()
            .ok_or_else(|| ProfileError::State("no line region available".to_owned()))
    }

    pub fn line_length_px(&mut self) -> Result<f32> {
        let (x, y) = (self.x_in_px(), self.y_in_px());
        let (Some(x), Some(y)) = (x, y) else {
            return Err(ProfileError::State(
                "no line coordinates available".to_owned(),
            ));
        };
        Ok(((x[1] - x[0]).powi(2) + (y[1] - y[0]).powi(2)).sqrt())
    }

    /// Plot this profile alone.
    pub fn show_line_profile(&mut self, ui: &mut egui::Ui) -> Result<()> {
        let unit = self.unit.clone();
        let style = self.style.clone();
        let profile = self.derived_line_profile()?.clone();

        let points: PlotPoints = profile
            .data
            .iter()
            .enumerate()
            .map(|(i, v)| [i as f64 * profile.scale, *v])
            .collect();
        let label = style
            .as_ref()
            .and_then(|s| s.label.clone())
            .unwrap_or_else(|| "Line profile".to_owned());
        let mut line = Line::new(points).name(label);
        if let Some(style) = &style {
            line = line.color(style.color);
        }

        let x_max = (profile.data.len().saturating_sub(1)) as f64 * profile.scale;
        Plot::new("line_profile")
            .legend(Legend::default())
            .show_axes([true, false])
            .include_x(0.0)
            .include_x(x_max)
            .x_axis_label(format!("Distance ({unit})"))
            .show(ui, |plot_ui| {
                plot_ui.line(line);
            });
        Ok(())
    }

    pub fn handle_event(&mut self, event: &PointerEvent) -> Option<SelectionResult> {
        self.selector.as_mut()?.handle_event(event)
    }
}
