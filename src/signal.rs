use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, Result};

/// Calibration of one signal axis: `physical = pixel * scale + offset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisCalibration {
    pub scale: f64,
    pub offset: f64,
    pub unit: String,
}

impl Default for AxisCalibration {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: 0.0,
            unit: "px".to_owned(),
        }
    }
}

/// A 1D intensity sample derived from a 2D signal, with its own per-sample
/// scale and unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile1d {
    pub data: Vec<f64>,
    pub scale: f64,
    pub unit: String,
}

/// A calibrated 2D image signal: row-major samples, per-axis
/// `(scale, offset, unit)` metadata and a serializable metadata dictionary.
///
/// Axis 0 is x (columns), axis 1 is y (rows).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal2d {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
    axes: [AxisCalibration; 2],
    metadata: BTreeMap<String, serde_json::Value>,
}

impl Signal2d {
    pub fn new(data: Vec<f64>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(ProfileError::Precondition(format!(
                "signal data has {} samples but shape is {rows}x{cols}",
                data.len()
            )));
        }
        Ok(Self {
            rows,
            cols,
            data,
            axes: [AxisCalibration::default(), AxisCalibration::default()],
            metadata: BTreeMap::new(),
        })
    }

    pub fn with_axes(mut self, axes: [AxisCalibration; 2]) -> Self {
        self.axes = axes;
        self
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn axis(&self, index: usize) -> &AxisCalibration {
        &self.axes[index]
    }

    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }

    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    /// Bilinear sample at fractional pixel coordinates, clamped to the image.
    pub fn sample_bilinear(&self, x_px: f64, y_px: f64) -> f64 {
        let x = x_px.clamp(0.0, (self.cols - 1) as f64);
        let y = y_px.clamp(0.0, (self.rows - 1) as f64);
        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.cols - 1);
        let y1 = (y0 + 1).min(self.rows - 1);
        let fx = x - x0 as f64;
        let fy = y - y0 as f64;

        let v00 = self.value(y0, x0);
        let v10 = self.value(y0, x1);
        let v01 = self.value(y1, x0);
        let v11 = self.value(y1, x1);

        let v0 = v00 * (1.0 - fx) + v10 * fx;
        let v1 = v01 * (1.0 - fx) + v11 * fx;
        v0 * (1.0 - fy) + v1 * fy
    }

    /// Sample intensities along a width-extended line given in physical
    /// units.
    ///
    /// The segment is sampled at `ceil(len_px) + 1` evenly spaced points,
    /// each averaged across `round(width_px)` parallel rows centered on the
    /// segment. The returned scale is physical length per sample.
    pub fn sample_line(&self, x0: f64, y0: f64, x1: f64, y1: f64, width: f64) -> Profile1d {
        let [ax, ay] = &self.axes;
        let px0 = (x0 - ax.offset) / ax.scale;
        let px1 = (x1 - ax.offset) / ax.scale;
        let py0 = (y0 - ay.offset) / ay.scale;
        let py1 = (y1 - ay.offset) / ay.scale;

        let dx = px1 - px0;
        let dy = py1 - py0;
        let length_px = (dx * dx + dy * dy).sqrt();
        let length_phys = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();

        let n = length_px.ceil() as usize + 1;
        let width_px = (width / ax.scale).round().max(1.0) as usize;

        // Unit direction and perpendicular, in pixel space.
        let (ux, uy) = if length_px > 0.0 {
            (dx / length_px, dy / length_px)
        } else {
            (1.0, 0.0)
        };
        let (nx, ny) = (-uy, ux);

        let mut data = Vec::with_capacity(n);
        for i in 0..n {
            let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
            let cx = px0 + t * dx;
            let cy = py0 + t * dy;
            let mut acc = 0.0;
            for k in 0..width_px {
                let off = k as f64 - (width_px - 1) as f64 / 2.0;
                acc += self.sample_bilinear(cx + off * nx, cy + off * ny);
            }
            data.push(acc / width_px as f64);
        }

        let scale = if n > 1 {
            length_phys / (n - 1) as f64
        } else {
            ax.scale
        };
        Profile1d {
            data,
            scale,
            unit: ax.unit.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_signal() -> Signal2d {
        // 4x4, value = col + 10 * row
        let data: Vec<f64> = (0..16).map(|i| (i % 4 + 10 * (i / 4)) as f64).collect();
        Signal2d::new(data, 4, 4).unwrap()
    }

    #[test]
    fn bilinear_interpolates_between_pixels() {
        let signal = gradient_signal();
        assert_eq!(signal.sample_bilinear(0.0, 0.0), 0.0);
        assert_eq!(signal.sample_bilinear(1.5, 0.0), 1.5);
        assert_eq!(signal.sample_bilinear(0.0, 1.5), 15.0);
        assert_eq!(signal.sample_bilinear(0.5, 0.5), 5.5);
    }

    #[test]
    fn bilinear_clamps_to_image() {
        let signal = gradient_signal();
        assert_eq!(signal.sample_bilinear(-3.0, 0.0), 0.0);
        assert_eq!(signal.sample_bilinear(10.0, 10.0), 33.0);
    }

    #[test]
    fn horizontal_line_samples_each_column() {
        let signal = gradient_signal();
        let profile = signal.sample_line(0.0, 1.0, 3.0, 1.0, 1.0);
        assert_eq!(profile.data, vec![10.0, 11.0, 12.0, 13.0]);
        assert_eq!(profile.scale, 1.0);
        assert_eq!(profile.unit, "px");
    }

    #[test]
    fn width_averages_across_rows() {
        let signal = gradient_signal();
        // Width 3 centered on row 1 averages rows 0..=2.
        let profile = signal.sample_line(0.0, 1.0, 3.0, 1.0, 3.0);
        assert_eq!(profile.data, vec![10.0, 11.0, 12.0, 13.0]);
    }

    #[test]
    fn calibrated_axes_convert_physical_coordinates() {
        let signal = gradient_signal().with_axes([
            AxisCalibration {
                scale: 2.0,
                offset: 1.0,
                unit: "nm".to_owned(),
            },
            AxisCalibration {
                scale: 2.0,
                offset: 1.0,
                unit: "nm".to_owned(),
            },
        ]);
        // Physical x 1..7 maps to pixels 0..3.
        let profile = signal.sample_line(1.0, 3.0, 7.0, 3.0, 2.0);
        assert_eq!(profile.data, vec![10.0, 11.0, 12.0, 13.0]);
        assert_eq!(profile.scale, 2.0);
        assert_eq!(profile.unit, "nm");
    }

    #[test]
    fn zero_length_line_yields_single_sample() {
        let signal = gradient_signal();
        let profile = signal.sample_line(2.0, 2.0, 2.0, 2.0, 1.0);
        assert_eq!(profile.data, vec![22.0]);
        assert_eq!(profile.scale, 1.0);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        assert!(Signal2d::new(vec![0.0; 5], 2, 3).is_err());
    }
}
