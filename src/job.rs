//! Line-profile job orchestration.
//!
//! A [`LineProfilesJob`] manages a set of [`LineProfile`]s over one signal,
//! in two modes: batch (`run_static` consumes pre-filled input arrays) and
//! interactive (`add_line` opens live selectors, `interactive_close`
//! finishes). Either way the job ends with one output record per line and a
//! snapshot on disk.

use std::collections::BTreeMap;
use std::sync::Arc;

use egui::{Rect, pos2};
use egui_plot::{Legend, Line, Plot, PlotPoints};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, Result};
use crate::input::PointerEvent;
use crate::persistence::{JobSnapshot, StatePersistence};
use crate::profile::{LineProfile, LineStyle};
use crate::signal::Signal2d;
use crate::surface::{DisplaySurface, SurfaceHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Initialized,
    Running,
    Finished,
}

/// Which line(s) currently receive input events and draw active handles.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActiveLine {
    #[default]
    None,
    One(usize),
    Many(Vec<usize>),
}

impl ActiveLine {
    pub fn indices(&self) -> Vec<usize> {
        match self {
            ActiveLine::None => Vec::new(),
            ActiveLine::One(i) => vec![*i],
            ActiveLine::Many(v) => v.clone(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ActiveLine::None)
    }
}

/// Per-line input record: the line index plus its width and style, if given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRecord {
    pub line: usize,
    pub width: Option<f32>,
    pub style: Option<LineStyle>,
}

/// Positional input arrays of the job. All four vectors run in parallel;
/// validation enforces their lengths agree before a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobInput {
    pub x: Vec<Option<[f32; 2]>>,
    pub y: Vec<Option<[f32; 2]>>,
    pub width: Vec<Option<f32>>,
    pub lines: Vec<LineRecord>,
}

/// One computed profile, appended to the job output on every calculation
/// pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub line: usize,
    pub x: [f32; 2],
    pub y: [f32; 2],
    pub width: f32,
    pub data: Vec<f64>,
    pub scale: f64,
    pub unit: String,
}

#[derive(Debug)]
pub struct LineProfilesJob {
    name: String,
    signal: Option<Arc<Signal2d>>,
    surface: Option<SurfaceHandle>,
    profiles: BTreeMap<usize, LineProfile>,
    next_index: usize,
    input: JobInput,
    output: Vec<OutputRecord>,
    active_line: ActiveLine,
    status: JobStatus,
    interactive: bool,
    store: Option<StatePersistence>,
}

impl LineProfilesJob {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            signal: None,
            surface: None,
            profiles: BTreeMap::new(),
            next_index: 0,
            input: JobInput::default(),
            output: Vec::new(),
            active_line: ActiveLine::None,
            status: JobStatus::Initialized,
            interactive: false,
            store: None,
        }
    }

    pub fn with_store(mut self, store: StatePersistence) -> Self {
        self.store = Some(store);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn signal(&self) -> Option<&Arc<Signal2d>> {
        self.signal.as_ref()
    }

    pub fn input(&self) -> &JobInput {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut JobInput {
        &mut self.input
    }

    pub fn output(&self) -> &[OutputRecord] {
        &self.output
    }

    pub fn active_line(&self) -> &ActiveLine {
        &self.active_line
    }

    pub fn line_indices(&self) -> Vec<usize> {
        self.profiles.keys().copied().collect()
    }

    pub fn profile(&self, line: usize) -> Option<&LineProfile> {
        self.profiles.get(&line)
    }

    /// Set the signal to analyze. Only allowed before the job has started.
    pub fn set_signal(&mut self, signal: Arc<Signal2d>) -> Result<()> {
        if self.status == JobStatus::Finished {
            return Err(ProfileError::Finished("cannot change the signal".to_owned()));
        }
        if self.status != JobStatus::Initialized {
            return Err(ProfileError::State(
                "Signal cannot be changed for a started job.".to_owned(),
            ));
        }
        self.signal = Some(signal);
        self.surface = None;
        Ok(())
    }

    /// The shared display surface, created on first use. Starts with an
    /// identity data-to-pixel mapping until the UI assigns a screen area.
    pub fn surface_handle(&mut self) -> Result<SurfaceHandle> {
        if let Some(surface) = &self.surface {
            return Ok(surface.clone());
        }
        let signal = self.signal.as_ref().ok_or_else(Self::missing_signal)?;
        let bounds = Rect::from_min_max(
            pos2(0.0, 0.0),
            pos2(signal.cols() as f32, signal.rows() as f32),
        );
        let surface = DisplaySurface::new(bounds, bounds, 100.0).into_handle();
        self.surface = Some(surface.clone());
        Ok(surface)
    }

    fn missing_signal() -> ProfileError {
        ProfileError::Precondition(
            "signal is not defined! Define a signal for which the line profiles are computed."
                .to_owned(),
        )
    }

    pub fn validate_ready_to_run(&mut self) -> Result<()> {
        if self.signal.is_none() {
            return Err(Self::missing_signal());
        }
        self.validate_and_prepare_input()
    }

    /// Check the positional input arrays for consistency, collecting every
    /// violation, and synthesize missing width/line records when valid.
    pub fn validate_and_prepare_input(&mut self) -> Result<()> {
        let mut errors = Vec::new();
        if self.input.x.len() != self.input.y.len() {
            errors.push("Inconsistent number of x and y values!".to_owned());
        }
        if !self.input.width.is_empty() && self.input.width.len() != self.input.x.len() {
            errors.push("Inconsistent number of x/y and lw values!".to_owned());
        }
        if !self.input.lines.is_empty() && self.input.lines.len() != self.input.x.len() {
            errors.push("Inconsistent number of x/y and lw values!".to_owned());
        }
        if !errors.is_empty() {
            return Err(ProfileError::Validation(errors));
        }

        if self.input.width.is_empty() {
            self.input.width = vec![None; self.input.x.len()];
        }
        if self.input.lines.is_empty() {
            self.input.lines = self
                .input
                .width
                .iter()
                .enumerate()
                .map(|(i, width)| LineRecord {
                    line: i,
                    width: *width,
                    style: None,
                })
                .collect();
        }
        Ok(())
    }

    /// Batch entry point: build one profile per input record, compute all of
    /// them, persist and finish.
    pub fn run_static(&mut self) -> Result<()> {
        if self.status == JobStatus::Finished {
            return Err(ProfileError::Finished("cannot run again".to_owned()));
        }
        self.status = JobStatus::Running;
        self.validate_ready_to_run()?;
        info!("running job '{}' with {} lines", self.name, self.input.x.len());

        let records: Vec<_> = self
            .input
            .lines
            .iter()
            .cloned()
            .zip(self.input.x.clone())
            .zip(self.input.y.clone())
            .zip(self.input.width.clone())
            .collect();
        for (((record, x), y), width) in records {
            self.add_line_internal(x, y, width, record.style, Some(record.line), false)?;
        }
        self.calc()?;
        self.save()?;
        self.set_all_inactive();
        self.status = JobStatus::Finished;
        Ok(())
    }

    /// Interactively add a line: validates prior input, opens a live
    /// selector and makes the new line the sole active one.
    pub fn add_line(
        &mut self,
        width: Option<f32>,
        style: Option<LineStyle>,
        x: Option<[f32; 2]>,
        y: Option<[f32; 2]>,
    ) -> Result<usize> {
        if self.status == JobStatus::Finished {
            return Err(ProfileError::Finished("cannot add a line".to_owned()));
        }
        let style = style.unwrap_or_else(|| LineStyle::for_index(self.next_index));
        self.validate_and_prepare_input()?;
        let index = self.add_line_internal(x, y, width, Some(style), None, true)?;
        self.interactive = true;
        self.set_active_line(ActiveLine::One(index))?;
        Ok(index)
    }

    fn add_line_internal(
        &mut self,
        x: Option<[f32; 2]>,
        y: Option<[f32; 2]>,
        width: Option<f32>,
        style: Option<LineStyle>,
        line_number: Option<usize>,
        append_input: bool,
    ) -> Result<usize> {
        let signal = self.signal.clone().ok_or_else(Self::missing_signal)?;
        let surface = self.surface_handle()?;
        let width = width.unwrap_or(LineProfile::DEFAULT_WIDTH);
        let index = line_number.unwrap_or(self.next_index);
        self.next_index = self.next_index.max(index + 1);

        let mut profile = LineProfile::new(signal, surface);
        match &style {
            Some(style) => profile.select_roi(width, Some(style.clone()), x, y),
            None => profile.calc_roi(x, y, Some(width))?,
        }
        debug!("added line {index} (width {width})");
        self.profiles.insert(index, profile);

        if append_input {
            self.input.lines.push(LineRecord {
                line: index,
                width: Some(width),
                style,
            });
            self.input.x.push(x);
            self.input.y.push(y);
            self.input.width.push(Some(width));
        }
        Ok(index)
    }

    /// Change which line(s) are active. Rejected on finished jobs unless
    /// clearing.
    pub fn set_active_line(&mut self, value: ActiveLine) -> Result<()> {
        if self.status == JobStatus::Finished && !value.is_none() {
            return Err(ProfileError::Finished("cannot activate a line".to_owned()));
        }
        for index in value.indices() {
            if !self.profiles.contains_key(&index) {
                return Err(ProfileError::State(format!("{index} is not a known line")));
            }
        }
        for profile in self.profiles.values_mut() {
            profile.set_active(false);
        }
        for index in value.indices() {
            if let Some(profile) = self.profiles.get_mut(&index) {
                profile.set_active(true);
            }
        }
        self.active_line = value;
        Ok(())
    }

    fn set_all_inactive(&mut self) {
        for profile in self.profiles.values_mut() {
            profile.set_active(false);
        }
        self.active_line = ActiveLine::None;
    }

    /// Remove one or several lines, together with their input records.
    /// `None` removes the active line(s).
    pub fn remove_line(&mut self, lines: Option<&[usize]>) -> Result<()> {
        if self.status == JobStatus::Finished {
            return Err(ProfileError::Finished("cannot remove a line".to_owned()));
        }
        let targets: Vec<usize> = match lines {
            Some(lines) => lines.to_vec(),
            None => {
                if self.active_line.is_none() {
                    return Err(ProfileError::State("No line selected!".to_owned()));
                }
                self.active_line.indices()
            }
        };

        // Validate up front so a bad index leaves the job untouched.
        for target in &targets {
            if !self.profiles.contains_key(target) {
                return Err(ProfileError::State(format!("{target} is not a known line")));
            }
        }

        for target in &targets {
            let Some(mut profile) = self.profiles.remove(target) else {
                continue;
            };
            profile.clear_roi_selection();
            if let Some(pos) = self.input.lines.iter().position(|r| r.line == *target) {
                self.input.lines.remove(pos);
                self.input.x.remove(pos);
                self.input.y.remove(pos);
                self.input.width.remove(pos);
            }
            debug!("removed line {target}");
        }

        self.active_line = match std::mem::take(&mut self.active_line) {
            ActiveLine::One(i) if targets.contains(&i) => ActiveLine::None,
            ActiveLine::Many(v) => {
                let kept: Vec<usize> = v.into_iter().filter(|i| !targets.contains(i)).collect();
                if kept.is_empty() {
                    ActiveLine::None
                } else {
                    ActiveLine::Many(kept)
                }
            }
            other => other,
        };
        Ok(())
    }

    /// Compute every profile, write the results back into the input arrays
    /// and append one output record per line.
    fn calc(&mut self) -> Result<()> {
        let interactive = self.interactive;
        for (i, (key, profile)) in self.profiles.iter_mut().enumerate() {
            if interactive {
                profile.calc_roi(None, None, None)?;
            }
            let x = profile.x_in_px();
            let y = profile.y_in_px();
            let width = profile.width_in_px();
            if i < self.input.x.len() {
                self.input.x[i] = x;
                self.input.y[i] = y;
                self.input.width[i] = width;
            }
            let (Some(x), Some(y), Some(width)) = (x, y, width) else {
                return Err(ProfileError::State(format!(
                    "line {key} has no coordinates to compute"
                )));
            };
            let derived = profile.derived_line_profile()?;
            self.output.push(OutputRecord {
                line: *key,
                x,
                y,
                width,
                data: derived.data.clone(),
                scale: derived.scale,
                unit: derived.unit.clone(),
            });
        }
        Ok(())
    }

    /// Intermediate flush in interactive mode: compute and persist without
    /// finishing.
    pub fn run_if_interactive(&mut self) -> Result<()> {
        self.status = JobStatus::Running;
        self.calc()?;
        self.save()
    }

    /// Close an interactive job: one final compute-and-persist pass, then
    /// finish.
    pub fn interactive_close(&mut self) -> Result<()> {
        if self.status == JobStatus::Finished {
            return Err(ProfileError::Finished("cannot close again".to_owned()));
        }
        self.calc()?;
        self.save()?;
        self.set_all_inactive();
        self.status = JobStatus::Finished;
        Ok(())
    }

    /// Lifecycle hook required by the orchestration layer; results are
    /// already collected during [`calc`](Self::calc).
    pub fn collect_output(&self) {}

    /// Lifecycle hook required by the orchestration layer; input lives in
    /// the snapshot.
    pub fn write_input(&self) {}

    /// Forward an input event to every line; inactive selectors ignore it.
    pub fn handle_event(&mut self, event: &PointerEvent) {
        for profile in self.profiles.values_mut() {
            profile.handle_event(event);
        }
    }

    /// Plot every line profile into one shared plot. Runs an interactive
    /// compute pass first if the job is not finished yet.
    pub fn show_profile_plots(&mut self, ui: &mut egui::Ui) -> Result<()> {
        if self.status != JobStatus::Finished {
            self.run_if_interactive()?;
        }

        let mut plot_lines = Vec::new();
        let mut x_max = 0.0f64;
        let mut unit = None;
        for (key, profile) in &mut self.profiles {
            let style = profile.style().cloned();
            let derived = profile.derived_line_profile()?.clone();
            unit.get_or_insert_with(|| derived.unit.clone());
            let points: PlotPoints = derived
                .data
                .iter()
                .enumerate()
                .map(|(i, v)| [i as f64 * derived.scale, *v])
                .collect();
            x_max = x_max.max((derived.data.len().saturating_sub(1)) as f64 * derived.scale);
            let mut line = Line::new(points).name(format!("Line profile {key}"));
            if let Some(style) = style {
                line = line.color(style.color);
            }
            plot_lines.push(line);
        }

        let unit = unit.unwrap_or_else(|| "px".to_owned());
        Plot::new("line_profiles")
            .legend(Legend::default())
            .show_axes([true, false])
            .include_x(0.0)
            .include_x(x_max)
            .x_axis_label(format!("Distance ({unit})"))
            .show(ui, |plot_ui| {
                for line in plot_lines {
                    plot_ui.line(line);
                }
            });
        Ok(())
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            name: self.name.clone(),
            signal: self.signal.as_deref().cloned(),
            input: self.input.clone(),
            output: self.output.clone(),
            active_line: self.active_line.clone(),
            status: self.status,
            version: JobSnapshot::current_version(),
        }
    }

    fn save(&mut self) -> Result<()> {
        if let Some(store) = &self.store {
            store.save_snapshot(&self.snapshot())?;
        }
        Ok(())
    }

    /// Rebuild a job from a snapshot. All restored lines start inactive and
    /// new lines continue after the highest restored index.
    pub fn from_snapshot(snapshot: JobSnapshot, store: Option<StatePersistence>) -> Result<Self> {
        let mut job = Self::new(snapshot.name);
        job.store = store;
        if let Some(signal) = snapshot.signal {
            job.signal = Some(Arc::new(signal));
        }
        job.input = snapshot.input;
        job.validate_and_prepare_input()?;

        let records: Vec<_> = job
            .input
            .lines
            .iter()
            .cloned()
            .zip(job.input.x.clone())
            .zip(job.input.y.clone())
            .zip(job.input.width.clone())
            .collect();
        let mut errors = Vec::new();
        for (i, (((record, _), _), width)) in records.iter().enumerate() {
            if let (Some(a), Some(b)) = (record.width, *width) {
                if a != b {
                    errors.push(format!(
                        "line width from lines[{i}]={a} and width[{i}]={b} differ"
                    ));
                }
            }
        }
        if !errors.is_empty() {
            return Err(ProfileError::Validation(errors));
        }

        for (((record, x), y), width) in records {
            job.add_line_internal(x, y, width, record.style, Some(record.line), false)?;
        }
        job.set_all_inactive();
        job.output = snapshot.output;
        job.status = snapshot.status;
        Ok(job)
    }

    /// Load a previously saved job by name.
    pub fn load(name: &str, store: StatePersistence) -> Result<Self> {
        let snapshot = store.load_snapshot(name)?;
        Self::from_snapshot(snapshot, Some(store))
    }
}
