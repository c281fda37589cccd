use egui::{ColorImage, Sense, TextureHandle, TextureOptions};
use log::warn;

use crate::input::InputTranslator;
use crate::job::{ActiveLine, JobStatus, LineProfilesJob};

/// Interactive UI around one [`LineProfilesJob`]: the signal image with its
/// draggable line overlays in the center, job controls and the profile plot
/// on the side.
pub struct ProfilerApp {
    job: LineProfilesJob,
    translator: InputTranslator,
    texture: Option<TextureHandle>,
    new_line_width: f32,
}

impl ProfilerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, job: LineProfilesJob) -> Self {
        Self {
            job,
            translator: InputTranslator::new(),
            texture: None,
            new_line_width: 5.0,
        }
    }

    pub fn job(&self) -> &LineProfilesJob {
        &self.job
    }

    /// Upload the signal as a grayscale texture, normalized to its value
    /// range. Cached after the first frame.
    fn signal_texture(&mut self, ctx: &egui::Context) -> Option<TextureHandle> {
        if let Some(texture) = &self.texture {
            return Some(texture.clone());
        }
        let signal = self.job.signal()?.clone();
        let (min, max) = signal
            .data()
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });
        let range = if max > min { max - min } else { 1.0 };
        let gray: Vec<u8> = signal
            .data()
            .iter()
            .map(|v| (((v - min) / range) * 255.0) as u8)
            .collect();
        let image = ColorImage::from_gray([signal.cols(), signal.rows()], &gray);
        let texture = ctx.load_texture("signal", image, TextureOptions::NEAREST);
        self.texture = Some(texture.clone());
        Some(texture)
    }

    fn side_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading(self.job.name().to_owned());
        ui.label(format!("Status: {:?}", self.job.status()));
        ui.separator();

        ui.add(egui::Slider::new(&mut self.new_line_width, 1.0..=50.0).text("Line width (px)"));
        let finished = self.job.status() == JobStatus::Finished;
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!finished, egui::Button::new("Add line"))
                .clicked()
            {
                if let Err(err) = self.job.add_line(Some(self.new_line_width), None, None, None) {
                    warn!("add_line failed: {err}");
                }
            }
            if ui
                .add_enabled(!finished, egui::Button::new("Remove line"))
                .clicked()
            {
                if let Err(err) = self.job.remove_line(None) {
                    warn!("remove_line failed: {err}");
                }
            }
        });
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!finished, egui::Button::new("Save"))
                .clicked()
            {
                if let Err(err) = self.job.run_if_interactive() {
                    warn!("flush failed: {err}");
                }
            }
            if ui
                .add_enabled(!finished, egui::Button::new("Finish"))
                .clicked()
            {
                if let Err(err) = self.job.interactive_close() {
                    warn!("close failed: {err}");
                }
            }
        });
        ui.separator();

        let active = self.job.active_line().indices();
        for index in self.job.line_indices() {
            let selected = active.contains(&index);
            if ui
                .selectable_label(selected, format!("Line {index}"))
                .clicked()
            {
                let target = if selected {
                    ActiveLine::None
                } else {
                    ActiveLine::One(index)
                };
                if let Err(err) = self.job.set_active_line(target) {
                    warn!("set_active_line failed: {err}");
                }
            }
        }
        ui.separator();

        if !self.job.line_indices().is_empty() {
            if let Err(err) = self.job.show_profile_plots(ui) {
                warn!("profile plot failed: {err}");
            }
        }
    }

    fn signal_view(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let Some(texture) = self.signal_texture(ctx) else {
            ui.label("No signal loaded.");
            return;
        };
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        painter.image(
            texture.id(),
            response.rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        let surface = match self.job.surface_handle() {
            Ok(surface) => surface,
            Err(err) => {
                warn!("no display surface: {err}");
                return;
            }
        };
        surface.write().set_pixel_area(response.rect);

        let events = {
            let surface = surface.read();
            self.translator.process_input(ctx, &surface)
        };
        for event in &events {
            self.job.handle_event(event);
        }

        surface.read().paint(&painter);
    }
}

impl eframe::App for ProfilerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::right("job_panel")
            .min_width(260.0)
            .show(ctx, |ui| self.side_panel(ui));
        egui::CentralPanel::default().show(ctx, |ui| self.signal_view(ui, ctx));
    }
}
