//! Frontend module for the egui UI
//!
//! The pipeline runs on its own thread and sends samples through the
//! [`PipelineBridge`]. Each frame, [`TelemetryApp`] drives a [`LiveView`] one
//! tick: pending samples are windowed and the [`AxisPlot`] redrawn.
//!
//! Escape closes the window. Closing the window stops the pipeline thread,
//! and a stop requested elsewhere (Ctrl-C) closes the window.

mod plot;
mod status_bar;

pub use plot::{axis_series, AxisPlot, AXIS_COLORS, AXIS_NAMES};
pub use status_bar::{render_status_bar, StatusBarContext};

use crate::config::AppConfig;
use crate::pipeline::bridge::PipelineBridge;
use crate::pipeline::live::LiveView;
use crate::pipeline::window::WindowBuffer;
use crate::types::SensorKind;

/// Main application state implementing [`eframe::App`]
pub struct TelemetryApp {
    view: LiveView<PipelineBridge, AxisPlot>,
    source_name: String,
    tick: u64,
}

impl TelemetryApp {
    pub fn new(bridge: PipelineBridge, config: &AppConfig, source_name: impl Into<String>) -> Self {
        let sensor = config.window.sensor;
        let view = LiveView::new(
            bridge,
            AxisPlot::from_config(&config.ui, sensor),
            WindowBuffer::with_capacity(config.window.capacity),
            sensor,
        );
        Self {
            view,
            source_name: source_name.into(),
            tick: 0,
        }
    }

    /// Pull pending samples and redraw the plot data. Returns `false` once
    /// the stream is closed.
    pub fn tick(&mut self) -> bool {
        let open = self.view.on_tick(self.tick);
        self.tick += 1;
        open
    }

    /// Whether the pipeline was told to stop from outside the UI (Ctrl-C).
    pub fn stop_requested(&self) -> bool {
        !self.view.feed().is_running()
    }

    pub fn view(&self) -> &LiveView<PipelineBridge, AxisPlot> {
        &self.view
    }

    fn set_sensor(&mut self, sensor: SensorKind) {
        self.view.set_sensor(sensor);
        self.view.renderer_mut().set_sensor(sensor);
    }

    fn sensor_selector(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Sensor:");
            let mut selected = self.view.sensor();
            for kind in SensorKind::ALL {
                ui.selectable_value(&mut selected, kind, kind.label());
            }
            if selected != self.view.sensor() {
                self.set_sensor(selected);
            }
        });
    }
}

impl eframe::App for TelemetryApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) || self.stop_requested() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        if self.tick() {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("sensor_bar").show(ctx, |ui| {
            self.sensor_selector(ui);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            let window = self.view.window();
            render_status_bar(
                ui,
                &StatusBarContext {
                    source: &self.source_name,
                    stats: self.view.feed().stats(),
                    window_len: window.len(),
                    window_capacity: window.capacity(),
                    closed: self.view.is_closed(),
                },
            );
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.view.renderer().show(ui);
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        tracing::info!("Window closed, stopping pipeline");
        self.view.feed().stop();
    }
}
