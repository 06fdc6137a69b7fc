//! Three-axis live plot using egui_plot.
//!
//! [`AxisPlot`] is a [`Renderer`]: each redraw converts the window snapshot
//! into one series per axis, and [`AxisPlot::show`] draws the last series
//! every frame.

use crate::config::UiConfig;
use crate::pipeline::live::Renderer;
use crate::types::{SensorKind, Triple};
use egui::{Color32, Ui};
use egui_plot::{Corner, Legend, Line, Plot, PlotPoints};

/// Axis names, in triple order.
pub const AXIS_NAMES: [&str; 3] = ["X", "Y", "Z"];

/// Line colors: X blue, Y green, Z red.
pub const AXIS_COLORS: [Color32; 3] = [Color32::BLUE, Color32::GREEN, Color32::RED];

/// Plot points `[index, value]` for one axis of the window, oldest first.
pub fn axis_series(window: &[Triple], axis: usize) -> Vec<[f64; 2]> {
    window
        .iter()
        .enumerate()
        .map(|(i, &(x, y, z))| {
            let v = match axis {
                0 => x,
                1 => y,
                _ => z,
            };
            [i as f64, v]
        })
        .collect()
}

/// Live plot of the three axes of one sensor
#[derive(Debug, Clone)]
pub struct AxisPlot {
    sensor: SensorKind,
    series: [Vec<[f64; 2]>; 3],
    /// Whether to show grid lines
    pub show_grid: bool,
    /// Whether to show the legend
    pub show_legend: bool,
    /// Line width for all axes
    pub line_width: f32,
    last_tick: Option<u64>,
}

impl AxisPlot {
    pub fn from_config(config: &UiConfig, sensor: SensorKind) -> Self {
        Self {
            sensor,
            series: Default::default(),
            show_grid: config.show_grid,
            show_legend: config.show_legend,
            line_width: config.line_width,
            last_tick: None,
        }
    }

    pub fn sensor(&self) -> SensorKind {
        self.sensor
    }

    /// Switch sensor; the plotted series are cleared.
    pub fn set_sensor(&mut self, sensor: SensorKind) {
        self.sensor = sensor;
        self.series = Default::default();
    }

    pub fn series(&self, axis: usize) -> &[[f64; 2]] {
        &self.series[axis.min(2)]
    }

    /// Tick of the last redraw, if any
    pub fn last_tick(&self) -> Option<u64> {
        self.last_tick
    }

    /// e.g. "Gyro Data Graph"
    pub fn title(&self) -> String {
        format!("{} Data Graph", self.sensor.label())
    }

    /// e.g. "Gyro X-axis"
    pub fn line_name(&self, axis: usize) -> String {
        format!("{} {}-axis", self.sensor.label(), AXIS_NAMES[axis.min(2)])
    }

    /// Draw the plot into `ui`.
    pub fn show(&self, ui: &mut Ui) {
        ui.heading(self.title());

        let mut plot = Plot::new("telemetry_plot")
            .show_grid(self.show_grid)
            .x_axis_label("Time")
            .y_axis_label(format!("{} Data", self.sensor.label()));

        if self.show_legend {
            plot = plot.legend(Legend::default().position(Corner::RightTop));
        }

        plot.show(ui, |plot_ui| {
            for (axis, points) in self.series.iter().enumerate() {
                if points.is_empty() {
                    continue;
                }
                let line = Line::new(self.line_name(axis), PlotPoints::from(points.clone()))
                    .color(AXIS_COLORS[axis])
                    .width(self.line_width);
                plot_ui.line(line);
            }
        });
    }
}

impl Renderer for AxisPlot {
    fn render(&mut self, tick: u64, window: &[Triple]) {
        for (axis, series) in self.series.iter_mut().enumerate() {
            *series = axis_series(window, axis);
        }
        self.last_tick = Some(tick);
    }
}
