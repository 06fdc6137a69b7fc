//! Status bar panel: source, sample counters and stream state.

use crate::types::PipelineStats;
use egui::{Color32, RichText, Ui};

/// Context needed to render the status bar.
pub struct StatusBarContext<'a> {
    pub source: &'a str,
    pub stats: PipelineStats,
    pub window_len: usize,
    pub window_capacity: usize,
    pub closed: bool,
}

/// Render the status bar.
pub fn render_status_bar(ui: &mut Ui, ctx: &StatusBarContext<'_>) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        // === Stream state dot + source ===
        let (status_color, status_text) = if ctx.closed {
            (Color32::GRAY, "Stream closed")
        } else {
            (Color32::GREEN, "Streaming")
        };
        ui.colored_label(status_color, "●");
        ui.label(RichText::new(format!("{}: {}", status_text, ctx.source)).small());

        ui.separator();

        let stats = &ctx.stats;
        ui.label(RichText::new(format!("Samples: {}", stats.samples)).small());

        ui.separator();

        ui.label(
            RichText::new(format!(
                "Window: {}/{}",
                ctx.window_len, ctx.window_capacity
            ))
            .small(),
        );

        ui.separator();

        // === Error counts ===
        let malformed_color = if stats.malformed > 0 {
            Color32::YELLOW
        } else {
            Color32::GRAY
        };
        ui.colored_label(
            malformed_color,
            RichText::new(format!("Malformed: {}", stats.malformed)).small(),
        );

        let sink_color = if stats.sink_failures > 0 {
            Color32::LIGHT_RED
        } else {
            Color32::GRAY
        };
        ui.colored_label(
            sink_color,
            RichText::new(format!("Write failures: {}", stats.sink_failures)).small(),
        );

        if stats.dropped_for_display > 0 {
            ui.separator();
            ui.label(
                RichText::new(format!("Skipped on screen: {}", stats.dropped_for_display)).small(),
            );
        }
    });
}
