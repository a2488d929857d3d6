use egui::{Vec2, ViewportBuilder};

use crate::app::ThresholdMeterApp;

mod app;
mod calc;
mod error;
mod loader;
mod table;

fn main() -> eframe::Result<()> {
    env_logger::init();

    let viewport_builder = ViewportBuilder::default().with_inner_size(Vec2::new(480.0, 760.0));
    let native_options = eframe::NativeOptions {
        viewport: viewport_builder,
        ..eframe::NativeOptions::default()
    };
    eframe::run_native(
        "Threshold Meter",
        native_options,
        Box::new(|cc| ThresholdMeterApp::new(cc)),
    )
}
