//! CrossView - Traffic Incident Dashboard & Interactive Chart Viewer
//!
//! A Rust application that merges intersection incident counts with
//! intersection metadata and displays interactive charts.

mod charts;
mod data;
mod gui;
mod stats;

use eframe::egui;
use gui::CrossviewApp;

fn main() -> eframe::Result<()> {
    pretty_env_logger::init();

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([1000.0, 640.0])
            .with_title("CrossView"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "CrossView",
        options,
        Box::new(|cc| Ok(Box::new(CrossviewApp::new(cc)))),
    )
}
