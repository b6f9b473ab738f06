//! CrossView Main Application
//! Main window with control panel, charts, and hover detail panel.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

use egui::{RichText, ScrollArea, SidePanel};

use crate::charts::{IncidentPlotter, StaticChartRenderer};
use crate::data::{
    fetch_sources_blocking, load_incidents, load_intersections, merge_intersections,
    ColumnAliases, FetchConfig, MergeOutcome, SourceLocation,
};
use crate::gui::{ControlPanel, ControlPanelAction, DetailPanel};
use crate::stats::DatasetSummary;

/// Load result from background thread
enum LoadResult {
    Progress(f32, String),
    Complete(Box<LoadedDataset>),
    Error(String),
}

/// One fully loaded cycle: merged records, warnings, and their summary.
struct LoadedDataset {
    outcome: MergeOutcome,
    summary: DatasetSummary,
}

/// Main application window.
pub struct CrossviewApp {
    control_panel: ControlPanel,
    dataset: Option<LoadedDataset>,
    /// Index of the last record hovered on either chart.
    hovered: Option<usize>,

    // Async load
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl CrossviewApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            control_panel: ControlPanel::new(),
            dataset: None,
            hovered: None,
            load_rx: None,
            is_loading: false,
        }
    }

    fn handle_browse_incidents(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.control_panel.settings.incidents = path.to_string_lossy().to_string();
        }
    }

    fn handle_browse_intersections(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON Files", &["json"])
            .pick_file()
        {
            self.control_panel.settings.intersections = path.to_string_lossy().to_string();
        }
    }

    /// Start the load pipeline in a background thread.
    fn start_load(&mut self) {
        if self.is_loading {
            return; // Already loading
        }

        // A new load cycle discards the previous dataset entirely.
        self.dataset = None;
        self.hovered = None;

        let incidents = self.control_panel.settings.incidents_location();
        let intersections = self.control_panel.settings.intersections_location();

        self.control_panel.set_progress(5.0, "Fetching sources...");
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        thread::spawn(move || {
            Self::run_load(tx, incidents, intersections);
        });
    }

    /// Run the whole pipeline (called from the background thread).
    fn run_load(tx: Sender<LoadResult>, incidents: SourceLocation, intersections: SourceLocation) {
        match Self::load_pipeline(&tx, &incidents, &intersections) {
            Ok(dataset) => {
                let _ = tx.send(LoadResult::Complete(Box::new(dataset)));
            }
            Err(err) => {
                log::error!("load failed: {err:#}");
                let _ = tx.send(LoadResult::Error(err.to_string()));
            }
        }
    }

    /// Fetch, parse, and merge. Either source failing fails the whole
    /// pipeline; nothing is rendered from partial data.
    fn load_pipeline(
        tx: &Sender<LoadResult>,
        incidents: &SourceLocation,
        intersections: &SourceLocation,
    ) -> anyhow::Result<LoadedDataset> {
        let _ = tx.send(LoadResult::Progress(
            10.0,
            "Fetching sources...".to_string(),
        ));
        let bytes = fetch_sources_blocking(incidents, intersections, &FetchConfig::default())?;

        let _ = tx.send(LoadResult::Progress(
            40.0,
            "Parsing incidents CSV...".to_string(),
        ));
        let records = load_incidents(&bytes.incidents, &ColumnAliases::default())?;

        let _ = tx.send(LoadResult::Progress(
            60.0,
            "Parsing intersections JSON...".to_string(),
        ));
        let metas = load_intersections(&bytes.intersections)?;

        let _ = tx.send(LoadResult::Progress(80.0, "Merging...".to_string()));
        let outcome = merge_intersections(&records, &metas);
        let summary = DatasetSummary::compute(&outcome.intersections);

        log::info!(
            "merged {} intersections ({} warnings)",
            outcome.intersections.len(),
            outcome.warnings.len()
        );

        Ok(LoadedDataset { outcome, summary })
    }

    /// Check for load results
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    LoadResult::Progress(progress, status) => {
                        self.control_panel.set_progress(progress, &status);
                    }
                    LoadResult::Complete(dataset) => {
                        let count = dataset.outcome.intersections.len();
                        let warnings = dataset.outcome.warnings.len();
                        self.dataset = Some(*dataset);

                        let status = if warnings == 0 {
                            format!("Complete! {count} intersections")
                        } else {
                            format!("Complete! {count} intersections, {warnings} warnings")
                        };
                        self.control_panel.set_progress(100.0, &status);
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                    LoadResult::Error(error) => {
                        self.control_panel
                            .set_progress(0.0, &format!("Error: {error}"));
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                }
            }

            // Put receiver back if still needed
            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    /// Handle PNG export of the incidents chart.
    fn handle_export_png(&mut self) {
        let Some(dataset) = &self.dataset else {
            self.control_panel.set_progress(0.0, "No data to export");
            return;
        };

        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name("incidents_chart.png")
            .save_file()
        else {
            return; // User cancelled
        };

        let result = StaticChartRenderer::render_incidents_png(
            &dataset.outcome.intersections,
            1280,
            720,
        )
        .map_err(|err| err.to_string())
        .and_then(|png| std::fs::write(&path, png).map_err(|err| err.to_string()));

        match result {
            Ok(()) => {
                self.control_panel.set_progress(
                    100.0,
                    &format!("Complete! Chart exported to {}", path.display()),
                );
            }
            Err(err) => {
                self.control_panel
                    .set_progress(0.0, &format!("Error: {err}"));
            }
        }
    }

    fn draw_summary_strip(ui: &mut egui::Ui, summary: &DatasetSummary) {
        ui.horizontal_wrapped(|ui| {
            for (label, value) in [
                ("Intersections", summary.count.to_string()),
                ("Total incidents", summary.total.to_string()),
                ("Mean", format!("{:.1}", summary.mean)),
                ("Median", format!("{:.1}", summary.median)),
                ("P95", format!("{:.1}", summary.p95)),
                ("Max", summary.max.to_string()),
                (
                    "Signalized",
                    format!("{}/{}", summary.signalized, summary.count),
                ),
                (
                    "Located",
                    format!("{}/{}", summary.with_coords, summary.count),
                ),
            ] {
                ui.label(RichText::new(format!("{label}: ")).size(12.0));
                ui.label(RichText::new(value).size(12.0).strong());
                ui.add_space(12.0);
            }
        });
    }
}

impl eframe::App for CrossviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(280.0)
            .max_width(330.0)
            .show(ctx, |ui| {
                ScrollArea::vertical().show(ui, |ui| {
                    let has_data = self.dataset.is_some();
                    let action = self.control_panel.show(ui, has_data);

                    match action {
                        ControlPanelAction::BrowseIncidents => self.handle_browse_incidents(),
                        ControlPanelAction::BrowseIntersections => {
                            self.handle_browse_intersections()
                        }
                        ControlPanelAction::Load => self.start_load(),
                        ControlPanelAction::ExportPng => self.handle_export_png(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Right panel - hover details and warnings
        if let Some(dataset) = &self.dataset {
            let hovered_record = self
                .hovered
                .and_then(|i| dataset.outcome.intersections.get(i));

            SidePanel::right("detail_panel")
                .min_width(240.0)
                .max_width(300.0)
                .show(ctx, |ui| {
                    ScrollArea::vertical().show(ui, |ui| {
                        DetailPanel::show(ui, hovered_record, &dataset.outcome.warnings);
                    });
                });
        }

        // Central panel - charts
        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(dataset) = &self.dataset else {
                ui.centered_and_justified(|ui| {
                    ui.label(RichText::new("No Data").size(20.0));
                });
                return;
            };

            let show_map = self.control_panel.settings.show_map;
            let mut chart_hit = None;
            let mut map_hit = None;

            ScrollArea::vertical().show(ui, |ui| {
                Self::draw_summary_strip(ui, &dataset.summary);
                ui.add_space(8.0);

                ui.label(
                    RichText::new("Incidents by intersection")
                        .size(14.0)
                        .strong(),
                );
                chart_hit = IncidentPlotter::draw_incidents_chart(
                    ui,
                    &dataset.outcome.intersections,
                    self.hovered,
                );

                if show_map {
                    ui.add_space(12.0);
                    ui.label(RichText::new("Map").size(14.0).strong());
                    map_hit = IncidentPlotter::draw_map_chart(
                        ui,
                        &dataset.outcome.intersections,
                        self.hovered,
                    );
                }
            });

            // Keep showing the last hovered record, like the original
            // dashboard's sticky info panel.
            if let Some(hit) = chart_hit.or(map_hit) {
                self.hovered = Some(hit);
            }
        });
    }
}
