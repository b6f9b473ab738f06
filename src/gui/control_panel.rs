//! Control Panel Widget
//! Left side panel with source selection and load controls.

use egui::{Color32, RichText};

use crate::data::SourceLocation;

/// User-entered source locations. Either a local path or an http(s) URL.
#[derive(Default, Clone)]
pub struct SourceSettings {
    pub incidents: String,
    pub intersections: String,
    pub show_map: bool,
}

impl SourceSettings {
    pub fn incidents_location(&self) -> SourceLocation {
        SourceLocation::parse(&self.incidents)
    }

    pub fn intersections_location(&self) -> SourceLocation {
        SourceLocation::parse(&self.intersections)
    }

    pub fn ready(&self) -> bool {
        !self.incidents.trim().is_empty() && !self.intersections.trim().is_empty()
    }
}

/// Left side control panel with source fields and progress reporting.
pub struct ControlPanel {
    pub settings: SourceSettings,
    pub progress: f32,
    pub status: String,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            settings: SourceSettings {
                show_map: true,
                ..Default::default()
            },
            progress: 0.0,
            status: "Ready".to_string(),
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui, has_data: bool) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🚦 CrossView")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Traffic Incident Dashboard")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Sources Section =====
        ui.label(RichText::new("📁 Data Sources").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.label(RichText::new("Incidents CSV (path or URL)").size(12.0));
                ui.horizontal(|ui| {
                    ui.add(
                        egui::TextEdit::singleline(&mut self.settings.incidents)
                            .desired_width(190.0)
                            .hint_text("Incidentes.csv"),
                    );
                    if ui.button("📂").clicked() {
                        action = ControlPanelAction::BrowseIncidents;
                    }
                });

                ui.add_space(6.0);

                ui.label(RichText::new("Intersections JSON (path or URL)").size(12.0));
                ui.horizontal(|ui| {
                    ui.add(
                        egui::TextEdit::singleline(&mut self.settings.intersections)
                            .desired_width(190.0)
                            .hint_text("intersections.json"),
                    );
                    if ui.button("📂").clicked() {
                        action = ControlPanelAction::BrowseIntersections;
                    }
                });
            });

        ui.add_space(10.0);
        ui.checkbox(&mut self.settings.show_map, "Show coordinate map");

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.settings.ready(), |ui| {
                let button = egui::Button::new(RichText::new("▶ Load Dashboard").size(16.0))
                    .min_size(egui::vec2(200.0, 35.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::Load;
                }
            });

            ui.add_space(8.0);

            ui.add_enabled_ui(has_data, |ui| {
                let export = egui::Button::new(RichText::new("📄 Export PNG").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(export).clicked() {
                    action = ControlPanelAction::ExportPng;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        ui.label(RichText::new("📊 Progress").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(self.progress > 0.0 && self.progress < 100.0),
        );

        ui.add_space(5.0);

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("Complete") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseIncidents,
    BrowseIntersections,
    Load,
    ExportPng,
}
