//! Detail Panel Widget
//! Right side panel showing the hovered intersection, plus the list of
//! merge warnings from the last load.

use egui::{Color32, RichText};

use crate::data::{Coordinates, MergeWarning, MergedIntersection};

/// Display-ready text for one intersection.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailContent {
    pub title: String,
    pub total: String,
    pub status: String,
    /// `Some` only when the record carries a street-view reference.
    pub street_view: Option<String>,
}

/// Format a merged record for the detail panel. Pure; the only branch is
/// whether the street-view reference is non-empty.
pub fn detail_content(record: &MergedIntersection) -> DetailContent {
    DetailContent {
        title: record.name.clone(),
        total: record.total.to_string(),
        status: record.status.clone(),
        street_view: if record.street_view.is_empty() {
            None
        } else {
            Some(record.street_view.clone())
        },
    }
}

fn coords_text(coords: Coordinates) -> String {
    format!("{:.5}, {:.5}", coords.lat, coords.lng)
}

/// Draws the hover detail card and the warnings list.
pub struct DetailPanel;

impl DetailPanel {
    pub fn show(
        ui: &mut egui::Ui,
        record: Option<&MergedIntersection>,
        warnings: &[MergeWarning],
    ) {
        ui.label(RichText::new("Intersection").size(14.0).strong());
        ui.add_space(5.0);

        match record {
            None => {
                ui.label(
                    RichText::new("Hover a point to see details")
                        .size(12.0)
                        .color(Color32::GRAY),
                );
            }
            Some(record) => {
                let content = detail_content(record);

                ui.label(RichText::new(&content.title).size(16.0).strong());
                ui.add_space(5.0);

                egui::Grid::new("detail_grid")
                    .min_col_width(90.0)
                    .spacing([8.0, 4.0])
                    .show(ui, |ui| {
                        ui.label("Total incidents:");
                        ui.label(RichText::new(&content.total).strong());
                        ui.end_row();

                        ui.label("Signalized:");
                        ui.label(if content.status.is_empty() {
                            "n/a"
                        } else {
                            content.status.as_str()
                        });
                        ui.end_row();

                        if let Some(coords) = record.coords {
                            ui.label("Coordinates:");
                            ui.label(coords_text(coords));
                            ui.end_row();
                        }
                    });

                ui.add_space(8.0);

                if let Some(url) = &content.street_view {
                    if ui.button("🌍 Open Street View").clicked() {
                        if let Err(err) = open::that(url) {
                            log::warn!("failed to open street view {url}: {err}");
                        }
                    }
                }
            }
        }

        if !warnings.is_empty() {
            ui.add_space(15.0);
            ui.separator();
            ui.add_space(5.0);

            egui::CollapsingHeader::new(
                RichText::new(format!("⚠ Data warnings ({})", warnings.len()))
                    .color(Color32::from_rgb(243, 156, 18)),
            )
            .default_open(false)
            .show(ui, |ui| {
                for warning in warnings {
                    ui.label(RichText::new(warning.to_string()).size(11.0));
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merged(total: f64, street_view: &str) -> MergedIntersection {
        MergedIntersection {
            name: "Av. Juarez".to_string(),
            total,
            status: "Si".to_string(),
            coords: None,
            street_view: street_view.to_string(),
        }
    }

    #[test]
    fn formats_fields_verbatim() {
        let content = detail_content(&merged(12.0, ""));
        assert_eq!(content.title, "Av. Juarez");
        assert_eq!(content.total, "12");
        assert_eq!(content.status, "Si");
    }

    #[test]
    fn fractional_totals_keep_their_decimals() {
        let content = detail_content(&merged(12.5, ""));
        assert_eq!(content.total, "12.5");
    }

    #[test]
    fn street_view_present_only_when_non_empty() {
        assert_eq!(detail_content(&merged(1.0, "")).street_view, None);
        assert_eq!(
            detail_content(&merged(1.0, "https://maps.example/x")).street_view,
            Some("https://maps.example/x".to_string())
        );
    }

    #[test]
    fn coords_text_is_five_decimals() {
        let text = coords_text(Coordinates {
            lat: 25.543211,
            lng: -103.406789,
        });
        assert_eq!(text, "25.54321, -103.40679");
    }
}
