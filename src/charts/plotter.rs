//! Chart Plotter Module
//! Interactive incidents chart and coordinate map using egui_plot.

use egui::Color32;
use egui_plot::{Line, Plot, PlotPoints, Points};

use crate::data::MergedIntersection;

/// Chart palette, matching the dashboard's original look.
pub const LINE_COLOR: Color32 = Color32::from_rgb(70, 130, 180); // Steel blue
pub const MARKER_COLOR: Color32 = Color32::from_rgb(243, 156, 18); // Orange
pub const HOVER_COLOR: Color32 = Color32::from_rgb(231, 76, 60); // Red

const CHART_HEIGHT: f32 = 340.0;
const MAX_LABEL_CHARS: usize = 14;

/// Draws the interactive charts and reports which record is under the
/// pointer.
pub struct IncidentPlotter;

impl IncidentPlotter {
    /// Line-plus-markers chart of incident totals, one mark per
    /// intersection in merge order. Returns the index of the mark under
    /// the pointer, if any.
    pub fn draw_incidents_chart(
        ui: &mut egui::Ui,
        intersections: &[MergedIntersection],
        hovered: Option<usize>,
    ) -> Option<usize> {
        let x_labels: Vec<String> = intersections
            .iter()
            .map(|i| truncate_label(&i.name))
            .collect();
        let marks: Vec<[f64; 2]> = intersections
            .iter()
            .enumerate()
            .map(|(i, rec)| [i as f64, rec.total])
            .collect();

        let mut hover_hit = None;

        Plot::new("incidents_chart")
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .y_axis_label("Incidents")
            .include_y(0.0)
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if (mark.value - idx).abs() > f64::EPSILON {
                    return String::new();
                }
                let idx = idx as usize;
                if idx < x_labels.len() {
                    x_labels[idx].clone()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(PlotPoints::from_iter(marks.iter().copied()))
                        .color(LINE_COLOR)
                        .width(2.0)
                        .name("Incidents"),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from_iter(marks.iter().copied()))
                        .radius(4.0)
                        .color(MARKER_COLOR),
                );

                // Redraw the hovered mark on top, like the original's
                // mouseover recolor.
                if let Some(idx) = hovered {
                    if let Some(&mark) = marks.get(idx) {
                        plot_ui.points(
                            Points::new(PlotPoints::from_iter([mark]))
                                .radius(6.0)
                                .color(HOVER_COLOR),
                        );
                    }
                }

                if let Some(pointer) = plot_ui.pointer_coordinate() {
                    hover_hit = index_under_pointer(pointer.x, intersections.len());
                }
            });

        hover_hit
    }

    /// Scatter map of the located intersections (x = longitude,
    /// y = latitude). Records without coordinates are omitted here only.
    /// Returns the index (into the full sequence) of the point under the
    /// pointer, if any.
    pub fn draw_map_chart(
        ui: &mut egui::Ui,
        intersections: &[MergedIntersection],
        hovered: Option<usize>,
    ) -> Option<usize> {
        let located: Vec<(usize, [f64; 2])> = intersections
            .iter()
            .enumerate()
            .filter_map(|(i, rec)| rec.coords.map(|c| (i, [c.lng, c.lat])))
            .collect();

        let mut hover_hit = None;

        Plot::new("map_chart")
            .height(CHART_HEIGHT)
            .data_aspect(1.0)
            .allow_scroll(false)
            .x_axis_label("Longitude")
            .y_axis_label("Latitude")
            .show(ui, |plot_ui| {
                let points: Vec<[f64; 2]> = located.iter().map(|&(_, p)| p).collect();
                plot_ui.points(
                    Points::new(PlotPoints::from_iter(points.iter().copied()))
                        .radius(4.0)
                        .color(MARKER_COLOR)
                        .name("Intersections"),
                );

                if let Some(idx) = hovered {
                    if let Some(&(_, point)) = located.iter().find(|(i, _)| *i == idx) {
                        plot_ui.points(
                            Points::new(PlotPoints::from_iter([point]))
                                .radius(6.0)
                                .color(HOVER_COLOR),
                        );
                    }
                }

                if let Some(pointer) = plot_ui.pointer_coordinate() {
                    let bounds = plot_ui.plot_bounds();
                    let tolerance = [bounds.width() * 0.02, bounds.height() * 0.02];
                    hover_hit =
                        point_under_pointer(&located, [pointer.x, pointer.y], tolerance);
                }
            });

        hover_hit
    }
}

/// Hover hit test for the incidents chart: the nearest integer mark, when
/// the pointer is within roughly half a slot of it.
fn index_under_pointer(pointer_x: f64, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let idx = pointer_x.round();
    if idx < 0.0 || idx >= len as f64 || (pointer_x - idx).abs() > 0.45 {
        return None;
    }
    Some(idx as usize)
}

/// Hover hit test for the map: the closest located point within the
/// per-axis tolerance.
fn point_under_pointer(
    located: &[(usize, [f64; 2])],
    pointer: [f64; 2],
    tolerance: [f64; 2],
) -> Option<usize> {
    located
        .iter()
        .filter(|(_, p)| {
            (p[0] - pointer[0]).abs() <= tolerance[0] && (p[1] - pointer[1]).abs() <= tolerance[1]
        })
        .min_by(|(_, a), (_, b)| {
            let da = (a[0] - pointer[0]).powi(2) + (a[1] - pointer[1]).powi(2);
            let db = (b[0] - pointer[0]).powi(2) + (b[1] - pointer[1]).powi(2);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|&(i, _)| i)
}

fn truncate_label(name: &str) -> String {
    if name.chars().count() <= MAX_LABEL_CHARS {
        name.to_string()
    } else {
        let head: String = name.chars().take(MAX_LABEL_CHARS - 1).collect();
        format!("{head}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_hit_requires_proximity() {
        assert_eq!(index_under_pointer(2.1, 5), Some(2));
        assert_eq!(index_under_pointer(2.5, 5), None);
        assert_eq!(index_under_pointer(-0.6, 5), None);
        assert_eq!(index_under_pointer(4.9, 5), None);
        assert_eq!(index_under_pointer(1.0, 0), None);
    }

    #[test]
    fn map_hit_picks_closest_within_tolerance() {
        let located = vec![(0, [-103.40, 25.54]), (3, [-103.41, 25.55])];

        let hit = point_under_pointer(&located, [-103.409, 25.549], [0.01, 0.01]);
        assert_eq!(hit, Some(3));

        let miss = point_under_pointer(&located, [-103.0, 25.0], [0.01, 0.01]);
        assert_eq!(miss, None);
    }

    #[test]
    fn labels_are_truncated_with_ellipsis() {
        assert_eq!(truncate_label("Av. Juarez"), "Av. Juarez");
        let long = truncate_label("Blvd. Independencia y Calzada");
        assert!(long.ends_with('…'));
        assert!(long.chars().count() <= MAX_LABEL_CHARS);
    }
}
