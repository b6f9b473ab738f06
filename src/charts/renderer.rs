//! Static Chart Renderer
//! Renders the incidents chart off-screen for PNG export.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbImage};
use plotters::prelude::*;
use thiserror::Error;

use crate::data::MergedIntersection;

const LINE_RGB: RGBColor = RGBColor(70, 130, 180);
const MARKER_RGB: RGBColor = RGBColor(243, 156, 18);

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Chart drawing failed: {0}")]
    Draw(String),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("No intersections to render")]
    Empty,
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render the incidents chart to in-memory PNG bytes.
    pub fn render_incidents_png(
        intersections: &[MergedIntersection],
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        if intersections.is_empty() {
            return Err(RenderError::Empty);
        }

        let marks: Vec<(f64, f64)> = intersections
            .iter()
            .enumerate()
            .map(|(i, rec)| (i as f64, rec.total))
            .collect();
        let y_max = y_axis_max(intersections);
        let labels: Vec<String> = intersections.iter().map(|i| i.name.clone()).collect();

        let mut buffer = vec![0u8; (width * height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let mut chart = ChartBuilder::on(&root)
                .caption("Incidents by intersection", ("sans-serif", 24))
                .margin(12)
                .x_label_area_size(40)
                .y_label_area_size(48)
                .build_cartesian_2d(-0.5..(marks.len() as f64 - 0.5), 0.0..y_max)
                .map_err(draw_err)?;

            chart
                .configure_mesh()
                .y_desc("Incidents")
                .x_labels(labels.len().min(12))
                .x_label_formatter(&|x| {
                    let idx = x.round();
                    if (x - idx).abs() > 1e-6 || idx < 0.0 {
                        return String::new();
                    }
                    labels
                        .get(idx as usize)
                        .cloned()
                        .unwrap_or_default()
                })
                .draw()
                .map_err(draw_err)?;

            chart
                .draw_series(LineSeries::new(marks.iter().copied(), LINE_RGB.stroke_width(2)))
                .map_err(draw_err)?;
            chart
                .draw_series(
                    marks
                        .iter()
                        .map(|&point| Circle::new(point, 4, MARKER_RGB.filled())),
                )
                .map_err(draw_err)?;

            root.present().map_err(draw_err)?;
        }

        let img = RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| RenderError::Draw("pixel buffer size mismatch".to_string()))?;
        let mut png = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img).write_to(&mut png, ImageFormat::Png)?;
        Ok(png.into_inner())
    }
}

/// Headroom above the tallest mark so it never touches the frame.
fn y_axis_max(intersections: &[MergedIntersection]) -> f64 {
    let max = intersections.iter().fold(0.0_f64, |m, i| m.max(i.total));
    if max <= 0.0 {
        1.0
    } else {
        max * 1.1
    }
}

fn draw_err<E: std::fmt::Display>(err: E) -> RenderError {
    RenderError::Draw(err.to_string())
}
