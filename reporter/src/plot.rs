use anyhow::{anyhow, bail, Result};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;

use crate::client::Track;

pub const CHART_WIDTH: u32 = 1200;
pub const CHART_HEIGHT: u32 = 400;

const REFERENCE_COLOR: RGBColor = RGBColor(70, 130, 180); // steel blue
const ALTERNATE_COLOR: RGBColor = RGBColor(255, 99, 71); // tomato

fn draw_err<E: std::fmt::Display>(e: E) -> anyhow::Error {
    anyhow!("chart rendering failed: {e}")
}

/// Overlay the reference and alternate accessibility tracks for one
/// variant and return the chart as a raw RGB8 buffer
/// (CHART_WIDTH x CHART_HEIGHT). The caption comes from the first
/// metadata row; a dashed marker sits at the interval midpoint.
pub fn render_track_comparison(reference: &Track, alternate: &Track) -> Result<Vec<u8>> {
    if reference.values.is_empty() {
        bail!("reference track has no values");
    }

    let start = reference.interval.start as f64;
    let resolution = reference.resolution.max(1) as f64;
    let n = reference.values.len();

    let positions: Vec<f64> = (0..n).map(|i| start + i as f64 * resolution).collect();
    let x_min = positions[0];
    let x_max = start + n as f64 * resolution;

    let y_max = reference
        .values
        .iter()
        .chain(alternate.values.iter())
        .cloned()
        .fold(0.0_f64, f64::max);
    let y_max = if y_max > 0.0 { y_max * 1.05 } else { 1.0 };

    let caption = match reference.metadata.first() {
        Some(meta) => format!("ATAC-seq: {} ({})", meta.biosample_name, meta.ontology_curie),
        None => "ATAC-seq".to_string(),
    };

    let mut buf = vec![0u8; (CHART_WIDTH * CHART_HEIGHT * 3) as usize];
    {
        let root =
            BitMapBackend::with_buffer(&mut buf, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(caption, ("sans-serif", 22))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, 0.0..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_desc("bp")
            .y_desc("Chromatin accessibility")
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(LineSeries::new(
                positions
                    .iter()
                    .cloned()
                    .zip(reference.values.iter().cloned()),
                REFERENCE_COLOR.stroke_width(1),
            ))
            .map_err(draw_err)?
            .label("Reference")
            .legend(|(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], REFERENCE_COLOR.stroke_width(2))
            });

        chart
            .draw_series(LineSeries::new(
                positions
                    .iter()
                    .cloned()
                    .zip(alternate.values.iter().cloned()),
                ALTERNATE_COLOR.stroke_width(1),
            ))
            .map_err(draw_err)?
            .label("Alternate")
            .legend(|(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], ALTERNATE_COLOR.stroke_width(2))
            });

        // variant marker at the interval midpoint
        let marker_x = start + (n as f64 / 2.0).floor() * resolution;
        chart
            .draw_series(DashedLineSeries::new(
                vec![(marker_x, 0.0), (marker_x, y_max)],
                6,
                4,
                BLACK.stroke_width(1),
            ))
            .map_err(draw_err)?
            .label("Variant")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(2)));

        chart
            .configure_series_labels()
            .border_style(BLACK)
            .background_style(WHITE.mix(0.8))
            .draw()
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
    }

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{TrackInterval, TrackMetadata};

    fn track(values: Vec<f64>) -> Track {
        Track {
            interval: TrackInterval {
                chromosome: "chr1".to_string(),
                start: 1,
                end: 1 + values.len() as u64,
            },
            resolution: 1,
            values,
            metadata: vec![TrackMetadata {
                biosample_name: "heart left ventricle".to_string(),
                ontology_curie: "UBERON:0002078".to_string(),
            }],
        }
    }

    #[test]
    fn renders_full_rgb_buffer() {
        let reference = track(vec![0.1, 0.5, 0.2, 0.9]);
        let alternate = track(vec![0.2, 0.4, 0.8, 0.1]);
        let buf = render_track_comparison(&reference, &alternate).unwrap();
        assert_eq!(buf.len(), (CHART_WIDTH * CHART_HEIGHT * 3) as usize);
        // white background means the buffer cannot stay all-zero
        assert!(buf.iter().any(|&b| b == 255));
    }

    #[test]
    fn empty_reference_track_is_an_error() {
        let reference = track(vec![]);
        let alternate = track(vec![0.2]);
        assert!(render_track_comparison(&reference, &alternate).is_err());
    }

    #[test]
    fn flat_zero_tracks_still_render() {
        let reference = track(vec![0.0, 0.0, 0.0]);
        let alternate = track(vec![0.0, 0.0, 0.0]);
        assert!(render_track_comparison(&reference, &alternate).is_ok());
    }
}
