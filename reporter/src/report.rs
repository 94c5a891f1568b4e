use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use polars::prelude::*;
use printpdf::image_crate::{DynamicImage, RgbImage};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerIndex, PdfPageIndex,
};
use rust_xlsxwriter::Workbook;
use tracing::info;

// landscape A4
const PAGE_WIDTH_MM: f32 = 297.0;
const PAGE_HEIGHT_MM: f32 = 210.0;
const CHART_DPI: f32 = 110.0;

/// Multi-page PDF under construction, one chart page per variant.
pub struct PdfReport {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    // page created by PdfDocument::new, consumed by the first add_page
    first_page: Option<(PdfPageIndex, PdfLayerIndex)>,
    pages: usize,
}

impl PdfReport {
    pub fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "chart");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .context("failed to register PDF font")?;
        Ok(Self {
            doc,
            font,
            first_page: Some((page, layer)),
            pages: 0,
        })
    }

    /// Append one page: the variant title line on top, the rendered
    /// chart (raw RGB8, `width` x `height`) below it.
    pub fn add_page(
        &mut self,
        title_line: &str,
        chart_rgb: Vec<u8>,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let (page, layer_idx) = match self.first_page.take() {
            Some(first) => first,
            None => self
                .doc
                .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "chart"),
        };
        let layer = self.doc.get_page(page).get_layer(layer_idx);

        layer.use_text(title_line, 9.0, Mm(12.0), Mm(198.0), &self.font);

        let image = RgbImage::from_raw(width, height, chart_rgb)
            .ok_or_else(|| anyhow!("chart buffer does not match {width}x{height} RGB8"))?;
        Image::from_dynamic_image(&DynamicImage::ImageRgb8(image)).add_to_layer(
            layer,
            ImageTransform {
                translate_x: Some(Mm(12.0)),
                translate_y: Some(Mm(70.0)),
                dpi: Some(CHART_DPI),
                ..Default::default()
            },
        );

        self.pages += 1;
        Ok(())
    }

    pub fn pages(&self) -> usize {
        self.pages
    }

    pub fn save(self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        self.doc
            .save(&mut BufWriter::new(file))
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Wrote {} page(s) to {}", self.pages, path.display());
        Ok(())
    }
}

fn blank_row_like(df: &DataFrame) -> PolarsResult<DataFrame> {
    let cols: Vec<Column> = df
        .get_columns()
        .iter()
        .map(|c| Series::full_null(c.name().clone(), 1, c.dtype()).into())
        .collect();
    DataFrame::new(cols)
}

/// Running concatenation of per-variant blocks, with one all-null
/// separator row between consecutive blocks and none after the last.
#[derive(Default)]
pub struct ScoreAccumulator {
    combined: Option<DataFrame>,
}

impl ScoreAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_block(&mut self, block: DataFrame) -> PolarsResult<()> {
        match self.combined.as_mut() {
            None => self.combined = Some(block),
            Some(acc) => {
                let separator = blank_row_like(acc)?;
                acc.vstack_mut(&separator)?;
                acc.vstack_mut(&block)?;
            }
        }
        Ok(())
    }

    /// The combined table, or None when no block was ever pushed.
    pub fn finish(self) -> Option<DataFrame> {
        self.combined
    }
}

/// Write the combined table to a single-sheet workbook. Nulls stay
/// blank, so separator rows come out as fully empty spreadsheet rows.
pub fn write_workbook(df: &DataFrame, path: &Path, sheet_name: &str) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (c, name) in df.get_column_names().iter().enumerate() {
        worksheet.write_string(0, c as u16, name.as_str())?;
    }

    for (c, column) in df.get_columns().iter().enumerate() {
        let col = c as u16;
        for r in 0..df.height() {
            let row = (r + 1) as u32;
            match column.get(r)? {
                AnyValue::Null => {}
                AnyValue::String(s) => {
                    worksheet.write_string(row, col, s)?;
                }
                AnyValue::StringOwned(s) => {
                    worksheet.write_string(row, col, s.as_str())?;
                }
                AnyValue::Float64(v) => {
                    worksheet.write_number(row, col, v)?;
                }
                AnyValue::Float32(v) => {
                    worksheet.write_number(row, col, v as f64)?;
                }
                AnyValue::Int64(v) => {
                    worksheet.write_number(row, col, v as f64)?;
                }
                AnyValue::Int32(v) => {
                    worksheet.write_number(row, col, v as f64)?;
                }
                AnyValue::UInt64(v) => {
                    worksheet.write_number(row, col, v as f64)?;
                }
                AnyValue::Boolean(b) => {
                    worksheet.write_boolean(row, col, b)?;
                }
                other => {
                    worksheet.write_string(row, col, format!("{other}"))?;
                }
            }
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!("Wrote {} row(s) to {}", df.height(), path.display());
    Ok(())
}
