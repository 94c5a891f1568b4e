use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use polars::prelude::*;
use tracing::{debug, info};

use crate::config::ColumnMap;
use crate::models::{polars_err, VariantRecord};

fn cell_to_string(cell: &calamine::DataType) -> String {
    use calamine::DataType as Ct;
    match cell {
        Ct::String(s) => s.clone(),
        Ct::Empty => String::new(),
        Ct::Bool(b) => b.to_string(),
        Ct::Error(e) => format!("ERR({e:?})"),
        Ct::Float(n) | Ct::Duration(n) => n.to_string(),
        Ct::Int(i) => i.to_string(),
        Ct::DateTime(f) => f.to_string(),
        Ct::DateTimeIso(s) | Ct::DurationIso(s) => s.clone(),
    }
}

/// Load one worksheet into an all-String DataFrame. Typing is deferred
/// to the named-column extraction so a stray text cell in a numeric
/// column fails with a row-level message instead of a sheet-level one.
pub fn read_excel(path: &Path, sheet_idx: usize) -> PolarsResult<DataFrame> {
    use calamine::{open_workbook_auto, Reader};

    let mut wb = open_workbook_auto(path).map_err(|e| polars_err(Box::new(e)))?;
    let range = wb
        .worksheet_range_at(sheet_idx)
        .ok_or_else(|| polars_err("worksheet missing".into()))?
        .map_err(|e| polars_err(Box::new(e)))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| polars_err("empty sheet".into()))?
        .iter()
        .map(cell_to_string)
        .collect();
    debug!("Input sheet header = {:?}", headers);

    let n_cols = headers.len();
    let mut cols: Vec<Vec<Option<String>>> =
        vec![Vec::with_capacity(range.height()); n_cols];
    for row in rows {
        for (i, cell) in row.iter().take(n_cols).enumerate() {
            cols[i].push(match cell {
                calamine::DataType::Empty => None,
                _ => Some(cell_to_string(cell)),
            });
        }
        // ragged rows: pad the short ones so every column stays aligned
        for col in cols.iter_mut().skip(row.len().min(n_cols)) {
            col.push(None);
        }
    }

    let series: Vec<Series> = headers
        .into_iter()
        .zip(cols)
        .map(|(h, c)| Series::new(PlSmallStr::from(h), c))
        .collect();

    DataFrame::new(series.into_iter().map(Into::into).collect())
}

fn named_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
    let col = df.column(name).map_err(|_| {
        let found: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        anyhow::anyhow!(
            "input sheet is missing required column `{name}`; found columns: {found:?}"
        )
    })?;
    col.str()
        .with_context(|| format!("column `{name}` could not be read as text"))
}

/// Extract variant records from the loaded sheet by header name.
pub fn load_variants(df: &DataFrame, columns: &ColumnMap) -> Result<Vec<VariantRecord>> {
    let variant_id = named_column(df, &columns.variant_id)?;
    let chromosome = named_column(df, &columns.chromosome)?;
    let position = named_column(df, &columns.position)?;
    let ref_base = named_column(df, &columns.ref_base)?;
    let alt_base = named_column(df, &columns.alt_base)?;
    let mpra_score = named_column(df, &columns.mpra_score)?;

    let mut records = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let pos_text = position
            .get(i)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .with_context(|| format!("row {}: `{}` is empty", i + 1, columns.position))?;
        let pos_value: f64 = pos_text.parse().with_context(|| {
            format!(
                "row {}: `{}` value {pos_text:?} is not numeric",
                i + 1,
                columns.position
            )
        })?;
        if pos_value < 1.0 {
            bail!(
                "row {}: `{}` must be a positive 1-based coordinate, got {pos_text}",
                i + 1,
                columns.position
            );
        }

        let mpra = mpra_score
            .get(i)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse::<f64>().ok());

        records.push(VariantRecord {
            variant_id: variant_id.get(i).unwrap_or_default().to_string(),
            chromosome: chromosome.get(i).unwrap_or_default().to_string(),
            position: pos_value as u64,
            ref_base: ref_base.get(i).unwrap_or_default().to_string(),
            alt_base: alt_base.get(i).unwrap_or_default().to_string(),
            mpra_score: mpra,
        });
    }

    info!("Loaded {} variants from input sheet", records.len());
    Ok(records)
}

/// Strip surrounding quotes and normalize Windows separators in a
/// pasted path.
pub fn normalize_input_path(raw: &str) -> PathBuf {
    let cleaned = raw.trim().replace('\\', "/").replace('"', "");
    PathBuf::from(cleaned)
}

/// Output files land next to the input workbook.
pub fn sibling_path(input: &Path, file_name: &str) -> PathBuf {
    match input.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(file_name),
        _ => PathBuf::from(file_name),
    }
}

/// Prompt for the input workbook path on stdin.
pub fn prompt_input_path() -> Result<PathBuf> {
    print!("Enter input Excel file path: ");
    io::stdout().flush().context("failed to flush stdout")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read input path from stdin")?;
    let path = normalize_input_path(&line);
    if path.as_os_str().is_empty() {
        bail!("no input path given");
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnMap;

    fn sheet(rows: &[(&str, &str, &str, &str, &str, &str)]) -> DataFrame {
        let mut ids = Vec::new();
        let mut chrs = Vec::new();
        let mut poss = Vec::new();
        let mut refs = Vec::new();
        let mut alts = Vec::new();
        let mut mpras = Vec::new();
        for (id, chr, pos, r, a, m) in rows {
            ids.push(id.to_string());
            chrs.push(chr.to_string());
            poss.push(pos.to_string());
            refs.push(r.to_string());
            alts.push(a.to_string());
            mpras.push(m.to_string());
        }
        DataFrame::new(vec![
            Series::new("unique_varID".into(), ids).into(),
            Series::new("chromosome".into(), chrs).into(),
            Series::new("position".into(), poss).into(),
            Series::new("ref".into(), refs).into(),
            Series::new("alt".into(), alts).into(),
            Series::new("MPRA_score".into(), mpras).into(),
        ])
        .unwrap()
    }

    #[test]
    fn loads_named_columns() {
        let df = sheet(&[("V1", "chr1", "100", "A", "G", "0.42")]);
        let records = load_variants(&df, &ColumnMap::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].variant_id, "V1");
        assert_eq!(records[0].position, 100);
        assert_eq!(records[0].mpra_score, Some(0.42));
    }

    #[test]
    fn missing_column_names_the_offender() {
        let df = sheet(&[("V1", "chr1", "100", "A", "G", "")]);
        let df = df.drop("position").unwrap();
        let err = load_variants(&df, &ColumnMap::default()).unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("`position`"), "got: {msg}");
        assert!(msg.contains("unique_varID"), "got: {msg}");
    }

    #[test]
    fn non_numeric_position_is_a_row_error() {
        let df = sheet(&[("V1", "chr1", "not-a-number", "A", "G", "")]);
        let err = load_variants(&df, &ColumnMap::default()).unwrap_err();
        assert!(format!("{err}").contains("row 1"));
    }

    #[test]
    fn zero_position_is_rejected() {
        let df = sheet(&[("V1", "chr1", "0", "A", "G", "")]);
        assert!(load_variants(&df, &ColumnMap::default()).is_err());
    }

    #[test]
    fn missing_mpra_score_is_none() {
        let df = sheet(&[("V1", "chr1", "100", "A", "G", "")]);
        let records = load_variants(&df, &ColumnMap::default()).unwrap();
        assert_eq!(records[0].mpra_score, None);
    }

    #[test]
    fn pasted_windows_path_is_normalized() {
        let p = normalize_input_path("  \"C:\\data\\variants.xlsx\"\n");
        assert_eq!(p, PathBuf::from("C:/data/variants.xlsx"));
    }

    #[test]
    fn outputs_land_in_the_input_folder() {
        let out = sibling_path(Path::new("/data/run1/variants.xlsx"), "ATAC_Report.pdf");
        assert_eq!(out, PathBuf::from("/data/run1/ATAC_Report.pdf"));
        let bare = sibling_path(Path::new("variants.xlsx"), "ATAC_Report.pdf");
        assert_eq!(bare, PathBuf::from("ATAC_Report.pdf"));
    }
}
