use polars::prelude::*;
use tracing::debug;

use crate::client::ScoreRow;
use crate::config::ScoreRange;
use crate::models::VariantRecord;

/// Tidy the remote scorer's rows into a DataFrame. Column order here
/// is the column order of the output workbook block.
pub fn scores_to_dataframe(rows: &[ScoreRow]) -> PolarsResult<DataFrame> {
    let gene_id: Vec<String> = rows.iter().map(|r| r.gene_id.clone()).collect();
    let gene_name: Vec<String> = rows.iter().map(|r| r.gene_name.clone()).collect();
    let biosample: Vec<String> = rows.iter().map(|r| r.biosample_name.clone()).collect();
    let ontology: Vec<String> = rows.iter().map(|r| r.ontology_curie.clone()).collect();
    let raw: Vec<f64> = rows.iter().map(|r| r.raw_score).collect();
    let quantile: Vec<f64> = rows.iter().map(|r| r.quantile_score).collect();

    DataFrame::new(vec![
        Series::new("gene_id".into(), gene_id).into(),
        Series::new("gene_name".into(), gene_name).into(),
        Series::new("biosample_name".into(), biosample).into(),
        Series::new("ontology_curie".into(), ontology).into(),
        Series::new("raw_score".into(), raw).into(),
        Series::new("quantile_score".into(), quantile).into(),
    ])
}

/// Keep rows whose biosample is allow-listed and whose |raw_score| and
/// |quantile_score| fall inside the configured ranges, then overwrite
/// both score columns with their per-gene mean over the survivors.
/// The three predicates are an AND, so filter order is irrelevant;
/// zero survivors yield an empty frame with the full schema.
pub fn refine_scores(
    df: DataFrame,
    biosample_allowlist: &[String],
    raw_range: &ScoreRange,
    quantile_range: &ScoreRange,
) -> PolarsResult<DataFrame> {
    let allowlist = Series::new(
        PlSmallStr::from("biosample_allowlist"),
        biosample_allowlist.to_vec(),
    );

    let refined = df
        .lazy()
        .filter(col("biosample_name").is_in(lit(allowlist)))
        .filter(
            col("raw_score")
                .abs()
                .gt_eq(lit(raw_range.min))
                .and(col("raw_score").abs().lt_eq(lit(raw_range.max))),
        )
        .filter(
            col("quantile_score")
                .abs()
                .gt_eq(lit(quantile_range.min))
                .and(col("quantile_score").abs().lt_eq(lit(quantile_range.max))),
        )
        .with_columns([
            col("raw_score")
                .mean()
                .over([col("gene_name")])
                .alias("raw_score"),
            col("quantile_score")
                .mean()
                .over([col("gene_name")])
                .alias("quantile_score"),
        ])
        .collect()?;

    debug!("Refined score table: {} rows survived", refined.height());
    Ok(refined)
}

/// Attach the per-variant constants to a refined block and sort it by
/// gene: `unique_varID` becomes the first column, `MPRA_score` the
/// last. Works for zero-row blocks too.
pub fn annotate_block(df: DataFrame, variant: &VariantRecord) -> PolarsResult<DataFrame> {
    let n = df.height();
    let mut out = df;
    out.insert_column(
        0,
        Series::new(
            PlSmallStr::from("unique_varID"),
            vec![variant.variant_id.clone(); n],
        ),
    )?;
    let mpra: Vec<Option<f64>> = vec![variant.mpra_score; n];
    out.with_column(Series::new(PlSmallStr::from("MPRA_score"), mpra))?;
    out.sort(["gene_name"], SortMultipleOptions::default())
}
