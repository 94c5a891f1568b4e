use anyhow::Result;
use polars::prelude::DataFrame;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use reporter::client::AlphaGenomeClient;
use reporter::config::PipelineConfig;
use reporter::input::{load_variants, prompt_input_path, read_excel, sibling_path};
use reporter::models::GenomicInterval;
use reporter::refine::{annotate_block, refine_scores, scores_to_dataframe};
use reporter::report::{write_workbook, ScoreAccumulator};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = PipelineConfig::score_defaults();

    let input_path = prompt_input_path()?;
    let sheet = read_excel(&input_path, 0)?;
    let variants = load_variants(&sheet, &config.columns)?;
    let output_path = sibling_path(&input_path, "Variant_Score_Results.xlsx");

    let client = AlphaGenomeClient::new(&config)?;
    let mut accumulator = ScoreAccumulator::new();

    for (i, variant) in variants.iter().enumerate() {
        info!(
            "[{}/{}] scoring {} at {}:{}",
            i + 1,
            variants.len(),
            variant.variant_id,
            variant.chromosome,
            variant.position
        );

        let interval = GenomicInterval::centered_on(
            &variant.chromosome,
            variant.position,
            config.interval_half_width,
        )
        .resize_to_supported(config.sequence_length);

        let rows = client.score_variant(&interval, variant)?;
        let scores = scores_to_dataframe(&rows)?;
        let refined = refine_scores(
            scores,
            &config.biosample_allowlist,
            &config.raw_score_range,
            &config.quantile_score_range,
        )?;
        info!(
            "{}: {} of {} score rows kept",
            variant.variant_id,
            refined.height(),
            rows.len()
        );

        let block = annotate_block(refined, variant)?;
        accumulator.push_block(block)?;
    }

    match accumulator.finish() {
        Some(combined) => write_workbook(&combined, &output_path, "AllVariants")?,
        None => {
            warn!("no variants processed; writing empty workbook");
            write_workbook(&DataFrame::empty(), &output_path, "AllVariants")?;
        }
    }

    Ok(())
}
