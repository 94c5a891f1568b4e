use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use reporter::client::{AlphaGenomeClient, OutputType};
use reporter::config::PipelineConfig;
use reporter::input::{load_variants, prompt_input_path, read_excel, sibling_path};
use reporter::models::GenomicInterval;
use reporter::plot::{render_track_comparison, CHART_HEIGHT, CHART_WIDTH};
use reporter::report::PdfReport;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = PipelineConfig::atac_defaults();

    let input_path = prompt_input_path()?;
    let sheet = read_excel(&input_path, 0)?;
    let variants = load_variants(&sheet, &config.columns)?;
    let output_path = sibling_path(&input_path, "ATAC_Report.pdf");

    let client = AlphaGenomeClient::new(&config)?;
    let mut report = PdfReport::new("ATAC Report")?;

    for (i, variant) in variants.iter().enumerate() {
        info!(
            "[{}/{}] predicting ATAC for {} at {}:{}",
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

        let prediction =
            client.predict_variant(&interval, variant, &config.ontology_terms, OutputType::Atac)?;
        let chart =
            render_track_comparison(&prediction.reference.atac, &prediction.alternate.atac)?;
        report.add_page(&variant.title_line(), chart, CHART_WIDTH, CHART_HEIGHT)?;
    }

    report.save(&output_path)?;
    Ok(())
}
