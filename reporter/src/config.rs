use std::env;

/// Inclusive range applied to the absolute value of a score.
#[derive(Debug, Clone, Copy)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

impl ScoreRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Header names of the columns extracted from the input workbook.
/// Lookup is by name, not position, so a reordered sheet still loads
/// and a misnamed sheet fails with the offending column spelled out.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    pub variant_id: String,
    pub chromosome: String,
    pub position: String,
    pub ref_base: String,
    pub alt_base: String,
    pub mpra_score: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            variant_id: "unique_varID".to_string(),
            chromosome: "chromosome".to_string(),
            position: "position".to_string(),
            ref_base: "ref".to_string(),
            alt_base: "alt".to_string(),
            mpra_score: "MPRA_score".to_string(),
        }
    }
}

/// All tunables for one batch run, passed into the pipeline instead of
/// living as loose constants inside the driver.
///
/// `interval_half_width` is the full window size centered on the
/// variant; the request builder places the variant at `width / 2`.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub credential: String,
    pub base_url: String,
    pub interval_half_width: u64,
    pub sequence_length: u64,
    pub ontology_terms: Vec<String>,
    pub biosample_allowlist: Vec<String>,
    pub raw_score_range: ScoreRange,
    pub quantile_score_range: ScoreRange,
    pub columns: ColumnMap,
}

const DEFAULT_BASE_URL: &str = "https://alphagenome.googleapis.com";

fn credential_from_env() -> String {
    env::var("ALPHAGENOME_API_KEY").unwrap_or_default()
}

impl PipelineConfig {
    /// Defaults for the ATAC report pipeline: 1 Mb window, one cardiac
    /// ontology context.
    pub fn atac_defaults() -> Self {
        Self {
            credential: credential_from_env(),
            base_url: DEFAULT_BASE_URL.to_string(),
            interval_half_width: 1_048_576,
            sequence_length: 1_048_576,
            ontology_terms: vec!["UBERON:0002078".to_string()],
            biosample_allowlist: Vec::new(),
            raw_score_range: ScoreRange::new(0.0, 100.0),
            quantile_score_range: ScoreRange::new(0.0, 100.0),
            columns: ColumnMap::default(),
        }
    }

    /// Defaults for the variant scoring pipeline: smaller request
    /// window, cardiac biosample allow-list, permissive score ranges.
    pub fn score_defaults() -> Self {
        let biosample_allowlist = [
            "right cardiac atrium",
            "left cardiac atrium",
            "heart right ventricle",
            "heart left ventricle",
            "cardiac muscle cell",
            "cardiac septum",
            "regular cardiac myocyte",
            "Right ventricle myocardium inferior",
            "Right ventricle myocardium superior",
            "left ventricle myocardium inferior",
            "left ventricle myocardium superior",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        Self {
            credential: credential_from_env(),
            base_url: DEFAULT_BASE_URL.to_string(),
            interval_half_width: 16_384,
            sequence_length: 1_048_576,
            ontology_terms: vec!["UBERON:0002078".to_string()],
            biosample_allowlist,
            raw_score_range: ScoreRange::new(0.0, 100.0),
            quantile_score_range: ScoreRange::new(0.0, 100.0),
            columns: ColumnMap::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_defaults_carry_cardiac_allowlist() {
        let cfg = PipelineConfig::score_defaults();
        assert!(cfg
            .biosample_allowlist
            .iter()
            .any(|b| b == "heart left ventricle"));
        assert_eq!(cfg.raw_score_range.min, 0.0);
        assert_eq!(cfg.raw_score_range.max, 100.0);
    }

    #[test]
    fn atac_defaults_use_megabase_window() {
        let cfg = PipelineConfig::atac_defaults();
        assert_eq!(cfg.interval_half_width, 1_048_576);
        assert_eq!(cfg.ontology_terms, vec!["UBERON:0002078".to_string()]);
    }
}
