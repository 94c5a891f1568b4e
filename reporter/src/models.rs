use polars::prelude::PolarsError;

/// Sequence lengths the remote model accepts for a prediction window.
pub const SUPPORTED_SEQUENCE_LENGTHS: [u64; 5] =
    [2_048, 16_384, 131_072, 524_288, 1_048_576];

pub fn polars_err(e: Box<dyn std::error::Error>) -> PolarsError {
    PolarsError::ComputeError(format!("{e}").into())
}

/// One row of the input variant workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRecord {
    pub variant_id: String,
    pub chromosome: String,
    pub position: u64,
    pub ref_base: String,
    pub alt_base: String,
    pub mpra_score: Option<f64>,
}

impl VariantRecord {
    /// Page title carried over the chart for this variant.
    pub fn title_line(&self) -> String {
        let mpra = match self.mpra_score {
            Some(v) => format!("{v}"),
            None => "NA".to_string(),
        };
        format!(
            "Variant ID: {} | Chr: {} | Pos: {} | Ref: {} → Alt: {} | MPRA Score: {}",
            self.variant_id, self.chromosome, self.position, self.ref_base, self.alt_base, mpra
        )
    }
}

/// Half-open genomic range `[start, end)` in 1-based coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomicInterval {
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
}

impl GenomicInterval {
    /// Window of `width` bp centered on `position`. A position close to
    /// the chromosome start clamps rather than errors: start never
    /// drops below 1.
    pub fn centered_on(chromosome: &str, position: u64, width: u64) -> Self {
        let half = width / 2;
        Self {
            chromosome: chromosome.to_string(),
            start: position.saturating_sub(half).max(1),
            end: position + half,
        }
    }

    pub fn width(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Re-center this interval at `new_width`, keeping start >= 1 by
    /// shifting the window right when the center sits too close to the
    /// chromosome start.
    pub fn resize(&self, new_width: u64) -> Self {
        let center = (self.start + self.end) / 2;
        let start = center.saturating_sub(new_width / 2).max(1);
        Self {
            chromosome: self.chromosome.clone(),
            start,
            end: start + new_width,
        }
    }

    /// Resize to the nearest sequence length the model supports:
    /// the smallest bucket that fits `requested`, or the largest bucket
    /// when the request exceeds them all.
    pub fn resize_to_supported(&self, requested: u64) -> Self {
        let bucket = SUPPORTED_SEQUENCE_LENGTHS
            .iter()
            .copied()
            .find(|&len| len >= requested)
            .unwrap_or(SUPPORTED_SEQUENCE_LENGTHS[SUPPORTED_SEQUENCE_LENGTHS.len() - 1]);
        self.resize(bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_window_clamps_near_chromosome_start() {
        let iv = GenomicInterval::centered_on("chr1", 5, 16_384);
        assert_eq!(iv.start, 1);
        assert_eq!(iv.end, 5 + 8_192);
    }

    #[test]
    fn centered_window_places_variant_at_midpoint() {
        let iv = GenomicInterval::centered_on("chr1", 100, 8);
        assert_eq!(iv.start, 96);
        assert_eq!(iv.end, 104);
    }

    #[test]
    fn resize_snaps_to_smallest_fitting_bucket() {
        let iv = GenomicInterval::centered_on("chr1", 100, 8);
        let resized = iv.resize_to_supported(8);
        assert_eq!(resized.width(), 2_048);
        assert!(resized.start >= 1);
    }

    #[test]
    fn resize_keeps_start_positive_for_small_positions() {
        let iv = GenomicInterval::centered_on("chrX", 2, 16_384);
        let resized = iv.resize_to_supported(1_048_576);
        assert_eq!(resized.width(), 1_048_576);
        assert!(resized.start >= 1);
        assert_eq!(resized.end, resized.start + 1_048_576);
    }

    #[test]
    fn oversized_request_falls_back_to_largest_bucket() {
        let iv = GenomicInterval::centered_on("chr2", 5_000_000, 8);
        let resized = iv.resize_to_supported(4_000_000);
        assert_eq!(resized.width(), 1_048_576);
    }

    #[test]
    fn title_line_includes_all_fields() {
        let v = VariantRecord {
            variant_id: "V1".to_string(),
            chromosome: "chr1".to_string(),
            position: 100,
            ref_base: "A".to_string(),
            alt_base: "G".to_string(),
            mpra_score: Some(1.5),
        };
        let line = v.title_line();
        assert!(line.contains("Variant ID: V1"));
        assert!(line.contains("Ref: A → Alt: G"));
        assert!(line.contains("MPRA Score: 1.5"));
    }
}
