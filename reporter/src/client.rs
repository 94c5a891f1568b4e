use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PipelineConfig;
use crate::models::{GenomicInterval, VariantRecord};

/// Output kinds the prediction endpoint understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    Atac,
    RnaSeq,
}

impl OutputType {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputType::Atac => "ATAC",
            OutputType::RnaSeq => "RNA_SEQ",
        }
    }
}

#[derive(Serialize)]
struct IntervalPayload<'a> {
    chromosome: &'a str,
    start: u64,
    end: u64,
}

impl<'a> From<&'a GenomicInterval> for IntervalPayload<'a> {
    fn from(iv: &'a GenomicInterval) -> Self {
        Self {
            chromosome: &iv.chromosome,
            start: iv.start,
            end: iv.end,
        }
    }
}

#[derive(Serialize)]
struct VariantPayload<'a> {
    chromosome: &'a str,
    position: u64,
    reference_bases: &'a str,
    alternate_bases: &'a str,
}

impl<'a> From<&'a VariantRecord> for VariantPayload<'a> {
    fn from(v: &'a VariantRecord) -> Self {
        Self {
            chromosome: &v.chromosome,
            position: v.position,
            reference_bases: &v.ref_base,
            alternate_bases: &v.alt_base,
        }
    }
}

#[derive(Serialize)]
struct PredictVariantRequest<'a> {
    interval: IntervalPayload<'a>,
    variant: VariantPayload<'a>,
    ontology_terms: &'a [String],
    requested_outputs: Vec<&'static str>,
}

#[derive(Serialize)]
struct ScoreVariantRequest<'a> {
    interval: IntervalPayload<'a>,
    variant: VariantPayload<'a>,
    variant_scorers: Vec<&'static str>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackInterval {
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackMetadata {
    pub biosample_name: String,
    pub ontology_curie: String,
}

/// One predicted signal track at fixed resolution, values ordered from
/// the interval start.
#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    pub interval: TrackInterval,
    pub resolution: u64,
    pub values: Vec<f64>,
    pub metadata: Vec<TrackMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackSet {
    pub atac: Track,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictVariantResponse {
    pub reference: TrackSet,
    pub alternate: TrackSet,
}

/// One gene-level effect score for one biosample context.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScoreRow {
    pub gene_id: String,
    pub gene_name: String,
    pub biosample_name: String,
    pub ontology_curie: String,
    pub raw_score: f64,
    pub quantile_score: f64,
}

#[derive(Deserialize)]
struct ScoreVariantResponse {
    scores: Vec<ScoreRow>,
}

/// Blocking client for the remote prediction service. One instance is
/// built per run and reused for every row; failures carry the URL,
/// status, and response body and abort the batch.
pub struct AlphaGenomeClient {
    client: Client,
    base_url: String,
}

impl AlphaGenomeClient {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("variant-reporter/0.1"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&config.credential)
                .context("credential is not a valid header value")?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn predict_variant(
        &self,
        interval: &GenomicInterval,
        variant: &VariantRecord,
        ontology_terms: &[String],
        output: OutputType,
    ) -> Result<PredictVariantResponse> {
        let request = PredictVariantRequest {
            interval: interval.into(),
            variant: variant.into(),
            ontology_terms,
            requested_outputs: vec![output.as_str()],
        };
        self.post_json("/v1/predict_variant", &request)
    }

    pub fn score_variant(
        &self,
        interval: &GenomicInterval,
        variant: &VariantRecord,
    ) -> Result<Vec<ScoreRow>> {
        let request = ScoreVariantRequest {
            interval: interval.into(),
            variant: variant.into(),
            variant_scorers: vec![OutputType::RnaSeq.as_str()],
        };
        let response: ScoreVariantResponse = self.post_json("/v1/score_variant", &request)?;
        Ok(response.scores)
    }

    fn post_json<T: Serialize, R: DeserializeOwned>(&self, endpoint: &str, body: &T) -> Result<R> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("POST {url}");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .with_context(|| format!("request to {url} failed"))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(anyhow!(
                "Failed to fetch data from URL: {url}. Status: {status}. Error: {error_text}"
            ));
        }

        response
            .json()
            .with_context(|| format!("malformed response body from {url}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GenomicInterval;

    #[test]
    fn predict_request_serializes_documented_shape() {
        let variant = VariantRecord {
            variant_id: "V1".to_string(),
            chromosome: "chr1".to_string(),
            position: 100,
            ref_base: "A".to_string(),
            alt_base: "G".to_string(),
            mpra_score: None,
        };
        let interval = GenomicInterval::centered_on("chr1", 100, 8);
        let ontology = vec!["UBERON:0002078".to_string()];
        let request = PredictVariantRequest {
            interval: (&interval).into(),
            variant: (&variant).into(),
            ontology_terms: &ontology,
            requested_outputs: vec![OutputType::Atac.as_str()],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["interval"]["start"], 96);
        assert_eq!(json["interval"]["end"], 104);
        assert_eq!(json["variant"]["reference_bases"], "A");
        assert_eq!(json["requested_outputs"][0], "ATAC");
    }

    #[test]
    fn predict_response_deserializes() {
        let body = r#"{
            "reference": {"atac": {
                "interval": {"chromosome": "chr1", "start": 1, "end": 2049},
                "resolution": 1,
                "values": [0.1, 0.2],
                "metadata": [{"biosample_name": "heart left ventricle",
                              "ontology_curie": "UBERON:0002078"}]
            }},
            "alternate": {"atac": {
                "interval": {"chromosome": "chr1", "start": 1, "end": 2049},
                "resolution": 1,
                "values": [0.1, 0.4],
                "metadata": [{"biosample_name": "heart left ventricle",
                              "ontology_curie": "UBERON:0002078"}]
            }}
        }"#;
        let parsed: PredictVariantResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.reference.atac.values.len(), 2);
        assert_eq!(
            parsed.alternate.atac.metadata[0].biosample_name,
            "heart left ventricle"
        );
    }

    #[test]
    fn score_response_deserializes() {
        let body = r#"{"scores": [{
            "gene_id": "ENSG000001",
            "gene_name": "G1",
            "biosample_name": "heart left ventricle",
            "ontology_curie": "UBERON:0002078",
            "raw_score": 5.0,
            "quantile_score": 10.0
        }]}"#;
        let parsed: ScoreVariantResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.scores.len(), 1);
        assert_eq!(parsed.scores[0].gene_name, "G1");
        assert_eq!(parsed.scores[0].raw_score, 5.0);
    }
}
