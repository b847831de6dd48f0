use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::record::CollegeRecord;
use crate::settings::Settings;

const FIELDS: &str = "school.name,school.city,school.state,\
latest.admissions.admission_rate.overall,latest.cost.tuition.in_state,\
latest.cost.tuition.out_of_state,latest.student.size";

/// Best-effort lookup of extra data by institution name. `None` means
/// "nothing to add" whatever the reason.
pub trait Enricher {
    fn lookup(&self, name: &str) -> impl Future<Output = Option<Enrichment>> + Send;
}

/// One school from the schools API, projected to the fields we request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Enrichment {
    #[serde(rename = "school.name")]
    pub name: Option<String>,
    #[serde(rename = "school.city")]
    pub city: Option<String>,
    #[serde(rename = "school.state")]
    pub state: Option<String>,
    #[serde(rename = "latest.admissions.admission_rate.overall")]
    pub admission_rate: Option<f64>,
    #[serde(rename = "latest.cost.tuition.in_state")]
    pub tuition_in_state: Option<f64>,
    #[serde(rename = "latest.cost.tuition.out_of_state")]
    pub tuition_out_of_state: Option<f64>,
    #[serde(rename = "latest.student.size")]
    pub size: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SchoolsResponse {
    #[serde(default)]
    results: Vec<Enrichment>,
}

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// College Scorecard schools endpoint. One attempt, bounded by a timeout.
pub struct ScorecardClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl ScorecardClient {
    pub fn new(settings: &Settings) -> Result<Self, EnrichError> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.enrichment_timeout())
            .build()?;
        Ok(ScorecardClient {
            http,
            base_url: settings.scorecard_url.clone(),
            api_key: settings.scorecard_api_key.clone(),
            timeout: settings.enrichment_timeout(),
        })
    }

    async fn fetch(&self, name: &str) -> Result<Option<Enrichment>, EnrichError> {
        let mut query = vec![("school.name", name), ("_fields", FIELDS)];
        if let Some(key) = self.api_key.as_deref() {
            query.push(("api_key", key));
        }

        let resp = self.http.get(&self.base_url).query(&query).send().await?;
        if resp.status() != StatusCode::OK {
            return Err(EnrichError::Status(resp.status()));
        }
        let body: SchoolsResponse = resp.json().await?;
        Ok(body.results.into_iter().next())
    }
}

impl Enricher for ScorecardClient {
    async fn lookup(&self, name: &str) -> Option<Enrichment> {
        if name.is_empty() {
            return None;
        }
        let outcome = match tokio::time::timeout(self.timeout, self.fetch(name)).await {
            Ok(r) => r,
            Err(_) => Err(EnrichError::Timeout(self.timeout)),
        };
        match outcome {
            Ok(Some(e)) => {
                info!("Enrichment found for {}", name);
                Some(e)
            }
            Ok(None) => {
                info!("No enrichment results for {}", name);
                None
            }
            Err(e) => {
                warn!("Enrichment lookup for {} failed: {}", name, e);
                None
            }
        }
    }
}

/// `None` is the offline enricher: every lookup contributes nothing.
impl<E: Enricher + Sync> Enricher for Option<E> {
    async fn lookup(&self, name: &str) -> Option<Enrichment> {
        match self {
            Some(e) => e.lookup(name).await,
            None => None,
        }
    }
}

/// Fill fields the page left empty. Never overwrites extracted values.
pub fn apply(record: &mut CollegeRecord, e: &Enrichment) {
    if record.location.is_empty() {
        record.location = match (e.city.as_deref(), e.state.as_deref()) {
            (Some(c), Some(s)) => format!("{}, {}", c, s),
            (Some(x), None) | (None, Some(x)) => x.to_string(),
            (None, None) => String::new(),
        };
    }
    if record.acceptance_rate.is_empty() {
        if let Some(rate) = e.admission_rate {
            record.acceptance_rate = format_percent(rate);
        }
    }
    if record.tuition.in_state.is_empty() {
        if let Some(t) = e.tuition_in_state {
            record.tuition.in_state = format!("${}", format_thousands(t));
        }
    }
    if record.tuition.out_of_state.is_empty() {
        if let Some(t) = e.tuition_out_of_state {
            record.tuition.out_of_state = format!("${}", format_thousands(t));
        }
    }
    if record.size.is_empty() {
        if let Some(n) = e.size {
            record.size = format_thousands(n);
        }
    }
}

/// 0.0425 -> "4.3%", 0.42 -> "42%"
fn format_percent(rate: f64) -> String {
    let pct = (rate * 1000.0).round() / 10.0;
    if pct.fract() == 0.0 {
        format!("{:.0}%", pct)
    } else {
        format!("{:.1}%", pct)
    }
}

fn format_thousands(n: f64) -> String {
    let digits = format!("{:.0}", n.round().abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0.0 {
        format!("-{}", out)
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "metadata": {"total": 1, "page": 0, "per_page": 20},
        "results": [{
            "school.name": "Example University",
            "school.city": "Example City",
            "school.state": "EX",
            "latest.admissions.admission_rate.overall": 0.0425,
            "latest.cost.tuition.in_state": 12000,
            "latest.cost.tuition.out_of_state": 38500,
            "latest.student.size": 18234
        }]
    }"#;

    fn settings(url: &str) -> Settings {
        Settings {
            db_path: "unused.sqlite".into(),
            scorecard_url: url.to_string(),
            scorecard_api_key: None,
            enrichment_timeout_secs: 2,
            fetch_timeout_secs: 2,
        }
    }

    #[test]
    fn parses_first_result() {
        let body: SchoolsResponse = serde_json::from_str(SAMPLE).unwrap();
        let e = body.results.into_iter().next().unwrap();
        assert_eq!(e.name.as_deref(), Some("Example University"));
        assert_eq!(e.state.as_deref(), Some("EX"));
        assert_eq!(e.tuition_in_state, Some(12000.0));
    }

    #[test]
    fn empty_results_mean_nothing() {
        let body: SchoolsResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert!(body.results.is_empty());
        let body: SchoolsResponse = serde_json::from_str(r#"{"metadata": {}}"#).unwrap();
        assert!(body.results.is_empty());
    }

    #[test]
    fn apply_fills_only_empty_fields() {
        let body: SchoolsResponse = serde_json::from_str(SAMPLE).unwrap();
        let e = &body.results[0];

        let mut r = CollegeRecord::new("https://www.niche.com/x");
        r.name = "Example University".into();
        r.acceptance_rate = "25%".into();
        apply(&mut r, e);

        assert_eq!(r.acceptance_rate, "25%");
        assert_eq!(r.location, "Example City, EX");
        assert_eq!(r.tuition.in_state, "$12,000");
        assert_eq!(r.tuition.out_of_state, "$38,500");
        assert_eq!(r.size, "18,234");
        assert_eq!(r.name, "Example University");
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_percent(0.0425), "4.3%");
        assert_eq!(format_percent(0.42), "42%");
        assert_eq!(format_thousands(999.0), "999");
        assert_eq!(format_thousands(1000.0), "1,000");
        assert_eq!(format_thousands(1234567.0), "1,234,567");
    }

    #[tokio::test]
    async fn unreachable_endpoint_yields_none() {
        // Nothing listens on port 1; the connection is refused immediately
        let client = ScorecardClient::new(&settings("http://127.0.0.1:1/v1/schools.json")).unwrap();
        assert_eq!(client.lookup("Example University").await, None);
    }

    #[tokio::test]
    async fn blank_name_skips_lookup() {
        let client = ScorecardClient::new(&settings("http://127.0.0.1:1/")).unwrap();
        assert_eq!(client.lookup("").await, None);
        let offline: Option<ScorecardClient> = None;
        assert_eq!(offline.lookup("Example University").await, None);
    }
}
