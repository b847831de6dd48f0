use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::db::{self, Reconciled, Store};
use crate::enrich::{self, Enricher};
use crate::parser;
use crate::record::{CollegeRecord, WatchlistEntry};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatchRequest {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchResponse {
    pub success: bool,
    pub inserted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub colleges: Vec<CollegeRecord>,
    pub watchlist: Vec<WatchlistEntry>,
}

/// Page payload carried by extract/analyze messages.
#[derive(Debug, Clone, Deserialize)]
pub struct PageRequest {
    pub url: String,
    pub html: String,
}

/// Extraction, enrichment and persistence behind one entry point per request.
pub struct Service<E> {
    store: Store,
    enricher: E,
}

impl<E: Enricher> Service<E> {
    pub fn new(store: Store, enricher: E) -> Self {
        Service { store, enricher }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Extract `html` from `url`, enrich best-effort, then reconcile.
    pub async fn analyze(&self, url: &str, html: &str) -> db::Result<CollegeRecord> {
        let record = parser::process_page(url, html);
        self.enrich_and_save(record).await
    }

    /// Merge enrichment into an extracted record, stamp it and reconcile.
    /// A failed lookup leaves the extracted fields untouched.
    pub async fn enrich_and_save(&self, mut record: CollegeRecord) -> db::Result<CollegeRecord> {
        if let Some(extra) = self.enricher.lookup(&record.name).await {
            enrich::apply(&mut record, &extra);
        }
        record.analyzed_at = Some(Utc::now());
        let outcome = self.store.reconcile(record.clone())?;
        if outcome == Reconciled::Replaced {
            info!("Updated existing record for {}", record.name);
        }
        Ok(record)
    }

    pub fn save(&self, record: CollegeRecord) -> SaveResponse {
        match self.store.reconcile(record) {
            Ok(_) => SaveResponse { success: true },
            Err(e) => {
                warn!("Error saving college data: {}", e);
                SaveResponse { success: false }
            }
        }
    }

    pub fn add_to_watchlist(&self, req: WatchRequest) -> WatchResponse {
        match self
            .store
            .reconcile_watchlist(WatchlistEntry::new(&req.name, &req.url))
        {
            Ok(inserted) => {
                if inserted {
                    info!("Added to watchlist: {}", req.name);
                }
                WatchResponse {
                    success: true,
                    inserted,
                }
            }
            Err(e) => {
                warn!("Error adding to watchlist: {}", e);
                WatchResponse {
                    success: false,
                    inserted: false,
                }
            }
        }
    }

    pub fn query(&self) -> db::Result<QueryResponse> {
        Ok(QueryResponse {
            colleges: self.store.colleges()?,
            watchlist: self.store.watchlist()?,
        })
    }

    /// Handle a `{type, data}` message. Unknown types are logged and get no
    /// response.
    pub async fn handle(&self, message: &Value) -> Option<Value> {
        let kind = message.get("type").and_then(Value::as_str).unwrap_or("");
        let data = message.get("data").cloned().unwrap_or(Value::Null);

        match kind {
            "SAVE_COLLEGE_DATA" => {
                let resp = match serde_json::from_value::<CollegeRecord>(data) {
                    Ok(record) => self.save(record),
                    Err(e) => {
                        warn!("Malformed college data: {}", e);
                        SaveResponse { success: false }
                    }
                };
                Some(json!(resp))
            }
            "ADD_TO_WATCHLIST" => {
                let resp = match serde_json::from_value::<WatchRequest>(data) {
                    Ok(req) => self.add_to_watchlist(req),
                    Err(e) => {
                        warn!("Malformed watchlist entry: {}", e);
                        WatchResponse {
                            success: false,
                            inserted: false,
                        }
                    }
                };
                Some(json!(resp))
            }
            "GET_COLLEGE_DATA" => Some(match self.query() {
                Ok(resp) => json!(resp),
                Err(e) => json!({ "error": e.to_string() }),
            }),
            "EXTRACT_COLLEGE_DATA" => match serde_json::from_value::<PageRequest>(data) {
                Ok(page) => Some(json!(parser::process_page(&page.url, &page.html))),
                Err(e) => Some(json!({ "error": e.to_string() })),
            },
            "ANALYZE_PAGE" => match serde_json::from_value::<PageRequest>(data) {
                Ok(page) => Some(match self.analyze(&page.url, &page.html).await {
                    Ok(record) => json!({ "success": true, "data": record }),
                    Err(e) => {
                        warn!("Error analyzing page: {}", e);
                        json!({ "success": false })
                    }
                }),
                Err(e) => Some(json!({ "success": false, "error": e.to_string() })),
            },
            other => {
                warn!("Unknown message type: {:?}", other);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::{Enrichment, ScorecardClient};
    use crate::settings::Settings;

    struct Fixed(Enrichment);

    impl Enricher for Fixed {
        async fn lookup(&self, _name: &str) -> Option<Enrichment> {
            Some(self.0.clone())
        }
    }

    const US_NEWS_URL: &str = "https://www.usnews.com/best-colleges/example-university-0000";

    fn fixture() -> String {
        std::fs::read_to_string("tests/fixtures/usnews.html").unwrap()
    }

    fn offline() -> Service<Option<ScorecardClient>> {
        Service::new(Store::open_in_memory().unwrap(), None)
    }

    #[tokio::test]
    async fn analyze_us_news_into_empty_store() {
        let svc = offline();
        let record = svc.analyze(US_NEWS_URL, &fixture()).await.unwrap();
        assert_eq!(record.name, "Example University");
        assert_eq!(record.location, "Example City, EX");
        assert_eq!(record.acceptance_rate, "25%");
        assert_eq!(record.source, "US News");
        assert!(record.analyzed_at.is_some());

        let stored = svc.store().colleges().unwrap();
        assert_eq!(stored, vec![record]);
    }

    #[tokio::test]
    async fn failed_enrichment_keeps_local_record() {
        let svc = offline();
        let local = parser::process_page(US_NEWS_URL, &fixture());
        svc.enrich_and_save(local.clone()).await.unwrap();

        let mut stored = svc.store().find("Example University").unwrap().unwrap();
        assert!(stored.analyzed_at.is_some());
        stored.analyzed_at = None;
        assert_eq!(stored, local);
    }

    #[tokio::test]
    async fn unreachable_scorecard_keeps_local_record() {
        let settings = Settings {
            db_path: "unused.sqlite".into(),
            scorecard_url: "http://127.0.0.1:1/".into(),
            scorecard_api_key: None,
            enrichment_timeout_secs: 2,
            fetch_timeout_secs: 2,
        };
        let client = ScorecardClient::new(&settings).unwrap();
        let svc = Service::new(Store::open_in_memory().unwrap(), Some(client));

        let local = parser::process_page(US_NEWS_URL, &fixture());
        let saved = svc.analyze(US_NEWS_URL, &fixture()).await.unwrap();
        assert!(saved.analyzed_at.is_some());

        let mut stored = svc.store().colleges().unwrap();
        assert_eq!(stored, vec![saved]);

        let mut stored = stored.remove(0);
        stored.analyzed_at = None;
        stored.scraped_at = local.scraped_at;
        assert_eq!(stored, local);
    }

    #[tokio::test]
    async fn enrichment_fills_gaps_only() {
        let extra = Enrichment {
            city: Some("Elsewhere".into()),
            state: Some("ZZ".into()),
            admission_rate: Some(0.5),
            tuition_in_state: Some(1.0),
            ..Default::default()
        };
        let svc = Service::new(Store::open_in_memory().unwrap(), Fixed(extra));
        let html = "<html><head><title>Bare College</title></head><body><h1>Bare College</h1></body></html>";
        let record = svc.analyze("https://www.niche.com/colleges/bare/", html).await.unwrap();
        assert_eq!(record.location, "Elsewhere, ZZ");
        assert_eq!(record.acceptance_rate, "50%");

        let record = svc.analyze(US_NEWS_URL, &fixture()).await.unwrap();
        assert_eq!(record.location, "Example City, EX");
        assert_eq!(record.acceptance_rate, "25%");
        assert_eq!(record.tuition.in_state, "In-state tuition: $12,000");
    }

    #[tokio::test]
    async fn message_round_trip() {
        let svc = offline();

        let resp = svc
            .handle(&json!({
                "type": "SAVE_COLLEGE_DATA",
                "data": { "name": "Example University", "acceptanceRate": "25%" }
            }))
            .await
            .unwrap();
        assert_eq!(resp, json!({ "success": true }));

        let watch = json!({
            "type": "ADD_TO_WATCHLIST",
            "data": { "name": "Example University", "url": US_NEWS_URL }
        });
        let first = svc.handle(&watch).await.unwrap();
        assert_eq!(first, json!({ "success": true, "inserted": true }));
        let second = svc.handle(&watch).await.unwrap();
        assert_eq!(second, json!({ "success": true, "inserted": false }));

        let all = svc.handle(&json!({ "type": "GET_COLLEGE_DATA" })).await.unwrap();
        assert_eq!(all["colleges"].as_array().unwrap().len(), 1);
        assert_eq!(all["colleges"][0]["acceptanceRate"], "25%");
        assert_eq!(all["watchlist"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn extract_message_does_not_persist() {
        let svc = offline();
        let resp = svc
            .handle(&json!({
                "type": "EXTRACT_COLLEGE_DATA",
                "data": { "url": US_NEWS_URL, "html": fixture() }
            }))
            .await
            .unwrap();
        assert_eq!(resp["name"], "Example University");
        assert!(svc.store().colleges().unwrap().is_empty());

        let resp = svc
            .handle(&json!({
                "type": "ANALYZE_PAGE",
                "data": { "url": US_NEWS_URL, "html": fixture() }
            }))
            .await
            .unwrap();
        assert_eq!(resp["success"], true);
        assert_eq!(svc.store().colleges().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_and_malformed_messages() {
        let svc = offline();
        assert!(svc.handle(&json!({ "type": "OPEN_DASHBOARD" })).await.is_none());
        assert!(svc.handle(&json!({ "nope": 1 })).await.is_none());

        let resp = svc
            .handle(&json!({ "type": "SAVE_COLLEGE_DATA", "data": { "location": "x" } }))
            .await
            .unwrap();
        assert_eq!(resp, json!({ "success": false }));
        assert!(svc.store().colleges().unwrap().is_empty());
    }
}
