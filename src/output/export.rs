//! JSON export of search results

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::OutputResult;
use crate::backend::{BackendKind, SearchOutcome};
use crate::crawler::{EnrichmentReport, StopReason};
use crate::model::{SearchFilter, SearchResponse};

/// Export file contents: the search response plus run metadata
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub exported_at: DateTime<Utc>,
    pub backend: BackendKind,
    /// Fingerprint of the configuration that produced the results
    pub config_hash: String,
    pub stop: StopReason,
    pub pages_fetched: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<EnrichmentReport>,
    #[serde(flatten)]
    pub response: SearchResponse,
}

impl ExportDocument {
    pub fn new(
        backend: BackendKind,
        config_hash: impl Into<String>,
        filter: &SearchFilter,
        outcome: SearchOutcome,
    ) -> Self {
        Self {
            exported_at: Utc::now(),
            backend,
            config_hash: config_hash.into(),
            stop: outcome.stop.clone(),
            pages_fetched: outcome.pages_fetched,
            enrichment: outcome.enrichment.clone(),
            response: outcome.into_response(filter),
        }
    }
}

/// Writes any serializable value as pretty-printed JSON
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> OutputResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}
