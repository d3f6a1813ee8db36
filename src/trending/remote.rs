//! Trend store backed by a remote document database (Appwrite REST API)

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{TrendError, TrendStore};
use crate::models::TrendingEntry;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteStoreConfig {
    /// e.g. `https://cloud.appwrite.io/v1`
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
    pub collection_id: String,
    /// Optional server key; public collections work without one
    pub api_key: String,
    pub timeout: Duration,
}

impl RemoteStoreConfig {
    fn validate(&self) -> Result<(), TrendError> {
        let missing = [
            ("endpoint", &self.endpoint),
            ("project id", &self.project_id),
            ("database id", &self.database_id),
            ("collection id", &self.collection_id),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());

        match missing {
            Some((name, _)) => Err(TrendError::NotConfigured(format!("missing {}", name))),
            None => Ok(()),
        }
    }
}

/// Stored attributes of one document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrendFields {
    search_term: String,
    count: u64,
    #[serde(default)]
    poster_url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    movie_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TrendDocument {
    #[serde(rename = "$id")]
    id: String,
    #[serde(flatten)]
    fields: TrendFields,
}

#[derive(Debug, Deserialize)]
struct DocumentList {
    #[serde(default)]
    documents: Vec<TrendDocument>,
}

impl From<&TrendingEntry> for TrendFields {
    fn from(entry: &TrendingEntry) -> Self {
        Self {
            search_term: entry.search_term.clone(),
            count: entry.count,
            poster_url: entry.poster_url.clone(),
            title: entry.title.clone(),
            movie_id: entry.movie_id,
        }
    }
}

impl From<TrendDocument> for TrendingEntry {
    fn from(doc: TrendDocument) -> Self {
        Self {
            id: doc.id,
            search_term: doc.fields.search_term,
            count: doc.fields.count,
            poster_url: doc.fields.poster_url,
            title: doc.fields.title,
            movie_id: doc.fields.movie_id,
        }
    }
}

pub struct RemoteTrendStore {
    config: RemoteStoreConfig,
    agent: ureq::Agent,
}

impl RemoteTrendStore {
    pub fn new(config: RemoteStoreConfig) -> Result<Self, TrendError> {
        config.validate()?;
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .http_status_as_error(false)
            .build()
            .new_agent();
        Ok(Self { config, agent })
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.config.endpoint.trim_end_matches('/'),
            self.config.database_id,
            self.config.collection_id
        )
    }

    fn with_headers<B>(&self, request: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        let request = request
            .header("X-Appwrite-Project", &self.config.project_id)
            .header("Accept", "application/json");
        if self.config.api_key.is_empty() {
            request
        } else {
            request.header("X-Appwrite-Key", &self.config.api_key)
        }
    }

    fn read_json<T: DeserializeOwned>(mut response: ureq::http::Response<ureq::Body>) -> Result<T, TrendError> {
        let status = response.status();
        if !status.is_success() {
            return Err(TrendError::HttpStatus { status: status.as_u16() });
        }
        let body = response.body_mut().read_to_string()?;
        Ok(serde_json::from_str(&body)?)
    }

    fn list(&self, queries: &[serde_json::Value]) -> Result<Vec<TrendingEntry>, TrendError> {
        let mut request = self.with_headers(self.agent.get(&self.documents_url()));
        for query in queries {
            request = request.query("queries[]", query.to_string());
        }
        let list: DocumentList = Self::read_json(request.call()?)?;
        Ok(list.documents.into_iter().map(TrendingEntry::from).collect())
    }
}

impl TrendStore for RemoteTrendStore {
    fn find_by_term(&self, term: &str) -> Result<Option<TrendingEntry>, TrendError> {
        let queries = [
            json!({ "method": "equal", "attribute": "searchTerm", "values": [term] }),
            json!({ "method": "limit", "values": [1] }),
        ];
        Ok(self.list(&queries)?.into_iter().next())
    }

    fn create(&self, entry: &TrendingEntry) -> Result<TrendingEntry, TrendError> {
        let body = json!({ "documentId": "unique()", "data": TrendFields::from(entry) }).to_string();
        let response = self
            .with_headers(self.agent.post(&self.documents_url()))
            .header("Content-Type", "application/json")
            .send(body.as_bytes())?;
        let doc: TrendDocument = Self::read_json(response)?;
        Ok(doc.into())
    }

    fn update(&self, entry: &TrendingEntry) -> Result<TrendingEntry, TrendError> {
        let url = format!("{}/{}", self.documents_url(), entry.id);
        let body = json!({ "data": TrendFields::from(entry) }).to_string();
        let response = self
            .with_headers(self.agent.patch(&url))
            .header("Content-Type", "application/json")
            .send(body.as_bytes())?;
        let doc: TrendDocument = Self::read_json(response)?;
        Ok(doc.into())
    }

    fn top_by_count(&self, limit: usize) -> Result<Vec<TrendingEntry>, TrendError> {
        let queries = [
            json!({ "method": "orderDesc", "attribute": "count" }),
            json!({ "method": "orderAsc", "attribute": "searchTerm" }),
            json!({ "method": "limit", "values": [limit] }),
        ];
        self.list(&queries)
    }
}
