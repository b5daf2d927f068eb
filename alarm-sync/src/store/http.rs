//! REST client for a collection-style JSON store.
//!
//! Layout, with `suffix` empty for plain REST stores and `.json` for
//! Firebase Realtime Database:
//!
//! | Operation | Request                                 |
//! |-----------|-----------------------------------------|
//! | list      | `GET    {base}/{collection}{suffix}`      |
//! | create    | `POST   {base}/{collection}{suffix}`      |
//! | update    | `PATCH  {base}/{collection}/{id}{suffix}` |
//! | delete    | `DELETE {base}/{collection}/{id}{suffix}` |

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::{Response, Url};
use serde::Deserialize;

use super::AlarmStore;
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::tracing::prelude::*;
use crate::types::{AlarmCollection, AlarmFields, AlarmId, AlarmPatch, AlarmRecord};

const MAX_LOG_BODY_CHARS: usize = 512;

/// Body returned by `POST`. Firebase names the new key `name`.
#[derive(Debug, Deserialize)]
struct Created {
    #[serde(alias = "name")]
    id: String,
}

/// [`AlarmStore`] backed by HTTP requests.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: reqwest::Client,
    base: Url,
    collection: String,
    suffix: String,
}

impl HttpStore {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .with_context(|| format!("invalid store URL {:?}", config.base_url))?;
        if base.cannot_be_a_base() {
            bail!("store URL {:?} cannot carry a path", config.base_url);
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base,
            collection: config.collection.clone(),
            suffix: config.path_suffix.clone(),
        })
    }

    fn collection_url(&self) -> Url {
        self.url(&[&self.collection])
    }

    fn record_url(&self, id: &AlarmId) -> Url {
        self.url(&[&self.collection, id.as_str()])
    }

    /// Append path segments to the base URL, suffixing the last one.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            if let Some((last, leading)) = segments.split_last() {
                path.extend(leading);
                path.push(&format!("{last}{}", self.suffix));
            }
        }
        url
    }

    /// Turn a non-2xx response into a [`StoreError`].
    async fn ensure_success(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            trace!(%status, url = %response.url(), "Store response");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!(%status, body = %preview, "Store request failed");

        Err(StoreError::status(status.as_u16(), preview))
    }
}

/// Validate a listing body into a collection.
///
/// `null` or an empty body means the collection does not exist yet, which
/// is the same as having no alarms. Any record that does not match the
/// schema fails the whole listing.
pub(crate) fn parse_collection(body: &str) -> Result<AlarmCollection, StoreError> {
    if body.trim().is_empty() {
        return Ok(AlarmCollection::new());
    }

    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| StoreError::malformed("<collection>", e))?;

    let map = match value {
        serde_json::Value::Null => return Ok(AlarmCollection::new()),
        serde_json::Value::Object(map) => map,
        other => {
            return Err(StoreError::malformed(
                "<collection>",
                format!("expected an object keyed by id, got {other}"),
            ));
        }
    };

    let mut records = Vec::with_capacity(map.len());
    for (id, record) in map {
        match serde_json::from_value::<AlarmFields>(record) {
            Ok(fields) => records.push(AlarmRecord::new(id.into(), fields)),
            Err(e) => return Err(StoreError::malformed(id, e)),
        }
    }
    Ok(records.into_iter().collect())
}

#[async_trait]
impl AlarmStore for HttpStore {
    async fn list(&self) -> Result<AlarmCollection, StoreError> {
        let response = self.client.get(self.collection_url()).send().await?;
        let body = Self::ensure_success(response).await?.text().await?;
        parse_collection(&body)
    }

    async fn create(&self, fields: &AlarmFields) -> Result<AlarmId, StoreError> {
        let response = self
            .client
            .post(self.collection_url())
            .json(fields)
            .send()
            .await?;
        let body = Self::ensure_success(response).await?.text().await?;
        let created: Created =
            serde_json::from_str(&body).map_err(|e| StoreError::malformed("<created>", e))?;
        Ok(created.id.into())
    }

    async fn update(&self, id: &AlarmId, patch: AlarmPatch) -> Result<(), StoreError> {
        let response = self
            .client
            .patch(self.record_url(id))
            .json(&patch)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn delete(&self, id: &AlarmId) -> Result<(), StoreError> {
        let response = self.client.delete(self.record_url(id)).send().await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}
