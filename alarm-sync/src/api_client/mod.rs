//! HTTP client for the daemon API.

pub mod types;

use anyhow::{Context, Result, bail};
use reqwest::{Response, Url};

use types::{
    AddAlarmRequest, AddAlarmResponse, AlarmState, DismissResponse, ErrorResponse, ServiceState,
    ToggleResponse,
};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:7786";

const API_PREFIX: [&str; 2] = ["api", "v0"];

pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("invalid API URL {:?}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("API URL {:?} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend(API_PREFIX)
            .extend(segments);
        Ok(url)
    }

    /// Pass through 2xx responses; turn anything else into an error
    /// carrying the server's message.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(err) => bail!("{status}: {}", err.error),
            Err(_) => bail!("{status}: {body}"),
        }
    }

    pub async fn get_state(&self) -> Result<ServiceState> {
        let response = self.http.get(self.url(&["state"])?).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn list_alarms(&self) -> Result<Vec<AlarmState>> {
        let response = self.http.get(self.url(&["alarms"])?).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn add_alarm(&self, time: &str, period: &str) -> Result<AddAlarmResponse> {
        let request = AddAlarmRequest {
            time: time.to_string(),
            period: period.to_string(),
        };
        let response = self
            .http
            .post(self.url(&["alarms"])?)
            .json(&request)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn toggle_alarm(&self, id: &str) -> Result<ToggleResponse> {
        let response = self
            .http
            .patch(self.url(&["alarms", id, "toggle"])?)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn delete_alarm(&self, id: &str) -> Result<()> {
        let response = self.http.delete(self.url(&["alarms", id])?).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    pub async fn dismiss(&self) -> Result<DismissResponse> {
        let response = self
            .http
            .post(self.url(&["ringing", "dismiss"])?)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn dismiss_notice(&self) -> Result<()> {
        let response = self.http.delete(self.url(&["notice"])?).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}
