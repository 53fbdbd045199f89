//! HTTP adapter for the field persistence and contract send endpoints

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;

use crate::backend::{ContractSnapshot, FieldBackend};
use crate::error::BackendError;
use crate::model::{ContractId, ContractStatus, Field, FieldId};
use crate::store::FieldPatch;
use crate::wire::{
    ContractRecord, CreateFieldRequest, ErrorBody, FieldRecord, SendResponse, UpdateFieldRequest,
};

#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    /// Server root, e.g. `http://localhost:3001`
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl HttpBackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

/// [`FieldBackend`] speaking JSON over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(config: HttpBackendConfig) -> Result<Self, BackendError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            BackendError::Transport(format!("invalid base url {:?}: {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::Transport(format!(
                "base url {:?} cannot carry a path",
                config.base_url
            )));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, base_url })
    }

    /// Append path segments to the base url. Each segment is percent-encoded,
    /// so ids containing `/`, `?` or `#` stay inside their segment.
    fn url(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                BackendError::Transport(format!("base url {} cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

/// Turn non-success statuses into [`BackendError::Status`], using the
/// server's error message when the body carries one
async fn check(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or(body);
    Err(BackendError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    Ok(check(response).await?.json::<T>().await?)
}

#[async_trait]
impl FieldBackend for HttpBackend {
    async fn fetch_contract(
        &self,
        contract_id: &ContractId,
    ) -> Result<ContractSnapshot, BackendError> {
        let response = self
            .client
            .get(self.url(&["api", "contracts", contract_id.as_str()])?)
            .send()
            .await?;
        let record: ContractRecord = decode(response).await?;
        Ok(record.into_snapshot()?)
    }

    async fn create_field(&self, field: &Field) -> Result<Field, BackendError> {
        let response = self
            .client
            .post(self.url(&["api", "fields"])?)
            .json(&CreateFieldRequest::from_field(field))
            .send()
            .await?;
        let record: FieldRecord = decode(response).await?;
        Ok(record.into_field()?)
    }

    async fn update_field(
        &self,
        field_id: &FieldId,
        patch: &FieldPatch,
    ) -> Result<Field, BackendError> {
        let response = self
            .client
            .put(self.url(&["api", "fields"])?)
            .json(&UpdateFieldRequest::from_patch(field_id, patch))
            .send()
            .await?;
        let record: FieldRecord = decode(response).await?;
        Ok(record.into_field()?)
    }

    async fn delete_field(&self, field_id: &FieldId) -> Result<(), BackendError> {
        let response = self
            .client
            .delete(self.url(&["api", "fields"])?)
            .query(&[("fieldId", field_id.as_str())])
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn send_contract(
        &self,
        contract_id: &ContractId,
    ) -> Result<ContractStatus, BackendError> {
        let response = self
            .client
            .post(self.url(&["api", "contracts", contract_id.as_str(), "send"])?)
            .send()
            .await?;
        let sent: SendResponse = decode(response).await?;
        Ok(sent.status)
    }
}
