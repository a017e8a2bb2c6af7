use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::{BackendError, BackendErrorKind, ListQuery, Page, TxHash, VotingBackend};
use crate::config::BackendConfig;
use crate::voting::{Address, VoteOption, VotingId, VotingRecord};

const CONTRACTS_PATH: &str = "api/OracleVotingContracts";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TxReceipt {
    tx_hash: TxHash,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    kind: Option<BackendErrorKind>,
    message: String,
}

/// Indexer and node API over HTTP/JSON
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let mut url = Url::parse(base_url).map_err(|e| {
            BackendError::validation(format!("invalid backend url {}: {}", base_url, e))
        })?;
        // Url::join drops the last segment unless the path ends with a slash
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport_error)?;

        Ok(Self {
            client,
            base_url: url,
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        Self::new(&config.url, Duration::from_secs(config.request_timeout_secs))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::validation(format!("invalid path {}: {}", path, e)))
    }

    pub(crate) fn contract_url(&self, id: &VotingId, action: Option<&str>) -> Result<Url, BackendError> {
        let path = match action {
            Some(action) => format!("{}/{}/{}", CONTRACTS_PATH, id, action),
            None => format!("{}/{}", CONTRACTS_PATH, id),
        };
        self.url(&path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(String, String)],
    ) -> Result<T, BackendError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(transport_error)?;
        read_json(response).await
    }

    async fn post_tx(&self, url: Url, body: serde_json::Value) -> Result<TxHash, BackendError> {
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        let receipt: Envelope<TxReceipt> = read_json(response).await?;
        Ok(receipt.result.tx_hash)
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;
    if !status.is_success() {
        return Err(status_error(status, &body));
    }
    serde_json::from_str(&body).map_err(|e| {
        warn!("Malformed backend response: {}", e);
        BackendError::network(format!("malformed response: {}", e))
    })
}

/// Query string of a list request
pub(crate) fn list_params(query: &ListQuery) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = query
        .statuses
        .iter()
        .map(|status| ("states[]".to_string(), status.to_string()))
        .collect();

    let (all, oracle) = match &query.owner {
        Some(owner) => (false, owner.clone()),
        None => (true, query.oracle.clone()),
    };
    params.push(("all".to_string(), all.to_string()));
    params.push(("oracle".to_string(), oracle));
    params.push(("epoch".to_string(), query.epoch.to_string()));
    params.push(("limit".to_string(), query.limit.to_string()));
    if let Some(token) = &query.continuation_token {
        params.push(("continuationToken".to_string(), token.clone()));
    }
    params
}

pub(crate) fn transport_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::new(BackendErrorKind::Timeout, err.to_string())
    } else {
        BackendError::network(err.to_string())
    }
}

/// Maps a non-success response; a kind reported in the body wins over the status
pub(crate) fn status_error(status: StatusCode, body: &str) -> BackendError {
    let detail = serde_json::from_str::<ErrorBody>(body).ok().map(|b| b.error);
    let message = detail
        .as_ref()
        .map(|d| d.message.clone())
        .unwrap_or_else(|| match status.canonical_reason() {
            Some(reason) => format!("{} {}", status.as_u16(), reason),
            None => status.as_u16().to_string(),
        });

    if let Some(kind) = detail.and_then(|d| d.kind) {
        return BackendError::new(kind, message);
    }

    let kind = match status {
        StatusCode::NOT_FOUND => BackendErrorKind::NotFound,
        StatusCode::CONFLICT => BackendErrorKind::DuplicateVote,
        StatusCode::PAYMENT_REQUIRED => BackendErrorKind::InsufficientBalance,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => BackendErrorKind::Timeout,
        s if s.is_server_error() => BackendErrorKind::Network,
        _ => BackendErrorKind::Validation,
    };
    BackendError::new(kind, message)
}

#[async_trait]
impl VotingBackend for HttpBackend {
    async fn fetch_votings(&self, query: &ListQuery) -> Result<Page, BackendError> {
        if query.statuses.is_empty() {
            return Ok(Page::default());
        }
        let url = self.url(CONTRACTS_PATH)?;
        self.get_json(url, &list_params(query)).await
    }

    async fn fetch_voting(&self, id: &VotingId) -> Result<VotingRecord, BackendError> {
        let url = self.contract_url(id, None)?;
        let envelope: Envelope<VotingRecord> = self.get_json(url, &[]).await?;
        Ok(envelope.result)
    }

    async fn start_voting(&self, id: &VotingId, from: &Address) -> Result<TxHash, BackendError> {
        let url = self.contract_url(id, Some("start"))?;
        self.post_tx(url, json!({ "from": from })).await
    }

    async fn add_fund(
        &self,
        id: &VotingId,
        from: &Address,
        amount: f64,
    ) -> Result<TxHash, BackendError> {
        let url = self.contract_url(id, Some("fund"))?;
        self.post_tx(url, json!({ "from": from, "amount": amount }))
            .await
    }

    async fn cast_vote(
        &self,
        id: &VotingId,
        from: &Address,
        option: VoteOption,
        deposit: f64,
    ) -> Result<TxHash, BackendError> {
        let url = self.contract_url(id, Some("vote"))?;
        self.post_tx(
            url,
            json!({ "from": from, "option": option, "deposit": deposit }),
        )
        .await
    }
}
