//! HTTP client for the platform backend

use async_trait::async_trait;
use chrono::Utc;
use freetag_core::{Asset, KeyValueStore, STORAGE_KEY_TOKEN};
use freetag_donation::{
    BankDonationRequest, BankDonationResponse, BuyRequest, CryptoSettleRequest, CryptoSettlement,
    CryptoStartRequest, GatewayResult, PaymentGateway, SellRequest, SettlementReceipt, TradeReceipt,
};
use freetag_rates::{ExchangeRate, RateFetcher, RateResult};
use freetag_session::{CurrentSession, ProbeKind, SessionBackend, SessionResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ApiError, ApiResult};
use crate::wire::{error_message, AuthMe, BeneficiaryMe, PhilanthropistMe, RateDto};

/// Default timeout for backend requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the platform REST API
///
/// Account-linked calls (buy/sell) carry the bearer token from the token
/// store, read at request time so a login or logout takes effect at once.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Option<Arc<dyn KeyValueStore>>,
}

impl ApiClient {
    /// Create a client with default timeouts
    pub fn new(base_url: &str) -> ApiResult<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom request timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(ApiError::Build)?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            tokens: None,
        })
    }

    /// Read the bearer token for account-linked calls from `store`
    pub fn with_token_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.tokens = Some(store);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn stored_token(&self) -> Option<String> {
        self.tokens
            .as_ref()?
            .get(STORAGE_KEY_TOKEN)
            .filter(|t| !t.trim().is_empty())
    }

    /// GET `path`, decoding a JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        token: Option<&str>,
    ) -> ApiResult<T> {
        let mut request = self.http.get(self.url(path)).query(query);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::transport(path, e))?;
        Self::decode(path, response).await
    }

    /// POST a JSON body to `path`, decoding a JSON body
    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> ApiResult<T> {
        let mut request = self.http.post(self.url(path)).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::transport(path, e))?;
        Self::decode(path, response).await
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::transport(path, e))?;

        if !status.is_success() {
            return Err(ApiError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::decode(path, e))
    }
}

#[async_trait]
impl RateFetcher for ApiClient {
    async fn fetch_rates(&self, target: &Asset) -> RateResult<Vec<ExchangeRate>> {
        let rates: Vec<RateDto> = self
            .get_json("/rates", &[("target", target.code())], None)
            .await
            .map_err(|e| e.into_rate_error(target.code()))?;

        let received_at = Utc::now();
        tracing::trace!(currency = %target, count = rates.len(), "Rates received");
        Ok(rates
            .into_iter()
            .map(|dto| dto.into_rate(received_at))
            .collect())
    }
}

#[async_trait]
impl SessionBackend for ApiClient {
    async fn probe(&self, kind: ProbeKind, token: &str) -> SessionResult<Option<CurrentSession>> {
        let path = kind.endpoint();
        let result = match kind {
            ProbeKind::StandardUser => self
                .get_json::<AuthMe>(path, &[], Some(token))
                .await
                .map(CurrentSession::from),
            ProbeKind::Beneficiary => self
                .get_json::<BeneficiaryMe>(path, &[], Some(token))
                .await
                .map(CurrentSession::from),
            ProbeKind::Philanthropist => self
                .get_json::<PhilanthropistMe>(path, &[], Some(token))
                .await
                .map(CurrentSession::from),
        };

        match result {
            Ok(session) => Ok(Some(session)),
            // 401 or any other non-success: the role does not apply
            Err(ApiError::Status { status, .. }) => {
                tracing::debug!(endpoint = path, status, "Session probe not applicable");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl PaymentGateway for ApiClient {
    async fn donate_bank(
        &self,
        request: &BankDonationRequest,
    ) -> GatewayResult<BankDonationResponse> {
        Ok(self.post_json("/donate/public", request, None).await?)
    }

    async fn start_crypto(&self, request: &CryptoStartRequest) -> GatewayResult<CryptoSettlement> {
        Ok(self.post_json("/crypto/public", request, None).await?)
    }

    async fn settle_crypto(
        &self,
        request: &CryptoSettleRequest,
    ) -> GatewayResult<SettlementReceipt> {
        Ok(self.post_json("/crypto/settle", request, None).await?)
    }

    async fn buy(&self, request: &BuyRequest) -> GatewayResult<TradeReceipt> {
        let token = self.stored_token();
        Ok(self.post_json("/crypto/buy", request, token.as_deref()).await?)
    }

    async fn sell(&self, request: &SellRequest) -> GatewayResult<TradeReceipt> {
        let token = self.stored_token();
        Ok(self.post_json("/crypto/sell", request, token.as_deref()).await?)
    }
}
