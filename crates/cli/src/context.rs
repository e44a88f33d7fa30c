//! Application context - wires everything together

use freetag_api::ApiClient;
use freetag_compliance::ComplianceGate;
use freetag_conversion::ConversionEngine;
use freetag_core::{Asset, FileStore, KeyValueStore};
use freetag_donation::{DonationFlowController, DraftStore, PaymentGateway, TradeController};
use freetag_rates::{RateFetcher, RateSource, StaticRateFetcher};
use freetag_session::{SessionBackend, SessionResolver};
use std::sync::Arc;

use crate::config::AppConfig;

/// Application context - one shared instance of every component
pub struct AppContext {
    pub config: AppConfig,
    pub store: Arc<dyn KeyValueStore>,
    pub rates: Arc<RateSource>,
    pub conversion: ConversionEngine,
    pub compliance: ComplianceGate,
    pub session: SessionResolver,
    pub donations: DonationFlowController,
    pub trades: TradeController,
    pub drafts: DraftStore<dyn KeyValueStore>,
}

impl AppContext {
    /// Create a context talking to the configured backend
    ///
    /// With `offline`, rates come from the built-in static table instead
    /// of `GET /rates`. Sessions and payments still need the backend.
    pub fn new(config: AppConfig, offline: bool) -> Result<Self, anyhow::Error> {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(config.store_path())?);
        let api = Arc::new(ApiClient::new(&config.api_base_url)?.with_token_store(store.clone()));

        let fetcher: Arc<dyn RateFetcher> = if offline {
            tracing::info!("Offline mode, using static rates");
            Arc::new(StaticRateFetcher::with_defaults())
        } else {
            api.clone()
        };

        tracing::debug!(
            api = api.base_url(),
            store = %config.store_path().display(),
            "Context ready"
        );
        Ok(Self::from_parts(config, store, fetcher, api.clone(), api))
    }

    /// Wire a context from already-built collaborators
    pub fn from_parts(
        config: AppConfig,
        store: Arc<dyn KeyValueStore>,
        fetcher: Arc<dyn RateFetcher>,
        backend: Arc<dyn SessionBackend>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let rates = RateSource::new(fetcher);
        let drafts = DraftStore::new(store.clone(), &config.draft);

        Self {
            conversion: ConversionEngine::new(rates.clone()),
            compliance: ComplianceGate::new(rates.clone()),
            session: SessionResolver::new(store.clone(), backend, config.session.clone()),
            donations: DonationFlowController::new(
                rates.clone(),
                gateway.clone(),
                config.flow.clone(),
            )
            .with_drafts(drafts.clone()),
            trades: TradeController::new(rates.clone(), gateway),
            drafts,
            rates,
            store,
            config,
        }
    }

    /// Refresh the rate cache for each target, deduplicated
    ///
    /// Failures are logged and skipped; quotes for a missing rate show
    /// zero and compliance fails closed. Returns the number of rates held.
    pub async fn refresh_rates(&self, targets: &[Asset]) -> usize {
        let mut seen: Vec<&Asset> = Vec::new();
        let mut total = 0;
        for target in targets {
            if seen.contains(&target) {
                continue;
            }
            seen.push(target);
            match self.rates.refresh(target).await {
                Ok(count) => total += count,
                Err(e) => tracing::warn!(currency = %target, error = %e, "Rates unavailable"),
            }
        }
        total
    }
}
