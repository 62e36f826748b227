//! Reference-data client for the IBGE localidades API.
//!
//! States and municipalities are fetched lazily and cached in memory for
//! the process lifetime (no TTL, no invalidation) — an accepted staleness
//! trade-off. A non-success upstream response is logged and surfaced as a
//! fixed-message error; nothing is retried.

use std::time::Duration;

use tracing::{debug, error};

use crate::cache::RefCache;
use crate::error::{Result, TriageError};
use crate::metrics::MetricsCollector;
use crate::models::{Municipality, State};

/// Default base URL of the IBGE localidades API.
pub const DEFAULT_BASE_URL: &str = "https://servicodados.ibge.gov.br/api/v1/localidades";

/// HTTP client over the localidades API with process-lifetime caches.
pub struct LocationClient {
    http: reqwest::Client,
    base_url: String,
    states_cache: RefCache<(), Vec<State>>,
    municipalities_cache: RefCache<String, Vec<Municipality>>,
    metrics: MetricsCollector,
}

impl LocationClient {
    /// Create a client against the given base URL.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            states_cache: RefCache::new(),
            municipalities_cache: RefCache::new(),
            metrics: MetricsCollector::default(),
        })
    }

    /// List the first-level subdivisions (states), ordered by code.
    ///
    /// The first successful fetch is cached for the process lifetime.
    pub async fn states(&self) -> Result<Vec<State>> {
        if let Some(cached) = self.states_cache.get(&()) {
            debug!("serving states from cache");
            return Ok(cached);
        }

        let url = format!("{}/estados?orderBy=sigla", self.base_url);
        let response = self.http.get(&url).send().await.inspect_err(|err| {
            self.metrics.record_reference_fetch("estados", false);
            error!(error = %err, "states request failed");
        })?;

        if !response.status().is_success() {
            self.metrics.record_reference_fetch("estados", false);
            error!(status = %response.status(), "states request returned non-success");
            return Err(TriageError::ReferenceFetch("estados"));
        }

        let states: Vec<State> = response.json().await?;
        self.metrics.record_reference_fetch("estados", true);
        self.states_cache.put((), states.clone());

        Ok(states)
    }

    /// List the municipalities of one state, ordered by name.
    ///
    /// An empty state code yields an empty list without a network call.
    /// Results are cached per state code for the process lifetime.
    pub async fn municipalities(&self, state_code: &str) -> Result<Vec<Municipality>> {
        if state_code.is_empty() {
            return Ok(Vec::new());
        }

        let key = state_code.to_string();
        if let Some(cached) = self.municipalities_cache.get(&key) {
            debug!(state_code, "serving municipalities from cache");
            return Ok(cached);
        }

        let url = format!("{}/estados/{state_code}/municipios?orderBy=nome", self.base_url);
        let response = self.http.get(&url).send().await.inspect_err(|err| {
            self.metrics.record_reference_fetch("municipios", false);
            error!(state_code, error = %err, "municipalities request failed");
        })?;

        if !response.status().is_success() {
            self.metrics.record_reference_fetch("municipios", false);
            error!(state_code, status = %response.status(), "municipalities request returned non-success");
            return Err(TriageError::ReferenceFetch("municipios"));
        }

        let mut municipalities: Vec<Municipality> = response.json().await?;
        for municipality in &mut municipalities {
            municipality.state_code = state_code.to_string();
        }

        self.metrics.record_reference_fetch("municipios", true);
        self.municipalities_cache
            .put(key, municipalities.clone());

        Ok(municipalities)
    }

    /// Drop both caches. Production code never calls this; it exists so
    /// tests can exercise cold and warm paths.
    pub fn invalidate(&self) {
        self.states_cache.clear();
        self.municipalities_cache.clear();
    }

    /// Number of state lists currently cached (0 or 1).
    #[must_use]
    pub fn cached_state_lists(&self) -> usize {
        self.states_cache.len()
    }

    /// Number of per-state municipality lists currently cached.
    #[must_use]
    pub fn cached_municipality_lists(&self) -> usize {
        self.municipalities_cache.len()
    }
}
