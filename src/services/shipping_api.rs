//! # Shipping API Client
//!
//! This module provides the HTTP client for the external Shipping API, the source of truth for
//! shipment records, lifecycle statuses and queue counts. The core only reads from and writes to
//! it; the shipment state machine itself is owned upstream. Failures (transport errors or non-2xx
//! responses) surface as `ShippingApiError` carrying the upstream message, so callers can report
//! them as soft failures without crashing the request.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::config::ShippingApiSettings;
use crate::errors::{PiletasError, PiletasResult};
use crate::models::{
    LifecycleStatus, OperationTimeRequest, QueueCountResponse, ShipmentSnapshot, ShippingErrorBody,
    ShippingPage, ShippingRecord, StatusPushRequest, TemperatureReadingRequest,
};

/// Pages fetched from one listing endpoint are capped so a misbehaving
/// upstream pager cannot loop the service forever.
const MAX_PAGES: u32 = 50;

/// A client for the external Shipping API, authenticated with a bearer token.
#[derive(Clone)]
pub struct ShippingApiClient {
    client: Client,
    base_url: Url,
    bearer_token: Secret<String>,
    page_size: u32,
}

impl ShippingApiClient {
    /// Creates a new `ShippingApiClient` from the configured base URL, token and timeout.
    pub fn new(settings: &ShippingApiSettings) -> PiletasResult<Self> {
        let base_url = Url::parse(&settings.base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url,
            bearer_token: settings.bearer_token.clone(),
            page_size: settings.page_size,
        })
    }

    fn request(&self, method: Method, path: &str) -> PiletasResult<RequestBuilder> {
        let url = self.base_url.join(path)?;
        Ok(self
            .client
            .request(method, url)
            .bearer_auth(self.bearer_token.expose_secret()))
    }

    /// Decodes a 2xx response, or turns a non-2xx response into a `ShippingApiError`
    /// carrying the upstream message.
    async fn decode<T: DeserializeOwned>(&self, response: Response) -> PiletasResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        let message = response
            .json::<ShippingErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| format!("upstream responded {}", status));
        Err(PiletasError::ShippingApiError {
            status: Some(status.as_u16()),
            message,
        })
    }

    async fn expect_success(&self, response: Response) -> PiletasResult<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let message = response
            .json::<ShippingErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| format!("upstream responded {}", status));
        Err(PiletasError::ShippingApiError {
            status: Some(status.as_u16()),
            message,
        })
    }

    /// Fetches one page of the shipment listing for a lifecycle status.
    pub async fn fetch_status_page(
        &self,
        status: LifecycleStatus,
        page: u32,
    ) -> PiletasResult<ShippingPage> {
        let path = format!("shipping/status/{}", status.code());
        let response = self
            .request(Method::GET, &path)?
            .query(&[("page", page), ("per_page", self.page_size)])
            .send()
            .await?;
        self.decode(response).await
    }

    /// Fetches every page of the shipment listing for a lifecycle status.
    pub async fn fetch_all_by_status(
        &self,
        status: LifecycleStatus,
    ) -> PiletasResult<Vec<ShippingRecord>> {
        let mut records = Vec::new();
        let mut page = 1;
        loop {
            let current = self.fetch_status_page(status, page).await?;
            debug!(
                "Fetched page {}/{:?} of status {} ({} records)",
                page,
                current.last_page,
                status,
                current.data.len()
            );
            records.extend(current.data.iter().cloned());
            if !current.has_next() {
                break;
            }
            page += 1;
            if page > MAX_PAGES {
                warn!(
                    "Stopping status {} listing after {} pages; upstream pager may be misbehaving",
                    status, MAX_PAGES
                );
                break;
            }
        }
        Ok(records)
    }

    /// Fetches the queue and processing listings and converts them into
    /// allocation snapshots, skipping records the allocator cannot use.
    pub async fn fetch_tracked_snapshots(&self) -> PiletasResult<Vec<ShipmentSnapshot>> {
        let mut snapshots: Vec<ShipmentSnapshot> = Vec::new();
        for status in [LifecycleStatus::Queued, LifecycleStatus::Processing] {
            for record in self.fetch_all_by_status(status).await? {
                if let Some(snapshot) = record.to_snapshot() {
                    if !snapshots
                        .iter()
                        .any(|s| s.shipment_id == snapshot.shipment_id)
                    {
                        snapshots.push(snapshot);
                    }
                }
            }
        }
        Ok(snapshots)
    }

    /// Requests a lifecycle transition for a shipment.
    pub async fn push_status(
        &self,
        code_gen: &str,
        status: LifecycleStatus,
    ) -> PiletasResult<()> {
        let body = StatusPushRequest {
            code_gen: code_gen.to_string(),
            status: status.code(),
        };
        let response = self
            .request(Method::POST, "status/push")?
            .json(&body)
            .send()
            .await?;
        self.expect_success(response).await
    }

    /// Records a temperature reading against a shipment.
    pub async fn record_temperature(&self, code_gen: &str, temperatura: f64) -> PiletasResult<()> {
        let path = format!("shipping/temperatura/{}", code_gen);
        let response = self
            .request(Method::POST, &path)?
            .json(&TemperatureReadingRequest { temperatura })
            .send()
            .await?;
        self.expect_success(response).await
    }

    /// Records the elapsed duration of a completed operation.
    pub async fn record_operation_time(
        &self,
        code_gen: &str,
        tipo_timer: &str,
        elapsed_seconds: i64,
    ) -> PiletasResult<()> {
        let body = OperationTimeRequest {
            code_gen: code_gen.to_string(),
            tipo_timer: tipo_timer.to_string(),
            elapsed_seconds,
        };
        let response = self
            .request(Method::POST, "operation-times")?
            .json(&body)
            .send()
            .await?;
        self.expect_success(response).await
    }

    /// Current number of shipments holding a queue slot.
    pub async fn queue_count(&self) -> PiletasResult<u32> {
        let response = self.request(Method::GET, "queue/count")?.send().await?;
        let body: QueueCountResponse = self.decode(response).await?;
        Ok(body.count.unwrap_or(0))
    }

    /// Calls a shipment into the reception queue.
    pub async fn call_to_queue(&self, code_gen: &str) -> PiletasResult<()> {
        let path = format!("queue/{}", code_gen);
        let response = self.request(Method::POST, &path)?.send().await?;
        self.expect_success(response).await
    }

    /// Releases a shipment's queue slot.
    pub async fn release_queue_slot(&self, code_gen: &str) -> PiletasResult<()> {
        let path = format!("queue/{}", code_gen);
        let response = self.request(Method::DELETE, &path)?.send().await?;
        self.expect_success(response).await
    }
}
