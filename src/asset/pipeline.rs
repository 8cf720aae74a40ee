//! Icon load orchestration: cache lookup, fetch, decode, rasterize, deliver.
//!
//! Loads run as tokio tasks; decode and rasterize run on the blocking pool.
//! Results travel over a channel to whoever owns the display targets and are
//! re-checked there against the target's current request, so a superseded or
//! cancelled load never reaches its target.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::metrics::{CacheMetrics, PipelineMetrics};

use super::cache::{AssetCache, CacheKey};
use super::decoder::VectorDocument;
use super::fetcher::{resolve_uri, AssetFetcher};
use super::types::{
    AssetError, AssetRequestConfig, IconState, IconTarget, LoadState, PipelineResult,
    RasterImage, TargetId,
};

/// Why a load stopped before producing a raster
enum Interrupt {
    Cancelled,
    Failed(AssetError),
}

impl From<AssetError> for Interrupt {
    fn from(error: AssetError) -> Self {
        Interrupt::Failed(error)
    }
}

/// Move `state` forward unless it already reached a terminal state
fn advance(state: &AtomicU8, next: LoadState) {
    let _ = state.fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
        (!LoadState::from(current).is_terminal()).then_some(next as u8)
    });
}

fn checkpoint(token: &CancellationToken) -> Result<(), Interrupt> {
    if token.is_cancelled() {
        Err(Interrupt::Cancelled)
    } else {
        Ok(())
    }
}

/// The load currently owning a target
#[derive(Debug, Clone)]
struct ActiveLoad {
    request_id: Uuid,
    token: CancellationToken,
    state: Arc<AtomicU8>,
}

impl ActiveLoad {
    fn cancel(&self) {
        self.token.cancel();
        advance(&self.state, LoadState::Cancelled);
    }
}

struct PipelineShared {
    cache: Arc<dyn AssetCache>,
    fetcher: Arc<dyn AssetFetcher>,
    config: AssetRequestConfig,
    active: Arc<DashMap<TargetId, ActiveLoad>>,
    delivery_tx: mpsc::UnboundedSender<Delivery>,
}

/// Icon loading pipeline. Cheap to clone; clones share in-flight state.
#[derive(Clone)]
pub struct AssetPipeline {
    inner: Arc<PipelineShared>,
}

impl AssetPipeline {
    /// Create a pipeline and the receiving end of its deliveries
    pub fn new(
        cache: Arc<dyn AssetCache>,
        fetcher: Arc<dyn AssetFetcher>,
        config: AssetRequestConfig,
    ) -> (Self, Deliveries) {
        let (delivery_tx, delivery_rx) = mpsc::unbounded_channel();
        let active = Arc::new(DashMap::new());

        let pipeline = Self {
            inner: Arc::new(PipelineShared {
                cache,
                fetcher,
                config,
                active: active.clone(),
                delivery_tx,
            }),
        };
        let deliveries = Deliveries {
            rx: delivery_rx,
            active,
        };
        (pipeline, deliveries)
    }

    pub fn config(&self) -> &AssetRequestConfig {
        &self.inner.config
    }

    /// Start loading `uri` into `target`.
    ///
    /// The placeholder is applied before this returns. Any earlier load for the
    /// same target is cancelled. Must be called within a tokio runtime.
    #[tracing::instrument(skip(self, target), fields(target_id = %target.target_id()))]
    pub fn load(&self, uri: &str, target: &mut dyn IconTarget) -> LoadHandle {
        let target_id = target.target_id();
        let load = ActiveLoad {
            request_id: Uuid::new_v4(),
            token: CancellationToken::new(),
            state: Arc::new(AtomicU8::new(LoadState::Pending as u8)),
        };

        target.set_icon(IconState::Pending(self.inner.config.placeholder_image.clone()));

        if let Some(previous) = self.inner.active.insert(target_id, load.clone()) {
            previous.cancel();
            tracing::debug!(
                request_id = %previous.request_id,
                "Superseded previous icon load"
            );
        }
        PipelineMetrics::record_load();

        let shared = self.inner.clone();
        let uri = uri.to_string();
        let task_load = load.clone();
        tokio::spawn(async move {
            shared.run(target_id, task_load, uri).await;
        });

        LoadHandle {
            request_id: load.request_id,
            target: target_id,
            token: load.token,
            state: load.state,
            active: self.inner.active.clone(),
        }
    }

    /// Cancel whatever is in flight for `target`. Returns true if something was.
    pub fn cancel(&self, target: TargetId) -> bool {
        match self.inner.active.remove(&target) {
            Some((_, load)) => {
                load.cancel();
                tracing::debug!(target_id = %target, request_id = %load.request_id, "Cancelled icon load");
                true
            }
            None => false,
        }
    }

    /// Number of targets with a load not yet delivered
    pub fn in_flight(&self) -> usize {
        self.inner.active.len()
    }
}

impl PipelineShared {
    async fn run(&self, target: TargetId, load: ActiveLoad, uri: String) {
        let outcome = self.produce(&uri, &load.token, &load.state).await;

        if matches!(outcome, Err(Interrupt::Cancelled)) || load.token.is_cancelled() {
            self.forget(target, load.request_id);
            PipelineMetrics::record_cancelled();
            tracing::debug!(target_id = %target, uri = %uri, "Icon load cancelled");
            return;
        }

        let result = match outcome {
            Ok(raster) => {
                PipelineMetrics::record_success();
                PipelineResult::Success(Arc::new(raster))
            }
            Err(Interrupt::Failed(error)) => {
                advance(&load.state, LoadState::Failed);
                PipelineMetrics::record_fallback(error.stage());
                tracing::warn!(target_id = %target, stage = error.stage(), error = %error, "Icon load failed, using error image");
                PipelineResult::Fallback(self.config.error_image.clone())
            }
            Err(Interrupt::Cancelled) => return,
        };

        advance(&load.state, LoadState::Delivering);
        let delivery = Delivery {
            target,
            request_id: load.request_id,
            result,
        };
        if self.delivery_tx.send(delivery).is_err() {
            tracing::debug!(target_id = %target, "Delivery receiver dropped");
            self.forget(target, load.request_id);
        }
    }

    async fn produce(
        &self,
        uri: &str,
        token: &CancellationToken,
        state: &Arc<AtomicU8>,
    ) -> Result<RasterImage, Interrupt> {
        let url = resolve_uri(uri)?;
        let key = CacheKey::for_uri(&url);

        let cached = match self.cache.get(&key).await {
            Ok(Some(bytes)) => {
                CacheMetrics::record_hit();
                Some(bytes)
            }
            Ok(None) => {
                CacheMetrics::record_miss();
                None
            }
            Err(e) => {
                CacheMetrics::record_io_error();
                CacheMetrics::record_miss();
                tracing::warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                None
            }
        };
        checkpoint(token)?;

        let fresh = cached.is_none();
        let bytes = match cached {
            Some(bytes) => bytes,
            None => {
                advance(state, LoadState::Fetching);
                let started = Instant::now();
                let bytes = tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(Interrupt::Cancelled),
                    fetched = self.fetcher.fetch(&url) => fetched?,
                };
                PipelineMetrics::record_fetch_latency(started.elapsed());
                bytes
            }
        };
        checkpoint(token)?;

        advance(state, LoadState::Decoding);
        let started = Instant::now();
        let (width, height) = (self.config.raster_width, self.config.raster_height);
        let blocking_token = token.clone();
        let blocking_state = state.clone();
        let source = url.to_string();
        let (raster, bytes) = tokio::task::spawn_blocking(move || {
            let document = VectorDocument::decode(&bytes, &source)?;
            checkpoint(&blocking_token)?;
            advance(&blocking_state, LoadState::Rasterizing);
            let raster = document.rasterize(width, height, &source)?;
            Ok::<_, Interrupt>((raster, bytes))
        })
        .await
        .map_err(|e| {
            Interrupt::Failed(AssetError::Rasterize {
                uri: url.to_string(),
                reason: e.to_string(),
            })
        })??;
        PipelineMetrics::record_render_latency(started.elapsed());
        checkpoint(token)?;

        if fresh {
            if let Err(e) = self.cache.put(&key, bytes).await {
                CacheMetrics::record_io_error();
                tracing::warn!(key = %key, error = %e, "Cache write failed");
            }
        }

        Ok(raster)
    }

    /// Drop the active entry for `target` if it still belongs to `request_id`
    fn forget(&self, target: TargetId, request_id: Uuid) {
        self.active
            .remove_if(&target, |_, load| load.request_id == request_id);
    }
}

/// A finished load on its way to a target
#[derive(Debug)]
pub struct Delivery {
    pub target: TargetId,
    pub request_id: Uuid,
    pub result: PipelineResult,
}

impl Delivery {
    /// Apply the result to its target
    pub fn apply(self, target: &mut dyn IconTarget) {
        debug_assert_eq!(target.target_id(), self.target);
        target.set_icon(self.result.into());
    }
}

/// Receiving end of a pipeline's completions.
///
/// Owned by the code that owns the display targets. Only deliveries that are
/// still current for their target come out of it.
pub struct Deliveries {
    rx: mpsc::UnboundedReceiver<Delivery>,
    active: Arc<DashMap<TargetId, ActiveLoad>>,
}

impl Deliveries {
    /// Wait for the next current delivery
    pub async fn recv(&mut self) -> Option<Delivery> {
        while let Some(delivery) = self.rx.recv().await {
            if self.accept(&delivery) {
                return Some(delivery);
            }
        }
        None
    }

    /// Next current delivery, if one is already queued
    pub fn try_recv(&mut self) -> Option<Delivery> {
        while let Ok(delivery) = self.rx.try_recv() {
            if self.accept(&delivery) {
                return Some(delivery);
            }
        }
        None
    }

    fn accept(&self, delivery: &Delivery) -> bool {
        // The slot is released even when the load was cancelled after sending
        let owner = self
            .active
            .remove_if(&delivery.target, |_, load| load.request_id == delivery.request_id);
        match owner {
            Some((_, load)) if !load.token.is_cancelled() => {
                advance(&load.state, LoadState::Delivered);
                true
            }
            _ => {
                tracing::debug!(
                    target_id = %delivery.target,
                    request_id = %delivery.request_id,
                    "Discarded stale icon delivery"
                );
                false
            }
        }
    }
}

/// Handle to one load request
#[derive(Debug, Clone)]
pub struct LoadHandle {
    request_id: Uuid,
    target: TargetId,
    token: CancellationToken,
    state: Arc<AtomicU8>,
    active: Arc<DashMap<TargetId, ActiveLoad>>,
}

impl LoadHandle {
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn target(&self) -> TargetId {
        self.target
    }

    /// Cancel this load. Has no effect once delivered.
    ///
    /// The target's slot is released right away unless a newer load owns it.
    pub fn cancel(&self) {
        self.token.cancel();
        advance(&self.state, LoadState::Cancelled);
        self.active
            .remove_if(&self.target, |_, load| load.request_id == self.request_id);
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn state(&self) -> LoadState {
        LoadState::from(self.state.load(Ordering::Acquire))
    }
}
