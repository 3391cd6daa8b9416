//! Url-keyed cache of decoded models.
//!
//! Loads run on one background thread so the event loop never blocks on the
//! network; results are drained on the event loop thread each frame.
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};
use assets::{AssetFetcher, AssetSource};
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, info, warn};

use crate::model::{decode_gltf, NormalizedModel};

/// Turns a url into a ready-to-draw model.
pub trait ModelLoader: Send + Sync {
    fn load(&self, url: &str) -> Result<NormalizedModel>;
}

impl<F> ModelLoader for F
where
    F: Fn(&str) -> Result<NormalizedModel> + Send + Sync,
{
    fn load(&self, url: &str) -> Result<NormalizedModel> {
        self(url)
    }
}

/// Production loader: fetch bytes, decode glTF, normalize.
pub struct FetchingLoader {
    fetcher: AssetFetcher,
    canonical_radius: f32,
}

impl FetchingLoader {
    pub fn new(fetcher: AssetFetcher, canonical_radius: f32) -> Self {
        Self {
            fetcher,
            canonical_radius,
        }
    }
}

impl ModelLoader for FetchingLoader {
    fn load(&self, url: &str) -> Result<NormalizedModel> {
        let source = AssetSource::parse(url)?;
        let bytes = self.fetcher.fetch(&source)?;
        let mesh = decode_gltf(&bytes).with_context(|| format!("failed to decode {source}"))?;
        let model = NormalizedModel::normalize(mesh, self.canonical_radius)
            .with_context(|| format!("failed to normalize {source}"))?;
        debug!(
            %url,
            vertices = model.mesh.vertices.len(),
            radius = model.radius,
            scale = model.scale,
            "normalized model"
        );
        Ok(model)
    }
}

#[derive(Debug, Clone)]
pub enum LoadState {
    Loading,
    Ready(Arc<NormalizedModel>),
    Failed(String),
}

impl LoadState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, LoadState::Loading)
    }
}

/// Counts behind the loading indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: usize,
    pub failed: usize,
    pub total: usize,
    pub active: bool,
}

impl LoadProgress {
    /// Settled share of the catalog, rounded and clamped to `0..=100`.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let settled = (self.loaded + self.failed) as f64;
        let percent = (settled * 100.0 / self.total as f64).round();
        percent.clamp(0.0, 100.0) as u8
    }
}

struct LoadResult {
    url: String,
    outcome: Result<NormalizedModel, String>,
}

pub struct AssetCache {
    entries: HashMap<String, LoadState>,
    total: usize,
    loader: Arc<dyn ModelLoader>,
    requests: Option<Sender<String>>,
    results: Receiver<LoadResult>,
    cancelled: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl AssetCache {
    /// Starts the loader thread. `total` is the catalog size the progress
    /// figure is measured against.
    pub fn spawn(loader: Arc<dyn ModelLoader>, total: usize) -> Result<Self> {
        let (request_tx, request_rx) = unbounded::<String>();
        let (result_tx, result_rx) = unbounded();
        let cancelled = Arc::new(AtomicBool::new(false));

        let worker_loader = Arc::clone(&loader);
        let worker_cancelled = Arc::clone(&cancelled);
        let worker = thread::Builder::new()
            .name("zerogiven-assets".into())
            .spawn(move || {
                for url in request_rx.iter() {
                    if worker_cancelled.load(Ordering::Relaxed) {
                        break;
                    }
                    let outcome = worker_loader.load(&url).map_err(|err| format!("{err:#}"));
                    if result_tx.send(LoadResult { url, outcome }).is_err() {
                        break;
                    }
                }
            })
            .map_err(|err| anyhow!("failed to spawn asset loader thread: {err}"))?;

        Ok(Self {
            entries: HashMap::new(),
            total,
            loader,
            requests: Some(request_tx),
            results: result_rx,
            cancelled,
            worker: Some(worker),
        })
    }

    /// Queues a background load. Returns `false` when the url is already
    /// loading or settled.
    pub fn warm(&mut self, url: &str) -> bool {
        if self.entries.contains_key(url) {
            return false;
        }
        let Some(requests) = self.requests.as_ref() else {
            return false;
        };
        if requests.send(url.to_string()).is_err() {
            warn!(%url, "asset loader thread is gone; cannot warm asset");
            return false;
        }
        debug!(%url, "warming asset");
        self.entries.insert(url.to_string(), LoadState::Loading);
        true
    }

    /// Loads on the calling thread, or waits for an in-flight background load
    /// of the same url.
    pub fn warm_blocking(&mut self, url: &str) -> LoadState {
        if !self.entries.contains_key(url) {
            let outcome = self.loader.load(url).map_err(|err| format!("{err:#}"));
            self.apply(LoadResult {
                url: url.to_string(),
                outcome,
            });
        }
        while matches!(self.entries.get(url), Some(LoadState::Loading)) {
            match self.results.recv() {
                Ok(result) => self.apply(result),
                Err(_) => {
                    self.entries
                        .insert(url.to_string(), LoadState::Failed("loader stopped".into()));
                }
            }
        }
        self.entries.get(url).cloned().unwrap_or(LoadState::Loading)
    }

    /// Applies finished background loads. Returns the urls that settled.
    pub fn drain(&mut self) -> Vec<String> {
        let finished: Vec<LoadResult> = self.results.try_iter().collect();
        finished
            .into_iter()
            .map(|result| {
                let url = result.url.clone();
                self.apply(result);
                url
            })
            .collect()
    }

    /// Blocks until nothing is in flight.
    pub fn settle(&mut self) {
        while self.entries.values().any(|state| !state.is_settled()) {
            match self.results.recv() {
                Ok(result) => self.apply(result),
                Err(_) => break,
            }
        }
    }

    pub fn get(&self, url: &str) -> Option<&LoadState> {
        self.entries.get(url)
    }

    pub fn model(&self, url: &str) -> Option<Arc<NormalizedModel>> {
        match self.entries.get(url) {
            Some(LoadState::Ready(model)) => Some(Arc::clone(model)),
            _ => None,
        }
    }

    pub fn progress(&self) -> LoadProgress {
        let mut progress = LoadProgress {
            loaded: 0,
            failed: 0,
            total: self.total.max(self.entries.len()),
            active: false,
        };
        for state in self.entries.values() {
            match state {
                LoadState::Loading => progress.active = true,
                LoadState::Ready(_) => progress.loaded += 1,
                LoadState::Failed(_) => progress.failed += 1,
            }
        }
        progress
    }

    fn apply(&mut self, result: LoadResult) {
        let state = match result.outcome {
            Ok(model) => {
                info!(url = %result.url, "asset ready");
                LoadState::Ready(Arc::new(model))
            }
            Err(reason) => {
                warn!(url = %result.url, %reason, "asset failed to load");
                LoadState::Failed(reason)
            }
        };
        self.entries.insert(result.url, state);
    }
}

impl Drop for AssetCache {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
        self.requests.take();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::model::{MeshData, Vertex};

    fn unit_model() -> NormalizedModel {
        let mesh = MeshData {
            vertices: vec![
                Vertex {
                    position: [0.0, 0.0, 0.0],
                    normal: [0.0, 0.0, 1.0],
                },
                Vertex {
                    position: [1.0, 0.0, 0.0],
                    normal: [0.0, 0.0, 1.0],
                },
                Vertex {
                    position: [0.0, 1.0, 0.0],
                    normal: [0.0, 0.0, 1.0],
                },
            ],
            indices: vec![0, 1, 2],
            base_color: [1.0; 4],
        };
        NormalizedModel::normalize(mesh, 2.25).unwrap()
    }

    fn counting_cache(total: usize) -> (AssetCache, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let loader = move |url: &str| -> Result<NormalizedModel> {
            counter.fetch_add(1, Ordering::SeqCst);
            if url.contains("broken") {
                Err(anyhow!("corrupt file"))
            } else {
                Ok(unit_model())
            }
        };
        (AssetCache::spawn(Arc::new(loader), total).unwrap(), calls)
    }

    #[test]
    fn warm_is_idempotent() {
        let (mut cache, calls) = counting_cache(2);
        assert!(cache.warm("a.glb"));
        assert!(!cache.warm("a.glb"));
        cache.settle();
        assert!(!cache.warm("a.glb"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.model("a.glb").is_some());
    }

    #[test]
    fn failures_are_recorded_and_counted() {
        let (mut cache, _) = counting_cache(2);
        cache.warm("good.glb");
        cache.warm("broken.glb");
        cache.settle();
        assert!(matches!(cache.get("broken.glb"), Some(LoadState::Failed(reason)) if reason.contains("corrupt")));
        let progress = cache.progress();
        assert_eq!(progress.loaded, 1);
        assert_eq!(progress.failed, 1);
        assert!(!progress.active);
        assert_eq!(progress.percent(), 100);
    }

    #[test]
    fn warm_blocking_loads_inline() {
        let (mut cache, calls) = counting_cache(5);
        assert!(matches!(cache.warm_blocking("hero.glb"), LoadState::Ready(_)));
        assert!(matches!(cache.warm_blocking("hero.glb"), LoadState::Ready(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.progress().percent(), 20);
    }

    #[test]
    fn warm_blocking_waits_for_background_load() {
        let (mut cache, calls) = counting_cache(1);
        cache.warm("hero.glb");
        assert!(matches!(cache.warm_blocking("hero.glb"), LoadState::Ready(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn percent_is_rounded_and_clamped() {
        let progress = |loaded, failed, total| LoadProgress {
            loaded,
            failed,
            total,
            active: false,
        };
        assert_eq!(progress(1, 0, 3).percent(), 33);
        assert_eq!(progress(2, 0, 3).percent(), 67);
        assert_eq!(progress(0, 0, 0).percent(), 100);
        assert_eq!(progress(4, 2, 5).percent(), 100);
    }

    #[test]
    fn drain_reports_settled_urls() {
        let (mut cache, _) = counting_cache(1);
        cache.warm("a.glb");
        let mut settled = Vec::new();
        while settled.is_empty() {
            settled = cache.drain();
            std::thread::yield_now();
        }
        assert_eq!(settled, vec!["a.glb".to_string()]);
        assert!(cache.get("a.glb").is_some_and(LoadState::is_settled));
    }
}
