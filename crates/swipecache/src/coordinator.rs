//! # Download Coordinator
//!
//! Resolves "a playable local file for URL U": cache first, then network,
//! storing whatever the network returns. All resolution work runs on a single
//! worker task fed by a FIFO queue, so at most one request is checking the
//! cache, fetching or storing at any instant. Results are handed back to the
//! requesting context (an awaiting caller or a consumer-owned channel), never
//! to callbacks running on the worker.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::VideoCacheProvider;
use crate::fetcher::VideoFetcher;

/// Terminal state of a single resolve request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// Already cached; no network call was made
    Hit(PathBuf),
    /// Fetched from the network and stored
    Fetched(PathBuf),
    /// The network fetch failed
    FetchFailed,
    /// The fetch succeeded but the payload could not be cached
    StoreFailed,
    /// The coordinator stopped before the request was serviced
    Shutdown,
}

impl ResolveOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ResolveOutcome::Hit(path) | ResolveOutcome::Fetched(path) => Some(path),
            _ => None,
        }
    }

    pub fn into_path(self) -> Option<PathBuf> {
        match self {
            ResolveOutcome::Hit(path) | ResolveOutcome::Fetched(path) => Some(path),
            _ => None,
        }
    }
}

/// A delivered result: the requested URL and what became of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub url: Url,
    pub outcome: ResolveOutcome,
}

impl Resolution {
    /// Local path to play, or `None` if the caller should stream `url` directly.
    pub fn path(&self) -> Option<&Path> {
        self.outcome.path()
    }

    pub fn into_path(self) -> Option<PathBuf> {
        self.outcome.into_path()
    }
}

/// Where a player should read a video from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackSource {
    /// Play the cached file
    Local(PathBuf),
    /// Stream from the network while the cache warms in the background
    Remote(Url),
}

/// Where a finished job sends its resolution.
enum Reply {
    Awaiting(oneshot::Sender<Resolution>),
    Channel(mpsc::UnboundedSender<Resolution>),
    Detached,
}

impl Reply {
    fn deliver(self, resolution: Resolution) {
        match self {
            Reply::Awaiting(tx) => {
                if tx.send(resolution).is_err() {
                    debug!("Resolve caller went away before delivery");
                }
            }
            Reply::Channel(tx) => {
                if let Err(e) = tx.send(resolution) {
                    debug!(url = %e.0.url, "Resolution receiver closed, discarding result");
                }
            }
            Reply::Detached => {
                debug!(url = %resolution.url, outcome = ?resolution.outcome, "Background warm-up finished");
            }
        }
    }
}

struct ResolveJob {
    url: Url,
    reply: Reply,
}

/// Serializes cache-or-fetch resolution of video URLs.
pub struct DownloadCoordinator {
    cache: Arc<dyn VideoCacheProvider>,
    job_tx: mpsc::UnboundedSender<ResolveJob>,
    worker: JoinHandle<()>,
}

impl DownloadCoordinator {
    /// Spawn the worker. Must be called from within a Tokio runtime.
    pub fn new(cache: Arc<dyn VideoCacheProvider>, fetcher: Arc<dyn VideoFetcher>) -> Self {
        let (job_tx, job_rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(Self::run_worker(job_rx, Arc::clone(&cache), fetcher));

        Self {
            cache,
            job_tx,
            worker,
        }
    }

    /// The cache this coordinator reads and fills.
    pub fn cache(&self) -> &Arc<dyn VideoCacheProvider> {
        &self.cache
    }

    /// Resolve `url` to a local path, or `None` when no local copy could be
    /// produced and the caller should stream from the network instead.
    pub async fn resolve(&self, url: &Url) -> Option<PathBuf> {
        self.resolve_detailed(url).await.into_path()
    }

    /// Like [`resolve`](Self::resolve), reporting how the request ended.
    pub async fn resolve_detailed(&self, url: &Url) -> Resolution {
        let (tx, rx) = oneshot::channel();
        self.enqueue(url.clone(), Reply::Awaiting(tx));

        rx.await.unwrap_or_else(|_| Resolution {
            url: url.clone(),
            outcome: ResolveOutcome::Shutdown,
        })
    }

    /// Queue `url` and deliver its resolution to `deliver_to`.
    ///
    /// Resolutions arrive in submission order. Dropping the receiver does not
    /// stop the work; the result is simply discarded.
    pub fn submit(&self, url: Url, deliver_to: mpsc::UnboundedSender<Resolution>) {
        self.enqueue(url, Reply::Channel(deliver_to));
    }

    /// Decide where to play `url` from.
    ///
    /// A cached copy is returned straight away without queueing. Otherwise a
    /// background fetch-and-store is queued and the remote URL is returned,
    /// so playback never waits on the download.
    pub async fn playback_source(&self, url: &Url) -> PlaybackSource {
        if let Some(path) = self.cache.lookup(url).await {
            debug!(url = %url, path = ?path, "Playing from cache");
            return PlaybackSource::Local(path);
        }

        self.enqueue(url.clone(), Reply::Detached);
        debug!(url = %url, "Streaming from network, caching in background");
        PlaybackSource::Remote(url.clone())
    }

    /// Stop accepting work and wait for every queued request to finish.
    pub async fn shutdown(self) {
        let Self { job_tx, worker, .. } = self;
        drop(job_tx);

        if let Err(e) = worker.await {
            warn!(error = %e, "Download worker terminated abnormally");
        }
    }

    fn enqueue(&self, url: Url, reply: Reply) {
        if let Err(mpsc::error::SendError(job)) = self.job_tx.send(ResolveJob { url, reply }) {
            warn!(url = %job.url, "Download worker is not running, request dropped");
            job.reply.deliver(Resolution {
                url: job.url,
                outcome: ResolveOutcome::Shutdown,
            });
        }
    }

    async fn run_worker(
        mut job_rx: mpsc::UnboundedReceiver<ResolveJob>,
        cache: Arc<dyn VideoCacheProvider>,
        fetcher: Arc<dyn VideoFetcher>,
    ) {
        info!("Download worker started");

        while let Some(job) = job_rx.recv().await {
            let outcome = Self::process(cache.as_ref(), fetcher.as_ref(), &job.url).await;
            job.reply.deliver(Resolution {
                url: job.url,
                outcome,
            });
        }

        info!("Download worker stopped");
    }

    async fn process(
        cache: &dyn VideoCacheProvider,
        fetcher: &dyn VideoFetcher,
        url: &Url,
    ) -> ResolveOutcome {
        if let Some(path) = cache.lookup(url).await {
            debug!(url = %url, path = ?path, "Cache hit");
            return ResolveOutcome::Hit(path);
        }

        debug!(url = %url, "Cache miss, fetching");
        let data = match fetcher.fetch(url).await {
            Ok(data) => data,
            Err(e) => {
                warn!(url = %url, error = %e, "Video download failed");
                return ResolveOutcome::FetchFailed;
            }
        };

        let size = data.len();
        cache.insert(Some(data), url).await;

        match cache.lookup(url).await {
            Some(path) => {
                info!(url = %url, path = ?path, size, "Video cached");
                ResolveOutcome::Fetched(path)
            }
            None => {
                warn!(url = %url, "Downloaded video could not be cached");
                ResolveOutcome::StoreFailed
            }
        }
    }
}
