use std::path::Path;

use swipecache_engine::{
    DiskCache, DownloadCoordinator, PlaybackSource, Resolution, ResolveOutcome,
    VideoCacheProvider,
};
use tokio::sync::mpsc;
use tracing::info;
use url::Url;

use crate::error::AppError;

/// Submit every URL up front and print resolutions as they are delivered.
pub async fn resolve(coordinator: &DownloadCoordinator, urls: Vec<Url>) -> Result<(), AppError> {
    let total = urls.len();
    let (tx, mut rx) = mpsc::unbounded_channel();

    for url in urls {
        coordinator.submit(url, tx.clone());
    }
    drop(tx);

    let mut local = 0;
    while let Some(resolution) = rx.recv().await {
        if resolution.path().is_some() {
            local += 1;
        }
        println!("{}", format_resolution(&resolution));
    }

    info!(total, local, "Resolution finished");
    Ok(())
}

/// Print the playback decision, then let the background warm-up finish.
pub async fn source(coordinator: DownloadCoordinator, url: &Url) -> Result<(), AppError> {
    match coordinator.playback_source(url).await {
        PlaybackSource::Local(path) => println!("local {}", path.display()),
        PlaybackSource::Remote(url) => println!("remote {url}"),
    }

    coordinator.shutdown().await;
    Ok(())
}

pub async fn lookup(cache: &DiskCache, url: &Url) -> Result<(), AppError> {
    match cache.lookup(url).await {
        Some(path) => println!("{}", path.display()),
        None => println!("not cached"),
    }
    Ok(())
}

pub async fn import(cache: &DiskCache, url: &Url, file: &Path) -> Result<(), AppError> {
    if !file.is_file() {
        return Err(AppError::InvalidInput(format!(
            "'{}' is not a readable file",
            file.display()
        )));
    }

    cache.insert_file(file, url).await;
    match cache.lookup(url).await {
        Some(path) => {
            println!("{}", path.display());
            Ok(())
        }
        None => Err(AppError::InvalidInput(format!(
            "'{url}' could not be stored in the cache"
        ))),
    }
}

pub async fn remove(cache: &DiskCache, url: &Url) -> Result<(), AppError> {
    cache.delete(url).await;
    println!("removed {url}");
    Ok(())
}

pub async fn clear(cache: &DiskCache) -> Result<(), AppError> {
    let removed = cache.delete_all().await;
    println!("Removed {removed} cached video(s) from {}", cache.root().display());
    Ok(())
}

pub fn format_resolution(resolution: &Resolution) -> String {
    match &resolution.outcome {
        ResolveOutcome::Hit(path) => format!("hit         {}", path.display()),
        ResolveOutcome::Fetched(path) => format!("fetched     {}", path.display()),
        ResolveOutcome::FetchFailed
        | ResolveOutcome::StoreFailed
        | ResolveOutcome::Shutdown => format!("unavailable {}", resolution.url),
    }
}
