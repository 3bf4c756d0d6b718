use crate::configuration::Settings;
use crate::xkcd::Comic;
use crate::xkcd_client::{is_timeout, XkcdClient};
use anyhow::Context;
use log::{debug, error, info};
use resolve_path::PathResolveExt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use url::Url;

/// Terminal state of one download attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    AlreadyExists,
    Done,
    TimedOut,
    Failed,
}

impl DownloadOutcome {
    fn as_str(self) -> &'static str {
        match self {
            DownloadOutcome::AlreadyExists => "already exists done",
            DownloadOutcome::Done => "done",
            DownloadOutcome::TimedOut => "timed out done",
            DownloadOutcome::Failed => "failed",
        }
    }
}

/// Downloads every comic from #1 up to the latest into `directory`.
///
/// The latest comic doubles as the discovery call for the upper ID bound,
/// so failing to fetch or parse it aborts the run. Every other failure is
/// absorbed inside the per-comic task that hit it.
pub async fn run(settings: &Settings, directory: &str) -> anyhow::Result<()> {
    let dir = directory.resolve().to_path_buf();
    fs::create_dir_all(&dir)?;
    info!("Output Directory: {}", dir.display());

    let client = XkcdClient::new(settings)?;

    info!("Fetching latest comic...");
    let body = client
        .fetch_json(&settings.latest_url())
        .await
        .context("unable to fetch the latest comic metadata")?;
    let latest = Comic::from_json(&body).context("unable to parse the latest comic metadata")?;

    info!("Latest comic is #{}", latest.num);
    info!("Downloading {} comics...", latest.num);

    download_comic(&client, &latest, &dir).await;

    // Bounded fan-out: every remaining ID gets a task, but only
    // `worker_count` of them run at once.
    let permits = Arc::new(Semaphore::new(settings.worker_count));
    let mut handles = Vec::with_capacity(latest.num.saturating_sub(1) as usize);
    for id in 1..latest.num {
        let permit = permits.clone().acquire_owned().await?;
        let client = client.clone();
        let settings = settings.clone();
        let dir = dir.clone();
        handles.push(tokio::spawn(async move {
            let _permit = permit;
            fetch_comic(&client, &settings, id, &dir).await;
        }));
    }
    for handle in handles {
        if let Err(e) = handle.await {
            error!("Download task failed: {}", e);
        }
    }

    info!("Download Complete");
    Ok(())
}

/// Fetch-and-download for a single comic ID. All failures end the task
/// here; they were already reported closer to where they happened.
async fn fetch_comic(client: &XkcdClient, settings: &Settings, id: u32, dir: &Path) {
    if id == 0 {
        return;
    }
    let url = settings.comic_url(id);
    let Ok(body) = client.fetch_json(&url).await else {
        return;
    };
    let comic = match Comic::from_json(&body) {
        Ok(comic) => comic,
        Err(e) => {
            error!("Failed to parse comic #{} metadata: {:#}", id, e);
            return;
        }
    };
    download_comic(client, &comic, dir).await;
}

/// Ensures the image referenced by `comic` exists in `dir` and emits the
/// status line for it.
///
/// A file that already exists with nonzero length is taken as complete
/// and skipped; zero-byte leftovers from earlier failed runs are fetched
/// again. The body is fully received before anything touches the disk, so
/// a timed-out attempt never leaves a partial file behind.
pub async fn download_comic(client: &XkcdClient, comic: &Comic, dir: &Path) -> DownloadOutcome {
    let filename = derive_filename(&comic.img);
    let target = dir.join(&filename);

    let outcome = if is_complete(&target) {
        debug!("{} exists, skipping", target.display());
        DownloadOutcome::AlreadyExists
    } else {
        match client.fetch_bytes(&comic.img).await {
            Ok(body) => match fs::write(&target, &body) {
                Ok(()) => DownloadOutcome::Done,
                Err(e) => {
                    error!("Failed to write {}: {}", target.display(), e);
                    DownloadOutcome::Failed
                }
            },
            Err(e) if is_timeout(&e) => DownloadOutcome::TimedOut,
            Err(e) => {
                error!("Failed to download {}: {:#}", comic.img, e);
                DownloadOutcome::Failed
            }
        }
    };

    info!(
        "[#{}] {} - Downloading as {}... {}",
        comic.num,
        comic.title,
        filename,
        outcome.as_str()
    );
    outcome
}

fn is_complete(path: &Path) -> bool {
    path.metadata().map(|m| m.len() > 0).unwrap_or(false)
}

/// Final path segment of an image URL, used as the local filename.
pub fn derive_filename(img_url: &str) -> String {
    Url::parse(img_url)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back())
                .map(str::to_owned)
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| {
            img_url
                .rsplit('/')
                .next()
                .unwrap_or(img_url)
                .to_owned()
        })
}
