//! Content root watcher.
//!
//! Watches the content tree for edits to YAML/JSON files and re-runs
//! validation after each debounced batch of changes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::library::{FsSource, LoadError};
use crate::validation::{ValidationReport, ValidationSettings, Validator};

/// Errors that can occur with the watcher
#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("Watch directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),
}

/// Configuration for the watcher
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Content root to watch recursively
    pub root: PathBuf,

    /// Quiet period before a batch of events is delivered
    pub debounce: Duration,

    /// Loader ignore globs
    pub ignore: Vec<String>,

    pub settings: ValidationSettings,
}

impl WatchConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            debounce: Duration::from_secs(1),
            ignore: FsSource::default_ignore_patterns(),
            settings: ValidationSettings::default(),
        }
    }

    /// Check if the watch path exists
    pub fn validate(&self) -> Result<(), WatcherError> {
        if !self.root.exists() {
            return Err(WatcherError::DirectoryNotFound(self.root.clone()));
        }
        Ok(())
    }
}

/// Sent after every re-validation
#[derive(Debug, Clone)]
pub struct RevalidationEvent {
    /// Content files that changed in this batch
    pub changed: Vec<PathBuf>,

    pub report: ValidationReport,

    pub validated_at: DateTime<Utc>,
}

/// Re-validates the corpus whenever content files change
pub struct ContentWatcher {
    config: WatchConfig,
}

impl ContentWatcher {
    pub fn new(config: WatchConfig) -> Self {
        Self { config }
    }

    /// Get the current configuration
    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Load and validate the content root once
    pub async fn check_once(&self) -> Result<ValidationReport, WatcherError> {
        self.config.validate()?;
        revalidate(&self.config).await
    }

    /// Watch the content root and emit a report per batch of changes.
    ///
    /// Runs until stopped via the returned handle or the receiver is dropped.
    pub async fn watch(
        &self,
    ) -> Result<(mpsc::Receiver<RevalidationEvent>, WatchHandle), WatcherError> {
        self.config.validate()?;

        let (event_tx, event_rx) = mpsc::channel::<RevalidationEvent>(16);
        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);

        let config = self.config.clone();

        let handle = tokio::spawn(async move {
            if let Err(e) = run_watcher(config, event_tx, &mut stop_rx).await {
                tracing::error!("Watcher error: {}", e);
            }
        });

        Ok((
            event_rx,
            WatchHandle {
                stop_tx,
                task: handle,
            },
        ))
    }
}

/// Handle to control the watcher
pub struct WatchHandle {
    stop_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl WatchHandle {
    /// Stop the watcher
    pub async fn stop(self) -> Result<()> {
        let _ = self.stop_tx.send(()).await;
        self.task.await?;
        Ok(())
    }
}

/// Whether a changed path can affect the corpus
pub fn is_relevant(path: &Path) -> bool {
    FsSource::is_content_path(path)
}

async fn revalidate(config: &WatchConfig) -> Result<ValidationReport, WatcherError> {
    let source = FsSource::new(&config.root).with_ignore_patterns(&config.ignore)?;
    let validator = Validator::new(config.settings.clone());
    Ok(validator.validate_source(&source).await?)
}

/// Internal watcher loop
async fn run_watcher(
    config: WatchConfig,
    event_tx: mpsc::Sender<RevalidationEvent>,
    stop_rx: &mut mpsc::Receiver<()>,
) -> Result<(), WatcherError> {
    let (tx, rx) = std::sync::mpsc::channel();

    let mut debouncer = new_debouncer(config.debounce, tx)?;
    debouncer
        .watcher()
        .watch(&config.root, RecursiveMode::Recursive)?;

    tracing::info!("Watching {} for content changes", config.root.display());

    loop {
        // Check for stop signal
        if stop_rx.try_recv().is_ok() {
            tracing::info!("Watcher stopping...");
            break;
        }

        let mut changed: Vec<PathBuf> = Vec::new();

        match rx.recv_timeout(Duration::from_millis(500)) {
            Ok(Ok(events)) => {
                for event in events {
                    if is_relevant(&event.path) && !changed.contains(&event.path) {
                        changed.push(event.path);
                    }
                }
            }
            Ok(Err(e)) => {
                tracing::warn!("Watcher error: {:?}", e);
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!("Watcher channel disconnected");
                break;
            }
        }

        if !changed.is_empty() {
            changed.sort();
            tracing::debug!("{} content file(s) changed", changed.len());

            match revalidate(&config).await {
                Ok(report) => {
                    let event = RevalidationEvent {
                        changed,
                        report,
                        validated_at: Utc::now(),
                    };
                    if event_tx.send(event).await.is_err() {
                        tracing::debug!("Report receiver dropped, stopping watcher");
                        break;
                    }
                }
                Err(e) => tracing::warn!("Re-validation failed: {}", e),
            }
        }

        // Small sleep to prevent busy loop
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_relevant_paths() {
        assert!(is_relevant(Path::new("content/cardio/heart-failure.yaml")));
        assert!(is_relevant(Path::new("content/cardio/index.JSON")));
        assert!(!is_relevant(Path::new("content/cardio/notes.md")));
        assert!(!is_relevant(Path::new("content/cardio")));
    }

    #[tokio::test]
    async fn test_missing_root_rejected() {
        let temp = TempDir::new().unwrap();
        let watcher = ContentWatcher::new(WatchConfig::new(temp.path().join("missing")));

        assert!(matches!(
            watcher.check_once().await,
            Err(WatcherError::DirectoryNotFound(_))
        ));
        assert!(watcher.watch().await.is_err());
    }

    #[tokio::test]
    async fn test_check_once_reports_parse_failure() {
        let temp = TempDir::new().unwrap();
        tokio::fs::write(temp.path().join("broken.yaml"), "id: [unterminated")
            .await
            .unwrap();

        let watcher = ContentWatcher::new(WatchConfig::new(temp.path()));
        let report = watcher.check_once().await.unwrap();

        assert_eq!(report.error_count(), 1);
        assert_eq!(report.issues[0].file, "broken.yaml");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_edit_triggers_revalidation() {
        use crate::validation::IssueCategory;

        let temp = TempDir::new().unwrap();
        let config = WatchConfig {
            debounce: Duration::from_millis(200),
            ..WatchConfig::new(temp.path())
        };
        let watcher = ContentWatcher::new(config);
        let (mut events, handle) = watcher.watch().await.unwrap();

        // Let the debouncer register its watch
        tokio::time::sleep(Duration::from_millis(300)).await;
        tokio::fs::write(temp.path().join("broken.yaml"), "id: [unterminated")
            .await
            .unwrap();

        let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
            .await
            .expect("no revalidation within timeout")
            .expect("event channel closed");

        assert_eq!(event.changed.len(), 1);
        assert!(event.changed[0].ends_with("broken.yaml"));
        assert_eq!(event.report.error_count(), 1);
        assert_eq!(event.report.issues[0].category, IssueCategory::Schema);
        assert_eq!(event.report.issues[0].file, "broken.yaml");

        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_watch_stops_cleanly() {
        let temp = TempDir::new().unwrap();
        let watcher = ContentWatcher::new(WatchConfig::new(temp.path()));

        let (_events, handle) = watcher.watch().await.unwrap();
        handle.stop().await.unwrap();
    }
}
