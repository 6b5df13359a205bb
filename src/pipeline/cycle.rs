// src/pipeline/cycle.rs

//! The watch loop: fetch → extract → record → announce.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::error::Result;
use crate::services::{MeasureExtractor, Notifier, PageSource};
use crate::storage::{InsertOutcome, MeasureStore};

/// Summary of one watch cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Items listed on the page
    pub discovered: usize,
    /// Items recorded (and announced) for the first time
    pub inserted: usize,
    /// Items already present in the store
    pub already_seen: usize,
    /// Announcements that failed to send
    pub notify_failures: usize,
}

/// Drives the watch pipeline on a fixed interval.
///
/// Holds its collaborators explicitly; the watcher and the responder share
/// nothing but the store's underlying database file.
pub struct Watcher {
    source: Arc<dyn PageSource>,
    extractor: MeasureExtractor,
    store: Arc<dyn MeasureStore>,
    notifier: Arc<dyn Notifier>,
    poll_interval: Duration,
}

impl Watcher {
    pub fn new(
        source: Arc<dyn PageSource>,
        extractor: MeasureExtractor,
        store: Arc<dyn MeasureStore>,
        notifier: Arc<dyn Notifier>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            extractor,
            store,
            notifier,
            poll_interval,
        }
    }

    /// Run one full cycle.
    ///
    /// A fetch failure abandons the cycle with no store writes. Items are
    /// handled strictly in document order; each new one is recorded, then
    /// announced. A failed announcement is logged and not retried — the
    /// row stays recorded.
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let body = self.source.fetch().await?;
        let measures = self.extractor.extract(&body);

        let mut outcome = CycleOutcome {
            discovered: measures.len(),
            ..CycleOutcome::default()
        };

        for measure in &measures {
            if self.store.exists(&measure.url).await? {
                log::debug!("Measure already recorded: {}", measure.url);
                outcome.already_seen += 1;
                continue;
            }

            match self.store.insert_if_absent(measure).await? {
                InsertOutcome::AlreadyExists => {
                    // Lost a race with a concurrent writer; nothing to announce.
                    outcome.already_seen += 1;
                }
                InsertOutcome::Inserted => {
                    outcome.inserted += 1;
                    log::info!("New measure recorded: {} - {}", measure.url, measure.title);
                    if let Err(e) = self.notifier.notify(measure).await {
                        outcome.notify_failures += 1;
                        log::error!("Failed to announce {}: {}", measure.url, e);
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// Run cycles until `shutdown` flips, sleeping `poll_interval` between
    /// them. A failed cycle is logged; the next interval retries.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        loop {
            match self.run_cycle().await {
                Ok(outcome) => log::info!(
                    "Cycle complete: {} listed, {} new, {} already seen, {} announce failures",
                    outcome.discovered,
                    outcome.inserted,
                    outcome.already_seen,
                    outcome.notify_failures
                ),
                Err(e) => log::warn!("Cycle failed: {e}"),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = shutdown.changed() => {
                    log::info!("Watcher stopping");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::AppError;
    use crate::models::{Measure, SelectorConfig};
    use crate::storage::SqliteStore;

    const PAGE: &str = r#"
        <div class="main-page__content">
          <a class="main-page__content-information-link" href="/measures/1">
            <h4>Grant A</h4>
          </a>
          <a class="main-page__content-information-link" href="/measures/2">
            <h4>Grant B</h4>
          </a>
        </div>
    "#;

    struct FixedSource(String);

    #[async_trait]
    impl PageSource for FixedSource {
        async fn fetch(&self) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl PageSource for FailingSource {
        async fn fetch(&self) -> Result<String> {
            Err(AppError::config("connection refused"))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, measure: &Measure) -> Result<()> {
            self.sent.lock().unwrap().push(measure.url.clone());
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn notify(&self, _measure: &Measure) -> Result<()> {
            Err(AppError::telegram("chat unreachable"))
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        store: Arc<SqliteStore>,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let store = Arc::new(SqliteStore::open(dir.path().join("measures.db")).unwrap());
            Self { _dir: dir, store }
        }

        fn watcher(&self, source: Arc<dyn PageSource>, notifier: Arc<dyn Notifier>) -> Watcher {
            let extractor =
                MeasureExtractor::new(&SelectorConfig::default(), "https://it.nso.ru/measures/")
                    .unwrap();
            Watcher::new(
                source,
                extractor,
                Arc::clone(&self.store) as Arc<dyn MeasureStore>,
                notifier,
                Duration::from_secs(3600),
            )
        }
    }

    #[tokio::test]
    async fn test_new_measures_are_recorded_and_announced_in_order() {
        let fixture = Fixture::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = fixture.watcher(
            Arc::new(FixedSource(PAGE.to_string())),
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        );

        let outcome = watcher.run_cycle().await.unwrap();
        assert_eq!(
            outcome,
            CycleOutcome {
                discovered: 2,
                inserted: 2,
                already_seen: 0,
                notify_failures: 0,
            }
        );
        assert_eq!(
            notifier.sent(),
            vec![
                "https://it.nso.ru/measures/1".to_string(),
                "https://it.nso.ru/measures/2".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_second_run_on_same_page_announces_nothing() {
        let fixture = Fixture::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = fixture.watcher(
            Arc::new(FixedSource(PAGE.to_string())),
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        );

        watcher.run_cycle().await.unwrap();
        let second = watcher.run_cycle().await.unwrap();

        assert_eq!(
            second,
            CycleOutcome {
                discovered: 2,
                inserted: 0,
                already_seen: 2,
                notify_failures: 0,
            }
        );
        assert_eq!(notifier.sent().len(), 2);
        assert_eq!(fixture.store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_store_untouched() {
        let fixture = Fixture::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = fixture.watcher(
            Arc::new(FailingSource),
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        );

        assert!(watcher.run_cycle().await.is_err());
        assert_eq!(fixture.store.count().await.unwrap(), 0);
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_item_does_not_abort_batch() {
        let html = r#"
            <a class="main-page__content-information-link" href="/measures/1"><h4>One</h4></a>
            <a class="main-page__content-information-link"><h4>Broken</h4></a>
            <a class="main-page__content-information-link" href="/measures/3"><h4>Three</h4></a>
        "#;
        let fixture = Fixture::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = fixture.watcher(
            Arc::new(FixedSource(html.to_string())),
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        );

        let outcome = watcher.run_cycle().await.unwrap();
        assert_eq!(outcome.discovered, 2);
        assert_eq!(outcome.inserted, 2);
        assert_eq!(notifier.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_announcement_still_marks_measure_seen() {
        let fixture = Fixture::new();
        let watcher = fixture.watcher(
            Arc::new(FixedSource(PAGE.to_string())),
            Arc::new(FailingNotifier),
        );

        let outcome = watcher.run_cycle().await.unwrap();
        assert_eq!(outcome.inserted, 2);
        assert_eq!(outcome.notify_failures, 2);

        // Delivery is not retried once the row exists.
        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = fixture.watcher(
            Arc::new(FixedSource(PAGE.to_string())),
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        );
        let second = watcher.run_cycle().await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.already_seen, 2);
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let fixture = Fixture::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = fixture.watcher(
            Arc::new(FixedSource(PAGE.to_string())),
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        );

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(watcher.run(rx));

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("watcher did not stop")
            .unwrap();

        // The first cycle ran before the shutdown was observed.
        assert_eq!(fixture.store.count().await.unwrap(), 2);
    }
}
