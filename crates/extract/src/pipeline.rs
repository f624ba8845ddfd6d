use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use insight_core::Statement;
use insight_import::{ImportError, Reconciler, TagClassifier};
use thiserror::Error;
use notify::event::{AccessKind, AccessMode, ModifyKind};
use notify::{EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::hash;
use crate::provider::{ExtractionProvider, ProviderError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Could not read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not process statement '{file_name}': {source}")]
    Extraction {
        file_name: String,
        #[source]
        source: ProviderError,
    },
    #[error("Could not process statement '{file_name}': {source}")]
    Malformed {
        file_name: String,
        #[source]
        source: ImportError,
    },
}

impl PipelineError {
    /// The statement the failure belongs to.
    pub fn file_name(&self) -> String {
        match self {
            PipelineError::Io { path, .. } => display_name(path),
            PipelineError::Extraction { file_name, .. } | PipelineError::Malformed { file_name, .. } => {
                file_name.clone()
            }
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Orchestrates: hash → extract (provider) → decode → reconcile.
pub struct StatementPipeline<P: ExtractionProvider> {
    provider: P,
    classifier: TagClassifier,
}

impl<P: ExtractionProvider> StatementPipeline<P> {
    pub fn new(provider: P, classifier: TagClassifier) -> Self {
        Self { provider, classifier }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Process a file on disk. The statement is named after the file.
    pub async fn process_file(&self, path: &Path) -> Result<Statement, PipelineError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.process_bytes(&display_name(path), &bytes).await
    }

    /// Process raw PDF bytes. Any provider failure or malformed response
    /// fails the whole statement; nothing partial is returned.
    pub async fn process_bytes(&self, file_name: &str, data: &[u8]) -> Result<Statement, PipelineError> {
        let digest = hash::statement_digest(data);

        let response = self
            .provider
            .extract(data)
            .await
            .map_err(|source| PipelineError::Extraction {
                file_name: file_name.to_string(),
                source,
            })?;

        let transactions = Reconciler::new(&self.classifier)
            .reconcile_response(&response)
            .map_err(|source| PipelineError::Malformed {
                file_name: file_name.to_string(),
                source,
            })?;

        info!(
            file = file_name,
            digest = &digest[..12],
            transactions = transactions.len(),
            "statement processed"
        );
        Ok(Statement::new(file_name, digest, transactions))
    }

    /// Processes files one after another, in the given order. The first
    /// failure aborts the batch and no statement from it is returned, so a
    /// caller never holds half of a multi-file upload.
    pub async fn process_batch<T: AsRef<Path>>(&self, paths: &[T]) -> Result<Vec<Statement>, PipelineError> {
        let mut statements = Vec::with_capacity(paths.len());
        for path in paths {
            statements.push(self.process_file(path.as_ref()).await?);
        }
        Ok(statements)
    }
}

// ── Watch-folder integration ──────────────────────────────────────────────────

/// How long a new file must stay untouched before it is treated as complete on
/// platforms that report no close-after-write event.
const INTAKE_QUIET_PERIOD: Duration = Duration::from_secs(2);
const INTAKE_TICK: Duration = Duration::from_millis(250);

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Decides when a file in the intake folder has finished being written.
///
/// A close-after-write makes the file ready at once. Creation and content
/// changes only start (or restart) a quiet period, and a file still empty when
/// the period ends waits for another one.
struct IntakeSettler {
    quiet: Duration,
    pending: HashMap<PathBuf, Instant>,
}

impl IntakeSettler {
    fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: HashMap::new(),
        }
    }

    /// Returns the path when the event alone makes it ready.
    fn observe(&mut self, kind: &EventKind, path: PathBuf, now: Instant) -> Option<PathBuf> {
        match kind {
            EventKind::Access(AccessKind::Close(AccessMode::Write)) if has_content(&path) => {
                self.pending.remove(&path);
                Some(path)
            }
            EventKind::Modify(ModifyKind::Metadata(_)) => None,
            EventKind::Access(AccessKind::Close(AccessMode::Write)) | EventKind::Create(_) | EventKind::Modify(_) => {
                self.pending.insert(path, now + self.quiet);
                None
            }
            EventKind::Remove(_) => {
                self.pending.remove(&path);
                None
            }
            _ => None,
        }
    }

    /// Paths whose quiet period has run out, oldest deadline first.
    fn due(&mut self, now: Instant) -> Vec<PathBuf> {
        let mut expired: Vec<(PathBuf, Instant)> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(p, d)| (p.clone(), *d))
            .collect();
        expired.sort_by_key(|(_, d)| *d);

        let mut ready = Vec::new();
        for (path, _) in expired {
            if !path.exists() {
                self.pending.remove(&path);
            } else if has_content(&path) {
                self.pending.remove(&path);
                ready.push(path);
            } else {
                self.pending.insert(path, now + self.quiet);
            }
        }
        ready
    }
}

fn has_content(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|m| m.len() > 0)
}

/// Spawn a notify watcher on `watch_dir` that sends the path of every PDF
/// written into it to `tx`, once the file is complete. Must be called inside
/// a Tokio runtime. Returns the watcher, which must be kept alive for watching
/// to continue.
pub fn spawn_intake_watcher(
    watch_dir: &Path,
    tx: mpsc::Sender<PathBuf>,
) -> notify::Result<impl notify::Watcher> {
    let (raw_tx, mut raw_rx) = mpsc::unbounded_channel::<notify::Event>();

    let mut watcher = notify::recommended_watcher(move |event: notify::Result<notify::Event>| match event {
        Ok(ev) => {
            if raw_tx.send(ev).is_err() {
                warn!("intake event dropped: watcher task has stopped");
            }
        }
        Err(e) => warn!(error = %e, "intake watcher error"),
    })?;
    watcher.watch(watch_dir, RecursiveMode::NonRecursive)?;

    tokio::spawn(async move {
        let mut settler = IntakeSettler::new(INTAKE_QUIET_PERIOD);
        let mut tick = tokio::time::interval(INTAKE_TICK);
        loop {
            let ready: Vec<PathBuf> = tokio::select! {
                event = raw_rx.recv() => match event {
                    Some(ev) => ev
                        .paths
                        .into_iter()
                        .filter(|p| is_pdf(p))
                        .filter_map(|p| settler.observe(&ev.kind, p, Instant::now()))
                        .collect(),
                    None => break,
                },
                _ = tick.tick() => settler.due(Instant::now()),
            };
            for path in ready {
                if let Err(e) = tx.send(path).await {
                    warn!(path = %e.0.display(), "intake receiver closed; stopping watcher");
                    return;
                }
            }
        }
    });

    Ok(watcher)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockProvider;
    use insight_core::Money;

    const SPINNEYS: &str = r#"[
        {"date": "2024-01-03", "detail": "SPINNEYS MALL", "type": "withdrawal", "amount": 50, "balance": 950, "tag": "SPINNEYS MALL"},
        {"date": "2024-01-03", "detail": "VAT CHG", "type": "withdrawal", "amount": 2.5, "balance": 947.5, "tag": "VAT CHG"}
    ]"#;

    fn pipeline(provider: MockProvider) -> StatementPipeline<MockProvider> {
        StatementPipeline::new(provider, TagClassifier::builtin())
    }

    fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn process_bytes_reconciles_provider_rows() {
        let stmt = pipeline(MockProvider::new(SPINNEYS))
            .process_bytes("jan.pdf", b"%PDF-jan")
            .await
            .unwrap();
        assert_eq!(stmt.file_name, "jan.pdf");
        assert_eq!(stmt.digest, hash::statement_digest(b"%PDF-jan"));
        assert_eq!(stmt.transactions.len(), 1);
        let tx = &stmt.transactions[0];
        assert_eq!(tx.detail, "SPINNEYS MALL");
        assert_eq!(tx.tag, "grocery");
        assert_eq!(tx.amount, Money::from_cents(5250));
        assert_eq!(tx.balance, Money::from_cents(94750));
    }

    #[tokio::test]
    async fn malformed_response_names_statement() {
        let err = pipeline(MockProvider::new(r#"{"oops": true}"#))
            .process_bytes("feb.pdf", b"%PDF")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Malformed { .. }));
        assert_eq!(err.file_name(), "feb.pdf");
        assert!(err.to_string().contains("feb.pdf"));
    }

    #[tokio::test]
    async fn provider_failure_names_statement() {
        let err = pipeline(MockProvider::failing("503"))
            .process_bytes("mar.pdf", b"%PDF")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Extraction { .. }));
        assert!(err.to_string().contains("mar.pdf"));
    }

    #[tokio::test]
    async fn process_file_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "april.pdf", b"%PDF-april");
        let stmt = pipeline(MockProvider::new("[]")).process_file(&path).await.unwrap();
        assert_eq!(stmt.file_name, "april.pdf");
        assert!(stmt.transactions.is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = pipeline(MockProvider::new("[]"))
            .process_file(&dir.path().join("nope.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
        assert_eq!(err.file_name(), "nope.pdf");
    }

    #[tokio::test]
    async fn batch_preserves_selection_order() {
        let dir = tempfile::tempdir().unwrap();
        let b = write(dir.path(), "b.pdf", b"B");
        let a = write(dir.path(), "a.pdf", b"A");
        let provider = MockProvider::new("[]").with_response(b"B", SPINNEYS);
        let statements = pipeline(provider).process_batch(&[b, a]).await.unwrap();
        let names: Vec<&str> = statements.iter().map(|s| s.file_name.as_str()).collect();
        assert_eq!(names, ["b.pdf", "a.pdf"]);
        assert_eq!(statements[0].transactions.len(), 1);
    }

    #[tokio::test]
    async fn batch_aborts_on_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let one = write(dir.path(), "one.pdf", b"1");
        let two = write(dir.path(), "two.pdf", b"2");
        let three = write(dir.path(), "three.pdf", b"3");
        let provider = MockProvider::new("[]").with_failure(b"2", "rate limited");
        let p = pipeline(provider);

        let err = p.process_batch(&[one, two, three]).await.unwrap_err();
        assert_eq!(err.file_name(), "two.pdf");
        // Sequential: the third file was never sent.
        assert_eq!(p.provider().calls(), 2);
    }

    fn created() -> EventKind {
        EventKind::Create(notify::event::CreateKind::File)
    }

    fn written() -> EventKind {
        EventKind::Modify(ModifyKind::Data(notify::event::DataChange::Any))
    }

    fn closed_after_write() -> EventKind {
        EventKind::Access(AccessKind::Close(AccessMode::Write))
    }

    #[test]
    fn close_after_write_is_ready_at_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "jan.pdf", b"%PDF-1.7");
        let mut settler = IntakeSettler::new(Duration::from_secs(2));
        let t0 = Instant::now();

        assert_eq!(settler.observe(&created(), path.clone(), t0), None);
        assert_eq!(settler.observe(&closed_after_write(), path.clone(), t0), Some(path));
        assert!(settler.due(t0 + Duration::from_secs(10)).is_empty());
    }

    #[test]
    fn creation_waits_for_quiet_period() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "feb.pdf", b"%PDF-1.7");
        let mut settler = IntakeSettler::new(Duration::from_secs(2));
        let t0 = Instant::now();

        settler.observe(&created(), path.clone(), t0);
        settler.observe(&written(), path.clone(), t0 + Duration::from_secs(1));
        assert!(settler.due(t0 + Duration::from_secs(2)).is_empty());
        assert_eq!(settler.due(t0 + Duration::from_secs(3)), vec![path]);
        assert!(settler.due(t0 + Duration::from_secs(9)).is_empty());
    }

    #[test]
    fn empty_file_stays_pending() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "mar.pdf", b"");
        let mut settler = IntakeSettler::new(Duration::from_secs(2));
        let t0 = Instant::now();

        assert_eq!(settler.observe(&closed_after_write(), path.clone(), t0), None);
        assert!(settler.due(t0 + Duration::from_secs(3)).is_empty());

        std::fs::write(&path, b"%PDF-1.7").unwrap();
        assert_eq!(settler.due(t0 + Duration::from_secs(6)), vec![path]);
    }

    #[test]
    fn removed_file_is_forgotten() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "apr.pdf", b"%PDF");
        let mut settler = IntakeSettler::new(Duration::from_secs(2));
        let t0 = Instant::now();

        settler.observe(&created(), path.clone(), t0);
        std::fs::remove_file(&path).unwrap();
        assert!(settler.due(t0 + Duration::from_secs(3)).is_empty());
        assert!(settler.pending.is_empty());
    }

    #[test]
    fn metadata_change_does_not_requeue() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "may.pdf", b"%PDF");
        let mut settler = IntakeSettler::new(Duration::from_secs(2));
        let touched = EventKind::Modify(ModifyKind::Metadata(notify::event::MetadataKind::Any));

        assert_eq!(settler.observe(&touched, path, Instant::now()), None);
        assert!(settler.pending.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn watcher_waits_for_slow_writer() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        let _watcher = spawn_intake_watcher(dir.path(), tx).unwrap();

        let path = dir.path().join("slow.pdf");
        let mut file = std::fs::File::create(&path).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(rx.try_recv().is_err());

        file.write_all(&[b'%'; 4096]).unwrap();
        drop(file);

        let got = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.file_name(), path.file_name());
        assert_eq!(std::fs::metadata(&got).unwrap().len(), 4096);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn watcher_delivers_every_file_to_a_full_queue() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::channel(1);
        let _watcher = spawn_intake_watcher(dir.path(), tx).unwrap();

        for name in ["a.pdf", "b.pdf", "c.pdf", "notes.txt"] {
            write(dir.path(), name, b"%PDF-1.7");
        }

        let mut names = Vec::new();
        for _ in 0..3 {
            let path = tokio::time::timeout(Duration::from_secs(10), rx.recv())
                .await
                .unwrap()
                .unwrap();
            names.push(path.file_name().unwrap().to_string_lossy().into_owned());
        }
        names.sort();
        assert_eq!(names, ["a.pdf", "b.pdf", "c.pdf"]);
    }

    #[test]
    fn pdf_filter() {
        assert!(is_pdf(Path::new("/tmp/Statement.PDF")));
        assert!(is_pdf(Path::new("march.pdf")));
        assert!(!is_pdf(Path::new("march.pdf.part")));
        assert!(!is_pdf(Path::new("notes")));
    }
}
