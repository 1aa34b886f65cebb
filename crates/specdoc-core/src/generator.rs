//! Composition root for a documentation run.
//!
//! [`Generator`] reads the discovered files, builds batches, writes the
//! document header, and then dispatches batches to the backend in order,
//! appending each non-empty result before moving on.
//!
//! With the default concurrency of one the run is strictly sequential and the
//! configured delay is slept between one call finishing and the next starting.
//! With higher concurrency several calls may be in flight, call starts are
//! spaced by the delay, and results are still appended in batch order: a
//! finished later batch waits until every earlier batch has been written.
//!
//! The first error stops the run. Whatever was appended before it stays in
//! the document.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::assembler::{BatchResult, DocumentAssembler, HeaderMeta};
use crate::backend::openai::OpenAiClient;
use crate::backend::{Backend, Invoker};
use crate::batch::{self, Batch, BatchBuilder, BatchSummary};
use crate::collect;
use crate::config::{GeneratorConfig, Ready};
use crate::prompt::SYSTEM_PROMPT;
use crate::Result;

/// Progress callback type.
///
/// Called with `(completed, total)` after each batch has been handled.
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Output document.
    pub output: PathBuf,
    /// Input files processed.
    pub files: usize,
    /// Batches dispatched.
    pub batches: usize,
    /// Batches that produced a section.
    pub recorded: usize,
    /// Batches whose text was empty.
    pub skipped: usize,
}

/// Drives one documentation run against a backend.
pub struct Generator<B: Backend> {
    invoker: Invoker<B>,
    config: GeneratorConfig,
    progress_callback: Option<ProgressCallback>,
}

impl<B: Backend> Generator<B> {
    /// Create a generator using the built-in system prompt.
    pub fn new(backend: B, config: GeneratorConfig) -> Self {
        let invoker = Invoker::new(
            backend,
            SYSTEM_PROMPT,
            config.model.clone(),
            config.reasoning_effort.clone(),
        );
        Self {
            invoker,
            config,
            progress_callback: None,
        }
    }

    /// Set progress callback.
    #[must_use]
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Run over `files`, writing the document at the configured output path.
    pub async fn run(&self, files: &[PathBuf]) -> Result<RunSummary> {
        let inputs = collect::read_inputs(files)?;
        let batches = BatchBuilder::build(&inputs, self.config.limits);
        info!(
            files = inputs.len(),
            batches = batches.len(),
            output = %self.config.output.display(),
            "Starting documentation run"
        );

        let assembler = DocumentAssembler::new(&self.config.output);
        assembler.write_header(&HeaderMeta {
            generated_at: Utc::now(),
            source: self.config.source.clone(),
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            limits: self.config.limits,
        })?;

        let mut summary = RunSummary {
            output: self.config.output.clone(),
            files: inputs.len(),
            batches: batches.len(),
            recorded: 0,
            skipped: 0,
        };

        if self.config.concurrency.get() == 1 {
            self.run_sequential(&batches, &assembler, &mut summary).await?;
        } else {
            self.run_overlapped(&batches, &assembler, &mut summary).await?;
        }

        info!(
            recorded = summary.recorded,
            skipped = summary.skipped,
            "Documentation run finished"
        );
        Ok(summary)
    }

    async fn run_sequential(
        &self,
        batches: &[Batch],
        assembler: &DocumentAssembler,
        summary: &mut RunSummary,
    ) -> Result<()> {
        for (index, batch) in batches.iter().enumerate() {
            if index > 0 {
                pause(self.config.delay).await;
            }
            debug!(batch = index + 1, files = batch.len(), "Dispatching batch");
            let text = self.invoker.invoke(batch).await?;
            self.record(assembler, index, batch, text, summary)?;
        }
        Ok(())
    }

    async fn run_overlapped(
        &self,
        batches: &[Batch],
        assembler: &DocumentAssembler,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let pacer = Pacer::new(self.config.delay);
        let pacer = &pacer;

        let mut in_order = stream::iter(batches.iter().enumerate())
            .map(|(index, batch)| async move {
                pacer.wait_turn().await;
                debug!(batch = index + 1, files = batch.len(), "Dispatching batch");
                (index, batch, self.invoker.invoke(batch).await)
            })
            .buffered(self.config.concurrency.get());

        while let Some((index, batch, text)) = in_order.next().await {
            self.record(assembler, index, batch, text?, summary)?;
        }
        Ok(())
    }

    fn record(
        &self,
        assembler: &DocumentAssembler,
        index: usize,
        batch: &Batch,
        generated_text: String,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let result = BatchResult {
            batch_index: index,
            source_paths: batch.source_paths().into_iter().map(String::from).collect(),
            generated_text,
        };

        if assembler.append_batch(&result)? {
            summary.recorded += 1;
        } else {
            summary.skipped += 1;
        }

        if let Some(cb) = &self.progress_callback {
            cb(index + 1, summary.batches);
        }
        Ok(())
    }
}

/// Spaces call starts at least `delay` apart.
struct Pacer {
    delay: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl Pacer {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_start: Mutex::new(None),
        }
    }

    async fn wait_turn(&self) {
        let mut last = self.last_start.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.delay;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        debug!(delay_ms = delay.as_millis(), "Pausing before next batch");
        tokio::time::sleep(delay).await;
    }
}

/// Build the batch plan for a dry run. No backend is contacted.
pub fn plan(config: &GeneratorConfig, files: &[PathBuf]) -> Result<Vec<BatchSummary>> {
    let inputs = collect::read_inputs(files)?;
    let batches = BatchBuilder::build(&inputs, config.limits);
    Ok(batch::plan(&batches, config.limits))
}

/// Run a validated configuration against the OpenAI-compatible backend.
pub async fn generate<F>(ready: Ready, progress: Option<F>) -> Result<RunSummary>
where
    F: Fn(usize, usize) + Send + Sync + 'static,
{
    let Ready { config, files } = ready;
    let client = OpenAiClient::new(config.backend.clone())?;
    let mut generator = Generator::new(client, config);
    if let Some(cb) = progress {
        generator = generator.with_progress(cb);
    }
    generator.run(&files).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::backend::openai::{ApiMode, BackendSettings};
    use crate::backend::{ChatRequest, StructuredResponses};
    use crate::batch::BatchLimits;
    use crate::collect::FilePattern;
    use serde_json::{Value, json};
    use std::fs;
    use std::num::NonZeroUsize;
    use std::path::Path;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::{TempDir, tempdir};

    /// Chat-only backend answering from a script; `None` means fail.
    struct ScriptedBackend {
        replies: StdMutex<Vec<Option<String>>>,
        calls: AtomicUsize,
        call_times: StdMutex<Vec<Instant>>,
        latency: Duration,
    }

    impl ScriptedBackend {
        fn new(replies: &[Option<&str>]) -> Self {
            Self {
                replies: StdMutex::new(
                    replies.iter().map(|r| r.map(str::to_string)).rev().collect(),
                ),
                calls: AtomicUsize::new(0),
                call_times: StdMutex::new(Vec::new()),
                latency: Duration::ZERO,
            }
        }

        fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = latency;
            self
        }
    }

    #[async_trait::async_trait]
    impl Backend for ScriptedBackend {
        fn probe_structured(&self) -> Result<Option<&dyn StructuredResponses>> {
            Ok(None)
        }

        async fn chat_completion(&self, _request: &ChatRequest) -> Result<Value> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.call_times.lock().expect("lock").push(Instant::now());
            let reply = self.replies.lock().expect("lock").pop().flatten();
            if !self.latency.is_zero() {
                // Later calls answer sooner.
                let divisor = u32::try_from(call + 1).unwrap_or(u32::MAX);
                tokio::time::sleep(self.latency / divisor).await;
            }
            match reply {
                Some(text) => Ok(json!({ "choices": [{ "message": { "content": text } }] })),
                None => Err(Error::Backend {
                    status: 500,
                    message: "scripted failure".to_string(),
                }),
            }
        }
    }

    fn fixture(count: usize) -> (TempDir, Vec<PathBuf>) {
        let dir = tempdir().unwrap();
        let files = (0..count)
            .map(|i| {
                let path = dir.path().join(format!("{i:02}_spec.rb"));
                fs::write(&path, format!("describe 'feature {i}' do end")).unwrap();
                path
            })
            .collect();
        (dir, files)
    }

    fn config(dir: &Path, files_per_batch: usize) -> GeneratorConfig {
        GeneratorConfig {
            source: dir.to_path_buf(),
            output: dir.join("user_docs.md"),
            limits: BatchLimits::new(
                NonZeroUsize::new(files_per_batch),
                NonZeroUsize::new(120_000).unwrap(),
            ),
            max_tokens: 24_000,
            model: "gpt-5-mini".to_string(),
            reasoning_effort: "low".to_string(),
            delay: Duration::ZERO,
            concurrency: NonZeroUsize::MIN,
            pattern: FilePattern::default(),
            backend: BackendSettings {
                api_key: "sk-test".to_string(),
                base_url: "http://127.0.0.1:9".to_string(),
                api_mode: ApiMode::Chat,
                timeout: Duration::from_secs(1),
            },
        }
    }

    #[tokio::test]
    async fn test_records_each_batch_in_order() {
        let (dir, files) = fixture(2);
        let backend = ScriptedBackend::new(&[Some("first docs"), Some("second docs")]);
        let generator = Generator::new(backend, config(dir.path(), 1));

        let summary = generator.run(&files).await.unwrap();

        assert_eq!(summary.batches, 2);
        assert_eq!(summary.recorded, 2);
        let doc = fs::read_to_string(&summary.output).unwrap();
        let one = doc.find("## Batch 1").unwrap();
        let two = doc.find("## Batch 2").unwrap();
        assert!(one < two);
        assert!(doc[one..two].contains("00_spec.rb"));
        assert!(doc[two..].contains("01_spec.rb"));
    }

    #[tokio::test]
    async fn test_empty_results_leave_header_only() {
        let (dir, files) = fixture(3);
        let backend = ScriptedBackend::new(&[Some(""), Some("   "), Some("\n")]);
        let generator = Generator::new(backend, config(dir.path(), 1));

        let summary = generator.run(&files).await.unwrap();

        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.recorded, 0);
        let doc = fs::read_to_string(&summary.output).unwrap();
        assert!(doc.starts_with("# Inferred Documentation from RSpec"));
        assert!(doc.contains("---"));
        assert!(!doc.contains("## Batch"));
    }

    #[tokio::test]
    async fn test_failure_keeps_earlier_batches() {
        let (dir, files) = fixture(3);
        let backend = ScriptedBackend::new(&[Some("kept"), None, Some("never")]);
        let generator = Generator::new(backend, config(dir.path(), 1));

        let err = generator.run(&files).await.unwrap_err();

        assert!(matches!(err, Error::Backend { status: 500, .. }));
        let doc = fs::read_to_string(dir.path().join("user_docs.md")).unwrap();
        assert!(doc.contains("## Batch 1"));
        assert!(doc.contains("kept"));
        assert!(!doc.contains("## Batch 2"));
        assert!(!doc.contains("never"));
        assert_eq!(generator.invoker.backend().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_progress_reports_every_batch() {
        let (dir, files) = fixture(3);
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let backend = ScriptedBackend::new(&[Some("a"), Some(""), Some("c")]);
        let generator = Generator::new(backend, config(dir.path(), 1))
            .with_progress(move |done, total| sink.lock().expect("lock").push((done, total)));

        generator.run(&files).await.unwrap();

        assert_eq!(*seen.lock().expect("lock"), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_separates_calls() {
        let (dir, files) = fixture(3);
        let backend = ScriptedBackend::new(&[Some("a"), Some("b"), Some("c")]);
        let mut cfg = config(dir.path(), 1);
        cfg.delay = Duration::from_secs(2);
        let generator = Generator::new(backend, cfg);

        let started = Instant::now();
        generator.run(&files).await.unwrap();

        let times = generator.invoker.backend().call_times.lock().expect("lock").clone();
        assert_eq!(times.len(), 3);
        assert!(times[0] - started < Duration::from_secs(1));
        assert!(times[1] - times[0] >= Duration::from_secs(2));
        assert!(times[2] - times[1] >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_does_not_sleep() {
        let (dir, files) = fixture(2);
        let backend = ScriptedBackend::new(&[Some("a"), Some("b")]);
        let generator = Generator::new(backend, config(dir.path(), 1));

        let started = Instant::now();
        generator.run(&files).await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapped_run_appends_in_batch_order() {
        let (dir, files) = fixture(4);
        let backend = ScriptedBackend::new(&[Some("b1"), Some("b2"), Some("b3"), Some("b4")])
            .with_latency(Duration::from_secs(4));
        let mut cfg = config(dir.path(), 1);
        cfg.concurrency = NonZeroUsize::new(4).unwrap();
        let generator = Generator::new(backend, cfg);

        let summary = generator.run(&files).await.unwrap();

        assert_eq!(summary.recorded, 4);
        let doc = fs::read_to_string(&summary.output).unwrap();
        let positions: Vec<_> = (1..=4)
            .map(|n| doc.find(&format!("## Batch {n}")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapped_run_spaces_call_starts() {
        let (dir, files) = fixture(3);
        let backend = ScriptedBackend::new(&[Some("a"), Some("b"), Some("c")]);
        let mut cfg = config(dir.path(), 1);
        cfg.concurrency = NonZeroUsize::new(3).unwrap();
        cfg.delay = Duration::from_secs(1);
        let generator = Generator::new(backend, cfg);

        generator.run(&files).await.unwrap();

        let times = generator.invoker.backend().call_times.lock().expect("lock").clone();
        assert!(times.windows(2).all(|w| w[1] - w[0] >= Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn test_missing_input_file_fails_before_header() {
        let dir = tempdir().unwrap();
        let backend = ScriptedBackend::new(&[]);
        let generator = Generator::new(backend, config(dir.path(), 1));

        let err = generator
            .run(&[dir.path().join("vanished_spec.rb")])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Io(_)));
        assert!(!dir.path().join("user_docs.md").exists());
    }

    #[test]
    fn test_plan_without_backend() {
        let (dir, files) = fixture(5);
        let summary = plan(&config(dir.path(), 2), &files).unwrap();

        assert_eq!(summary.len(), 3);
        assert_eq!(summary[2].files.len(), 1);
    }
}
