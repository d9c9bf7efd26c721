//! Document Manager
//!
//! Owns the uploaded document collection and drives each document through
//! `uploading -> processing -> ready` (or `error`):
//! - One tokio task per submitted file, timelines run independently
//! - Whole-record replace-by-id under a single write lock
//! - Every change published on a broadcast channel
//!
//! Removal is final. Steps that resume after their document was removed
//! find no record to replace, emit nothing and stop the task.

use std::sync::Arc;

use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::pacer::{Pacer, TokioPacer};
use super::source::FileSource;
use super::types::{
    Document, DocumentEvent, DocumentStatus, IngestError, Notification, PROGRESS_COMPLETE,
};
use crate::config::LifecycleConfig;

// ============================================================================
// Document Manager
// ============================================================================

/// Manages the document collection and its intake tasks
#[derive(Clone)]
pub struct DocumentManager {
    inner: Arc<DocumentManagerInner>,
}

struct DocumentManagerInner {
    /// Documents in submission order
    documents: RwLock<Vec<Document>>,

    /// Change feed for renderers and notification sinks
    events: broadcast::Sender<DocumentEvent>,

    /// Intake tasks that may still be running
    tasks: Mutex<Vec<JoinHandle<()>>>,

    pacer: Arc<dyn Pacer>,

    config: LifecycleConfig,
}

/// How an intake task ended without error
enum Flow {
    Completed,
    /// The document was removed while the task was suspended
    Withdrawn,
}

impl DocumentManager {
    /// Create a manager that waits on the tokio timer
    pub fn new(config: LifecycleConfig) -> Self {
        Self::with_pacer(config, Arc::new(TokioPacer))
    }

    /// Create a manager with a custom delay strategy
    pub fn with_pacer(config: LifecycleConfig, pacer: Arc<dyn Pacer>) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));

        Self {
            inner: Arc::new(DocumentManagerInner {
                documents: RwLock::new(Vec::new()),
                events,
                tasks: Mutex::new(Vec::new()),
                pacer,
                config,
            }),
        }
    }

    /// Receive every event published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<DocumentEvent> {
        self.inner.events.subscribe()
    }

    // ========================================================================
    // Intake
    // ========================================================================

    /// Take files into the collection
    ///
    /// Each file gets its record (uploading, 0%) before this returns. The
    /// rest of its lifecycle runs on its own task, so one slow file never
    /// holds back another.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime. The check runs before
    /// any record is inserted, so the collection is left untouched.
    pub fn submit<I, F>(&self, files: I) -> Vec<Uuid>
    where
        I: IntoIterator<Item = F>,
        F: FileSource,
    {
        let runtime = Handle::current();
        let mut ids = Vec::new();

        for file in files {
            let document = Document::new(file.name(), file.size(), file.mime_type());
            let id = document.id();
            self.insert(document.clone());

            tracing::info!(
                document_id = %id,
                file_name = %file.name(),
                file_size = file.size(),
                mime_type = %file.mime_type(),
                "Accepted document for upload"
            );

            let manager = self.clone();
            let handle = runtime.spawn(async move {
                manager.run_intake(document, file).await;
            });

            let mut tasks = self.inner.tasks.lock();
            tasks.retain(|task| !task.is_finished());
            tasks.push(handle);

            ids.push(id);
        }

        ids
    }

    /// Remove a document
    ///
    /// Unknown ids are ignored. Returns whether a record was removed.
    pub fn remove(&self, id: Uuid) -> bool {
        let removed = {
            let mut documents = self.inner.documents.write();
            match documents.iter().position(|d| d.id() == id) {
                Some(index) => {
                    let document = documents.remove(index);
                    let _ = self.inner.events.send(DocumentEvent::Removed(id));
                    Some(document)
                }
                None => None,
            }
        };

        match removed {
            Some(document) => {
                tracing::info!(
                    document_id = %id,
                    file_name = %document.name(),
                    status = %document.status(),
                    "Removed document"
                );
                true
            }
            None => false,
        }
    }

    /// Wait for every intake task started so far
    pub async fn settle(&self) {
        loop {
            let handles = std::mem::take(&mut *self.inner.tasks.lock());
            if handles.is_empty() {
                break;
            }

            for result in join_all(handles).await {
                if let Err(e) = result {
                    tracing::error!(error = %e, "Document intake task aborted");
                }
            }
        }
    }

    // ========================================================================
    // Query Methods
    // ========================================================================

    /// Snapshot of the collection in submission order
    pub fn documents(&self) -> Vec<Document> {
        self.inner.documents.read().clone()
    }

    pub fn get(&self, id: Uuid) -> Option<Document> {
        self.inner
            .documents
            .read()
            .iter()
            .find(|d| d.id() == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.documents.read().is_empty()
    }

    pub fn ready_count(&self) -> usize {
        self.inner
            .documents
            .read()
            .iter()
            .filter(|d| d.status() == DocumentStatus::Ready)
            .count()
    }

    /// Whether at least one document can be asked about
    pub fn has_ready_documents(&self) -> bool {
        self.ready_count() > 0
    }

    // ========================================================================
    // Intake Pipeline
    // ========================================================================

    async fn run_intake<F: FileSource>(&self, mut document: Document, file: F) {
        let id = document.id();

        match self.ingest(&mut document, &file).await {
            Ok(Flow::Completed) => {
                tracing::info!(
                    document_id = %id,
                    file_name = %document.name(),
                    "Document ready for questions"
                );
            }
            Ok(Flow::Withdrawn) => {
                tracing::debug!(
                    document_id = %id,
                    file_name = %document.name(),
                    "Document removed during intake, dropping remaining steps"
                );
            }
            Err(e) => {
                tracing::warn!(
                    document_id = %id,
                    file_name = %document.name(),
                    error = %e,
                    "Failed to process document"
                );

                if let Err(e) = document.mark_failed() {
                    tracing::error!(document_id = %id, error = %e, "Cannot mark document as failed");
                    return;
                }
                let notice = Notification::Failed {
                    document_id: id,
                    name: document.name().to_string(),
                };
                self.replace(&document, Some(notice));
            }
        }
    }

    async fn ingest<F: FileSource>(
        &self,
        document: &mut Document,
        file: &F,
    ) -> Result<Flow, IngestError> {
        let config = &self.inner.config;
        let step = config.progress_step.max(1);

        while document.progress() < PROGRESS_COMPLETE {
            self.inner.pacer.pause(config.tick_interval).await;

            let next = document.progress().saturating_add(step).min(PROGRESS_COMPLETE);
            document.advance_progress(next)?;
            if !self.replace(document, None) {
                return Ok(Flow::Withdrawn);
            }

            tracing::debug!(document_id = %document.id(), progress = next, "Upload progress");
        }

        let content = file.read_text().await?;
        document.begin_processing(content)?;
        if !self.replace(document, None) {
            return Ok(Flow::Withdrawn);
        }

        self.inner.pacer.pause(config.analysis_delay).await;

        document.mark_ready()?;
        let notice = Notification::Ready {
            document_id: document.id(),
            name: document.name().to_string(),
        };
        if !self.replace(document, Some(notice)) {
            return Ok(Flow::Withdrawn);
        }

        Ok(Flow::Completed)
    }

    // ========================================================================
    // Collection Writes
    // ========================================================================

    fn insert(&self, document: Document) {
        let mut documents = self.inner.documents.write();
        documents.push(document.clone());
        let _ = self.inner.events.send(DocumentEvent::Updated(document));
    }

    /// Replace an existing record, publishing the update and an optional
    /// notice. Returns false when the id is no longer in the collection.
    fn replace(&self, document: &Document, notice: Option<Notification>) -> bool {
        let mut documents = self.inner.documents.write();

        let Some(slot) = documents.iter_mut().find(|d| d.id() == document.id()) else {
            return false;
        };
        *slot = document.clone();

        let _ = self.inner.events.send(DocumentEvent::Updated(document.clone()));
        if let Some(notice) = notice {
            let _ = self.inner.events.send(DocumentEvent::Notice(notice));
        }

        true
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::{InstantPacer, MemoryFile};
    use std::time::Duration;
    use tokio::sync::{broadcast::error::TryRecvError, Notify};

    fn test_manager() -> DocumentManager {
        DocumentManager::with_pacer(LifecycleConfig::default(), Arc::new(InstantPacer))
    }

    fn drain(rx: &mut broadcast::Receiver<DocumentEvent>) -> Vec<DocumentEvent> {
        let mut events = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                Err(TryRecvError::Lagged(n)) => panic!("lagged by {} events", n),
            }
        }
        events
    }

    fn notices(events: &[DocumentEvent]) -> Vec<Notification> {
        events
            .iter()
            .filter_map(|e| match e {
                DocumentEvent::Notice(n) => Some(n.clone()),
                _ => None,
            })
            .collect()
    }

    /// Panics if `id` published anything after its removal event
    fn assert_silent_after_removal(events: &[DocumentEvent], id: Uuid) {
        let removed_at = events
            .iter()
            .position(|e| matches!(e, DocumentEvent::Removed(r) if *r == id))
            .expect("no removal event");

        for event in &events[removed_at + 1..] {
            match event {
                DocumentEvent::Updated(d) => assert_ne!(d.id(), id, "update after removal"),
                DocumentEvent::Notice(n) => assert_ne!(n.document_id(), id, "notice after removal"),
                DocumentEvent::Removed(r) => assert_ne!(*r, id, "removed twice"),
            }
        }
    }

    /// Pacer that holds every pause of one length until released and
    /// yields on the rest
    struct GatedPacer {
        held: Duration,
        gate: Arc<Notify>,
    }

    #[async_trait::async_trait]
    impl Pacer for GatedPacer {
        async fn pause(&self, duration: Duration) {
            if duration == self.held {
                self.gate.notified().await;
            } else {
                tokio::task::yield_now().await;
            }
        }
    }

    fn gated_manager(held: fn(&LifecycleConfig) -> Duration) -> (DocumentManager, Arc<Notify>) {
        let config = LifecycleConfig {
            tick_interval: Duration::from_millis(1),
            analysis_delay: Duration::from_millis(50),
            ..LifecycleConfig::default()
        };
        let gate = Arc::new(Notify::new());
        let pacer = GatedPacer {
            held: held(&config),
            gate: gate.clone(),
        };
        (DocumentManager::with_pacer(config, Arc::new(pacer)), gate)
    }

    /// Source whose read blocks until released
    struct GatedFile {
        inner: MemoryFile,
        gate: Arc<Notify>,
    }

    #[async_trait::async_trait]
    impl FileSource for GatedFile {
        fn name(&self) -> &str {
            self.inner.name()
        }

        fn size(&self) -> u64 {
            self.inner.size()
        }

        fn mime_type(&self) -> &str {
            self.inner.mime_type()
        }

        async fn read_text(&self) -> Result<String, IngestError> {
            self.gate.notified().await;
            self.inner.read_text().await
        }
    }

    #[tokio::test]
    async fn test_submit_inserts_uploading_records() {
        let manager = test_manager();

        let ids = manager.submit(vec![
            MemoryFile::text("same.txt", "one"),
            MemoryFile::text("same.txt", "two"),
        ]);

        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);

        let documents = manager.documents();
        assert_eq!(documents.len(), 2);
        assert!(documents.iter().all(|d| d.status() == DocumentStatus::Uploading));
        assert!(documents.iter().all(|d| d.progress() == 0));

        manager.settle().await;
        assert_eq!(manager.ready_count(), 2);
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_complete() {
        let manager = test_manager();
        let mut rx = manager.subscribe();

        let id = manager.submit(vec![MemoryFile::text("a.txt", "alpha beta")])[0];
        manager.settle().await;

        let updates: Vec<Document> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                DocumentEvent::Updated(d) if d.id() == id => Some(d),
                _ => None,
            })
            .collect();

        let uploading: Vec<u8> = updates
            .iter()
            .take_while(|d| d.status() == DocumentStatus::Uploading)
            .map(|d| d.progress())
            .collect();
        assert_eq!(uploading, vec![0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);

        let statuses: Vec<DocumentStatus> = updates
            .iter()
            .skip(uploading.len())
            .map(|d| d.status())
            .collect();
        assert_eq!(statuses, vec![DocumentStatus::Processing, DocumentStatus::Ready]);
        assert!(updates.iter().skip(uploading.len()).all(|d| d.progress() == 100));
    }

    #[tokio::test]
    async fn test_event_count_matches_config_estimate() {
        for step in [10, 30, 100] {
            let config = LifecycleConfig {
                progress_step: step,
                ..LifecycleConfig::default()
            };
            let manager = DocumentManager::with_pacer(config.clone(), Arc::new(InstantPacer));
            let mut rx = manager.subscribe();

            manager.submit(vec![MemoryFile::text("a.txt", "alpha")]);
            manager.settle().await;

            assert_eq!(drain(&mut rx).len(), config.events_per_document(), "step {}", step);
        }
    }

    #[test]
    fn test_submit_outside_runtime_leaves_collection_untouched() {
        let manager = test_manager();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            manager.submit(vec![MemoryFile::text("a.txt", "alpha")])
        }));

        assert!(result.is_err());
        assert!(manager.is_empty());
    }

    #[tokio::test]
    async fn test_uneven_step_still_lands_on_100() {
        let config = LifecycleConfig {
            progress_step: 30,
            ..LifecycleConfig::default()
        };
        let manager = DocumentManager::with_pacer(config, Arc::new(InstantPacer));
        let mut rx = manager.subscribe();

        manager.submit(vec![MemoryFile::text("a.txt", "alpha")]);
        manager.settle().await;

        let progress: Vec<u8> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                DocumentEvent::Updated(d) if d.status() == DocumentStatus::Uploading => Some(d.progress()),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![0, 30, 60, 90, 100]);
    }

    #[tokio::test]
    async fn test_unreadable_file_is_retained_as_error() {
        let manager = test_manager();
        let mut rx = manager.subscribe();

        let id = manager.submit(vec![MemoryFile::new(
            "scan.pdf",
            "application/pdf",
            vec![0xff, 0xfe, 0x00, 0x81],
        )])[0];
        manager.settle().await;

        let document = manager.get(id).unwrap();
        assert_eq!(document.status(), DocumentStatus::Error);
        assert!(document.content().is_none());

        let notices = notices(&drain(&mut rx));
        assert_eq!(notices.len(), 1);
        assert!(notices[0].is_failure());
        assert_eq!(notices[0].description(), "Failed to process scan.pdf");
        assert!(!manager.has_ready_documents());
    }

    #[tokio::test]
    async fn test_failure_does_not_affect_other_documents() {
        let manager = test_manager();

        let ids = manager.submit(vec![
            MemoryFile::new("bad.txt", "text/plain", vec![0xc3, 0x28]),
            MemoryFile::text("good.txt", "fine words here"),
        ]);
        manager.settle().await;

        assert_eq!(manager.get(ids[0]).unwrap().status(), DocumentStatus::Error);
        assert_eq!(manager.get(ids[1]).unwrap().status(), DocumentStatus::Ready);
        assert_eq!(manager.get(ids[1]).unwrap().content(), Some("fine words here"));
    }

    #[tokio::test]
    async fn test_remove_twice_is_noop() {
        let manager = test_manager();
        let ids = manager.submit(vec![
            MemoryFile::text("a.txt", "a"),
            MemoryFile::text("b.txt", "b"),
        ]);
        manager.settle().await;

        assert!(manager.remove(ids[0]));
        let after_first = manager.documents();

        assert!(!manager.remove(ids[0]));
        assert_eq!(manager.documents(), after_first);
        assert_eq!(manager.len(), 1);
        assert!(!manager.remove(Uuid::new_v4()));
    }

    #[tokio::test]
    async fn test_removal_during_intake_is_final() {
        let manager = test_manager();
        let mut rx = manager.subscribe();
        let gate = Arc::new(Notify::new());

        let id = manager.submit(vec![GatedFile {
            inner: MemoryFile::text("slow.txt", "some slow text"),
            gate: gate.clone(),
        }])[0];

        // Let the upload ticks run until the task parks on the read
        while manager.get(id).map(|d| d.progress()) != Some(100) {
            tokio::task::yield_now().await;
        }

        assert!(manager.remove(id));
        gate.notify_one();
        manager.settle().await;

        assert!(manager.get(id).is_none());
        assert!(manager.is_empty());

        let events = drain(&mut rx);
        assert!(matches!(events.last(), Some(DocumentEvent::Removed(r)) if *r == id));
        assert_silent_after_removal(&events, id);
        assert!(notices(&events).is_empty());
    }

    #[tokio::test]
    async fn test_removal_during_tick_pause_is_final() {
        let (manager, gate) = gated_manager(|c| c.tick_interval);
        let mut rx = manager.subscribe();

        let id = manager.submit(vec![MemoryFile::text("a.txt", "alpha beta")])[0];

        // Release one tick, then remove while the next one is held
        gate.notify_one();
        while manager.get(id).map(|d| d.progress()) != Some(10) {
            tokio::task::yield_now().await;
        }

        assert!(manager.remove(id));
        gate.notify_one();
        manager.settle().await;

        assert!(manager.is_empty());

        let events = drain(&mut rx);
        assert_silent_after_removal(&events, id);
        assert!(notices(&events).is_empty());
        assert!(events.iter().all(|e| match e {
            DocumentEvent::Updated(d) => d.progress() <= 10,
            _ => true,
        }));
    }

    #[tokio::test]
    async fn test_removal_during_analysis_pause_is_final() {
        let (manager, gate) = gated_manager(|c| c.analysis_delay);
        let mut rx = manager.subscribe();

        let id = manager.submit(vec![MemoryFile::text("a.txt", "alpha beta")])[0];

        while manager.get(id).map(|d| d.status()) != Some(DocumentStatus::Processing) {
            tokio::task::yield_now().await;
        }

        assert!(manager.remove(id));
        gate.notify_one();
        manager.settle().await;

        assert!(manager.is_empty());
        assert!(!manager.has_ready_documents());

        let events = drain(&mut rx);
        assert_silent_after_removal(&events, id);
        assert!(notices(&events).is_empty());
        assert!(!events.iter().any(|e| matches!(
            e,
            DocumentEvent::Updated(d) if d.status() == DocumentStatus::Ready
        )));
    }

    #[tokio::test]
    async fn test_documents_progress_independently() {
        let manager = test_manager();
        let gate = Arc::new(Notify::new());

        let slow = manager.submit(vec![GatedFile {
            inner: MemoryFile::text("slow.txt", "waiting"),
            gate: gate.clone(),
        }])[0];
        let fast = manager.submit(vec![MemoryFile::text("fast.txt", "quick")])[0];

        while manager.get(fast).map(|d| d.status()) != Some(DocumentStatus::Ready) {
            tokio::task::yield_now().await;
        }
        assert_eq!(manager.get(slow).unwrap().status(), DocumentStatus::Uploading);

        gate.notify_one();
        manager.settle().await;
        assert_eq!(manager.get(slow).unwrap().status(), DocumentStatus::Ready);

        let names: Vec<String> = manager.documents().iter().map(|d| d.name().to_string()).collect();
        assert_eq!(names, vec!["slow.txt", "fast.txt"]);
    }
}
