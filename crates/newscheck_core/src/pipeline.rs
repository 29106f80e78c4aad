//! crates/newscheck_core/src/pipeline.rs
//!
//! The history view's list derivation pipeline.
//!
//! A driver task owns the view state and folds five inputs (refresh, search,
//! status, sort, page) into one `ViewSnapshot` published on a watch channel.
//! Only a refresh causes network traffic. Every refresh is tagged with a
//! generation number and a completed fetch is applied only if it belongs to
//! the latest generation, so an older fetch that resolves late never
//! overwrites a newer one. Earlier fetches are not aborted; their results are
//! dropped on arrival.

use futures::Stream;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::derive::{apply_filters, clamp_window, page_slice};
use crate::domain::{FilterState, PageWindow, Record, SortOrder, StatusFilter, ViewSnapshot};
use crate::ports::{PortError, PortResult, RecordSource};

/// One edit to the view's inputs, applied in the order it was made.
#[derive(Debug, Clone)]
enum ViewInput {
    Refresh,
    Search(String),
    Status(StatusFilter),
    Sort(SortOrder),
    PageIndex(usize),
    PageSize(usize),
}

type Fetched = (u64, PortResult<Vec<Record>>);

//=========================================================================================
// HistoryView (the subscription handle)
//=========================================================================================

/// A live, filtered and paginated view of the user's history.
///
/// Opening the view subscribes (and fires the initial refresh); dropping or
/// closing it unsubscribes. Filters start from their defaults on every open.
pub struct HistoryView {
    source: Arc<dyn RecordSource>,
    inputs: mpsc::UnboundedSender<ViewInput>,
    view: watch::Receiver<ViewSnapshot>,
    shutdown: CancellationToken,
    driver: Option<JoinHandle<()>>,
}

impl HistoryView {
    /// Subscribes to the record source and fires the initial refresh.
    pub fn open(source: Arc<dyn RecordSource>, page_size: usize) -> Self {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        let initial = ViewSnapshot {
            page: PageWindow::first(page_size),
            loading: true,
            ..ViewSnapshot::default()
        };
        let (view_tx, view_rx) = watch::channel(initial);
        let shutdown = CancellationToken::new();

        let driver = Driver {
            source: source.clone(),
            view_tx,
            fetch_tx,
            fetched: None,
            derived: Vec::new(),
            filters: FilterState::default(),
            page: PageWindow::first(page_size),
            latest_generation: 0,
            loading: false,
            error: None,
            stale_results: 0,
        };
        let handle = tokio::spawn(driver.run(input_rx, fetch_rx, shutdown.clone()));

        let view = Self {
            source,
            inputs: input_tx,
            view: view_rx,
            shutdown,
            driver: Some(handle),
        };
        view.refresh();
        view
    }

    pub fn refresh(&self) {
        self.push(ViewInput::Refresh);
    }

    pub fn set_search(&self, search: impl Into<String>) {
        self.push(ViewInput::Search(search.into()));
    }

    pub fn set_status(&self, status: StatusFilter) {
        self.push(ViewInput::Status(status));
    }

    pub fn set_sort(&self, sort: SortOrder) {
        self.push(ViewInput::Sort(sort));
    }

    pub fn set_page(&self, index: usize) {
        self.push(ViewInput::PageIndex(index));
    }

    pub fn set_page_size(&self, size: usize) {
        self.push(ViewInput::PageSize(size));
    }

    fn push(&self, input: ViewInput) {
        if self.inputs.send(input).is_err() {
            warn!("History view is closed; input ignored.");
        }
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> ViewSnapshot {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.view.clone()
    }

    /// Every published snapshot, starting with the current one.
    pub fn updates(&self) -> impl Stream<Item = ViewSnapshot> {
        let mut rx = self.view.clone();
        async_stream::stream! {
            loop {
                let snapshot = rx.borrow_and_update().clone();
                yield snapshot;
                if rx.changed().await.is_err() {
                    break;
                }
            }
        }
    }

    /// Waits for the first snapshot satisfying `predicate`.
    pub async fn wait_for<F>(&self, mut predicate: F) -> PortResult<ViewSnapshot>
    where
        F: FnMut(&ViewSnapshot) -> bool,
    {
        let mut rx = self.view.clone();
        let snapshot = rx
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| PortError::Unexpected("history view closed".to_string()))?
            .clone();
        Ok(snapshot)
    }

    /// Deletes a record and refreshes on success.
    ///
    /// A failed delete leaves the view untouched and fires no refresh.
    pub async fn delete(&self, id: &str) -> PortResult<()> {
        if let Err(e) = self.source.delete_by_id(id).await {
            warn!("Failed to delete record {}: {}", id, e);
            return Err(e);
        }
        info!("Deleted record {}", id);
        self.refresh();
        Ok(())
    }

    /// Unsubscribes and waits for the driver to stop.
    pub async fn close(mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.driver.take() {
            if let Err(e) = handle.await {
                error!("History view driver ended abnormally: {:?}", e);
            }
        }
    }
}

impl Drop for HistoryView {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

//=========================================================================================
// Driver (owns the view state)
//=========================================================================================

struct Driver {
    source: Arc<dyn RecordSource>,
    view_tx: watch::Sender<ViewSnapshot>,
    fetch_tx: mpsc::UnboundedSender<Fetched>,
    /// Records of the latest applied fetch, in fetch order.
    fetched: Option<Vec<Record>>,
    /// `fetched` after search, status and sort.
    derived: Vec<Record>,
    filters: FilterState,
    page: PageWindow,
    latest_generation: u64,
    loading: bool,
    error: Option<String>,
    stale_results: u64,
}

impl Driver {
    async fn run(
        mut self,
        mut inputs: mpsc::UnboundedReceiver<ViewInput>,
        mut fetched: mpsc::UnboundedReceiver<Fetched>,
        shutdown: CancellationToken,
    ) {
        debug!("History view driver started.");
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                Some((generation, result)) = fetched.recv() => {
                    self.on_fetched(generation, result);
                }
                input = inputs.recv() => match input {
                    Some(input) => self.on_input(input),
                    None => break,
                },
            }
        }
        debug!("History view driver stopped.");
    }

    fn on_input(&mut self, input: ViewInput) {
        match input {
            ViewInput::Refresh => {
                self.start_fetch();
                self.publish();
            }
            ViewInput::Search(search) => {
                self.filters.search = search;
                self.refilter();
            }
            ViewInput::Status(status) => {
                self.filters.status = status;
                self.refilter();
            }
            ViewInput::Sort(sort) => {
                self.filters.sort = sort;
                self.refilter();
            }
            ViewInput::PageIndex(index) => {
                self.page = PageWindow::new(index, self.page.size);
                self.publish();
            }
            ViewInput::PageSize(size) => {
                self.page = PageWindow::first(size);
                self.publish();
            }
        }
    }

    /// Issues exactly one `list_history` call for this refresh.
    fn start_fetch(&mut self) {
        self.latest_generation += 1;
        self.loading = true;
        let generation = self.latest_generation;
        let source = self.source.clone();
        let done = self.fetch_tx.clone();
        debug!("Fetching history (generation {}).", generation);
        tokio::spawn(async move {
            let result = source.list_history().await;
            // The view may already be closed.
            let _ = done.send((generation, result));
        });
    }

    fn on_fetched(&mut self, generation: u64, result: PortResult<Vec<Record>>) {
        if generation != self.latest_generation {
            debug!(
                "Discarding stale history fetch (generation {}, latest {}).",
                generation, self.latest_generation
            );
            self.stale_results += 1;
            self.publish();
            return;
        }

        self.loading = false;
        match result {
            Ok(records) => {
                info!("History loaded: {} records.", records.len());
                self.fetched = Some(records);
                self.error = None;
                self.derived = self.derive();
            }
            Err(e) => {
                error!("Failed to load history: {}", e);
                self.error = Some(e.to_string());
            }
        }
        self.publish();
    }

    /// A filter or sort edit: re-derive and go back to the first page.
    fn refilter(&mut self) {
        self.derived = self.derive();
        self.page = PageWindow::first(self.page.size);
        self.publish();
    }

    fn derive(&self) -> Vec<Record> {
        match &self.fetched {
            Some(records) => apply_filters(records, &self.filters),
            None => Vec::new(),
        }
    }

    /// Re-slices the derived list; never re-filters.
    fn publish(&mut self) {
        self.page = clamp_window(self.derived.len(), self.page);
        let snapshot = ViewSnapshot {
            records: self.derived.clone(),
            page: self.page,
            visible: page_slice(&self.derived, self.page).to_vec(),
            filters: self.filters.clone(),
            loading: self.loading,
            error: self.error.clone(),
            generation: self.latest_generation,
            stale_results: self.stale_results,
        };
        self.view_tx.send_replace(snapshot);
    }
}
