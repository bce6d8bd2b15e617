//! Progress reporting for flow runs.
//!
//! The scheduler drives a [`ProgressTracker`], which keeps counters for the
//! run and forwards [`ProgressUpdate`] events to an optional callback.

use crate::core::error::NodeId;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// An event emitted during a run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressUpdate {
    /// The run has started.
    Started { total_nodes: usize },
    /// A node is about to be processed.
    NodeStarted {
        node_id: NodeId,
        node_name: String,
        /// Nodes finished before this one.
        index: usize,
        total: usize,
    },
    /// A node was put back on the queue because an upstream node is pending.
    NodeDeferred { node_id: NodeId, deferrals: usize },
    /// A node has finished and its output (possibly absent) is published.
    NodeCompleted {
        node_id: NodeId,
        duration_ms: u64,
        index: usize,
        total: usize,
    },
    /// A node failed locally; its output is absent.
    NodeFailed { node_id: NodeId, message: String },
    /// A node was never reached.
    NodeSkipped { node_id: NodeId, reason: SkipReason },
    /// Share of the graph settled so far.
    Progress {
        percent: f32,
        elapsed_ms: u64,
        estimated_remaining_ms: Option<u64>,
    },
    /// The run has finished.
    Completed {
        total_duration_ms: u64,
        nodes_processed: usize,
        nodes_failed: usize,
        nodes_skipped: usize,
    },
    /// The run was aborted by a run-fatal error.
    Aborted { message: String },
}

/// Reason why a node was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No path leads to the node from a dependency-free node.
    Unreachable,
}

/// Callback type for progress updates.
pub type ProgressCallback = Box<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Per-run counters and the event sink.
pub struct ProgressTracker {
    total: usize,
    processed: AtomicUsize,
    failed: AtomicUsize,
    skipped: AtomicUsize,
    deferrals: AtomicUsize,
    started_at: Option<Instant>,
    /// Processing time of each finished node, for the remaining-time guess.
    durations: Mutex<Vec<u64>>,
    callback: Option<ProgressCallback>,
}

impl ProgressTracker {
    /// Create a tracker for a graph of `total` nodes.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            processed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            deferrals: AtomicUsize::new(0),
            started_at: None,
            durations: Mutex::new(Vec::new()),
            callback: None,
        }
    }

    /// Set a callback for progress updates.
    pub fn with_callback(mut self, callback: ProgressCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Forward updates to a callback shared with [`ExecutionOptions`].
    ///
    /// [`ExecutionOptions`]: crate::execution::engine::ExecutionOptions
    pub fn with_shared_callback(self, callback: Arc<ProgressCallback>) -> Self {
        self.with_callback(Box::new(move |update| callback(update)))
    }

    /// Mark the start of the run.
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
        self.emit(ProgressUpdate::Started { total_nodes: self.total });
    }

    /// A ready node is about to run.
    pub fn node_started(&self, node_id: NodeId, node_name: String) {
        self.emit(ProgressUpdate::NodeStarted {
            node_id,
            node_name,
            index: self.processed(),
            total: self.total,
        });
    }

    /// A popped node had pending dependencies and went back on the queue.
    pub fn node_deferred(&self, node_id: NodeId) {
        let deferrals = self.deferrals.fetch_add(1, Ordering::Relaxed) + 1;
        self.emit(ProgressUpdate::NodeDeferred { node_id, deferrals });
    }

    /// A node finished, with or without output.
    pub fn node_completed(&self, node_id: NodeId, duration_ms: u64) {
        let index = self.processed.fetch_add(1, Ordering::Relaxed) + 1;
        self.durations.lock().push(duration_ms);

        self.emit(ProgressUpdate::NodeCompleted {
            node_id,
            duration_ms,
            index,
            total: self.total,
        });
        self.emit(ProgressUpdate::Progress {
            percent: self.progress_percent(),
            elapsed_ms: self.elapsed_ms(),
            estimated_remaining_ms: self.estimated_remaining_ms(),
        });
    }

    /// A node failed locally. It still counts as processed once
    /// [`node_completed`](Self::node_completed) is called.
    pub fn node_failed(&self, node_id: NodeId, message: String) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.emit(ProgressUpdate::NodeFailed { node_id, message });
    }

    /// A node will not run.
    pub fn node_skipped(&self, node_id: NodeId, reason: SkipReason) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
        self.emit(ProgressUpdate::NodeSkipped { node_id, reason });
    }

    /// The run hit a run-fatal error.
    pub fn abort(&self, message: String) {
        self.emit(ProgressUpdate::Aborted { message });
    }

    /// The run finished normally.
    pub fn complete(&self) {
        self.emit(ProgressUpdate::Completed {
            total_duration_ms: self.elapsed_ms(),
            nodes_processed: self.processed(),
            nodes_failed: self.failed.load(Ordering::Relaxed),
            nodes_skipped: self.skipped.load(Ordering::Relaxed),
        });
    }

    /// Nodes processed so far.
    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }

    /// Deferrals counted so far.
    pub fn deferrals(&self) -> usize {
        self.deferrals.load(Ordering::Relaxed)
    }

    /// Share of nodes processed or skipped, in percent.
    pub fn progress_percent(&self) -> f32 {
        if self.total == 0 {
            return 100.0;
        }
        let settled = self.processed() + self.skipped.load(Ordering::Relaxed);
        settled as f32 * 100.0 / self.total as f32
    }

    /// Mean node time multiplied by the nodes still outstanding.
    pub fn estimated_remaining_ms(&self) -> Option<u64> {
        let durations = self.durations.lock();
        if durations.is_empty() {
            return None;
        }
        let mean = durations.iter().sum::<u64>() / durations.len() as u64;
        let outstanding = self.total.saturating_sub(self.processed()) as u64;
        Some(mean * outstanding)
    }

    fn elapsed_ms(&self) -> u64 {
        self.started_at
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    fn emit(&self, update: ProgressUpdate) {
        if let Some(callback) = &self.callback {
            callback(update);
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_tracker(total: usize) -> (ProgressTracker, Arc<Mutex<Vec<ProgressUpdate>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let tracker = ProgressTracker::new(total)
            .with_callback(Box::new(move |update| sink.lock().push(update)));
        (tracker, events)
    }

    #[test]
    fn test_progress_counts_processed_and_skipped() {
        let tracker = ProgressTracker::new(4);
        assert_eq!(tracker.progress_percent(), 0.0);

        tracker.node_completed(NodeId::new(), 1);
        assert_eq!(tracker.progress_percent(), 25.0);

        tracker.node_skipped(NodeId::new(), SkipReason::Unreachable);
        assert_eq!(tracker.progress_percent(), 50.0);
        assert_eq!(ProgressTracker::new(0).progress_percent(), 100.0);
    }

    #[test]
    fn test_event_sequence() {
        let (mut tracker, events) = recording_tracker(5);
        let node_id = NodeId::new();

        tracker.start();
        tracker.node_deferred(node_id);
        tracker.node_started(node_id, "Median".to_string());
        tracker.node_failed(node_id, "bad size".to_string());
        tracker.node_completed(node_id, 100);
        tracker.complete();

        let events = events.lock();
        // Started, NodeDeferred, NodeStarted, NodeFailed, NodeCompleted,
        // Progress, Completed
        assert_eq!(events.len(), 7);
        assert!(matches!(events[1], ProgressUpdate::NodeDeferred { deferrals: 1, .. }));
        assert!(matches!(
            events[6],
            ProgressUpdate::Completed {
                nodes_processed: 1,
                nodes_failed: 1,
                nodes_skipped: 0,
                ..
            }
        ));
        assert_eq!(tracker.estimated_remaining_ms(), Some(400));
        assert_eq!(tracker.deferrals(), 1);
    }

    #[test]
    fn test_update_serializes_with_tag() {
        let json = serde_json::to_string(&ProgressUpdate::Aborted {
            message: "cycle".to_string(),
        })
        .unwrap();
        assert!(json.contains("\"event\":\"aborted\""));
    }
}
