//! Image pull progress aggregation
//!
//! Pull events for different layers arrive interleaved. The aggregator keeps
//! one counter per layer id and turns the raw cumulative byte counts into
//! increments for the output sink. Events are processed strictly in arrival
//! order because each increment depends on the previously stored count.

pub mod size;

use std::collections::HashMap;

use futures_util::StreamExt;

use crate::engine::{PullEvent, PullStream};
use crate::error::Result;
use crate::output::OutputSink;
pub use size::format_size;

/// Display instructions emitted by the aggregator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressUpdate {
    /// A new layer appeared
    Added {
        layer: String,
        label: String,
        total: u64,
    },
    /// The engine revised a layer's expected size upward
    Resized { layer: String, total: u64 },
    Advanced {
        layer: String,
        label: String,
        delta: u64,
    },
    /// Terminal for the layer, emitted once
    Completed { layer: String, label: String },
    /// An event without byte counts
    Status { layer: Option<String>, status: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LayerProgress {
    current: u64,
    total: u64,
    complete: bool,
}

/// Totals for a finished pull
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullSummary {
    pub layers: usize,
    pub completed: usize,
    /// Sum of all increments handed to the sink
    pub advanced: u64,
}

fn size_label(total: u64) -> String {
    format_size(total).unwrap_or_else(|_| "0 B".to_string())
}

fn progress_label(status: &str, layer: &str, total: u64) -> String {
    format!("{} layer {} [{}]", status, layer, size_label(total))
}

fn completed_label(layer: &str, total: u64) -> String {
    format!("Downloaded layer {} [{}]", layer, size_label(total))
}

pub struct ProgressAggregator<'a> {
    sink: &'a dyn OutputSink,
    layers: HashMap<String, LayerProgress>,
    summary: PullSummary,
}

impl<'a> ProgressAggregator<'a> {
    pub fn new(sink: &'a dyn OutputSink) -> Self {
        Self {
            sink,
            layers: HashMap::new(),
            summary: PullSummary::default(),
        }
    }

    /// Account for one event
    pub fn observe(&mut self, event: &PullEvent) {
        let (layer, detail) = match (&event.id, event.progress) {
            (Some(layer), Some(detail)) => (layer, detail),
            (layer, _) => {
                self.sink.progress(&ProgressUpdate::Status {
                    layer: layer.clone(),
                    status: event.status.clone(),
                });
                return;
            }
        };

        let sink = self.sink;
        let entry = self.layers.entry(layer.clone()).or_insert_with(|| {
            sink.progress(&ProgressUpdate::Added {
                layer: layer.clone(),
                label: progress_label(&event.status, layer, detail.total),
                total: detail.total,
            });
            LayerProgress {
                total: detail.total,
                ..Default::default()
            }
        });
        if entry.complete {
            return;
        }

        if detail.total > entry.total {
            entry.total = detail.total;
            self.sink.progress(&ProgressUpdate::Resized {
                layer: layer.clone(),
                total: entry.total,
            });
        }

        let current = detail.current.min(entry.total);
        let delta = current.saturating_sub(entry.current);
        entry.current = entry.current.max(current);

        if delta > 0 {
            self.summary.advanced += delta;
            self.sink.progress(&ProgressUpdate::Advanced {
                layer: layer.clone(),
                label: progress_label(&event.status, layer, entry.total),
                delta,
            });
        }

        if entry.current >= entry.total {
            entry.complete = true;
            self.summary.completed += 1;
            self.sink.progress(&ProgressUpdate::Completed {
                layer: layer.clone(),
                label: completed_label(layer, entry.total),
            });
        }
    }

    /// Drop per-layer state and return the totals
    pub fn finish(self) -> PullSummary {
        PullSummary {
            layers: self.layers.len(),
            ..self.summary
        }
    }
}

/// Consume a pull stream to the end, rendering progress through `sink`.
///
/// The first error aborts the pull.
pub async fn consume(mut stream: PullStream<'_>, sink: &dyn OutputSink) -> Result<PullSummary> {
    let mut aggregator = ProgressAggregator::new(sink);
    while let Some(event) = stream.next().await {
        aggregator.observe(&event?);
    }
    let summary = aggregator.finish();
    sink.progress_done();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PwnboxError;
    use crate::testing::RecordingSink;

    fn completions(sink: &RecordingSink, layer: &str) -> usize {
        sink.updates()
            .iter()
            .filter(|u| matches!(u, ProgressUpdate::Completed { layer: l, .. } if l == layer))
            .count()
    }

    fn advanced(sink: &RecordingSink, layer: &str) -> u64 {
        sink.updates()
            .iter()
            .filter_map(|u| match u {
                ProgressUpdate::Advanced { layer: l, delta, .. } if l == layer => Some(*delta),
                _ => None,
            })
            .sum()
    }

    #[test]
    fn test_single_layer_completes_once() {
        let sink = RecordingSink::default();
        let mut agg = ProgressAggregator::new(&sink);
        agg.observe(&PullEvent::progress("L", "Downloading", 30, 100));
        agg.observe(&PullEvent::progress("L", "Downloading", 100, 100));
        // events after completion are ignored
        agg.observe(&PullEvent::progress("L", "Extracting", 50, 100));
        agg.observe(&PullEvent::progress("L", "Extracting", 100, 100));
        let summary = agg.finish();

        assert_eq!(advanced(&sink, "L"), 100);
        assert_eq!(completions(&sink, "L"), 1);
        assert_eq!(
            summary,
            PullSummary {
                layers: 1,
                completed: 1,
                advanced: 100
            }
        );
        assert!(matches!(
            &sink.updates()[0],
            ProgressUpdate::Added { layer, total: 100, label } if layer == "L"
                && label == "Downloading layer L [100.00 B]"
        ));
    }

    #[test]
    fn test_interleaved_layers() {
        let sink = RecordingSink::default();
        let mut agg = ProgressAggregator::new(&sink);
        agg.observe(&PullEvent::progress("a", "Downloading", 10, 2048));
        agg.observe(&PullEvent::progress("b", "Downloading", 5, 10));
        agg.observe(&PullEvent::progress("a", "Downloading", 1024, 2048));
        agg.observe(&PullEvent::progress("b", "Downloading", 10, 10));
        agg.observe(&PullEvent::progress("a", "Downloading", 2048, 2048));
        let summary = agg.finish();

        assert_eq!(advanced(&sink, "a"), 2048);
        assert_eq!(advanced(&sink, "b"), 10);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.layers, 2);
    }

    #[test]
    fn test_total_revised_upward() {
        let sink = RecordingSink::default();
        let mut agg = ProgressAggregator::new(&sink);
        agg.observe(&PullEvent::progress("L", "Downloading", 50, 100));
        agg.observe(&PullEvent::progress("L", "Downloading", 100, 200));
        agg.observe(&PullEvent::progress("L", "Downloading", 200, 200));

        assert!(sink
            .updates()
            .contains(&ProgressUpdate::Resized { layer: "L".to_string(), total: 200 }));
        assert_eq!(advanced(&sink, "L"), 200);
        assert_eq!(completions(&sink, "L"), 1);
    }

    #[test]
    fn test_counter_going_backwards_never_advances_negative() {
        let sink = RecordingSink::default();
        let mut agg = ProgressAggregator::new(&sink);
        agg.observe(&PullEvent::progress("L", "Downloading", 80, 100));
        agg.observe(&PullEvent::progress("L", "Extracting", 20, 100));
        agg.observe(&PullEvent::progress("L", "Extracting", 90, 100));
        assert_eq!(advanced(&sink, "L"), 90);
        assert_eq!(completions(&sink, "L"), 0);
    }

    #[test]
    fn test_zero_total_is_complete() {
        let sink = RecordingSink::default();
        let mut agg = ProgressAggregator::new(&sink);
        agg.observe(&PullEvent::progress("empty", "Downloading", 0, 0));
        agg.observe(&PullEvent::progress("empty", "Downloading", 0, 0));
        assert_eq!(completions(&sink, "empty"), 1);
        assert_eq!(advanced(&sink, "empty"), 0);
        assert_eq!(agg.finish().completed, 1);
    }

    #[test]
    fn test_status_events_are_not_accounted() {
        let sink = RecordingSink::default();
        let mut agg = ProgressAggregator::new(&sink);
        agg.observe(&PullEvent::status(None, "Pulling from deadpackets/pwnbox"));
        agg.observe(&PullEvent::status(Some("L"), "Already exists"));
        let summary = agg.finish();
        assert_eq!(summary, PullSummary::default());
        assert_eq!(sink.updates().len(), 2);
    }

    #[tokio::test]
    async fn test_consume_stops_on_error() {
        let sink = RecordingSink::default();
        let events: Vec<Result<PullEvent>> = vec![
            Ok(PullEvent::progress("L", "Downloading", 10, 100)),
            Err(PwnboxError::ContainerApiError("connection reset".to_string())),
            Ok(PullEvent::progress("L", "Downloading", 100, 100)),
        ];
        let stream: PullStream = Box::pin(futures_util::stream::iter(events));
        assert!(consume(stream, &sink).await.is_err());
        assert_eq!(advanced(&sink, "L"), 10);
    }

    #[tokio::test]
    async fn test_consume_to_completion() {
        let sink = RecordingSink::default();
        let events: Vec<Result<PullEvent>> = vec![
            Ok(PullEvent::progress("L", "Downloading", 30, 100)),
            Ok(PullEvent::progress("L", "Downloading", 100, 100)),
            Ok(PullEvent::status(None, "Status: Downloaded newer image")),
        ];
        let stream: PullStream = Box::pin(futures_util::stream::iter(events));
        let summary = consume(stream, &sink).await.unwrap();
        assert_eq!(summary.advanced, 100);
        assert_eq!(summary.completed, 1);
    }
}
