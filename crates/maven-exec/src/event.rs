//! Process output events, sinks and the bounded output tail

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A raw event from a process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessEvent {
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The type of event
    pub event_type: ProcessEventType,
    /// Optional data associated with the event
    pub data: Option<String>,
}

impl ProcessEvent {
    /// Create a new process event
    pub fn new(event_type: ProcessEventType) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type,
            data: None,
        }
    }

    /// Create a new process event with data
    pub fn new_with_data(event_type: ProcessEventType, data: String) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type,
            data: Some(data),
        }
    }

    /// The output line and its stream, for `Stdout`/`Stderr` events
    pub fn line(&self) -> Option<(LogSource, &str)> {
        let source = match self.event_type {
            ProcessEventType::Stdout => LogSource::Stdout,
            ProcessEventType::Stderr => LogSource::Stderr,
            _ => return None,
        };
        self.data.as_deref().map(|line| (source, line))
    }
}

/// Types of raw process events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProcessEventType {
    /// Process has started
    Started {
        /// Process id of the child
        pid: u32,
    },
    /// Log line from stdout
    Stdout,
    /// Log line from stderr
    Stderr,
}

/// Source of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogSource {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
}

/// Receives every output line of a running invocation
///
/// Called from the task draining the child, so implementations should not
/// block for long.
pub trait OutputSink: Send + Sync {
    /// Handle one line of output
    fn line(&self, label: &str, source: LogSource, line: &str);
}

/// Forwards output to `tracing`: stdout at `info`, stderr at `warn`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl OutputSink for TracingSink {
    fn line(&self, label: &str, source: LogSource, line: &str) {
        match source {
            LogSource::Stdout => tracing::info!(task = %label, "{line}"),
            LogSource::Stderr => tracing::warn!(task = %label, "{line}"),
        }
    }
}

/// Discards all output
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn line(&self, _label: &str, _source: LogSource, _line: &str) {}
}

/// Longest line kept in the tail, in bytes
const MAX_LINE_BYTES: usize = 4096;

/// The most recent lines of output, bounded in count and line length
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputTail {
    capacity: usize,
    lines: VecDeque<String>,
    total: u64,
}

impl OutputTail {
    /// Keep at most `capacity` lines
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            lines: VecDeque::with_capacity(capacity.min(1024)),
            total: 0,
        }
    }

    /// Record a line, evicting the oldest when full
    pub fn push(&mut self, line: &str) {
        self.total += 1;
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(truncate(line, MAX_LINE_BYTES).to_string());
    }

    /// Lines currently held, oldest first
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Number of lines currently held
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True if nothing was kept
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of lines seen, including evicted ones
    pub fn total_lines(&self) -> u64 {
        self.total
    }

    /// Take the held lines
    pub fn into_lines(self) -> Vec<String> {
        self.lines.into()
    }
}

fn truncate(line: &str, max: usize) -> &str {
    if line.len() <= max {
        return line;
    }
    let mut end = max;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}
