// Frame-delayed capture queue.
//
// Entries are kept in capture order. An entry becomes ready once
// `frame_delay` frames have passed since it was captured; the delay stands
// in for a GPU fence and is not a completion guarantee.

use std::collections::VecDeque;

use super::{CaptureKind, PendingCapture};

#[derive(Debug)]
pub struct CaptureQueue {
    entries: VecDeque<PendingCapture>,
    frame_delay: u64,
}

impl CaptureQueue {
    pub fn new(frame_delay: u64) -> Self {
        Self {
            entries: VecDeque::new(),
            frame_delay,
        }
    }

    pub fn frame_delay(&self) -> u64 {
        self.frame_delay
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an entry for this frame and kind is already queued.
    pub fn contains(&self, frame: u64, kind: CaptureKind) -> bool {
        self.entries
            .iter()
            .any(|e| e.frame == frame && e.kind == kind)
    }

    pub fn push(&mut self, capture: PendingCapture) {
        self.entries.push_back(capture);
    }

    /// Remove and return every entry whose delay has elapsed at `frame`.
    pub fn drain_ready(&mut self, frame: u64) -> Vec<PendingCapture> {
        let mut ready = Vec::new();
        while let Some(front) = self.entries.front() {
            if frame.saturating_sub(front.frame) < self.frame_delay {
                break;
            }
            if let Some(entry) = self.entries.pop_front() {
                ready.push(entry);
            }
        }
        ready
    }
}
