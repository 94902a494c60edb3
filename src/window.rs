//! Sliding window event buffers.
//!
//! Maintains four parallel buffers (30s/5m/1h/24h), each retaining events for
//! 2x its own duration so that a window always has a full period of history
//! available at the moment it closes. Generalizes the teacher's single-
//! duration `WindowManager`/`EventWindow` into four independently swept
//! buffers behind one owner — see SPEC_FULL.md §4.2.

use crate::types::{BehavioralEvent, BiosignalSample, ContextSample, WindowType};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};

/// One event buffer for a single `WindowType`.
#[derive(Default)]
struct Buffer {
    behavioral: VecDeque<BehavioralEvent>,
    biosignal: VecDeque<BiosignalSample>,
    context: VecDeque<ContextSample>,
}

impl Buffer {
    fn sweep(&mut self, cutoff: DateTime<Utc>) {
        while matches!(self.behavioral.front(), Some(e) if e.timestamp < cutoff) {
            self.behavioral.pop_front();
        }
        while matches!(self.biosignal.front(), Some(s) if s.timestamp < cutoff) {
            self.biosignal.pop_front();
        }
        while matches!(self.context.front(), Some(c) if c.timestamp < cutoff) {
            self.context.pop_front();
        }
    }
}

/// A read-only view into one window's retained events, bounded to the
/// window's own duration (not its wider retention bound).
pub struct WindowSlice<'a> {
    pub window_type: WindowType,
    pub behavioral: Vec<&'a BehavioralEvent>,
    pub biosignal: Vec<&'a BiosignalSample>,
    pub context: Vec<&'a ContextSample>,
}

/// The four parallel sliding-window buffers, owned by a single caller —
/// typically the fusion engine's scheduler-tick handler.
pub struct WindowAggregator {
    buffers: HashMap<WindowType, Buffer>,
}

impl Default for WindowAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowAggregator {
    pub fn new() -> Self {
        let mut buffers = HashMap::new();
        for wt in WindowType::ALL {
            buffers.insert(wt, Buffer::default());
        }
        Self { buffers }
    }

    /// Record a behavioral event into every window's buffer.
    pub fn push_behavioral(&mut self, event: BehavioralEvent) {
        for buf in self.buffers.values_mut() {
            buf.behavioral.push_back(event.clone());
        }
    }

    /// Record a biosignal sample into every window's buffer.
    pub fn push_biosignal(&mut self, sample: BiosignalSample) {
        for buf in self.buffers.values_mut() {
            buf.biosignal.push_back(sample.clone());
        }
    }

    /// Record a context sample into every window's buffer.
    pub fn push_context(&mut self, sample: ContextSample) {
        for buf in self.buffers.values_mut() {
            buf.context.push_back(sample.clone());
        }
    }

    /// Drop events older than each window's retention bound (2x duration),
    /// relative to `now`. Called from the scheduler tick before reading a
    /// slice, and independently on a slow cadence to bound memory.
    pub fn sweep(&mut self, now: DateTime<Utc>) {
        for (wt, buf) in self.buffers.iter_mut() {
            buf.sweep(now - wt.retention());
        }
    }

    /// The events within `window_type`'s own duration (not its wider
    /// retention bound), as of `now`. Empty when no events have landed yet.
    pub fn slice(&self, window_type: WindowType, now: DateTime<Utc>) -> WindowSlice<'_> {
        let cutoff = now - window_type.duration();
        let buf = &self.buffers[&window_type];
        WindowSlice {
            window_type,
            behavioral: buf
                .behavioral
                .iter()
                .filter(|e| e.timestamp >= cutoff)
                .collect(),
            biosignal: buf
                .biosignal
                .iter()
                .filter(|s| s.timestamp >= cutoff)
                .collect(),
            context: buf
                .context
                .iter()
                .filter(|c| c.timestamp >= cutoff)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BehavioralEventType;

    fn event(t: DateTime<Utc>) -> BehavioralEvent {
        BehavioralEvent {
            event_type: BehavioralEventType::Tap,
            timestamp: t,
            magnitude: None,
        }
    }

    #[test]
    fn empty_window_yields_empty_slice() {
        let agg = WindowAggregator::new();
        let slice = agg.slice(WindowType::W30s, Utc::now());
        assert!(slice.behavioral.is_empty());
        assert!(slice.biosignal.is_empty());
        assert!(slice.context.is_empty());
    }

    #[test]
    fn sweep_drops_events_past_retention_but_keeps_within_window() {
        let mut agg = WindowAggregator::new();
        let now = Utc::now();
        agg.push_behavioral(event(now - chrono::Duration::seconds(20)));
        agg.push_behavioral(event(now - chrono::Duration::minutes(5)));

        let slice = agg.slice(WindowType::W30s, now);
        assert_eq!(slice.behavioral.len(), 1);

        agg.sweep(now);
        let slice = agg.slice(WindowType::W30s, now);
        assert_eq!(slice.behavioral.len(), 1);
    }
}
