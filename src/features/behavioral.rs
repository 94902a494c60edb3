//! Behavioral feature extraction over a window of input events.
//!
//! Formulas below are load-bearing literals, not tuning parameters — in
//! particular `focus_hint == 1.0 - distraction_score` is an exact invariant
//! checked in tests, not an approximation. See SPEC_FULL.md §4.3.

use crate::types::{BehavioralEvent, BehavioralEventType, BehaviorWindowFeatures};
use statrs::statistics::Statistics;

const IDLE_GAP_THRESHOLD_S: f64 = 5.0;
const SESSION_BOUNDARY_GAP_S: f64 = 30.0;

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// A rate over the event span, 0 when the span is degenerate (< 2 events or
/// a zero-length span) rather than dividing by zero.
fn rate(count: f64, duration_s: f64) -> f64 {
    if duration_s <= 0.0 {
        return 0.0;
    }
    clamp01(count / duration_s)
}

/// Gaps (seconds) between consecutive events, sorted by timestamp.
fn gaps_seconds(events: &[&BehavioralEvent]) -> Vec<f64> {
    if events.len() < 2 {
        return Vec::new();
    }
    let mut sorted: Vec<&&BehavioralEvent> = events.iter().collect();
    sorted.sort_by_key(|e| e.timestamp);
    sorted
        .windows(2)
        .map(|w| (w[1].timestamp - w[0].timestamp).num_milliseconds() as f64 / 1000.0)
        .collect()
}

/// Derive `BehaviorWindowFeatures` from the behavioral events within a window.
///
/// `duration` is the event span itself — `ts(last) − ts(first)` — not the
/// window's nominal bucket size, per SPEC_FULL.md §4.3.
pub fn compute(events: &[&BehavioralEvent]) -> BehaviorWindowFeatures {
    let duration_s = if events.len() < 2 {
        0.0
    } else {
        let first = events.iter().map(|e| e.timestamp).min().unwrap();
        let last = events.iter().map(|e| e.timestamp).max().unwrap();
        (last - first).num_milliseconds() as f64 / 1000.0
    };

    let taps = events
        .iter()
        .filter(|e| e.event_type == BehavioralEventType::Tap)
        .count();
    let keystrokes = events
        .iter()
        .filter(|e| matches!(e.event_type, BehavioralEventType::KeyDown | BehavioralEventType::KeyUp))
        .count();
    let scroll_magnitude: f64 = events
        .iter()
        .filter(|e| e.event_type == BehavioralEventType::Scroll)
        .filter_map(|e| e.magnitude)
        .map(f64::abs)
        .sum();
    let switches = events
        .iter()
        .filter(|e| e.event_type == BehavioralEventType::AppSwitch)
        .count();
    let notifications = events
        .iter()
        .filter(|e| {
            matches!(
                e.event_type,
                BehavioralEventType::NotifReceived | BehavioralEventType::NotifOpened
            )
        })
        .count();

    let tap_rate_norm = rate(taps as f64, duration_s);
    let keystroke_rate_norm = rate(keystrokes as f64 / 2.0, duration_s);
    let scroll_velocity_norm = rate(scroll_magnitude / 100.0, duration_s);
    let switch_rate_norm = rate(switches as f64, duration_s);
    let notification_load = rate(notifications as f64, duration_s);

    let gaps = gaps_seconds(events);
    // Fewer than two events means no gap evidence at all; treat the window
    // as maximally idle rather than claiming perfect activity.
    let idle_ratio = if gaps.is_empty() {
        1.0
    } else {
        let idle_count = gaps.iter().filter(|g| **g > IDLE_GAP_THRESHOLD_S).count();
        idle_count as f64 / gaps.len() as f64
    };

    let burstiness = if gaps.is_empty() {
        0.0
    } else {
        let mean = gaps.clone().mean();
        let variance = gaps.clone().variance();
        clamp01(variance / (mean + 1e-3))
    };

    let session_fragmentation = if gaps.is_empty() {
        0.0
    } else {
        let sessions = gaps.iter().filter(|g| **g > SESSION_BOUNDARY_GAP_S).count();
        clamp01(sessions as f64 / (events.len() as f64 / 10.0).max(1.0))
    };

    let distraction_score = clamp01(
        0.3 * switch_rate_norm
            + 0.2 * burstiness
            + 0.3 * session_fragmentation
            + 0.2 * notification_load,
    );
    let focus_hint = 1.0 - distraction_score;

    BehaviorWindowFeatures {
        tap_rate_norm,
        keystroke_rate_norm,
        scroll_velocity_norm,
        idle_ratio,
        switch_rate_norm,
        burstiness,
        session_fragmentation,
        notification_load,
        distraction_score,
        focus_hint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn ev(event_type: BehavioralEventType, secs_from_now: i64) -> BehavioralEvent {
        BehavioralEvent {
            event_type,
            timestamp: Utc::now() + Duration::seconds(secs_from_now),
            magnitude: None,
        }
    }

    #[test]
    fn empty_window_yields_zero_distraction_and_full_focus() {
        let events: Vec<&BehavioralEvent> = Vec::new();
        let features = compute(&events);
        assert_eq!(features.distraction_score, 0.0);
        assert_eq!(features.focus_hint, 1.0);
    }

    #[test]
    fn empty_window_yields_neutral_vector() {
        let events: Vec<&BehavioralEvent> = Vec::new();
        let features = compute(&events);
        assert_eq!(features.idle_ratio, 1.0);
        assert_eq!(features.focus_hint, 1.0);
        assert_eq!(features.tap_rate_norm, 0.0);
        assert_eq!(features.keystroke_rate_norm, 0.0);
        assert_eq!(features.scroll_velocity_norm, 0.0);
        assert_eq!(features.switch_rate_norm, 0.0);
        assert_eq!(features.burstiness, 0.0);
        assert_eq!(features.session_fragmentation, 0.0);
        assert_eq!(features.notification_load, 0.0);
        assert_eq!(features.distraction_score, 0.0);
    }

    #[test]
    fn distraction_saturates_to_one_when_all_components_saturate() {
        let features = BehaviorWindowFeatures {
            tap_rate_norm: 0.0,
            keystroke_rate_norm: 0.0,
            scroll_velocity_norm: 0.0,
            idle_ratio: 0.0,
            switch_rate_norm: 1.0,
            burstiness: 1.0,
            session_fragmentation: 1.0,
            notification_load: 1.0,
            distraction_score: clamp01(0.3 * 1.0 + 0.2 * 1.0 + 0.3 * 1.0 + 0.2 * 1.0),
            focus_hint: 0.0,
        };
        assert_eq!(features.distraction_score, 1.0);
        assert_eq!(1.0 - features.distraction_score, features.focus_hint);
    }

    #[test]
    fn focus_hint_is_exact_complement_of_distraction_score() {
        let events = [
            ev(BehavioralEventType::AppSwitch, 0),
            ev(BehavioralEventType::AppSwitch, 2),
            ev(BehavioralEventType::NotifReceived, 10),
            ev(BehavioralEventType::Tap, 15),
        ];
        let refs: Vec<&BehavioralEvent> = events.iter().collect();
        let features = compute(&refs);
        assert!((features.focus_hint - (1.0 - features.distraction_score)).abs() < 1e-12);
    }

    #[test]
    fn rates_use_actual_event_span_not_window_bucket_size() {
        // Two taps 10s apart: duration=10s, tap_rate_norm = clamp(2/10,0,1) = 0.2,
        // regardless of whatever nominal window size (30s/5m/...) they fell into.
        let events = [ev(BehavioralEventType::Tap, 0), ev(BehavioralEventType::Tap, 10)];
        let refs: Vec<&BehavioralEvent> = events.iter().collect();
        let features = compute(&refs);
        assert!((features.tap_rate_norm - 0.2).abs() < 1e-9);
    }

    #[test]
    fn single_event_yields_zero_duration_and_zero_rates() {
        let events = [ev(BehavioralEventType::Tap, 0)];
        let refs: Vec<&BehavioralEvent> = events.iter().collect();
        let features = compute(&refs);
        assert_eq!(features.tap_rate_norm, 0.0);
    }
}
