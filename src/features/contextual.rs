//! Contextual feature extraction from conversation and device signals.
//!
//! `overload`, `frustration`, and `engagement` are reserved scalars with no
//! upstream data source yet; they are always `0.0` here, kept only so the
//! embedding's slot layout is stable if a future source populates them — see
//! SPEC_FULL.md §9 (Open Questions).

use crate::types::{ContextDerived, ContextSample};
use statrs::statistics::Statistics;

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

fn inter_arrival_seconds(mut timestamps: Vec<chrono::DateTime<chrono::Utc>>) -> Vec<f64> {
    if timestamps.len() < 2 {
        return Vec::new();
    }
    timestamps.sort();
    timestamps
        .windows(2)
        .map(|w| (w[1] - w[0]).num_milliseconds() as f64 / 1000.0)
        .collect()
}

/// Derive `ContextDerived` from the context samples within a window.
pub fn compute(samples: &[&ContextSample]) -> ContextDerived {
    let reply_delays: Vec<f64> = samples
        .iter()
        .filter_map(|s| s.conversation.as_ref())
        .filter_map(|c| c.reply_delays_s.as_ref())
        .flatten()
        .copied()
        .collect();
    let avg_reply_delay_s = if reply_delays.is_empty() {
        0.0
    } else {
        reply_delays.clone().mean()
    };

    let bursts: Vec<chrono::DateTime<chrono::Utc>> = samples
        .iter()
        .filter_map(|s| s.conversation.as_ref())
        .filter_map(|c| c.message_bursts.as_ref())
        .flatten()
        .copied()
        .collect();
    let gaps = inter_arrival_seconds(bursts);
    let burstiness = if gaps.is_empty() {
        0.0
    } else {
        let mean = gaps.clone().mean();
        let variance = gaps.clone().variance();
        clamp01(variance / (mean + 1e-3))
    };

    let interrupt_count: usize = samples
        .iter()
        .filter_map(|s| s.conversation.as_ref())
        .filter_map(|c| c.interrupts.as_ref())
        .map(|v| v.len())
        .sum();
    // Per-minute basis, unbounded — SPEC_FULL.md §3/§4.3: interrupt_rate ≥ 0.
    let interrupt_rate = interrupt_count as f64 / 60.0;

    ContextDerived {
        avg_reply_delay_s,
        burstiness,
        interrupt_rate,
        overload: 0.0,
        frustration: 0.0,
        engagement: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConversationSignals;

    #[test]
    fn empty_samples_yield_neutral_defaults() {
        let samples: Vec<&ContextSample> = Vec::new();
        let derived = compute(&samples);
        assert_eq!(derived.avg_reply_delay_s, 0.0);
        assert_eq!(derived.interrupt_rate, 0.0);
        assert_eq!(derived.overload, 0.0);
    }

    #[test]
    fn reply_delay_averages_across_samples() {
        let sample = ContextSample {
            conversation: Some(ConversationSignals {
                reply_delays_s: Some(vec![2.0, 4.0, 6.0]),
                message_bursts: None,
                interrupts: None,
            }),
            device_state: None,
            user_patterns: None,
            timestamp: chrono::Utc::now(),
        };
        let samples = vec![&sample];
        let derived = compute(&samples);
        assert!((derived.avg_reply_delay_s - 4.0).abs() < 1e-9);
    }

    #[test]
    fn interrupt_rate_is_unbounded_per_minute_basis() {
        // 120 interrupts / 60 = 2.0, well above the old [0,1] clamp — the
        // rate must not be capped at 1.0.
        let sample = ContextSample {
            conversation: Some(ConversationSignals {
                reply_delays_s: None,
                message_bursts: None,
                interrupts: Some((0..120).map(|_| chrono::Utc::now()).collect()),
            }),
            device_state: None,
            user_patterns: None,
            timestamp: chrono::Utc::now(),
        };
        let samples = vec![&sample];
        let derived = compute(&samples);
        assert!((derived.interrupt_rate - 2.0).abs() < 1e-9);
    }
}
