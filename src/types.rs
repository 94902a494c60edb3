//! Core value types: raw samples, window features, HSV axes, and the HSV itself.
//!
//! All numeric fields that may be unavailable from a given source are modeled
//! as `Option<f64>` rather than sentinel zeros; extractors collapse missing
//! inputs to neutral values only at the feature-computation boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single behavioral event type, timestamped, carrying no content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehavioralEventType {
    Tap,
    Scroll,
    KeyDown,
    KeyUp,
    AppSwitch,
    NotifReceived,
    NotifOpened,
}

/// A behavioral event: timing and type only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehavioralEvent {
    pub event_type: BehavioralEventType,
    pub timestamp: DateTime<Utc>,
    /// Movement/scroll magnitude, when the event type carries one.
    pub magnitude: Option<f64>,
}

/// Motion sample (phone/wearable accelerometer-derived).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Motion {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub energy: Option<f64>,
}

/// Raw biosignal sample pushed by a wearable/phone adapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BiosignalSample {
    pub heart_rate: Option<f64>,
    pub hrv: Option<f64>,
    pub rr_intervals: Option<Vec<f64>>,
    pub motion: Option<Motion>,
    pub sleep_stage: Option<String>,
    pub respiration_rate: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Conversation-derived timing signals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationSignals {
    pub reply_delays_s: Option<Vec<f64>>,
    pub message_bursts: Option<Vec<DateTime<Utc>>>,
    pub interrupts: Option<Vec<DateTime<Utc>>>,
}

/// Device-state signals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceState {
    pub foreground: Option<String>,
    pub screen_on: Option<bool>,
    pub focus_mode: Option<String>,
}

/// Slowly-varying user pattern signals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatterns {
    pub morning_focus_bias: Option<f64>,
    pub avg_session_minutes: Option<f64>,
    pub baseline_typing_cadence: Option<f64>,
}

/// Contextual sample pushed by the context adapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextSample {
    pub conversation: Option<ConversationSignals>,
    pub device_state: Option<DeviceState>,
    pub user_patterns: Option<UserPatterns>,
    pub timestamp: DateTime<Utc>,
}

/// Combined latest-value snapshot published by the ingestion fan-in.
///
/// Only published when `last_bio` is present — see `ingestion::Fanin`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalData {
    pub last_bio: BiosignalSample,
    pub last_behav: Option<BehavioralEvent>,
    pub last_ctx: Option<ContextSample>,
}

/// The four fixed window cadences the aggregator and scheduler operate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowType {
    W30s,
    W5m,
    W1h,
    W24h,
}

impl WindowType {
    pub const ALL: [WindowType; 4] = [
        WindowType::W30s,
        WindowType::W5m,
        WindowType::W1h,
        WindowType::W24h,
    ];

    /// Duration of the window itself.
    pub fn duration(self) -> chrono::Duration {
        match self {
            WindowType::W30s => chrono::Duration::seconds(30),
            WindowType::W5m => chrono::Duration::minutes(5),
            WindowType::W1h => chrono::Duration::hours(1),
            WindowType::W24h => chrono::Duration::hours(24),
        }
    }

    /// Retention bound used by the aggregator's periodic sweep: 2x duration.
    pub fn retention(self) -> chrono::Duration {
        self.duration() * 2
    }

    /// HSI 1.0 window label.
    pub fn label(self) -> &'static str {
        match self {
            WindowType::W30s => "micro_window",
            WindowType::W5m => "short_window",
            WindowType::W1h => "medium_window",
            WindowType::W24h => "long_window",
        }
    }
}

/// Biosignal features derived from a `BiosignalSample`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessedBiosignals {
    pub normalized_hr: f64,
    pub normalized_hrv: f64,
    pub rmssd: f64,
    pub sdnn: f64,
    pub motion_energy: f64,
    pub rr_intervals: Vec<f64>,
}

/// Behavioral features derived from a window of `BehavioralEvent`s.
///
/// Invariant: `focus_hint == 1.0 - distraction_score` exactly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BehaviorWindowFeatures {
    pub tap_rate_norm: f64,
    pub keystroke_rate_norm: f64,
    pub scroll_velocity_norm: f64,
    pub idle_ratio: f64,
    pub switch_rate_norm: f64,
    pub burstiness: f64,
    pub session_fragmentation: f64,
    pub notification_load: f64,
    pub distraction_score: f64,
    pub focus_hint: f64,
}

/// Contextual features derived from conversation/device/pattern signals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextDerived {
    pub avg_reply_delay_s: f64,
    pub burstiness: f64,
    pub interrupt_rate: f64,
    /// Reserved scalars not yet specified upstream — see SPEC_FULL.md §9.
    pub overload: f64,
    pub frustration: f64,
    pub engagement: f64,
}

/// Affect axis readings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AffectAxis {
    pub arousal_index: Option<f64>,
    pub valence_stability: Option<f64>,
}

/// Engagement axis readings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngagementAxis {
    pub engagement_stability: Option<f64>,
    pub interaction_cadence: Option<f64>,
}

/// Activity axis readings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityAxis {
    pub motion_index: Option<f64>,
    pub posture_stability: Option<f64>,
}

/// Context axis readings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextAxis {
    pub screen_active_ratio: Option<f64>,
    pub session_fragmentation: Option<f64>,
}

/// The full set of orthogonal state axes carried by an HSV.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HsvAxes {
    pub affect: AffectAxis,
    pub engagement: EngagementAxis,
    pub activity: ActivityAxis,
    pub context: ContextAxis,
}

/// Fixed-dimension deterministic state embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateEmbedding {
    pub vector: Vec<f64>,
    pub window_type: WindowType,
    pub timestamp_ms: i64,
}

pub const EMBEDDING_DIM: usize = 64;

/// Metadata carried alongside a fused HSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HsvMeta {
    pub session_id: String,
    pub device: String,
    pub sampling_rate_hz: f64,
    pub embedding: StateEmbedding,
    pub axes: HsvAxes,
}

/// The Human State Vector: one fused snapshot per successful scheduler tick.
///
/// `emotion` and `focus` are reserved for downstream interpretation modules
/// and are always empty at the core — see SPEC_FULL.md §4.6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hsv {
    pub version: String,
    pub timestamp_ms: i64,
    pub behavior: BehaviorWindowFeatures,
    pub context: ContextDerived,
    pub meta: HsvMeta,
    pub emotion: HashMap<String, f64>,
    pub focus: HashMap<String, f64>,
}

pub const HSV_VERSION: &str = "hsv-1.0";
