//! Fusion engine: combines the latest signals and window contents into a
//! Human State Vector, gated per-module by consent and capability, and
//! publishes the result on a `tokio::sync::watch` channel.
//!
//! Generalizes the teacher's provider-pull-then-build shape (see
//! `core/mod.rs` / `flux/processor.rs`) from a single behavioral processor
//! into three gated modules feeding one embedding — see SPEC_FULL.md §4.6.

use crate::features::{behavioral, biosignal, contextual};
use crate::oracles::{CapabilityLevel, CapabilityOracle, ConsentOracle, Module};
use crate::types::{
    ActivityAxis, AffectAxis, BehavioralEvent, BiosignalSample, ContextAxis, ContextDerived,
    ContextSample, EngagementAxis, Hsv, HsvAxes, HsvMeta, SignalData, StateEmbedding, WindowType,
    BehaviorWindowFeatures, EMBEDDING_DIM, HSV_VERSION,
};
use crate::window::WindowAggregator;
use chrono::Utc;
use std::sync::Mutex;
use tokio::sync::watch;

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

fn gated(consent: &dyn ConsentOracle, capability: &dyn CapabilityOracle, module: Module) -> bool {
    consent.current().allows(module) && capability.capability(module) != CapabilityLevel::None
}

/// Core tier gets a coarse subset of behavioral features: rates and the
/// distraction/focus summary survive, but the finer-grained burst/session/
/// notification signals are withheld — see SPEC_FULL.md §4.4.
fn apply_core_tier_redaction(
    mut behavior: BehaviorWindowFeatures,
    level: CapabilityLevel,
) -> BehaviorWindowFeatures {
    if level == CapabilityLevel::Core {
        behavior.burstiness = 0.0;
        behavior.session_fragmentation = 0.0;
        behavior.notification_load = 0.0;
    }
    behavior
}

/// Deterministic fixed-width packing of every scalar feature the fusion
/// engine computes, zero-padded to `EMBEDDING_DIM`. Ordering is stable so
/// identical inputs always yield an identical vector.
fn build_embedding(
    behavior: &BehaviorWindowFeatures,
    context: &ContextDerived,
    axes: &HsvAxes,
    window_type: WindowType,
    timestamp_ms: i64,
) -> StateEmbedding {
    let mut vector = vec![
        behavior.tap_rate_norm,
        behavior.keystroke_rate_norm,
        behavior.scroll_velocity_norm,
        behavior.idle_ratio,
        behavior.switch_rate_norm,
        behavior.burstiness,
        behavior.session_fragmentation,
        behavior.notification_load,
        behavior.distraction_score,
        behavior.focus_hint,
        context.avg_reply_delay_s,
        context.burstiness,
        context.interrupt_rate,
        context.overload,
        context.frustration,
        context.engagement,
        axes.affect.arousal_index.unwrap_or(0.0),
        axes.affect.valence_stability.unwrap_or(0.0),
        axes.engagement.engagement_stability.unwrap_or(0.0),
        axes.engagement.interaction_cadence.unwrap_or(0.0),
        axes.activity.motion_index.unwrap_or(0.0),
        axes.activity.posture_stability.unwrap_or(0.0),
        axes.context.screen_active_ratio.unwrap_or(0.0),
        axes.context.session_fragmentation.unwrap_or(0.0),
    ];
    vector.resize(EMBEDDING_DIM, 0.0);

    StateEmbedding {
        vector,
        window_type,
        timestamp_ms,
    }
}

struct FusionState {
    latest: SignalData,
    has_bio: bool,
    last_bio_ts: Option<chrono::DateTime<Utc>>,
    last_behav_ts: Option<chrono::DateTime<Utc>>,
    last_ctx_ts: Option<chrono::DateTime<Utc>>,
}

impl FusionState {
    fn empty() -> Self {
        Self {
            latest: SignalData {
                last_bio: crate::types::BiosignalSample::default(),
                last_behav: None,
                last_ctx: None,
            },
            has_bio: false,
            last_bio_ts: None,
            last_behav_ts: None,
            last_ctx_ts: None,
        }
    }
}

/// The fusion engine. `push_signal` feeds new data in; `tick` (invoked by
/// the scheduler for each firing `WindowType`) builds and publishes one HSV.
pub struct FusionEngine {
    windows: Mutex<WindowAggregator>,
    state: Mutex<FusionState>,
    consent: Box<dyn ConsentOracle>,
    capability: Box<dyn CapabilityOracle>,
    device: String,
    session_id: String,
    sampling_rate_hz: f64,
    publisher: watch::Sender<Option<Hsv>>,
}

impl FusionEngine {
    pub fn new(
        consent: Box<dyn ConsentOracle>,
        capability: Box<dyn CapabilityOracle>,
        device: String,
        session_id: String,
        sampling_rate_hz: f64,
    ) -> (Self, watch::Receiver<Option<Hsv>>) {
        let (publisher, subscriber) = watch::channel(None);
        let engine = Self {
            windows: Mutex::new(WindowAggregator::new()),
            state: Mutex::new(FusionState::empty()),
            consent,
            capability,
            device,
            session_id,
            sampling_rate_hz,
            publisher,
        };
        (engine, subscriber)
    }

    /// Feed a combined signal snapshot from the ingestion fan-in.
    ///
    /// The fan-in re-emits its latest cached value on every source arrival,
    /// so each field is only forwarded into the window aggregator when its
    /// timestamp has actually advanced — otherwise a cached reading would
    /// be double-counted every time an unrelated source ticks.
    pub fn push_signal(&self, signal: SignalData) {
        let mut windows = self.windows.lock().expect("window aggregator mutex poisoned");
        let mut state = self.state.lock().expect("fusion state mutex poisoned");

        if state.last_bio_ts != Some(signal.last_bio.timestamp) {
            windows.push_biosignal(signal.last_bio.clone());
            state.last_bio_ts = Some(signal.last_bio.timestamp);
            state.has_bio = true;
        }
        if let Some(behav) = &signal.last_behav {
            if state.last_behav_ts != Some(behav.timestamp) {
                windows.push_behavioral(behav.clone());
                state.last_behav_ts = Some(behav.timestamp);
            }
        }
        if let Some(ctx) = &signal.last_ctx {
            if state.last_ctx_ts != Some(ctx.timestamp) {
                windows.push_context(ctx.clone());
                state.last_ctx_ts = Some(ctx.timestamp);
            }
        }
        state.latest = signal;
    }

    /// Feed a single fresh biosignal sample directly, bypassing the merged
    /// `SignalData` model. For callers (e.g. a direct stdin adapter) that
    /// don't go through the ingestion fan-in's latest-value cache.
    pub fn push_biosignal(&self, sample: BiosignalSample) {
        let mut windows = self.windows.lock().expect("window aggregator mutex poisoned");
        let mut state = self.state.lock().expect("fusion state mutex poisoned");
        windows.push_biosignal(sample.clone());
        state.last_bio_ts = Some(sample.timestamp);
        state.has_bio = true;
        state.latest.last_bio = sample;
    }

    /// Feed a single fresh behavioral event directly.
    pub fn push_behavioral(&self, event: BehavioralEvent) {
        let mut windows = self.windows.lock().expect("window aggregator mutex poisoned");
        let mut state = self.state.lock().expect("fusion state mutex poisoned");
        windows.push_behavioral(event.clone());
        state.last_behav_ts = Some(event.timestamp);
        state.latest.last_behav = Some(event);
    }

    /// Feed a single fresh context sample directly.
    pub fn push_context(&self, sample: ContextSample) {
        let mut windows = self.windows.lock().expect("window aggregator mutex poisoned");
        let mut state = self.state.lock().expect("fusion state mutex poisoned");
        windows.push_context(sample.clone());
        state.last_ctx_ts = Some(sample.timestamp);
        state.latest.last_ctx = Some(sample);
    }

    /// Build and publish one HSV for the firing window type. No-op if no
    /// biosignal sample has been observed yet.
    pub fn tick(&self, window_type: WindowType) {
        let now = Utc::now();
        let (latest, has_bio) = {
            let state = self.state.lock().expect("fusion state mutex poisoned");
            (state.latest.clone(), state.has_bio)
        };
        if !has_bio {
            return;
        }

        let mut windows = self.windows.lock().expect("window aggregator mutex poisoned");
        windows.sweep(now);
        let slice = windows.slice(window_type, now);

        let biosignal_allowed = gated(&*self.consent, &*self.capability, Module::Biosignal);
        let behavior_allowed = gated(&*self.consent, &*self.capability, Module::Behavior);
        let context_allowed = gated(&*self.consent, &*self.capability, Module::Context);

        let processed_bio = if biosignal_allowed {
            biosignal::compute(&latest.last_bio)
        } else {
            Default::default()
        };
        let behavior = if behavior_allowed {
            let level = self.capability.capability(Module::Behavior);
            apply_core_tier_redaction(behavioral::compute(&slice.behavioral), level)
        } else {
            Default::default()
        };
        let context = if context_allowed {
            contextual::compute(&slice.context)
        } else {
            Default::default()
        };

        let screen_active_ratio = if context_allowed && !slice.context.is_empty() {
            let on = slice
                .context
                .iter()
                .filter(|c| {
                    c.device_state
                        .as_ref()
                        .and_then(|d| d.screen_on)
                        .unwrap_or(false)
                })
                .count();
            Some(clamp01(on as f64 / slice.context.len() as f64))
        } else {
            None
        };

        let axes = HsvAxes {
            affect: AffectAxis {
                arousal_index: biosignal_allowed.then(|| {
                    clamp01(processed_bio.normalized_hr * 0.6 + (1.0 - processed_bio.normalized_hrv) * 0.4)
                }),
                valence_stability: None,
            },
            engagement: EngagementAxis {
                engagement_stability: behavior_allowed.then(|| clamp01(1.0 - behavior.burstiness)),
                interaction_cadence: behavior_allowed.then(|| {
                    clamp01(
                        (behavior.tap_rate_norm
                            + behavior.keystroke_rate_norm
                            + behavior.scroll_velocity_norm)
                            / 3.0,
                    )
                }),
            },
            activity: ActivityAxis {
                motion_index: biosignal_allowed.then_some(processed_bio.motion_energy),
                posture_stability: None,
            },
            context: ContextAxis {
                screen_active_ratio,
                session_fragmentation: behavior_allowed.then_some(behavior.session_fragmentation),
            },
        };

        let timestamp_ms = now.timestamp_millis();
        let embedding = build_embedding(&behavior, &context, &axes, window_type, timestamp_ms);

        let hsv = Hsv {
            version: HSV_VERSION.to_string(),
            timestamp_ms,
            behavior,
            context,
            meta: HsvMeta {
                session_id: self.session_id.clone(),
                device: self.device.clone(),
                sampling_rate_hz: self.sampling_rate_hz,
                embedding,
                axes,
            },
            emotion: Default::default(),
            focus: Default::default(),
        };

        let _ = self.publisher.send(Some(hsv));
    }
}
