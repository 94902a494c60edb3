//! HSI 1.0 wire-format exporter.
//!
//! Builder-style construction mirrors the teacher's `HsiBuilder`; the
//! `HSI_VERSION` literal is reused verbatim from `core/hsi.rs` since the
//! wire version did not change — see SPEC_FULL.md §4.7.

use crate::types::Hsv;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const HSI_VERSION: &str = "1.0";
pub const PRODUCER_NAME: &str = "synheart-hsi-core";
pub const EMBEDDING_MODEL: &str = "hsi-fusion-v1";

/// Confidence carried on every derived reading and embedding. The core has
/// no per-reading uncertainty estimate yet, so a single fixed value in
/// (0,1] is used throughout rather than a fabricated one.
const READING_CONFIDENCE: f64 = 0.8;
const EMBEDDING_CONFIDENCE: f64 = 0.9;

/// Fixed, non-negotiable privacy declaration carried on every snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HsiPrivacy {
    pub contains_pii: bool,
    pub raw_biosignals_allowed: bool,
    pub derived_metrics_allowed: bool,
}

impl Default for HsiPrivacy {
    fn default() -> Self {
        Self {
            contains_pii: false,
            raw_biosignals_allowed: false,
            derived_metrics_allowed: true,
        }
    }
}

/// A single named axis reading. `direction` documents how to interpret the
/// scalar; the core only ever emits `"higher_is_more"` readings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HsiReading {
    pub axis: String,
    pub score: f64,
    pub confidence: f64,
    pub window_id: String,
    pub direction: String,
}

impl HsiReading {
    fn higher_is_more(axis: &str, score: f64, window_id: &str) -> Self {
        Self {
            axis: axis.to_string(),
            score,
            confidence: READING_CONFIDENCE,
            window_id: window_id.to_string(),
            direction: "higher_is_more".to_string(),
        }
    }
}

/// A named group of axis readings — `axes.affect` or `axes.behavior`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HsiAxisGroup {
    pub readings: Vec<HsiReading>,
}

/// The two reading groups the exporter ever populates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HsiAxes {
    pub affect: HsiAxisGroup,
    pub behavior: HsiAxisGroup,
}

/// Span and label of one window referenced by `window_ids`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HsiWindowInfo {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub label: String,
}

/// Producer identity carried on every snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HsiProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// One exported embedding vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HsiEmbedding {
    pub vector: Vec<f64>,
    pub dimension: usize,
    pub encoding: String,
    pub model: String,
    pub confidence: f64,
    pub window_id: String,
}

/// Ambient metadata carried alongside the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HsiMeta {
    pub sdk: String,
    pub platform: String,
    pub sampling_rate_hz: f64,
}

/// One exported HSI 1.0 snapshot (`HSI10Payload`), ready to sign and upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HsiSnapshot {
    pub hsi_version: String,
    pub observed_at_utc: DateTime<Utc>,
    pub computed_at_utc: DateTime<Utc>,
    pub producer: HsiProducer,
    pub window_ids: Vec<String>,
    pub windows: HashMap<String, HsiWindowInfo>,
    pub axes: HsiAxes,
    pub embeddings: Vec<HsiEmbedding>,
    pub privacy: HsiPrivacy,
    pub meta: HsiMeta,
}

/// Builder for `HsiSnapshot`s. `instance_id` is generated once per exporter
/// and held for its lifetime, per SPEC_FULL.md §4.7's stable producer identity.
pub struct HsiExporter {
    producer_name: String,
    instance_id: String,
}

impl Default for HsiExporter {
    fn default() -> Self {
        Self {
            producer_name: PRODUCER_NAME.to_string(),
            instance_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl HsiExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the default producer name. Mostly useful in tests.
    pub fn with_producer(mut self, producer: impl Into<String>) -> Self {
        self.producer_name = producer.into();
        self
    }

    /// Export a fused HSV into an HSI 1.0 snapshot.
    pub fn export(&self, hsv: &Hsv) -> HsiSnapshot {
        let window_type = hsv.meta.embedding.window_type;
        let observed_at_utc = Utc
            .timestamp_millis_opt(hsv.timestamp_ms)
            .single()
            .unwrap_or_else(Utc::now);
        let computed_at_utc = Utc::now().max(observed_at_utc);

        let window_id = format!("{}:{}", window_type.label(), observed_at_utc.to_rfc3339());
        let window_ids = vec![window_id.clone()];
        let mut windows = HashMap::new();
        windows.insert(
            window_id.clone(),
            HsiWindowInfo {
                start: observed_at_utc - window_type.duration(),
                end: observed_at_utc,
                label: window_type.label().to_string(),
            },
        );

        let mut affect_readings = Vec::new();
        if let Some(v) = hsv.meta.axes.affect.arousal_index {
            affect_readings.push(HsiReading::higher_is_more("arousal_index", v, &window_id));
        }
        if let Some(v) = hsv.meta.axes.affect.valence_stability {
            affect_readings.push(HsiReading::higher_is_more("valence_stability", v, &window_id));
        }

        let mut behavior_readings = Vec::new();
        if let Some(v) = hsv.meta.axes.engagement.engagement_stability {
            behavior_readings.push(HsiReading::higher_is_more(
                "engagement_stability",
                v,
                &window_id,
            ));
        }
        if let Some(v) = hsv.meta.axes.engagement.interaction_cadence {
            behavior_readings.push(HsiReading::higher_is_more(
                "interaction_cadence",
                v,
                &window_id,
            ));
        }
        if let Some(v) = hsv.meta.axes.activity.motion_index {
            behavior_readings.push(HsiReading::higher_is_more("motion", v, &window_id));
        }
        if let Some(v) = hsv.meta.axes.activity.posture_stability {
            behavior_readings.push(HsiReading::higher_is_more(
                "posture_stability",
                v,
                &window_id,
            ));
        }
        if let Some(v) = hsv.meta.axes.context.screen_active_ratio {
            behavior_readings.push(HsiReading::higher_is_more(
                "screen_active_ratio",
                v,
                &window_id,
            ));
        }
        if let Some(v) = hsv.meta.axes.context.session_fragmentation {
            behavior_readings.push(HsiReading::higher_is_more(
                "session_fragmentation",
                v,
                &window_id,
            ));
        }

        let embeddings = vec![HsiEmbedding {
            vector: hsv.meta.embedding.vector.clone(),
            dimension: hsv.meta.embedding.vector.len(),
            encoding: "float64".to_string(),
            model: EMBEDDING_MODEL.to_string(),
            confidence: EMBEDDING_CONFIDENCE,
            window_id: window_id.clone(),
        }];

        HsiSnapshot {
            hsi_version: HSI_VERSION.to_string(),
            observed_at_utc,
            computed_at_utc,
            producer: HsiProducer {
                name: self.producer_name.clone(),
                version: crate::VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            window_ids,
            windows,
            axes: HsiAxes {
                affect: HsiAxisGroup {
                    readings: affect_readings,
                },
                behavior: HsiAxisGroup {
                    readings: behavior_readings,
                },
            },
            embeddings,
            privacy: HsiPrivacy::default(),
            meta: HsiMeta {
                sdk: format!("{PRODUCER_NAME}/{}", crate::VERSION),
                platform: std::env::consts::OS.to_string(),
                sampling_rate_hz: hsv.meta.sampling_rate_hz,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ActivityAxis, AffectAxis, BehaviorWindowFeatures, ContextAxis, ContextDerived,
        EngagementAxis, HsvAxes, HsvMeta, StateEmbedding, WindowType, EMBEDDING_DIM, HSV_VERSION,
    };

    fn sample_hsv() -> Hsv {
        Hsv {
            version: HSV_VERSION.to_string(),
            timestamp_ms: 1_700_000_000_000,
            behavior: BehaviorWindowFeatures::default(),
            context: ContextDerived::default(),
            meta: HsvMeta {
                session_id: "session-1".to_string(),
                device: "device-1".to_string(),
                sampling_rate_hz: 1.0,
                embedding: StateEmbedding {
                    vector: vec![0.0; EMBEDDING_DIM],
                    window_type: WindowType::W30s,
                    timestamp_ms: 1_700_000_000_000,
                },
                axes: HsvAxes {
                    affect: AffectAxis {
                        arousal_index: Some(0.5),
                        valence_stability: None,
                    },
                    engagement: EngagementAxis::default(),
                    activity: ActivityAxis::default(),
                    context: ContextAxis::default(),
                },
            },
            emotion: Default::default(),
            focus: Default::default(),
        }
    }

    #[test]
    fn exports_hsi_1_0_with_fixed_privacy_block() {
        let snapshot = HsiExporter::new().export(&sample_hsv());
        assert_eq!(snapshot.hsi_version, "1.0");
        assert!(!snapshot.privacy.contains_pii);
        assert!(!snapshot.privacy.raw_biosignals_allowed);
        assert!(snapshot.privacy.derived_metrics_allowed);
        assert!(snapshot
            .axes
            .affect
            .readings
            .iter()
            .all(|r| r.direction == "higher_is_more"));
    }

    #[test]
    fn computed_at_is_never_before_observed_at() {
        let snapshot = HsiExporter::new().export(&sample_hsv());
        assert!(snapshot.computed_at_utc >= snapshot.observed_at_utc);
    }

    #[test]
    fn window_ids_are_a_nonempty_permutation_of_windows_keys() {
        let snapshot = HsiExporter::new().export(&sample_hsv());
        assert!(!snapshot.window_ids.is_empty());
        let mut from_ids = snapshot.window_ids.clone();
        from_ids.sort();
        let mut from_map: Vec<String> = snapshot.windows.keys().cloned().collect();
        from_map.sort();
        assert_eq!(from_ids, from_map);
    }

    #[test]
    fn every_reading_window_id_is_in_window_ids() {
        let snapshot = HsiExporter::new().export(&sample_hsv());
        for reading in snapshot
            .axes
            .affect
            .readings
            .iter()
            .chain(snapshot.axes.behavior.readings.iter())
        {
            assert!(snapshot.window_ids.contains(&reading.window_id));
        }
        for embedding in &snapshot.embeddings {
            assert!(snapshot.window_ids.contains(&embedding.window_id));
        }
    }

    #[test]
    fn affect_and_behavior_readings_only_include_populated_axes() {
        let snapshot = HsiExporter::new().export(&sample_hsv());
        assert_eq!(snapshot.axes.affect.readings.len(), 1);
        assert_eq!(snapshot.axes.affect.readings[0].axis, "arousal_index");
        assert!(snapshot.axes.behavior.readings.is_empty());
    }

    #[test]
    fn embedding_carries_required_fields() {
        let snapshot = HsiExporter::new().export(&sample_hsv());
        assert_eq!(snapshot.embeddings.len(), 1);
        let embedding = &snapshot.embeddings[0];
        assert_eq!(embedding.dimension, EMBEDDING_DIM);
        assert_eq!(embedding.encoding, "float64");
        assert!(embedding.confidence > 0.0 && embedding.confidence <= 1.0);
    }

    #[test]
    fn json_round_trip_preserves_top_level_fields() {
        let snapshot = HsiExporter::new().export(&sample_hsv());
        let encoded = serde_json::to_string(&snapshot).expect("encode");
        let decoded: HsiSnapshot = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(decoded.hsi_version, snapshot.hsi_version);
        assert_eq!(decoded.window_ids, snapshot.window_ids);
        assert_eq!(decoded.windows.len(), snapshot.windows.len());
    }
}
