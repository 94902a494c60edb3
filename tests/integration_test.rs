//! End-to-end scenarios for the fusion pipeline and upload client, driven
//! through the public API rather than individual module internals. See
//! SPEC_FULL.md §8 for the literal scenarios this file covers.

use chrono::Utc;
use synheart_hsi_core::oracles::{
    CapabilityLevel, ConsentRecord, StaticCapabilityOracle, StaticConsentOracle,
};
use synheart_hsi_core::types::{BiosignalSample, WindowType};
use synheart_hsi_core::FusionEngine;

fn engine_with(consent: ConsentRecord) -> (FusionEngine, tokio::sync::watch::Receiver<Option<synheart_hsi_core::Hsv>>) {
    FusionEngine::new(
        Box::new(StaticConsentOracle::new(consent)),
        Box::new(StaticCapabilityOracle::new(CapabilityLevel::Research)),
        "test-device".to_string(),
        "session-e2e".to_string(),
        1.0,
    )
}

/// Scenario 1: empty window — a single biosignal sample but no behavioral
/// events for 30s. Expect a neutral behavior vector and a full-length
/// embedding.
#[tokio::test]
async fn empty_window_scenario() {
    let (engine, mut rx) = engine_with(ConsentRecord {
        biosignal: true,
        behavior: true,
        context: true,
    });

    engine.push_biosignal(BiosignalSample {
        heart_rate: Some(70.0),
        timestamp: Utc::now(),
        ..Default::default()
    });
    engine.tick(WindowType::W30s);

    let hsv = rx.borrow_and_update().clone().expect("hsv published");
    assert_eq!(hsv.behavior.idle_ratio, 1.0);
    assert_eq!(hsv.behavior.focus_hint, 1.0);
    assert_eq!(hsv.behavior.distraction_score, 0.0);
    assert_eq!(hsv.meta.embedding.vector.len(), 64);
}

/// Scenario 4: consent denied for behavior — fusion still proceeds using
/// the other channels, and behavior fields fall back to their defaults.
#[tokio::test]
async fn consent_denied_scenario() {
    let (engine, mut rx) = engine_with(ConsentRecord {
        biosignal: true,
        behavior: false,
        context: true,
    });

    engine.push_biosignal(BiosignalSample {
        heart_rate: Some(80.0),
        hrv: Some(50.0),
        timestamp: Utc::now(),
        ..Default::default()
    });
    engine.tick(WindowType::W30s);

    let hsv = rx.borrow_and_update().clone().expect("hsv published");
    assert_eq!(hsv.behavior.distraction_score, 0.0);
    assert_eq!(hsv.behavior.focus_hint, 0.0);
    assert!(hsv.meta.axes.affect.arousal_index.is_some());
    assert!(hsv.meta.axes.engagement.engagement_stability.is_none());
}

#[cfg(all(feature = "gateway", feature = "server"))]
mod upload_scenarios {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::Router;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use synheart_hsi_core::exporter::HsiExporter;
    use synheart_hsi_core::types::{
        BehaviorWindowFeatures, ContextDerived, HsvAxes, HsvMeta, StateEmbedding, WindowType,
        EMBEDDING_DIM, HSV_VERSION,
    };
    use synheart_hsi_core::{HsiSnapshot, Hsv, UploadClient, UploadConfig};
    use tokio::net::TcpListener;

    fn sample_snapshot() -> HsiSnapshot {
        let hsv = Hsv {
            version: HSV_VERSION.to_string(),
            timestamp_ms: Utc::now().timestamp_millis(),
            behavior: BehaviorWindowFeatures::default(),
            context: ContextDerived::default(),
            meta: HsvMeta {
                session_id: "session-e2e".to_string(),
                device: "test-device".to_string(),
                sampling_rate_hz: 1.0,
                embedding: StateEmbedding {
                    vector: vec![0.0; EMBEDDING_DIM],
                    window_type: WindowType::W30s,
                    timestamp_ms: Utc::now().timestamp_millis(),
                },
                axes: HsvAxes::default(),
            },
            emotion: Default::default(),
            focus: Default::default(),
        };
        HsiExporter::new().export(&hsv)
    }

    /// Scenario 5: server returns 401 on the first attempt. The client must
    /// raise `InvalidSignature` immediately, with no retry (401 is permanent).
    #[tokio::test]
    async fn upload_401_is_not_retried() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();
        let app = Router::new().route(
            "/v1/hsi/snapshots",
            post(move |_body: String| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (
                        StatusCode::UNAUTHORIZED,
                        r#"{"status":"error","code":"invalid_signature"}"#.to_string(),
                    )
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = UploadClient::new(UploadConfig {
            endpoint: format!("http://{addr}"),
            tenant_id: "tenant-1".to_string(),
            signing_key: b"test-key".to_vec(),
            api_key: "test-api-key".to_string(),
            subject_id: "subject-1".to_string(),
            subject_type: "pseudonymous_user".to_string(),
            max_retries: 3,
            max_queue_size: 10,
        });

        let result = client.upload(&sample_snapshot()).await;
        assert!(matches!(
            result,
            Err(synheart_hsi_core::UploadError::InvalidSignature)
        ));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    /// Scenario 6: two transient (500) failures then a 200. The client must
    /// succeed on the third attempt; total observed attempts == 3.
    #[tokio::test]
    async fn upload_retries_transient_failures_then_succeeds() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();
        let app = Router::new().route(
            "/v1/hsi/snapshots",
            post(move |_body: String| {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 {
                        (StatusCode::INTERNAL_SERVER_ERROR, "transient".to_string())
                    } else {
                        (
                            StatusCode::OK,
                            r#"{"status":"ok","snapshot_id":"snap-xyz","timestamp":"2026-01-01T00:00:00Z"}"#
                                .to_string(),
                        )
                    }
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = UploadClient::new(UploadConfig {
            endpoint: format!("http://{addr}"),
            tenant_id: "tenant-1".to_string(),
            signing_key: b"test-key".to_vec(),
            api_key: "test-api-key".to_string(),
            subject_id: "subject-1".to_string(),
            subject_type: "pseudonymous_user".to_string(),
            max_retries: 3,
            max_queue_size: 10,
        });

        let result = client.upload(&sample_snapshot()).await;
        let response = result.expect("upload should succeed on the third attempt");
        assert_eq!(response.snapshot_id.as_deref(), Some("snap-xyz"));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
