//! Privacy-preserving transparency log.
//!
//! Tracks and exposes pipeline-stage counters — events ingested, ticks
//! fired, HSVs published, uploads attempted/succeeded/failed — without
//! storing any personal or identifying information. Structure (atomics,
//! optional persistence, `summary()`) is unchanged from the teacher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Transparency statistics for the current session.
#[derive(Debug)]
pub struct TransparencyLog {
    biosignal_samples: AtomicU64,
    behavioral_events: AtomicU64,
    context_samples: AtomicU64,
    ticks_fired: AtomicU64,
    hsvs_published: AtomicU64,
    uploads_attempted: AtomicU64,
    uploads_succeeded: AtomicU64,
    uploads_failed: AtomicU64,
    session_start: DateTime<Utc>,
    persist_path: Option<PathBuf>,
}

impl TransparencyLog {
    /// Create a new transparency log.
    pub fn new() -> Self {
        Self {
            biosignal_samples: AtomicU64::new(0),
            behavioral_events: AtomicU64::new(0),
            context_samples: AtomicU64::new(0),
            ticks_fired: AtomicU64::new(0),
            hsvs_published: AtomicU64::new(0),
            uploads_attempted: AtomicU64::new(0),
            uploads_succeeded: AtomicU64::new(0),
            uploads_failed: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a transparency log with persistence.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            eprintln!("Note: Could not load previous transparency stats: {e}");
        }

        log
    }

    pub fn record_biosignal_sample(&self) {
        self.biosignal_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_behavioral_event(&self) {
        self.behavioral_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_context_sample(&self) {
        self.context_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tick(&self) {
        self.ticks_fired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_hsv_published(&self) {
        self.hsvs_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upload_attempted(&self) {
        self.uploads_attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upload_succeeded(&self) {
        self.uploads_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upload_failed(&self) {
        self.uploads_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> TransparencyStats {
        TransparencyStats {
            biosignal_samples: self.biosignal_samples.load(Ordering::Relaxed),
            behavioral_events: self.behavioral_events.load(Ordering::Relaxed),
            context_samples: self.context_samples.load(Ordering::Relaxed),
            ticks_fired: self.ticks_fired.load(Ordering::Relaxed),
            hsvs_published: self.hsvs_published.load(Ordering::Relaxed),
            uploads_attempted: self.uploads_attempted.load(Ordering::Relaxed),
            uploads_succeeded: self.uploads_succeeded.load(Ordering::Relaxed),
            uploads_failed: self.uploads_failed.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds() as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Biosignal samples ingested: {}\n\
             - Behavioral events ingested: {}\n\
             - Context samples ingested: {}\n\
             - Window ticks fired: {}\n\
             - HSVs published: {}\n\
             - Uploads attempted/succeeded/failed: {}/{}/{}\n\
             - Session duration: {} seconds\n\
             \n\
             Privacy Guarantee:\n\
             - No key content or cursor coordinates captured\n\
             - No raw biosignal waveforms leave the device\n\
             - Only derived, aggregated metrics are exported",
            stats.biosignal_samples,
            stats.behavioral_events,
            stats.context_samples,
            stats.ticks_fired,
            stats.hsvs_published,
            stats.uploads_attempted,
            stats.uploads_succeeded,
            stats.uploads_failed,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                biosignal_samples: stats.biosignal_samples,
                behavioral_events: stats.behavioral_events,
                context_samples: stats.context_samples,
                ticks_fired: stats.ticks_fired,
                hsvs_published: stats.hsvs_published,
                uploads_attempted: stats.uploads_attempted,
                uploads_succeeded: stats.uploads_succeeded,
                uploads_failed: stats.uploads_failed,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load stats from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

                self.biosignal_samples
                    .store(persisted.biosignal_samples, Ordering::Relaxed);
                self.behavioral_events
                    .store(persisted.behavioral_events, Ordering::Relaxed);
                self.context_samples
                    .store(persisted.context_samples, Ordering::Relaxed);
                self.ticks_fired.store(persisted.ticks_fired, Ordering::Relaxed);
                self.hsvs_published
                    .store(persisted.hsvs_published, Ordering::Relaxed);
                self.uploads_attempted
                    .store(persisted.uploads_attempted, Ordering::Relaxed);
                self.uploads_succeeded
                    .store(persisted.uploads_succeeded, Ordering::Relaxed);
                self.uploads_failed
                    .store(persisted.uploads_failed, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.biosignal_samples.store(0, Ordering::Relaxed);
        self.behavioral_events.store(0, Ordering::Relaxed);
        self.context_samples.store(0, Ordering::Relaxed);
        self.ticks_fired.store(0, Ordering::Relaxed);
        self.hsvs_published.store(0, Ordering::Relaxed);
        self.uploads_attempted.store(0, Ordering::Relaxed);
        self.uploads_succeeded.store(0, Ordering::Relaxed);
        self.uploads_failed.store(0, Ordering::Relaxed);
    }
}

impl Default for TransparencyLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of transparency statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransparencyStats {
    pub biosignal_samples: u64,
    pub behavioral_events: u64,
    pub context_samples: u64,
    pub ticks_fired: u64,
    pub hsvs_published: u64,
    pub uploads_attempted: u64,
    pub uploads_succeeded: u64,
    pub uploads_failed: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    biosignal_samples: u64,
    behavioral_events: u64,
    context_samples: u64,
    ticks_fired: u64,
    hsvs_published: u64,
    uploads_attempted: u64,
    uploads_succeeded: u64,
    uploads_failed: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared transparency log.
pub type SharedTransparencyLog = Arc<TransparencyLog>;

/// Create a new shared transparency log.
pub fn create_shared_log() -> SharedTransparencyLog {
    Arc::new(TransparencyLog::new())
}

/// Create a new shared transparency log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedTransparencyLog {
    Arc::new(TransparencyLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_events_across_stages() {
        let log = TransparencyLog::new();

        log.record_biosignal_sample();
        log.record_biosignal_sample();
        log.record_behavioral_event();
        log.record_tick();
        log.record_hsv_published();

        let stats = log.stats();
        assert_eq!(stats.biosignal_samples, 2);
        assert_eq!(stats.behavioral_events, 1);
        assert_eq!(stats.ticks_fired, 1);
        assert_eq!(stats.hsvs_published, 1);
    }

    #[test]
    fn reset_clears_all_counters() {
        let log = TransparencyLog::new();

        log.record_biosignal_sample();
        log.record_upload_attempted();
        log.record_upload_succeeded();
        log.reset();

        let stats = log.stats();
        assert_eq!(stats.biosignal_samples, 0);
        assert_eq!(stats.uploads_succeeded, 0);
    }

    #[test]
    fn summary_mentions_privacy_guarantee() {
        let log = TransparencyLog::new();
        let summary = log.summary();

        assert!(summary.contains("Biosignal samples"));
        assert!(summary.contains("Privacy Guarantee"));
        assert!(summary.contains("raw biosignal waveforms"));
    }
}
