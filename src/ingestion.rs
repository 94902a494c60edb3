//! Multi-source ingestion fan-in.
//!
//! Subscribes to three independent push streams (biosignal, behavioral,
//! context), caches the latest value per source, and republishes a combined
//! `SignalData` whenever a biosignal sample is cached — see SPEC_FULL.md
//! §4.1. Behavioral arrivals are also forwarded to the window aggregator.
//!
//! Built on `crossbeam_channel`, the teacher's cross-thread communication
//! primitive, read by a single dedicated thread so per-source caches are
//! mutated by exactly one owner.

use crate::error::{CoreError, SourceStreamError};
use crate::types::{BehavioralEvent, BiosignalSample, ContextSample, SignalData};
use crossbeam_channel::{Receiver, Select, Sender};
use std::thread::JoinHandle;

/// Adapter contract for a biosignal source (consumed, not implemented here).
pub trait BiosignalAdapter: Send {
    fn initialize(&mut self) -> Result<(), CoreError>;
    fn subscribe(&self) -> Receiver<BiosignalSample>;
    fn dispose(&mut self) -> Result<(), CoreError>;
}

/// Adapter contract for a behavioral event source.
pub trait BehavioralAdapter: Send {
    fn initialize(&mut self) -> Result<(), CoreError>;
    fn subscribe(&self) -> Receiver<BehavioralEvent>;
    fn dispose(&mut self) -> Result<(), CoreError>;
}

/// Adapter contract for a context signal source.
pub trait ContextAdapter: Send {
    fn initialize(&mut self) -> Result<(), CoreError>;
    fn subscribe(&self) -> Receiver<ContextSample>;
    fn dispose(&mut self) -> Result<(), CoreError>;
}

/// A single fan-in error observation, reported without tearing down the
/// owning source's subscription.
pub type StreamErrorHook = Box<dyn Fn(SourceStreamError) + Send>;

/// The multi-source ingestion fan-in.
///
/// Start is idempotent; stop cancels the read loop and clears caches. A
/// single source's stream closing is logged and does not affect the others.
pub struct Fanin {
    combined_rx: Receiver<SignalData>,
    behavioral_rx: Receiver<BehavioralEvent>,
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl Fanin {
    /// Start the fan-in loop over three already-initialized adapter
    /// receivers. Returns the combined `SignalData` stream and a separate
    /// behavioral-event stream for the window aggregator.
    pub fn start(
        bio_rx: Receiver<BiosignalSample>,
        behav_rx: Receiver<BehavioralEvent>,
        ctx_rx: Receiver<ContextSample>,
        on_stream_error: Option<StreamErrorHook>,
    ) -> Self {
        let (combined_tx, combined_rx) = crossbeam_channel::unbounded::<SignalData>();
        let (behav_out_tx, behav_out_rx) = crossbeam_channel::unbounded::<BehavioralEvent>();
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);

        let worker = std::thread::spawn(move || {
            let mut last_bio: Option<BiosignalSample> = None;
            let mut last_behav: Option<BehavioralEvent> = None;
            let mut last_ctx: Option<ContextSample> = None;

            loop {
                let mut sel = Select::new();
                let bio_idx = sel.recv(&bio_rx);
                let behav_idx = sel.recv(&behav_rx);
                let ctx_idx = sel.recv(&ctx_rx);
                let stop_idx = sel.recv(&stop_rx);

                let oper = sel.select();
                match oper.index() {
                    i if i == stop_idx => {
                        let _ = oper.recv(&stop_rx);
                        break;
                    }
                    i if i == bio_idx => match oper.recv(&bio_rx) {
                        Ok(sample) => {
                            last_bio = Some(sample);
                            Self::publish_if_ready(
                                &combined_tx,
                                &last_bio,
                                &last_behav,
                                &last_ctx,
                            );
                        }
                        Err(_) => Self::report(&on_stream_error, "biosignal"),
                    },
                    i if i == behav_idx => match oper.recv(&behav_rx) {
                        Ok(event) => {
                            last_behav = Some(event.clone());
                            let _ = behav_out_tx.send(event);
                            Self::publish_if_ready(
                                &combined_tx,
                                &last_bio,
                                &last_behav,
                                &last_ctx,
                            );
                        }
                        Err(_) => Self::report(&on_stream_error, "behavioral"),
                    },
                    i if i == ctx_idx => match oper.recv(&ctx_rx) {
                        Ok(sample) => {
                            last_ctx = Some(sample);
                            Self::publish_if_ready(
                                &combined_tx,
                                &last_bio,
                                &last_behav,
                                &last_ctx,
                            );
                        }
                        Err(_) => Self::report(&on_stream_error, "context"),
                    },
                    _ => unreachable!("Select only registers four operations"),
                }
            }
        });

        Self {
            combined_rx,
            behavioral_rx: behav_out_rx,
            stop_tx: Some(stop_tx),
            worker: Some(worker),
        }
    }

    fn publish_if_ready(
        combined_tx: &Sender<SignalData>,
        last_bio: &Option<BiosignalSample>,
        last_behav: &Option<BehavioralEvent>,
        last_ctx: &Option<ContextSample>,
    ) {
        if let Some(bio) = last_bio {
            let _ = combined_tx.send(SignalData {
                last_bio: bio.clone(),
                last_behav: last_behav.clone(),
                last_ctx: last_ctx.clone(),
            });
        }
    }

    fn report(hook: &Option<StreamErrorHook>, source: &str) {
        if let Some(hook) = hook {
            hook(SourceStreamError {
                source_name: source.to_string(),
                message: "stream closed unexpectedly".to_string(),
            });
        } else {
            tracing::warn!(source, "source stream closed; subscription not restarted");
        }
    }

    /// The combined `SignalData` stream, emitted only once a biosignal
    /// sample has been observed.
    pub fn combined(&self) -> Receiver<SignalData> {
        self.combined_rx.clone()
    }

    /// Behavioral events forwarded for the window aggregator.
    pub fn behavioral_events(&self) -> Receiver<BehavioralEvent> {
        self.behavioral_rx.clone()
    }

    /// Cancel the read loop. Idempotent.
    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Fanin {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BehavioralEventType, BiosignalSample};
    use chrono::Utc;
    use std::time::Duration;

    #[test]
    fn emits_only_after_biosignal_observed() {
        let (bio_tx, bio_rx) = crossbeam_channel::unbounded();
        let (behav_tx, behav_rx) = crossbeam_channel::unbounded();
        let (_ctx_tx, ctx_rx) = crossbeam_channel::unbounded();

        let mut fanin = Fanin::start(bio_rx, behav_rx, ctx_rx, None);
        let combined = fanin.combined();

        behav_tx
            .send(BehavioralEvent {
                event_type: BehavioralEventType::Tap,
                timestamp: Utc::now(),
                magnitude: None,
            })
            .unwrap();
        assert!(combined.recv_timeout(Duration::from_millis(200)).is_err());

        bio_tx
            .send(BiosignalSample {
                heart_rate: Some(70.0),
                timestamp: Utc::now(),
                ..Default::default()
            })
            .unwrap();
        let signal = combined.recv_timeout(Duration::from_secs(1)).unwrap();
        assert!(signal.last_behav.is_some());

        fanin.stop();
    }
}
