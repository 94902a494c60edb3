//! Window scheduler.
//!
//! Drives four independent `tokio::time::interval` tasks, one per
//! `WindowType`, plus a single immediate tick covering all four windows at
//! startup. Each tick invokes the supplied callback with the window type
//! that fired. `stop` aborts every task — see SPEC_FULL.md §4.5.

use crate::types::WindowType;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Duration as TokioDuration;

/// Callback invoked on every window tick, including the immediate
/// all-windows tick fired once at `start`.
pub type TickHandler = Arc<dyn Fn(WindowType) + Send + Sync>;

/// Owns the four interval tasks. Dropping without calling `stop` aborts them
/// too, since `JoinHandle::abort` is called from `Drop`.
pub struct WindowScheduler {
    handles: Vec<JoinHandle<()>>,
}

impl WindowScheduler {
    /// Start all four interval tasks plus one immediate tick covering every
    /// window type.
    pub fn start(on_tick: TickHandler) -> Self {
        for wt in WindowType::ALL {
            on_tick(wt);
        }

        let mut handles = Vec::with_capacity(WindowType::ALL.len());
        for wt in WindowType::ALL {
            let period = std_duration(wt);
            let handler = on_tick.clone();
            let handle = tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                interval.tick().await; // first tick fires immediately; already covered above
                loop {
                    interval.tick().await;
                    handler(wt);
                }
            });
            handles.push(handle);
        }

        Self { handles }
    }

    /// Abort all scheduled tasks. Idempotent.
    pub fn stop(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for WindowScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn std_duration(window_type: WindowType) -> TokioDuration {
    window_type
        .duration()
        .to_std()
        .expect("window durations are all positive and well within std::time::Duration's range")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn immediate_tick_fires_for_all_four_windows_at_start() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let mut scheduler = WindowScheduler::start(Arc::new(move |_wt| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(count.load(Ordering::SeqCst), 4);
        scheduler.stop();
    }
}
