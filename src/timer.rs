//! Quickfire countdown: one background task emitting a tick per period.
//!
//! The task is owned through `Countdown`; dropping or cancelling the handle
//! aborts the task and closes its channel, so nothing can fire afterwards.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

#[derive(Debug)]
pub struct Countdown {
  handle: JoinHandle<()>,
  ticks: mpsc::Receiver<()>,
}

impl Countdown {
  /// Spawn the ticking task. The first tick arrives one `period` from now.
  /// Must be called from within a tokio runtime.
  pub fn start(period: Duration) -> Self {
    let (tx, ticks) = mpsc::channel(4);
    let handle = tokio::spawn(async move {
      let mut interval = interval_at(Instant::now() + period, period);
      interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
      loop {
        interval.tick().await;
        if tx.send(()).await.is_err() {
          break;
        }
      }
      debug!(target: "quiz", "Countdown task finished");
    });
    Self { handle, ticks }
  }

  /// Wait for the next tick. `None` once the countdown was cancelled.
  pub async fn tick(&mut self) -> Option<()> {
    self.ticks.recv().await
  }

  pub fn cancel(&mut self) {
    self.handle.abort();
    self.ticks.close();
  }
}

impl Drop for Countdown {
  fn drop(&mut self) {
    self.handle.abort();
  }
}

/// `mm:ss` as shown next to a running quickfire quiz.
pub fn format_clock(total_secs: u32) -> String {
  format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}
