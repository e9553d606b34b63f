use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// One elapsed second of the question on screen during visit `visit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub visit: u64,
}

/// How the per-question countdown is driven.
#[derive(Debug, Clone, Default)]
pub enum Ticker {
    /// No background task; the owner calls `PracticeSession::tick` itself.
    #[default]
    Manual,
    /// A runtime task sends one `Tick` per `period`.
    Interval {
        runtime: Handle,
        period: Duration,
        sink: mpsc::UnboundedSender<Tick>,
    },
}

impl Ticker {
    #[must_use]
    pub fn manual() -> Self {
        Self::Manual
    }

    /// Background ticker on `runtime`, plus the receiving end of its ticks.
    #[must_use]
    pub fn interval(runtime: Handle, period: Duration) -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (sink, ticks) = mpsc::unbounded_channel();
        (
            Self::Interval {
                runtime,
                period,
                sink,
            },
            ticks,
        )
    }

    /// Start counting for `visit`. `None` for a manual ticker.
    pub(crate) fn arm(&self, visit: u64) -> Option<Countdown> {
        let Self::Interval {
            runtime,
            period,
            sink,
        } = self
        else {
            return None;
        };

        let period = *period;
        let sink = sink.clone();
        let task = runtime.spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if sink.send(Tick { visit }).is_err() {
                    break;
                }
            }
        });
        Some(Countdown { task })
    }
}

/// A running countdown task. Aborted when cancelled or dropped.
#[derive(Debug)]
pub struct Countdown {
    task: JoinHandle<()>,
}

impl Countdown {
    pub fn cancel(self) {
        drop(self);
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.task.abort();
    }
}
