use std::time::Duration;

use chrono::Utc;
use promptdesk_core::{Msg, TimerId};
use promptdesk_logging::desk_debug;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// The one poll timer slot. Starting a timer cancels whatever occupied the
/// slot, and dropping the slot cancels the running timer.
#[derive(Debug, Default)]
pub struct PollTimer {
    active: Option<(TimerId, CancellationToken)>,
}

impl PollTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<TimerId> {
        self.active.as_ref().map(|(timer, _)| *timer)
    }

    /// Sends `Msg::Tick { timer, .. }` every `period`, first after one period.
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, timer: TimerId, period: Duration, tx: UnboundedSender<Msg>) {
        self.cancel_active();

        let token = CancellationToken::new();
        let cancelled = token.clone();
        tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticks.tick() => {
                        if tx.send(Msg::Tick { timer, at: Utc::now() }).is_err() {
                            break;
                        }
                    }
                }
            }
            desk_debug!("timer {} finished", timer);
        });
        self.active = Some((timer, token));
    }

    /// Cancels `timer` if it still occupies the slot.
    pub fn cancel(&mut self, timer: TimerId) {
        if self.active() == Some(timer) {
            self.cancel_active();
        }
    }

    pub fn cancel_active(&mut self) {
        if let Some((_, token)) = self.active.take() {
            token.cancel();
        }
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.cancel_active();
    }
}
