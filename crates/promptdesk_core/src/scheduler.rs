use std::time::Duration;

use promptdesk_logging::desk_debug;

use crate::Effect;

pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_secs(3);
/// Ten minutes at the default period.
pub const DEFAULT_MAX_POLLS: u32 = 200;

/// Identifies one incarnation of the poll timer. Ticks carry the id of the
/// timer that produced them so ticks from a replaced timer can be dropped.
pub type TimerId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub period: Duration,
    /// `None` polls a job for as long as it stays pending.
    pub max_polls: Option<u32>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            period: DEFAULT_POLL_PERIOD,
            max_polls: Some(DEFAULT_MAX_POLLS),
        }
    }
}

/// Bookkeeping for the single process-wide poll timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollScheduler {
    settings: PollSettings,
    active: Option<TimerId>,
    last_issued: TimerId,
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new(PollSettings::default())
    }
}

impl PollScheduler {
    pub fn new(settings: PollSettings) -> Self {
        Self {
            settings,
            active: None,
            last_issued: 0,
        }
    }

    pub fn active_timer(&self) -> Option<TimerId> {
        self.active
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Starts the timer, replacing any timer that is already running.
    pub fn start(&mut self) -> Vec<Effect> {
        let mut effects = self.stop();
        self.last_issued += 1;
        let timer = self.last_issued;
        self.active = Some(timer);
        desk_debug!("scheduler: starting timer {}", timer);
        effects.push(Effect::StartTimer {
            timer,
            period: self.settings.period,
        });
        effects
    }

    pub fn stop(&mut self) -> Vec<Effect> {
        match self.active.take() {
            Some(timer) => {
                desk_debug!("scheduler: cancelling timer {}", timer);
                vec![Effect::CancelTimer { timer }]
            }
            None => Vec::new(),
        }
    }

    /// Only the currently active timer may drive a poll pass.
    pub fn accepts(&self, timer: TimerId) -> bool {
        self.active == Some(timer)
    }

    pub(crate) fn poll_budget_exhausted(&self, polls: u32) -> bool {
        self.settings
            .max_polls
            .is_some_and(|max_polls| polls >= max_polls)
    }
}
