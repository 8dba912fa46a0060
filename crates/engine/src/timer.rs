//! Countdown timer
//!
//! [`Countdown`] is the engine-side record of the single per-session timer:
//! its delay, whether it is armed, and a generation number bumped on every
//! arm or disarm. An expiry is only honoured when it carries the current
//! generation, so a sleep that fires after the clock was re-armed is a no-op.
//!
//! [`TimerDriver`] is the tokio side: it owns at most one sleeping task and
//! replaces it (abort first, then spawn) whenever the generation moves.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::debug;

use crate::session::SessionCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Countdown {
    generation: u64,
    delay_ms: u32,
    armed: bool,
}

impl Countdown {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Arm with a fresh generation, invalidating any pending expiry
    pub(crate) fn arm(&mut self, delay_ms: u32) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.delay_ms = delay_ms;
        self.armed = true;
        self.generation
    }

    pub(crate) fn disarm(&mut self) {
        if self.armed {
            self.generation = self.generation.wrapping_add(1);
            self.armed = false;
        }
    }

    /// Whether an expiry from `generation` should be applied
    pub fn accepts(&self, generation: u64) -> bool {
        self.armed && self.generation == generation
    }
}

/// Keeps one tokio sleep in step with a [`Countdown`]
#[derive(Debug, Default)]
pub(crate) struct TimerDriver {
    armed: Option<(u64, JoinHandle<()>)>,
}

impl TimerDriver {
    pub(crate) fn sync(
        &mut self,
        countdown: &Countdown,
        tx: &mpsc::WeakUnboundedSender<SessionCommand>,
    ) {
        let running = self.armed.as_ref().map(|(g, _)| *g);
        let wanted = countdown.is_armed().then(|| countdown.generation());
        if running == wanted {
            return;
        }

        self.cancel();

        if let Some(generation) = wanted {
            let delay = Duration::from_millis(countdown.delay_ms() as u64);
            let tx = tx.clone();
            debug!(generation, delay_ms = countdown.delay_ms(), "arming countdown");
            let handle = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Some(tx) = tx.upgrade() {
                    let _ = tx.send(SessionCommand::TimerExpired { generation });
                }
            });
            self.armed = Some((generation, handle));
        }
    }

    pub(crate) fn cancel(&mut self) {
        if let Some((generation, handle)) = self.armed.take() {
            handle.abort();
            debug!(generation, "countdown cancelled");
        }
    }
}

impl Drop for TimerDriver {
    fn drop(&mut self) {
        self.cancel();
    }
}
