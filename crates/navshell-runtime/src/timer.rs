//! Cancellable timer slots.
//!
//! A slot holds at most one armed timer. Arming cancels whatever was armed
//! before, and every ticket carries a generation so a timer task that already
//! woke up can tell it was superseded.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct TimerTicket {
    pub generation: u64,
    pub token: CancellationToken,
}

#[derive(Debug, Default)]
pub struct TimerSlot {
    armed: Option<TimerTicket>,
    next_generation: u64,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the armed timer (if any) and arms a fresh one.
    pub fn arm(&mut self) -> TimerTicket {
        self.disarm();
        self.next_generation += 1;
        let ticket = TimerTicket {
            generation: self.next_generation,
            token: CancellationToken::new(),
        };
        self.armed = Some(ticket.clone());
        ticket
    }

    /// Returns true if a timer was armed.
    pub fn disarm(&mut self) -> bool {
        match self.armed.take() {
            Some(ticket) => {
                ticket.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.armed
            .as_ref()
            .is_some_and(|t| t.generation == generation)
    }

    /// Claims the slot for a timer that fired. False means the ticket was
    /// disarmed or replaced in the meantime and the callback must not run.
    pub fn fire(&mut self, generation: u64) -> bool {
        if self.is_current(generation) {
            self.armed = None;
            true
        } else {
            false
        }
    }
}

/// Sleeps for `delay` unless `token` is cancelled first. Returns true when
/// the delay elapsed.
pub async fn sleep_or_cancel(delay: Duration, token: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        () = token.cancelled() => false,
        () = tokio::time::sleep(delay) => true,
    }
}
