//! Self-expiring toast notifications.
//!
//! Every `show` spawns a one-shot timer task that reports back through the
//! app event channel. Showing again aborts the previous timer, and dropping
//! the notifier aborts whatever is still pending.

use std::time::Duration;
use tokio::task::JoinHandle;

use crate::event::{AppEvent, EventSender};

/// Default time a toast stays on screen
pub const DEFAULT_TOAST_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToastState {
    pub visible: bool,
    pub message: String,
}

pub struct Notifier {
    state: ToastState,
    delay: Duration,
    generation: u64,
    timer: Option<JoinHandle<()>>,
    events: EventSender,
}

impl Notifier {
    pub fn new(delay: Duration, events: EventSender) -> Self {
        Self {
            state: ToastState::default(),
            delay,
            generation: 0,
            timer: None,
            events,
        }
    }

    pub fn state(&self) -> &ToastState {
        &self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state.visible
    }

    /// Show `message` and (re)start the dismiss timer. Must run inside a tokio runtime.
    pub fn show(&mut self, message: impl Into<String>) {
        self.cancel_timer();

        self.generation += 1;
        self.state = ToastState {
            visible: true,
            message: message.into(),
        };

        let generation = self.generation;
        let delay = self.delay;
        let events = self.events.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the app is shutting down
            let _ = events.send(AppEvent::ToastExpired(generation));
        }));
    }

    /// Timer callback; returns true if the toast was actually hidden
    pub fn on_expired(&mut self, generation: u64) -> bool {
        if generation != self.generation || !self.state.visible {
            tracing::trace!("Ignoring stale toast timer {}", generation);
            return false;
        }
        self.timer = None;
        self.state.visible = false;
        true
    }

    /// Hide right away
    pub fn dismiss(&mut self) {
        self.cancel_timer();
        self.state.visible = false;
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event;
    use tokio::time::{sleep, timeout, Instant};

    async fn next_expiry(rx: &mut event::EventReceiver) -> Option<u64> {
        match timeout(Duration::from_secs(10), rx.recv()).await {
            Ok(Some(AppEvent::ToastExpired(generation))) => Some(generation),
            _ => None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_toast_hides_after_delay() {
        let (tx, mut rx) = event::channel();
        let mut notifier = Notifier::new(DEFAULT_TOAST_DELAY, tx);

        let start = Instant::now();
        notifier.show("Copied!");
        assert!(notifier.is_visible());
        assert_eq!(notifier.state().message, "Copied!");

        let generation = next_expiry(&mut rx).await.unwrap();
        assert_eq!(start.elapsed(), DEFAULT_TOAST_DELAY);
        assert!(notifier.on_expired(generation));
        assert!(!notifier.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_show_replaces_timer() {
        let (tx, mut rx) = event::channel();
        let mut notifier = Notifier::new(DEFAULT_TOAST_DELAY, tx);

        notifier.show("Copied!");
        sleep(Duration::from_millis(400)).await;

        let second = Instant::now();
        notifier.show("Copied!");

        let generation = next_expiry(&mut rx).await.unwrap();
        assert_eq!(second.elapsed(), DEFAULT_TOAST_DELAY);
        assert!(notifier.on_expired(generation));

        // The first timer was aborted, so nothing else arrives
        assert_eq!(next_expiry(&mut rx).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_generation_is_ignored() {
        let (tx, _rx) = event::channel();
        let mut notifier = Notifier::new(Duration::from_millis(50), tx);

        notifier.show("one");
        notifier.show("two");

        assert!(!notifier.on_expired(1));
        assert!(notifier.is_visible());
        assert_eq!(notifier.state().message, "two");
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_timer() {
        let (tx, mut rx) = event::channel();
        let notifier_tx = tx.clone();
        {
            let mut notifier = Notifier::new(DEFAULT_TOAST_DELAY, notifier_tx);
            notifier.show("Copied!");
        }

        assert_eq!(next_expiry(&mut rx).await, None);
        drop(tx);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_hides_and_cancels() {
        let (tx, mut rx) = event::channel();
        let mut notifier = Notifier::new(DEFAULT_TOAST_DELAY, tx);

        notifier.show("Copied!");
        notifier.dismiss();
        assert!(!notifier.is_visible());
        assert_eq!(next_expiry(&mut rx).await, None);
    }
}
