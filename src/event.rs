use tokio::sync::mpsc;

use crate::clipboard::ClipboardError;

/// Completions from background work, drained by the main loop
#[derive(Debug)]
pub enum AppEvent {
    /// The toast timer for the given show generation elapsed
    ToastExpired(u64),
    /// A clipboard write resolved
    CopyFinished(Result<(), ClipboardError>),
}

pub type EventSender = mpsc::UnboundedSender<AppEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<AppEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
