use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::event::{AppEvent, EventSender};
use crate::store::Verse;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClipboardError {
    #[error("Clipboard not available: {0}")]
    Unavailable(String),

    #[error("Clipboard write failed: {0}")]
    Write(String),
}

/// Something that can take text for the system clipboard
pub trait ClipboardWriter: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;

    /// Write `text` and keep serving it until another application replaces
    /// it. Blocks for that long where the clipboard lives in the owning
    /// process (X11, Wayland).
    fn write_and_hold(&self, text: &str) -> Result<(), ClipboardError> {
        self.write_text(text)
    }
}

/// System clipboard through arboard.
///
/// The handle is opened on first use and kept for the lifetime of the app;
/// on X11 the copied text only stays available while it is alive.
#[derive(Default)]
pub struct SystemClipboard {
    handle: Mutex<Option<arboard::Clipboard>>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the handle now so a missing display shows up before any output
    pub fn open() -> Result<Self, ClipboardError> {
        let clipboard = Self::new();
        clipboard.with_handle(|_| Ok(()))?;
        Ok(clipboard)
    }

    fn with_handle<T>(
        &self,
        f: impl FnOnce(&mut arboard::Clipboard) -> Result<T, ClipboardError>,
    ) -> Result<T, ClipboardError> {
        let mut guard = self
            .handle
            .lock()
            .map_err(|_| ClipboardError::Unavailable("clipboard lock poisoned".to_string()))?;

        if guard.is_none() {
            let clipboard = arboard::Clipboard::new()
                .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            *guard = Some(clipboard);
        }

        match guard.as_mut() {
            Some(clipboard) => f(clipboard),
            None => Err(ClipboardError::Unavailable("no clipboard handle".to_string())),
        }
    }
}

impl ClipboardWriter for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        self.with_handle(|clipboard| {
            clipboard
                .set_text(text.to_owned())
                .map_err(|e| ClipboardError::Write(e.to_string()))
        })
    }

    #[cfg(target_os = "linux")]
    fn write_and_hold(&self, text: &str) -> Result<(), ClipboardError> {
        use arboard::SetExtLinux;

        self.with_handle(|clipboard| {
            clipboard
                .set()
                .wait()
                .text(text.to_owned())
                .map_err(|e| ClipboardError::Write(e.to_string()))
        })
    }
}

/// Text put on the clipboard for a verse: "text - Book chapter:verse"
pub fn format_verse(verse: &Verse) -> String {
    format!(
        "{} - {} {}:{}",
        verse.text, verse.book, verse.chapter, verse.verse_number
    )
}

/// Write `text` on a blocking worker thread
pub async fn write_text(writer: Arc<dyn ClipboardWriter>, text: String) -> Result<(), ClipboardError> {
    tokio::task::spawn_blocking(move || writer.write_text(&text))
        .await
        .unwrap_or_else(|e| Err(ClipboardError::Write(format!("clipboard task failed: {}", e))))
}

/// Write `text` and hold it on a blocking worker thread, for one-shot
/// processes that would otherwise take the clipboard with them on exit
pub async fn write_and_hold(writer: Arc<dyn ClipboardWriter>, text: String) -> Result<(), ClipboardError> {
    tokio::task::spawn_blocking(move || writer.write_and_hold(&text))
        .await
        .unwrap_or_else(|e| Err(ClipboardError::Write(format!("clipboard task failed: {}", e))))
}

/// Fire-and-forget copy; the outcome comes back as `AppEvent::CopyFinished`
pub fn copy_verse(writer: Arc<dyn ClipboardWriter>, verse: &Verse, events: EventSender) {
    let text = format_verse(verse);
    tracing::debug!("Copying {} characters", text.len());

    tokio::spawn(async move {
        let result = write_text(writer, text).await;
        let _ = events.send(AppEvent::CopyFinished(result));
    });
}

/// Records writes in memory; optionally fails every write
#[cfg(test)]
#[derive(Default)]
pub struct FakeClipboard {
    pub written: Mutex<Vec<String>>,
    pub held: Mutex<Vec<String>>,
    pub fail: bool,
}

#[cfg(test)]
impl ClipboardWriter for FakeClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        if self.fail {
            return Err(ClipboardError::Unavailable("no display".to_string()));
        }
        self.written
            .lock()
            .map_err(|_| ClipboardError::Write("poisoned".to_string()))?
            .push(text.to_string());
        Ok(())
    }

    fn write_and_hold(&self, text: &str) -> Result<(), ClipboardError> {
        self.write_text(text)?;
        self.held
            .lock()
            .map_err(|_| ClipboardError::Write("poisoned".to_string()))?
            .push(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event;

    fn john() -> Verse {
        Verse::new("For God so loved...", "John", "3", "16", "Love")
    }

    #[test]
    fn test_format_verse() {
        assert_eq!(format_verse(&john()), "For God so loved... - John 3:16");
    }

    #[tokio::test]
    async fn test_copy_verse_success() {
        let fake = Arc::new(FakeClipboard::default());
        let (tx, mut rx) = event::channel();

        copy_verse(fake.clone(), &john(), tx);

        match rx.recv().await {
            Some(AppEvent::CopyFinished(Ok(()))) => {}
            other => panic!("unexpected event: {:?}", other),
        }
        let written = fake.written.lock().unwrap();
        assert_eq!(written.as_slice(), ["For God so loved... - John 3:16"]);
    }

    #[tokio::test]
    async fn test_copy_verse_failure_is_reported() {
        let fake = Arc::new(FakeClipboard {
            fail: true,
            ..Default::default()
        });
        let (tx, mut rx) = event::channel();

        copy_verse(fake.clone(), &john(), tx);

        match rx.recv().await {
            Some(AppEvent::CopyFinished(Err(ClipboardError::Unavailable(_)))) => {}
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(fake.written.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_and_hold_keeps_ownership() {
        let fake = Arc::new(FakeClipboard::default());

        write_and_hold(fake.clone(), format_verse(&john())).await.unwrap();

        assert_eq!(
            fake.held.lock().unwrap().as_slice(),
            ["For God so loved... - John 3:16"]
        );
    }

    #[tokio::test]
    async fn test_write_and_hold_failure() {
        let fake = Arc::new(FakeClipboard {
            fail: true,
            ..Default::default()
        });

        let result = write_and_hold(fake.clone(), format_verse(&john())).await;

        assert!(matches!(result, Err(ClipboardError::Unavailable(_))));
        assert!(fake.held.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tui_copy_does_not_hold() {
        let fake = Arc::new(FakeClipboard::default());
        let (tx, mut rx) = event::channel();

        copy_verse(fake.clone(), &john(), tx);
        rx.recv().await;

        assert_eq!(fake.written.lock().unwrap().len(), 1);
        assert!(fake.held.lock().unwrap().is_empty());
    }
}
