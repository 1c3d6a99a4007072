use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::clipboard::{self, ClipboardWriter};
use crate::config::AppConfig;
use crate::event::{self, AppEvent, EventReceiver, EventSender};
use crate::form::{Field, VerseForm};
use crate::store::storage::KeyValueStorage;
use crate::store::{StoreError, VerseStore};
use crate::theme::Theme;
use crate::toast::Notifier;

/// Status line messages clear after this long
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

pub const COPIED_MESSAGE: &str = "Copied!";
pub const COPY_FAILED_MESSAGE: &str = "Copy failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Form,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Help,
    Confirm,
    Alert,       // Blocking validation message, any key closes
    ThemePicker, // Theme filter selector
}

pub type Store = VerseStore<Box<dyn KeyValueStorage>>;

pub struct App {
    pub section: Section,
    pub popup: Popup,

    pub store: Store,
    pub form: VerseForm,
    pub notifier: Notifier,

    // Row in the displayed (possibly filtered) list
    pub selected: usize,
    pub picker_selected: usize,

    // Store index waiting for delete confirmation
    pub pending_delete: Option<usize>,
    pub alert_message: Option<String>,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,

    pub theme: Theme,
    confirm_delete: bool,

    clipboard: Arc<dyn ClipboardWriter>,
    events_tx: EventSender,
    events_rx: EventReceiver,
}

impl App {
    pub fn new(
        config: &AppConfig,
        storage: Box<dyn KeyValueStorage>,
        clipboard: Arc<dyn ClipboardWriter>,
    ) -> Self {
        let (events_tx, events_rx) = event::channel();
        let store = VerseStore::load(storage);
        tracing::info!("Starting with {} verses", store.len());

        Self {
            section: if store.is_empty() { Section::Form } else { Section::List },
            popup: Popup::None,

            store,
            form: VerseForm::default(),
            notifier: Notifier::new(config.toast_delay(), events_tx.clone()),

            selected: 0,
            picker_selected: 0,

            pending_delete: None,
            alert_message: None,

            status_message: None,
            status_message_time: None,

            theme: Theme::from_overrides(&config.colors),
            confirm_delete: config.confirm_delete,

            clipboard,
            events_tx,
            events_rx,
        }
    }

    /// Set a status message (auto-clears after 3 seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    /// Options shown by the theme picker; index 0 clears the filter
    pub fn picker_options(&self) -> Vec<String> {
        let mut options = vec!["All themes".to_string()];
        options.extend(self.store.distinct_themes());
        options
    }

    /// Store index of the selected row
    pub fn selected_index(&self) -> Option<usize> {
        self.store.displayed().get(self.selected).map(|(i, _)| *i)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Handle popups first
        if self.popup != Popup::None {
            return self.handle_popup_key(key);
        }

        match self.section {
            Section::Form => self.handle_form_key(key),
            Section::List => self.handle_list_key(key),
        }
    }

    fn handle_popup_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.popup {
            Popup::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Enter | KeyCode::Char('q')) {
                    self.popup = Popup::None;
                }
            }
            Popup::Alert => {
                self.alert_message = None;
                self.popup = Popup::None;
            }
            Popup::Confirm => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    self.popup = Popup::None;
                    if let Some(index) = self.pending_delete.take() {
                        self.delete_verse(index);
                    }
                }
                KeyCode::Char('n') | KeyCode::Esc => {
                    self.popup = Popup::None;
                    self.pending_delete = None;
                    self.status_message = None;
                }
                _ => {}
            },
            Popup::ThemePicker => self.handle_picker_key(key),
            Popup::None => {}
        }
        Ok(())
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Enter => self.submit(),
            KeyCode::Esc => {
                if self.store.editing().is_some() {
                    self.store.cancel_edit();
                    self.set_status("Edit cancelled");
                }
                self.form.clear();
                self.section = Section::List;
            }
            KeyCode::Down => self.form.next_field(),
            KeyCode::Up => self.form.prev_field(),
            KeyCode::Tab => {
                // Tab completes the theme when it can, otherwise moves to the list
                let completed = self.form.active == Field::Theme
                    && self.form.complete_theme(&self.store.distinct_themes());
                if !completed {
                    self.section = Section::List;
                }
            }
            KeyCode::BackTab => self.section = Section::List,
            KeyCode::Backspace => self.form.backspace(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.form.push_char(c);
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Tab | KeyCode::BackTab => self.section = Section::Form,

            KeyCode::Char('j') | KeyCode::Down => self.move_down(),
            KeyCode::Char('k') | KeyCode::Up => self.move_up(),
            KeyCode::Home | KeyCode::Char('g') => self.selected = 0,
            KeyCode::End | KeyCode::Char('G') => {
                self.selected = self.store.displayed().len().saturating_sub(1);
            }

            // New verse
            KeyCode::Char('a') | KeyCode::Char('n') => {
                self.store.cancel_edit();
                self.form.clear();
                self.section = Section::Form;
            }

            KeyCode::Char('e') | KeyCode::Enter => self.begin_edit(),
            KeyCode::Char('d') | KeyCode::Delete => self.request_delete(),
            KeyCode::Char('c') | KeyCode::Char('y') => self.copy_selected(),

            KeyCode::Char('f') => self.open_theme_picker(),
            KeyCode::Esc => {
                if self.notifier.is_visible() {
                    self.notifier.dismiss();
                } else if self.store.theme_filter().is_some() {
                    self.store.clear_filter();
                    self.clamp_selection();
                    self.set_status("Showing all verses");
                }
            }

            // Help (? or h)
            KeyCode::Char('?') | KeyCode::Char('h') => self.popup = Popup::Help,

            _ => {}
        }
        Ok(())
    }

    fn handle_picker_key(&mut self, key: KeyEvent) {
        let count = self.picker_options().len();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.popup = Popup::None,
            KeyCode::Char('j') | KeyCode::Down => {
                if self.picker_selected + 1 < count {
                    self.picker_selected += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.picker_selected = self.picker_selected.saturating_sub(1);
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                let options = self.picker_options();
                match self.picker_selected {
                    0 => {
                        self.store.clear_filter();
                        self.set_status("Showing all verses");
                    }
                    i => {
                        if let Some(theme) = options.get(i) {
                            self.store.filter_by_theme(theme);
                            self.set_status(format!("Filtered by theme: {}", theme));
                        }
                    }
                }
                self.selected = 0;
                self.popup = Popup::None;
            }
            _ => {}
        }
    }

    fn move_down(&mut self) {
        let len = self.store.displayed().len();
        if self.selected + 1 < len {
            self.selected += 1;
        }
    }

    fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let len = self.store.displayed().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    /// Select the row showing `index`, if it is visible
    fn select_store_index(&mut self, index: usize) {
        if let Some(row) = self.store.displayed().iter().position(|(i, _)| *i == index) {
            self.selected = row;
        } else {
            self.clamp_selection();
        }
    }

    /// Add or save the form contents
    fn submit(&mut self) {
        let verse = self.form.to_verse();
        let editing = self.store.editing();

        match self.store.submit(verse) {
            Ok(()) => {
                self.form.clear();
                match editing {
                    Some(index) => {
                        self.set_status("Changes saved");
                        self.select_store_index(index);
                    }
                    None => {
                        self.set_status("Verse added");
                        self.select_store_index(0);
                    }
                }
            }
            Err(e) if e.is_validation() => {
                tracing::debug!("Rejected verse: {}", e);
                self.alert_message = Some(e.to_string());
                self.popup = Popup::Alert;
            }
            Err(e @ StoreError::Storage(_)) => {
                // The list itself changed; only the write failed
                tracing::error!("{:#}", anyhow::Error::from(e));
                self.form.clear();
                self.set_status("Error: could not save verses to disk");
            }
            Err(e) => {
                self.store.cancel_edit();
                self.set_status(format!("Error: {}", e));
            }
        }
    }

    fn begin_edit(&mut self) {
        let Some(index) = self.selected_index() else {
            return;
        };
        if let Some(verse) = self.store.begin_edit(index) {
            self.set_status(format!("Editing {}", verse.reference()));
            self.form = VerseForm::from_verse(&verse);
            self.section = Section::Form;
        }
    }

    fn request_delete(&mut self) {
        let Some(index) = self.selected_index() else {
            return;
        };

        if !self.confirm_delete {
            self.delete_verse(index);
            return;
        }

        let reference = self
            .store
            .get(index)
            .map(|v| v.reference())
            .unwrap_or_default();
        self.pending_delete = Some(index);
        self.set_status(format!("Delete {}? (y/n)", reference));
        self.popup = Popup::Confirm;
    }

    fn delete_verse(&mut self, index: usize) {
        let was_editing = self.store.editing();

        match self.store.delete(index) {
            Ok(removed) => {
                self.set_status(format!("Deleted {}", removed.reference()));
            }
            Err(e @ StoreError::Storage(_)) => {
                tracing::error!("{:#}", anyhow::Error::from(e));
                self.set_status("Error: could not save verses to disk");
            }
            Err(e) => {
                self.set_status(format!("Error: {}", e));
                return;
            }
        }

        // The verse in the form no longer exists
        if was_editing == Some(index) {
            self.form.clear();
        }
        self.clamp_selection();
    }

    fn copy_selected(&mut self) {
        let Some(verse) = self.selected_index().and_then(|i| self.store.get(i)) else {
            return;
        };
        clipboard::copy_verse(self.clipboard.clone(), verse, self.events_tx.clone());
    }

    fn open_theme_picker(&mut self) {
        let options = self.picker_options();
        if options.len() == 1 {
            self.set_status("No themes to filter by");
            return;
        }
        self.picker_selected = self
            .store
            .theme_filter()
            .and_then(|current| options.iter().position(|t| t == current))
            .unwrap_or(0);
        self.popup = Popup::ThemePicker;
    }

    fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ToastExpired(generation) => {
                self.notifier.on_expired(generation);
            }
            AppEvent::CopyFinished(Ok(())) => self.notifier.show(COPIED_MESSAGE),
            AppEvent::CopyFinished(Err(e)) => {
                tracing::warn!("Failed to copy verse: {}", e);
                self.notifier.show(COPY_FAILED_MESSAGE);
            }
        }
    }

    /// Drain background events and expire the status line
    pub fn tick(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_event(event);
        }

        if let Some(time) = self.status_message_time {
            if time.elapsed() >= STATUS_TIMEOUT && self.popup != Popup::Confirm {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::FakeClipboard;
    use crate::store::storage::MemoryStorage;
    use crate::store::Verse;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(key(code)).unwrap();
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn app_with(config: AppConfig, clipboard: Arc<FakeClipboard>) -> App {
        App::new(&config, Box::new(MemoryStorage::new()), clipboard)
    }

    fn app() -> App {
        app_with(AppConfig::default(), Arc::new(FakeClipboard::default()))
    }

    fn open_new_form(app: &mut App) {
        app.section = Section::List;
        press(app, KeyCode::Char('a'));
    }

    /// Fill every field through the keyboard and submit
    fn enter_verse(app: &mut App, verse: &Verse) {
        open_new_form(app);
        for value in [&verse.text, &verse.book, &verse.chapter, &verse.verse_number, &verse.theme] {
            type_str(app, value);
            press(app, KeyCode::Down);
        }
        press(app, KeyCode::Enter);
    }

    fn john() -> Verse {
        Verse::new("For God so loved", "John", "3", "16", "Love")
    }

    fn psalm() -> Verse {
        Verse::new("The Lord is my shepherd", "Psalms", "23", "1", "Comfort")
    }

    #[test]
    fn test_starts_in_form_when_empty() {
        let app = app();
        assert_eq!(app.section, Section::Form);
    }

    #[test]
    fn test_add_through_form() {
        let mut app = app();
        app.section = Section::List;

        enter_verse(&mut app, &john());
        enter_verse(&mut app, &psalm());

        assert_eq!(app.store.verses(), &[psalm(), john()]);
        assert_eq!(app.form.to_verse(), Verse::default());
        assert_eq!(app.status_message.as_deref(), Some("Verse added"));
    }

    #[test]
    fn test_incomplete_form_raises_alert() {
        let mut app = app();
        type_str(&mut app, "Only text");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.popup, Popup::Alert);
        assert!(app.alert_message.as_deref().unwrap_or_default().contains("book"));
        assert!(app.store.is_empty());
        assert_eq!(app.form.text, "Only text");

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.popup, Popup::None);
        assert_eq!(app.form.text, "Only text");
    }

    #[test]
    fn test_edit_selected_verse() {
        let mut app = app();
        app.section = Section::List;
        enter_verse(&mut app, &john());
        enter_verse(&mut app, &psalm());
        app.section = Section::List;

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.section, Section::Form);
        assert_eq!(app.store.editing(), Some(1));
        assert_eq!(app.form.book, "John");

        // Jump to the verse field and change it
        for _ in 0..3 {
            press(&mut app, KeyCode::Down);
        }
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Backspace);
        type_str(&mut app, "17");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.store.len(), 2);
        assert_eq!(app.store.get(1).unwrap().verse_number, "17");
        assert_eq!(app.store.editing(), None);
        assert_eq!(app.status_message.as_deref(), Some("Changes saved"));
    }

    #[test]
    fn test_delete_asks_for_confirmation() {
        let mut app = app();
        app.section = Section::List;
        enter_verse(&mut app, &john());
        app.section = Section::List;

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.popup, Popup::Confirm);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.store.len(), 1);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.popup, Popup::None);
        assert!(app.store.is_empty());
    }

    #[test]
    fn test_delete_without_confirmation() {
        let config = AppConfig {
            confirm_delete: false,
            ..Default::default()
        };
        let mut app = app_with(config, Arc::new(FakeClipboard::default()));
        app.section = Section::List;
        enter_verse(&mut app, &john());
        app.section = Section::List;

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.popup, Popup::None);
        assert!(app.store.is_empty());
    }

    #[test]
    fn test_filtered_delete_targets_underlying_verse() {
        let mut app = app();
        app.section = Section::List;
        enter_verse(&mut app, &john());
        enter_verse(&mut app, &psalm());
        app.section = Section::List;

        // Picker options: All themes, Comfort, Love
        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.popup, Popup::ThemePicker);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.store.theme_filter(), Some("Love"));
        assert_eq!(app.selected_index(), Some(1));

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.store.verses(), &[psalm()]);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.store.theme_filter(), None);
        assert_eq!(app.store.displayed().len(), 1);
    }

    #[test]
    fn test_deleting_verse_under_edit_clears_form() {
        let config = AppConfig {
            confirm_delete: false,
            ..Default::default()
        };
        let mut app = app_with(config, Arc::new(FakeClipboard::default()));
        app.section = Section::List;
        enter_verse(&mut app, &john());
        app.section = Section::List;

        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::BackTab);
        press(&mut app, KeyCode::Char('d'));

        assert!(app.store.is_empty());
        assert_eq!(app.store.editing(), None);
        assert_eq!(app.form.to_verse(), Verse::default());
        assert_eq!(app.store.submit_label(), "Add");
    }

    #[test]
    fn test_tab_completes_theme() {
        let mut app = app();
        app.section = Section::List;
        enter_verse(&mut app, &john());

        open_new_form(&mut app);
        for _ in 0..4 {
            press(&mut app, KeyCode::Down);
        }
        type_str(&mut app, "lo");
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.form.theme, "Love");
        assert_eq!(app.section, Section::Form);
    }

    #[tokio::test]
    async fn test_copy_shows_toast() {
        let fake = Arc::new(FakeClipboard::default());
        let mut app = app_with(AppConfig::default(), fake.clone());
        app.section = Section::List;
        enter_verse(&mut app, &john());
        app.section = Section::List;

        press(&mut app, KeyCode::Char('c'));
        let event = app.events_rx.recv().await.unwrap();
        app.apply_event(event);

        assert!(app.notifier.is_visible());
        assert_eq!(app.notifier.state().message, COPIED_MESSAGE);
        assert_eq!(
            fake.written.lock().unwrap().as_slice(),
            ["For God so loved - John 3:16"]
        );
    }

    #[tokio::test]
    async fn test_copy_failure_shows_failure_toast() {
        let fake = Arc::new(FakeClipboard {
            fail: true,
            ..Default::default()
        });
        let mut app = app_with(AppConfig::default(), fake);
        app.section = Section::List;
        enter_verse(&mut app, &john());
        app.section = Section::List;

        press(&mut app, KeyCode::Char('y'));
        let event = app.events_rx.recv().await.unwrap();
        app.apply_event(event);

        assert_eq!(app.notifier.state().message, COPY_FAILED_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_clears_toast_and_status() {
        let config = AppConfig {
            toast_delay_ms: 500,
            ..Default::default()
        };
        let mut app = app_with(config, Arc::new(FakeClipboard::default()));
        enter_verse(&mut app, &john());
        assert_eq!(app.status_message.as_deref(), Some("Verse added"));

        app.section = Section::List;
        press(&mut app, KeyCode::Char('c'));
        let event = app.events_rx.recv().await.unwrap();
        app.apply_event(event);
        assert!(app.notifier.is_visible());

        tokio::time::sleep(Duration::from_millis(600)).await;
        app.tick();
        assert!(!app.notifier.is_visible());
        assert!(app.status_message.is_some());

        tokio::time::sleep(STATUS_TIMEOUT).await;
        app.tick();
        assert!(app.status_message.is_none());
        assert!(app.status_message_time.is_none());
    }
}
