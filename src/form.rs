use crate::store::Verse;

/// The five inputs of the verse form, in tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    #[default]
    Text,
    Book,
    Chapter,
    VerseNumber,
    Theme,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Text,
        Field::Book,
        Field::Chapter,
        Field::VerseNumber,
        Field::Theme,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::Text => "Text",
            Field::Book => "Book",
            Field::Chapter => "Chapter",
            Field::VerseNumber => "Verse",
            Field::Theme => "Theme",
        }
    }

    pub fn is_required(self) -> bool {
        self != Field::Theme
    }

    fn next(self) -> Self {
        match self {
            Field::Text => Field::Book,
            Field::Book => Field::Chapter,
            Field::Chapter => Field::VerseNumber,
            Field::VerseNumber => Field::Theme,
            Field::Theme => Field::Text,
        }
    }

    fn prev(self) -> Self {
        match self {
            Field::Text => Field::Theme,
            Field::Book => Field::Text,
            Field::Chapter => Field::Book,
            Field::VerseNumber => Field::Chapter,
            Field::Theme => Field::VerseNumber,
        }
    }
}

/// Input buffers for adding or editing a verse
#[derive(Debug, Clone, Default)]
pub struct VerseForm {
    pub text: String,
    pub book: String,
    pub chapter: String,
    pub verse_number: String,
    pub theme: String,
    pub active: Field,
    // Prefix the user typed before cycling theme suggestions
    theme_prefix: Option<String>,
}

impl VerseForm {
    pub fn from_verse(verse: &Verse) -> Self {
        Self {
            text: verse.text.clone(),
            book: verse.book.clone(),
            chapter: verse.chapter.clone(),
            verse_number: verse.verse_number.clone(),
            theme: verse.theme.clone(),
            active: Field::Text,
            theme_prefix: None,
        }
    }

    pub fn to_verse(&self) -> Verse {
        Verse::new(
            self.text.trim(),
            self.book.trim(),
            self.chapter.trim(),
            self.verse_number.trim(),
            self.theme.trim(),
        )
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Text => &self.text,
            Field::Book => &self.book,
            Field::Chapter => &self.chapter,
            Field::VerseNumber => &self.verse_number,
            Field::Theme => &self.theme,
        }
    }

    fn value_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Text => &mut self.text,
            Field::Book => &mut self.book,
            Field::Chapter => &mut self.chapter,
            Field::VerseNumber => &mut self.verse_number,
            Field::Theme => &mut self.theme,
        }
    }

    pub fn next_field(&mut self) {
        self.active = self.active.next();
        self.theme_prefix = None;
    }

    pub fn prev_field(&mut self) {
        self.active = self.active.prev();
        self.theme_prefix = None;
    }

    /// Append a character to the active field; returns false if it was rejected
    pub fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        // Chapter and verse are numeric references
        if matches!(self.active, Field::Chapter | Field::VerseNumber) && !ch.is_ascii_digit() {
            return false;
        }
        self.theme_prefix = None;
        let field = self.active;
        self.value_mut(field).push(ch);
        true
    }

    pub fn backspace(&mut self) {
        self.theme_prefix = None;
        let field = self.active;
        self.value_mut(field).pop();
    }

    /// Cycle the theme field through known themes starting with what was typed.
    /// Returns false when nothing matches.
    pub fn complete_theme(&mut self, themes: &[String]) -> bool {
        let prefix = self
            .theme_prefix
            .get_or_insert_with(|| self.theme.clone())
            .to_lowercase();

        let matches: Vec<&String> = themes
            .iter()
            .filter(|t| t.to_lowercase().starts_with(&prefix))
            .collect();

        if matches.is_empty() {
            self.theme_prefix = None;
            return false;
        }

        let next = match matches.iter().position(|t| **t == self.theme) {
            Some(i) => matches[(i + 1) % matches.len()],
            None => matches[0],
        };
        self.theme = next.clone();
        true
    }
}
