//! UI palette, with per-color overrides from the `[colors]` config table

use ratatui::style::Color;

use crate::config::ColorOverrides;

#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,      // Active borders, key hints
    pub danger: Color,      // Delete, validation errors
    pub success: Color,     // Toast border
    pub warning: Color,     // Status line, confirm popup
    pub text: Color,        // Primary text
    pub text_dim: Color,    // References, hints
    pub bg_selected: Color, // Selected list row
    pub inactive: Color,    // Inactive borders
}

impl Default for Theme {
    fn default() -> Self {
        // Catppuccin-inspired
        Self {
            accent: Color::Rgb(250, 179, 135),
            danger: Color::Rgb(243, 139, 168),
            success: Color::Rgb(166, 218, 149),
            warning: Color::Rgb(249, 226, 175),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            bg_selected: Color::Rgb(69, 71, 90),
            inactive: Color::Rgb(88, 91, 112),
        }
    }
}

impl Theme {
    pub fn from_overrides(overrides: &ColorOverrides) -> Self {
        let base = Self::default();
        let pick = |value: &Option<String>, fallback: Color| {
            match value.as_deref() {
                Some(raw) => parse_hex_color(raw).unwrap_or_else(|| {
                    tracing::warn!("Ignoring invalid color '{}'", raw);
                    fallback
                }),
                None => fallback,
            }
        };

        Self {
            accent: pick(&overrides.accent, base.accent),
            danger: pick(&overrides.danger, base.danger),
            success: pick(&overrides.success, base.success),
            warning: pick(&overrides.warning, base.warning),
            text: pick(&overrides.text, base.text),
            text_dim: pick(&overrides.text_dim, base.text_dim),
            bg_selected: pick(&overrides.bg_selected, base.bg_selected),
            inactive: base.inactive,
        }
    }
}

/// Parse a hex color string (#RRGGBB or #RGB)
pub fn parse_hex_color(s: &str) -> Option<Color> {
    let s = s.trim().trim_start_matches('#');

    if !s.is_ascii() {
        return None;
    }

    if s.len() == 6 {
        let r = u8::from_str_radix(&s[0..2], 16).ok()?;
        let g = u8::from_str_radix(&s[2..4], 16).ok()?;
        let b = u8::from_str_radix(&s[4..6], 16).ok()?;
        Some(Color::Rgb(r, g, b))
    } else if s.len() == 3 {
        let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
        let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
        let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
        Some(Color::Rgb(r, g, b))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#FFC107"), Some(Color::Rgb(255, 193, 7)));
        assert_eq!(parse_hex_color("fff"), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
    }

    #[test]
    fn test_overrides_fall_back_on_bad_values() {
        let overrides = ColorOverrides {
            accent: Some("#000000".to_string()),
            danger: Some("red".to_string()),
            ..Default::default()
        };
        let theme = Theme::from_overrides(&overrides);
        assert_eq!(theme.accent, Color::Rgb(0, 0, 0));
        assert_eq!(theme.danger, Theme::default().danger);
    }
}
