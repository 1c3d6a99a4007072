//! Small layout and widget helpers shared by the screens in mod.rs

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, Borders},
};

use crate::theme::Theme;

/// Bordered block whose border and title follow focus
pub fn section_block<'a>(t: &Theme, title: &'a str, is_active: bool) -> Block<'a> {
    let border_color = if is_active { t.accent } else { t.inactive };
    let title_style = if is_active {
        Style::default().fg(t.accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(t.inactive)
    };

    Block::default()
        .title(Span::styled(title, title_style))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
}

/// "key action │ " pair for the footer legend
pub fn key_hint<'a>(t: &Theme, key: &'a str, action: &'a str) -> Vec<Span<'a>> {
    vec![
        Span::styled(key, Style::default().fg(t.accent)),
        Span::styled(format!(" {} │ ", action), Style::default().fg(t.text_dim)),
    ]
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Top-right box sized to the message, `None` if the terminal is too small
pub fn toast_rect(area: Rect, message: &str) -> Option<Rect> {
    let width = u16::try_from(message.chars().count()).ok()?.checked_add(6)?;
    let height = 3;
    if area.width < width.checked_add(2)? || area.height < height + 1 {
        return None;
    }
    Some(Rect {
        x: area.x + area.width - width - 2,
        y: area.y + 1,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_rect_top_right() {
        let area = Rect::new(0, 0, 80, 24);
        let rect = toast_rect(area, "Copied!").unwrap();
        assert_eq!(rect.width, 13);
        assert_eq!(rect.x + rect.width, 78);
        assert_eq!(rect.y, 1);
    }

    #[test]
    fn test_toast_rect_too_small() {
        assert!(toast_rect(Rect::new(0, 0, 10, 3), "Copied!").is_none());
    }

    #[test]
    fn test_toast_rect_huge_message() {
        let area = Rect::new(0, 0, u16::MAX, 24);
        assert!(toast_rect(area, &"x".repeat(65_530)).is_none());
        assert!(toast_rect(area, &"x".repeat(70_000)).is_none());
    }

    #[test]
    fn test_centered_rect_inside_area() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(40, 20, area);
        assert!(popup.x >= 30 && popup.right() <= 70);
        assert!(popup.y >= 20 && popup.bottom() <= 30);
    }
}
