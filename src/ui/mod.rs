mod components;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Popup, Section};
use crate::form::Field;
use components::{centered_rect, key_hint, section_block, toast_rect};

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(1), // Info line
            Constraint::Length(8), // Form box (5 fields + submit + border)
            Constraint::Min(4),    // Verse list
            Constraint::Length(1), // Footer
        ])
        .split(area);

    draw_info_line(f, app, chunks[0]);
    draw_form(f, app, chunks[1]);
    draw_list(f, app, chunks[2]);
    draw_footer(f, app, chunks[3]);

    // Draw popups on top
    match app.popup {
        Popup::None => {}
        Popup::Help => draw_help_popup(f, app),
        Popup::Confirm => draw_confirm_popup(f, app),
        Popup::Alert => draw_alert_popup(f, app),
        Popup::ThemePicker => draw_theme_picker(f, app),
    }

    // Toast floats above everything
    if app.notifier.is_visible() {
        draw_toast(f, app);
    }
}

fn draw_info_line(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let t = &app.theme;

    // Priority: status message > active filter > counts
    let line = if let Some(ref status) = app.status_message {
        Line::from(Span::styled(status.as_str(), Style::default().fg(t.warning)))
    } else {
        let shown = app.store.displayed().len();
        let mut spans = vec![Span::styled(
            format!("{} verses", app.store.len()),
            Style::default().fg(t.text_dim),
        )];
        if let Some(theme) = app.store.theme_filter() {
            spans.push(Span::styled(" │ ", Style::default().fg(t.inactive)));
            spans.push(Span::styled(
                format!("Theme: {} ({} shown)", theme, shown),
                Style::default().fg(t.accent),
            ));
        }
        Line::from(spans)
    };

    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_form(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let t = &app.theme;
    let is_active = app.section == Section::Form;

    let title = match app.store.editing() {
        Some(_) => " Edit Verse ",
        None => " New Verse ",
    };
    let block = section_block(t, title, is_active);

    let mut lines: Vec<Line> = Field::ALL
        .iter()
        .map(|&field| {
            let value = app.form.value(field);
            let focused = is_active && app.form.active == field;

            let label_style = if focused {
                Style::default().fg(t.accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(t.text_dim)
            };
            let marker = if focused { "▸ " } else { "  " };

            let value_span = if value.is_empty() && !focused {
                let hint = if field.is_required() { "<required>" } else { "<optional>" };
                Span::styled(hint, Style::default().fg(t.inactive))
            } else {
                Span::styled(value.to_string(), Style::default().fg(t.text))
            };

            let mut spans = vec![
                Span::styled(marker, label_style),
                Span::styled(format!("{:<8}", field.label()), label_style),
                value_span,
            ];
            if focused {
                spans.push(Span::styled("_", Style::default().fg(t.accent)));
            }
            Line::from(spans)
        })
        .collect();

    lines.push(Line::from(vec![
        Span::styled("  Enter ", Style::default().fg(t.accent)),
        Span::styled(
            format!("[ {} ]", app.store.submit_label()),
            Style::default().fg(t.success).add_modifier(Modifier::BOLD),
        ),
        if app.store.editing().is_some() {
            Span::styled("  Esc cancel", Style::default().fg(t.text_dim))
        } else {
            Span::raw("")
        },
    ]));

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_list(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let t = &app.theme;
    let is_active = app.section == Section::List;

    let title = match app.store.theme_filter() {
        Some(theme) => format!(" Verses · {} ", theme),
        None => " Verses ".to_string(),
    };
    let block = section_block(t, &title, is_active);

    let displayed = app.store.displayed();
    if displayed.is_empty() {
        let message = if app.store.is_empty() {
            "  No verses yet. Fill in the form above and press Enter."
        } else {
            "  No verses with this theme (Esc shows all)"
        };
        let empty = Paragraph::new(Span::styled(message, Style::default().fg(t.text_dim)))
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = displayed
        .iter()
        .map(|(index, verse)| {
            let editing = app.store.editing() == Some(*index);
            let mut reference = vec![
                Span::styled(verse.book.clone(), Style::default().fg(t.text).add_modifier(Modifier::BOLD)),
                Span::styled(
                    format!(" {}:{}", verse.chapter, verse.verse_number),
                    Style::default().fg(t.text),
                ),
            ];
            if !verse.theme.is_empty() {
                reference.push(Span::styled(" - ", Style::default().fg(t.inactive)));
                reference.push(Span::styled(
                    verse.theme.clone(),
                    Style::default().fg(t.accent).add_modifier(Modifier::ITALIC),
                ));
            }
            if editing {
                reference.push(Span::styled("  (editing)", Style::default().fg(t.warning)));
            }

            ListItem::new(vec![
                Line::from(Span::styled(
                    truncate(&verse.text, width),
                    Style::default().fg(t.text),
                )),
                Line::from(reference),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(if is_active {
            Style::default().bg(t.bg_selected).fg(t.text)
        } else {
            Style::default()
        })
        .highlight_symbol("▌");

    let mut state = ListState::default();
    state.select(Some(app.selected.min(displayed.len() - 1)));
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_footer(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let hints: Vec<(&str, &str)> = match app.section {
        Section::Form => vec![
            ("↑↓", "Field"),
            ("Enter", app.store.submit_label()),
            ("Tab", "List"),
            ("Esc", "Cancel"),
        ],
        Section::List => vec![
            ("↑↓", "Nav"),
            ("a", "Add"),
            ("e", "Edit"),
            ("d", "Del"),
            ("c", "Copy"),
            ("f", "Filter"),
            ("h", "Help"),
            ("q", "Quit"),
        ],
    };

    // Responsive: show fewer hints on narrow terminals
    let max_hints = if area.width < 60 { 4 } else if area.width < 80 { 6 } else { hints.len() };

    let spans: Vec<Span> = hints
        .iter()
        .take(max_hints)
        .flat_map(|(key, action)| key_hint(&app.theme, *key, *action))
        .collect();

    f.render_widget(Paragraph::new(Line::from(spans)).alignment(Alignment::Center), area);
}

fn draw_help_popup(f: &mut Frame, app: &App) {
    let t = &app.theme;
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 60 },
        if area.height < 30 { 95 } else { 70 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let heading = |text: &'static str| {
        Line::from(Span::styled(text, Style::default().fg(t.danger).add_modifier(Modifier::BOLD)))
    };
    let entry = |keys: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", keys), Style::default().fg(t.accent)),
            Span::raw(what),
        ])
    };

    let help_text = vec![
        heading("═══ Form ═══"),
        entry("↑/↓", "Move between fields"),
        entry("Enter", "Add verse, or save the one being edited"),
        entry("Tab", "Complete theme / go to list"),
        entry("Esc", "Cancel editing and clear the form"),
        Line::from(""),
        heading("═══ List ═══"),
        entry("↑/↓ j/k", "Move selection"),
        entry("a/n", "New verse"),
        entry("e/Enter", "Edit selected verse"),
        entry("d", "Delete selected verse"),
        entry("c/y", "Copy verse to clipboard"),
        entry("f", "Filter by theme"),
        entry("Esc", "Clear theme filter"),
        entry("q", "Quit"),
        Line::from(""),
        heading("═══ Command Line ═══"),
        entry("--list", "Print verses as JSON"),
        entry("--themes", "Print themes"),
        entry("--copy N", "Copy verse N"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(t.text_dim)),
            Span::styled("h", Style::default().fg(t.accent)),
            Span::styled("/", Style::default().fg(t.text_dim)),
            Span::styled("Esc", Style::default().fg(t.accent)),
            Span::styled(" to close", Style::default().fg(t.text_dim)),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" versekeep Help ", Style::default().fg(t.accent)))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(t.accent)),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

fn draw_confirm_popup(f: &mut Frame, app: &App) {
    let t = &app.theme;
    let popup_area = centered_rect(40, 20, f.area());

    f.render_widget(Clear, popup_area);

    let message = app.status_message.as_deref().unwrap_or("Delete this verse?");

    let confirm = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(t.warning))),
        Line::from(""),
        Line::from(vec![
            Span::styled("  y", Style::default().fg(t.success).add_modifier(Modifier::BOLD)),
            Span::raw(" Yes   "),
            Span::styled("n", Style::default().fg(t.danger).add_modifier(Modifier::BOLD)),
            Span::raw(" No"),
        ]),
    ])
    .block(
        Block::default()
            .title(Span::styled(" Confirm ", Style::default().fg(t.warning)))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(t.warning)),
    )
    .alignment(Alignment::Center);

    f.render_widget(confirm, popup_area);
}

fn draw_alert_popup(f: &mut Frame, app: &App) {
    let t = &app.theme;
    let popup_area = centered_rect(50, 20, f.area());

    f.render_widget(Clear, popup_area);

    let message = app.alert_message.as_deref().unwrap_or("Please fill in all fields");
    let alert = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(t.danger))),
        Line::from(""),
        Line::from(Span::styled("Press any key", Style::default().fg(t.text_dim))),
    ])
    .block(
        Block::default()
            .title(Span::styled(" Missing Fields ", Style::default().fg(t.danger)))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(t.danger)),
    )
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });

    f.render_widget(alert, popup_area);
}

fn draw_theme_picker(f: &mut Frame, app: &App) {
    let t = &app.theme;
    let area = f.area();
    let popup_area = centered_rect(if area.width < 80 { 80 } else { 40 }, 50, area);

    f.render_widget(Clear, popup_area);

    let current = app.store.theme_filter();
    let items: Vec<ListItem> = app
        .picker_options()
        .into_iter()
        .enumerate()
        .map(|(i, option)| {
            let active = match current {
                Some(theme) => theme == option,
                None => i == 0,
            };
            let marker = if active { "● " } else { "  " };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(t.success)),
                Span::styled(option, Style::default().fg(t.text)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(Span::styled(" Filter by Theme ", Style::default().fg(t.accent)))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(t.accent)),
        )
        .highlight_style(Style::default().bg(t.bg_selected).fg(t.text));

    let mut state = ListState::default();
    state.select(Some(app.picker_selected));
    f.render_stateful_widget(list, popup_area, &mut state);
}

fn draw_toast(f: &mut Frame, app: &App) {
    let t = &app.theme;
    let message = app.notifier.state().message.as_str();
    let Some(rect) = toast_rect(f.area(), message) else {
        return;
    };

    f.render_widget(Clear, rect);
    let toast = Paragraph::new(Span::styled(message, Style::default().fg(t.text)))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(t.success)),
        );
    f.render_widget(toast, rect);
}

/// Cut `s` to at most `max` characters, marking the cut with an ellipsis
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}
