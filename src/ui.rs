//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! * The layout is a search box on top, the suggestion and result lists side
//!   by side below it, and a one-line status bar at the bottom.
//! * Each list is rebuilt wholesale every frame from the pane's rendered
//!   indices: [`paint`] is called once per visible item, nothing is diffed.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::{App, Pane};
use crate::input::Focus;
use crate::source::{Item, SourceKind};

/// How an item is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    Suggestion,
    Result,
}

impl Template {
    fn for_kind(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Suggestions => Template::Suggestion,
            SourceKind::Results => Template::Result,
        }
    }
}

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [input_area, body_area, status_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let [suggestions_area, results_area] = Layout::horizontal([
        Constraint::Percentage(35),
        Constraint::Percentage(65),
    ])
    .areas(body_area);

    draw_search_box(app, frame, input_area);

    let suggestions_focused = app.binding.focus() == Focus::Suggestions;
    let App {
        model,
        suggestions,
        results,
        ..
    } = &mut *app;
    let no_items: &[Item] = &[];
    let suggestion_items = model
        .source(SourceKind::Suggestions)
        .map_or(no_items, |s| s.items());
    let result_items = model
        .source(SourceKind::Results)
        .map_or(no_items, |s| s.items());
    draw_pane(suggestions, suggestion_items, suggestions_focused, frame, suggestions_area);
    draw_pane(results, result_items, false, frame, results_area);

    draw_status_bar(app, frame, status_area);
}

/// Produce the list entry for one item.
pub fn paint(template: Template, item: &Item) -> ListItem<'_> {
    let provider = Span::styled(
        format!("[{}]", item.provider),
        Style::default().fg(Color::Cyan),
    );

    match template {
        Template::Suggestion => ListItem::new(Line::from(vec![
            Span::styled(item.headline(), Style::default().fg(Color::White)),
            Span::raw(" "),
            provider,
        ])),
        Template::Result => {
            let mut lines = vec![Line::from(vec![
                Span::styled(
                    format!("{:<8}", item.kind_label()),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    item.headline(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                provider,
            ])];
            if let Some(details) = item.details() {
                lines.push(Line::from(Span::styled(
                    format!("        {details}"),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            ListItem::new(lines)
        }
    }
}

fn draw_search_box(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.binding.is_focused();
    let border = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let input = Paragraph::new(app.binding.widget.text.as_str()).block(
        Block::default()
            .title(" Search ")
            .borders(Borders::ALL)
            .border_style(border),
    );
    frame.render_widget(input, area);

    if focused {
        let column = u16::try_from(app.binding.widget.cursor_column()).unwrap_or(u16::MAX);
        let x = area
            .x
            .saturating_add(1)
            .saturating_add(column)
            .min(area.right().saturating_sub(2));
        frame.set_cursor_position((x, area.y + 1));
    }
}

fn draw_pane(pane: &mut Pane, items: &[Item], focused: bool, frame: &mut Frame, area: Rect) {
    let template = Template::for_kind(pane.kind);
    let list_items: Vec<ListItem> = pane
        .visible(items)
        .into_iter()
        .map(|item| paint(template, item))
        .collect();

    let title = match pane.kind {
        SourceKind::Suggestions => " Suggestions ",
        SourceKind::Results => " Results ",
    };
    let border = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let list = List::new(list_items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(border),
        )
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("▸ ");

    frame.render_stateful_widget(list, area, &mut pane.list_state);
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let updated = app
        .model
        .source(SourceKind::Results)
        .and_then(|s| s.last_reset())
        .map(|t| format!("updated {}", t.format("%H:%M:%S")))
        .unwrap_or_default();

    let mut spans = vec![
        Span::raw(" "),
        Span::styled(&app.status, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(updated, Style::default().fg(Color::Green)),
    ];
    if app.model.is_pending() {
        spans.push(Span::styled("  …", Style::default().fg(Color::DarkGray)));
    }
    spans.push(Span::raw("  Esc: quit  ↓/Tab: suggestions  Enter: search  PgUp/PgDn: scroll"));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
