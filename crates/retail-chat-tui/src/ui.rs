use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use retail_chat_core::{chart, ChatMessage, ChatRole};

use crate::app::{App, InputMode};
use crate::charts;

const INPUT_PLACEHOLDER: &str = "Ask about customers, products, or business metrics...";

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("**") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("**") else {
            break;
        };
        if close == 0 {
            // "****" has nothing to embolden, keep it literal
            spans.push(Span::raw(rest[..open + 4].to_string()));
            rest = &after_open[2..];
            continue;
        }

        if open > 0 {
            spans.push(Span::raw(rest[..open].to_string()));
        }
        spans.push(Span::styled(
            after_open[..close].to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        rest = &after_open[close + 2..];
    }

    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    Line::from(spans)
}

fn role_line(label: &'static str, color: Color, selected: bool) -> Line<'static> {
    let mut style = Style::default().fg(color).add_modifier(Modifier::BOLD);
    if selected {
        style = style.add_modifier(Modifier::REVERSED);
    }
    Line::from(Span::styled(label, style))
}

fn push_assistant(app: &App, msg: &ChatMessage, lines: &mut Vec<Line<'static>>) {
    let selected = app.selected == Some(msg.id);
    lines.push(role_line("Assistant:", Color::Yellow, selected));
    for line in msg.content.lines() {
        lines.push(parse_markdown_line(line));
    }

    for (i, suggestion) in msg.suggestions.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("  [{}] ", i + 1), Style::default().fg(Color::Magenta).bold()),
            Span::raw(suggestion.clone()),
        ]));
    }

    let chart_count = chart::renderable(&msg.chart_data).len();
    if chart_count > 0 {
        let noun = if chart_count == 1 { "chart" } else { "charts" };
        lines.push(Line::from(Span::styled(
            format!("  📈 {} {}", chart_count, noun),
            Style::default().fg(Color::DarkGray),
        )));
    }

    if let Some(data) = msg.disclosable_source() {
        let expanded = app.disclosure.is_expanded(msg.id);
        let marker = if expanded { "▾" } else { "▸" };
        let mut control = vec![Span::styled(
            format!("  {} Source data", marker),
            Style::default().fg(Color::Cyan),
        )];
        if let Some(label) = msg.intent_label() {
            control.push(Span::styled(
                format!(" · {}", label),
                Style::default().fg(Color::DarkGray),
            ));
        }
        lines.push(Line::from(control));

        if expanded {
            for row in data.lines() {
                lines.push(Line::from(Span::styled(
                    format!("    {}", row),
                    Style::default().fg(Color::Gray),
                )));
            }
        }
    }
}

/// Every transcript row in order, including the typing placeholder.
pub fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in app.messages() {
        match msg.role {
            ChatRole::User => {
                lines.push(role_line("You:", Color::Cyan, false));
                for line in msg.content.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            ChatRole::Assistant => push_assistant(app, msg, &mut lines),
        }
        lines.push(Line::default());
    }

    if app.controller.conversation().show_placeholder() {
        lines.push(role_line("Assistant:", Color::Yellow, false));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

/// Rows the transcript occupies once wrapped at `wrap_width` columns.
pub fn transcript_height(app: &App, wrap_width: usize) -> u16 {
    let width = wrap_width.clamp(1, u16::MAX as usize) as u16;
    let rows = Paragraph::new(Text::from(transcript_lines(app)))
        .wrap(Wrap { trim: false })
        .line_count(width);
    rows.min(u16::MAX as usize) as u16
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_body(app, frame, body_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let status = if app.is_awaiting() {
        Span::styled(" ● waiting ", Style::default().fg(Color::Yellow))
    } else {
        Span::styled(" ● ready ", Style::default().fg(Color::Green))
    };

    let header = Text::from(vec![
        Line::from(vec![
            Span::styled(" Retail Analytics Chat ", Style::default().fg(Color::Cyan).bold()),
            status,
            Span::styled(
                format!("v{}", env!("CARGO_PKG_VERSION")),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(vec![
            Span::styled(
                " AI-powered insights from your transaction data ",
                Style::default().fg(Color::Gray),
            ),
            Span::styled(format!("({})", app.api_base_url), Style::default().fg(Color::DarkGray)),
        ]),
    ]);

    frame.render_widget(Paragraph::new(header).style(Style::default().bg(Color::Black)), area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode, hints) = match app.input_mode {
        InputMode::Editing => (
            Span::styled(" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black).bold()),
            " Enter send · Esc browse · Ctrl-C quit",
        ),
        InputMode::Normal => (
            Span::styled(" BROWSE ", Style::default().bg(Color::Cyan).fg(Color::Black).bold()),
            " i ask · 1-4 suggestion · j/k select · s source data · PgUp/PgDn scroll · q quit",
        ),
    };

    let footer = Line::from(vec![mode, Span::styled(hints, Style::default().fg(Color::DarkGray))]);
    frame.render_widget(Paragraph::new(footer), area);
}

fn render_body(app: &mut App, frame: &mut Frame, area: Rect) {
    // Chat on the left, charts of the focused answer on the right when it has any
    let (chat_column, chart_area) = if app.has_charts() {
        let [chat, charts] =
            Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
                .areas(area);
        (chat, Some(charts))
    } else {
        (area, None)
    };

    let [chat_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(chat_column);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);
    if std::mem::take(&mut app.follow_bottom) {
        app.scroll_to_bottom();
    }

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" Conversation ({}) ", app.messages().len()));

    let chat = Paragraph::new(Text::from(transcript_lines(app)))
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((app.scroll, 0));
    frame.render_widget(chat, chat_area);

    render_input(app, frame, input_area);

    if let (Some(chart_area), Some(message)) = (chart_area, app.focused_message()) {
        charts::render_charts(frame, chart_area, &message.chart_data);
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let awaiting = app.is_awaiting();
    let border_color = if awaiting {
        Color::DarkGray
    } else if app.input_mode == InputMode::Editing {
        Color::Yellow
    } else {
        Color::Gray
    };
    let title = if awaiting {
        " Waiting for reply... "
    } else if app.can_send() {
        " Ask (Enter to send) "
    } else {
        " Ask "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Keep the cursor visible by scrolling the input horizontally
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width > 0 && app.cursor >= inner_width {
        app.cursor - inner_width + 1
    } else {
        0
    };

    let input = if app.input.is_empty() {
        Paragraph::new(Span::styled(INPUT_PLACEHOLDER, Style::default().fg(Color::DarkGray)))
    } else {
        let visible: String = app.input.chars().skip(scroll_offset).take(inner_width).collect();
        let style = if awaiting {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Cyan)
        };
        Paragraph::new(visible).style(style)
    };
    frame.render_widget(input.block(block), area);

    if app.input_mode == InputMode::Editing && !awaiting {
        let cursor_x = (app.cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}
