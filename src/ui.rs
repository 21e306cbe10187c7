use chrono::{Datelike, Days, NaiveDate};
use color_eyre::Result;
use crossterm::{
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io::{stdout, Stdout};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::Shell;
use crate::form_state::{FormController, Status};
use crate::guestbook_entry::Field;
use crate::input::{DatePicker, Focus, Overlay, ViewState};

const MAROON: Color = Color::Rgb(128, 0, 0);
const STAR_FILLED: &str = "★";
const STAR_EMPTY: &str = "☆";

pub struct UI {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl UI {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        Ok(UI { terminal })
    }

    pub fn draw(&mut self, shell: &Shell, controller: &FormController, view: &ViewState) -> Result<()> {
        self.terminal
            .draw(|f| render(f, shell, controller, view))?;
        Ok(())
    }
}

impl Drop for UI {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

/// Draw the whole screen: header, form card, and any overlay on top.
pub fn render(f: &mut Frame, shell: &Shell, controller: &FormController, view: &ViewState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)].as_ref())
        .split(f.area());

    render_header(f, chunks[0], shell);

    let card_area = centered_column(chunks[1], 64);
    let card = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray))
        .title(Line::from(Span::styled(
            " Share Your Experience ",
            Style::default().fg(MAROON).add_modifier(Modifier::BOLD),
        )))
        .title_alignment(Alignment::Center);
    let inner = card.inner(card_area);
    f.render_widget(card, card_area);

    match controller.status() {
        Status::Success => render_thank_you(f, inner),
        _ => render_form(f, inner, controller, view),
    }

    match &view.overlay {
        Some(Overlay::DatePicker(picker)) => render_date_picker(f, picker, view.today()),
        Some(Overlay::PhotoPrompt(editor)) => {
            let area = popup(f.area(), 60, 5);
            f.render_widget(Clear, area);
            let text = with_cursor(editor.value(), editor.cursor());
            let prompt = Paragraph::new(text).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Photo path (Enter: attach, Esc: cancel)")
                    .border_style(Style::default().fg(MAROON)),
            );
            f.render_widget(prompt, area);
        }
        Some(Overlay::Alert(message)) => {
            let area = popup(f.area(), 50, 5);
            f.render_widget(Clear, area);
            let alert = Paragraph::new(vec![
                Line::from(message.as_str()),
                Line::from(Span::styled(
                    "Press any key",
                    Style::default().fg(Color::Yellow),
                )),
            ])
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Alert")
                    .border_style(Style::default().fg(Color::Red)),
            );
            f.render_widget(alert, area);
        }
        None => {}
    }
}

fn render_header(f: &mut Frame, area: Rect, shell: &Shell) {
    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            shell.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            shell.tagline.as_str(),
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ])
    .style(Style::default().fg(Color::White).bg(MAROON))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::NONE));
    f.render_widget(header, Rect { height: area.height.min(3), ..area });
}

fn render_thank_you(f: &mut Frame, area: Rect) {
    let body = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "✔",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Thank You!",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("Your review has been sent to our guestbook."),
        Line::from(""),
        Line::from(Span::styled(
            "[ Write Another ]",
            Style::default().fg(Color::White).bg(MAROON),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Enter: write another, q: quit",
            Style::default().fg(Color::Yellow),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(body, area);
}

fn render_form(f: &mut Frame, area: Rect, controller: &FormController, view: &ViewState) {
    let draft = controller.draft();
    let error = match controller.status() {
        Status::Error(message) => Some(message.as_str()),
        _ => None,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(3),
                Constraint::Length(if error.is_some() { 3 } else { 0 }),
                Constraint::Length(3),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    let name_text = if view.focus == Focus::Name && view.overlay.is_none() {
        Text::from(with_cursor(&draft.name, view.name_cursor))
    } else {
        placeholder(&draft.name, "John Doe")
    };
    f.render_widget(
        Paragraph::new(name_text).block(field_block(view, Focus::Name, "Your Name")),
        chunks[0],
    );

    let date_text = match draft.date {
        Some(date) => date.format("%d %b %Y").to_string(),
        None => "dd / mm / yyyy  (Enter to pick)".to_string(),
    };
    f.render_widget(
        Paragraph::new(date_text).block(field_block(view, Focus::Date, "Date of Function")),
        chunks[1],
    );

    let rating = draft.rating.get();
    let stars: Vec<Span> = (1..=5u8)
        .flat_map(|star| {
            let span = if star <= rating {
                Span::styled(STAR_FILLED, Style::default().fg(Color::Yellow))
            } else {
                Span::styled(STAR_EMPTY, Style::default().fg(Color::DarkGray))
            };
            [span, Span::raw(" ")]
        })
        .collect();
    f.render_widget(
        Paragraph::new(Line::from(stars)).block(field_block(view, Focus::Rating, "Your Rating")),
        chunks[2],
    );

    let message_text = if view.focus == Focus::Message && view.overlay.is_none() {
        Text::from(with_cursor(&draft.message, view.message_cursor))
    } else {
        placeholder(&draft.message, "How was your experience?")
    };
    f.render_widget(
        Paragraph::new(message_text)
            .wrap(Wrap { trim: false })
            .block(field_block(view, Focus::Message, "Tell us more")),
        chunks[3],
    );

    let photo = if draft.image_name.is_empty() {
        Line::from(Span::styled(
            "Press Enter to upload image",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(vec![
            Span::styled("✔ ", Style::default().fg(MAROON)),
            Span::styled(
                truncate(&draft.image_name, 40),
                Style::default().fg(MAROON).add_modifier(Modifier::BOLD),
            ),
        ])
    };
    f.render_widget(
        Paragraph::new(photo)
            .alignment(Alignment::Center)
            .block(field_block(view, Focus::Photo, "Photo (Optional)")),
        chunks[4],
    );

    if let Some(message) = error {
        let alert = Paragraph::new(Line::from(vec![
            Span::styled("! ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(message),
        ]))
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Red)));
        f.render_widget(alert, chunks[5]);
    }

    let submitting = controller.is_submitting();
    let label = if submitting { "Sending..." } else { "Submit Review" };
    let button_style = if submitting {
        Style::default().fg(Color::Gray).bg(Color::Rgb(96, 48, 48))
    } else if view.focus == Focus::Submit {
        Style::default()
            .fg(Color::White)
            .bg(MAROON)
            .add_modifier(Modifier::BOLD | Modifier::REVERSED)
    } else {
        Style::default().fg(Color::White).bg(MAROON).add_modifier(Modifier::BOLD)
    };
    f.render_widget(
        Paragraph::new(label)
            .style(button_style)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL)),
        chunks[6],
    );

    let instructions = Paragraph::new("Tab: next field, Ctrl+S: submit, Ctrl+Q: quit")
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center);
    f.render_widget(instructions, chunks[7]);
}

fn field_block<'a>(view: &ViewState, focus: Focus, title: &'a str) -> Block<'a> {
    let border = if view.focus == focus {
        Style::default().fg(MAROON).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title);

    match view.hint {
        Some(field) if Focus::from(field) == focus => block.title_bottom(Line::from(Span::styled(
            format!(" Please fill out this field. ({}) ", field_name(field)),
            Style::default().fg(Color::Red),
        ))),
        _ => block,
    }
}

fn field_name(field: Field) -> &'static str {
    match field {
        Field::Name => "name",
        Field::Date => "date",
        Field::Message => "message",
    }
}

fn render_date_picker(f: &mut Frame, picker: &DatePicker, today: NaiveDate) {
    let area = popup(f.area(), 30, 12);
    f.render_widget(Clear, area);

    let cursor = picker.cursor;
    let first = cursor.with_day(1).unwrap_or(cursor);
    let offset = first.weekday().num_days_from_monday() as usize;

    let mut lines = vec![
        Line::from(Span::styled(
            first.format("%B %Y").to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Mo Tu We Th Fr Sa Su",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let mut week: Vec<Span> = vec![Span::raw("   "); offset];
    let mut column = offset;
    for day in 1..=days_in_month(first) {
        let style = if day == cursor.day() {
            Style::default().fg(Color::White).bg(MAROON).add_modifier(Modifier::BOLD)
        } else if first.with_day(day) == Some(today) {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        week.push(Span::styled(format!("{day:>2}"), style));
        week.push(Span::raw(" "));
        column += 1;
        if column == 7 {
            lines.push(Line::from(std::mem::take(&mut week)));
            column = 0;
        }
    }
    if !week.is_empty() {
        lines.push(Line::from(week));
    }

    let calendar = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Pick a date")
            .title_bottom(" Enter: pick  Esc: cancel ")
            .border_style(Style::default().fg(MAROON)),
    );
    f.render_widget(calendar, area);
}

fn days_in_month(first: NaiveDate) -> u32 {
    first
        .checked_add_months(chrono::Months::new(1))
        .and_then(|next| next.checked_sub_days(Days::new(1)))
        .map(|last| last.day())
        .unwrap_or(31)
}

fn with_cursor(value: &str, cursor: usize) -> String {
    let mut shown = value.to_string();
    let at = cursor.min(shown.len());
    if shown.is_char_boundary(at) {
        shown.insert(at, '|');
    } else {
        shown.push('|');
    }
    shown
}

fn placeholder(value: &str, hint: &str) -> Text<'static> {
    if value.is_empty() {
        Text::from(Span::styled(hint.to_string(), Style::default().fg(Color::DarkGray)))
    } else {
        Text::from(value.to_string())
    }
}

/// Cut `text` to at most `width` display columns, marking the cut.
fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    for c in text.chars() {
        if out.width() + c.width().unwrap_or(0) + 1 > width {
            break;
        }
        out.push(c);
    }
    out.push('…');
    out
}

fn centered_column(area: Rect, width: u16) -> Rect {
    let width = width.min(area.width);
    Rect {
        x: area.x + (area.width - width) / 2,
        width,
        ..area
    }
}

fn popup(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
