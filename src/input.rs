//! Key handling for the form. Pure state transitions: nothing here touches
//! the terminal or spawns work; background jobs are returned as [`Effect`]s.

use std::collections::VecDeque;
use std::path::PathBuf;

use chrono::{Days, Months, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::error::FormError;
use crate::form_state::{FormController, Status, SubmitRejected, Submission};
use crate::guestbook_entry::{Field, Rating};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Name,
    Date,
    Rating,
    Message,
    Photo,
    Submit,
}

impl Focus {
    const ORDER: [Focus; 6] = [
        Focus::Name,
        Focus::Date,
        Focus::Rating,
        Focus::Message,
        Focus::Photo,
        Focus::Submit,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

impl From<Field> for Focus {
    fn from(field: Field) -> Self {
        match field {
            Field::Name => Focus::Name,
            Field::Date => Focus::Date,
            Field::Message => Focus::Message,
        }
    }
}

/// Single-buffer text editing with a byte cursor kept on char boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineEditor {
    value: String,
    cursor: usize,
}

impl LineEditor {
    pub fn new(value: String, cursor: usize) -> Self {
        let mut cursor = cursor.min(value.len());
        while !value.is_char_boundary(cursor) {
            cursor -= 1;
        }
        LineEditor { value, cursor }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns whether the value changed.
    pub fn apply(&mut self, code: KeyCode, multiline: bool) -> bool {
        match code {
            KeyCode::Char(c) => {
                self.value.insert(self.cursor, c);
                self.cursor += c.len_utf8();
                true
            }
            KeyCode::Enter if multiline => {
                self.value.insert(self.cursor, '\n');
                self.cursor += 1;
                true
            }
            KeyCode::Backspace => match self.value[..self.cursor].chars().next_back() {
                Some(c) => {
                    self.cursor -= c.len_utf8();
                    self.value.remove(self.cursor);
                    true
                }
                None => false,
            },
            KeyCode::Delete => {
                if self.cursor < self.value.len() {
                    self.value.remove(self.cursor);
                    true
                } else {
                    false
                }
            }
            KeyCode::Left => {
                if let Some(c) = self.value[..self.cursor].chars().next_back() {
                    self.cursor -= c.len_utf8();
                }
                false
            }
            KeyCode::Right => {
                if let Some(c) = self.value[self.cursor..].chars().next() {
                    self.cursor += c.len_utf8();
                }
                false
            }
            KeyCode::Home => {
                self.cursor = 0;
                false
            }
            KeyCode::End => {
                self.cursor = self.value.len();
                false
            }
            _ => false,
        }
    }
}

/// Calendar cursor for the date field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatePicker {
    pub cursor: NaiveDate,
}

impl DatePicker {
    fn shift(&mut self, code: KeyCode) {
        let moved = match code {
            KeyCode::Left => self.cursor.checked_sub_days(Days::new(1)),
            KeyCode::Right => self.cursor.checked_add_days(Days::new(1)),
            KeyCode::Up => self.cursor.checked_sub_days(Days::new(7)),
            KeyCode::Down => self.cursor.checked_add_days(Days::new(7)),
            KeyCode::PageUp => self.cursor.checked_sub_months(Months::new(1)),
            KeyCode::PageDown => self.cursor.checked_add_months(Months::new(1)),
            _ => None,
        };
        if let Some(date) = moved {
            self.cursor = date;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    DatePicker(DatePicker),
    PhotoPrompt(LineEditor),
    Alert(String),
}

/// Work the event loop has to start on behalf of the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    LoadImage(PathBuf),
    Deliver(Submission),
    Quit,
}

#[derive(Debug, Clone)]
pub struct ViewState {
    pub focus: Focus,
    pub name_cursor: usize,
    pub message_cursor: usize,
    pub overlay: Option<Overlay>,
    /// Required field the last blocked submit pointed at.
    pub hint: Option<Field>,
    /// Alerts raised while another overlay was open, shown once it closes.
    pending_alerts: VecDeque<String>,
    today: NaiveDate,
}

impl ViewState {
    pub fn new(today: NaiveDate) -> Self {
        ViewState {
            focus: Focus::Name,
            name_cursor: 0,
            message_cursor: 0,
            overlay: None,
            hint: None,
            pending_alerts: VecDeque::new(),
            today,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Show `message` now, or after the overlay currently open is closed.
    pub fn alert(&mut self, message: String) {
        if self.overlay.is_some() {
            self.pending_alerts.push_back(message);
        } else {
            self.overlay = Some(Overlay::Alert(message));
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, controller: &mut FormController) -> Option<Effect> {
        let effect = self.dispatch_key(key, controller);
        if self.overlay.is_none() {
            self.overlay = self.pending_alerts.pop_front().map(Overlay::Alert);
        }
        effect
    }

    fn dispatch_key(&mut self, key: KeyEvent, controller: &mut FormController) -> Option<Effect> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
            return Some(Effect::Quit);
        }

        if let Some(overlay) = self.overlay.take() {
            return self.handle_overlay(overlay, key.code, controller);
        }

        if *controller.status() == Status::Success {
            return match key.code {
                KeyCode::Enter | KeyCode::Char('w') => {
                    controller.acknowledge_success();
                    self.reset_cursors();
                    None
                }
                KeyCode::Esc | KeyCode::Char('q') => Some(Effect::Quit),
                _ => None,
            };
        }

        if ctrl {
            return match key.code {
                KeyCode::Char('s') => self.submit(controller),
                _ => None,
            };
        }

        match key.code {
            KeyCode::Tab => {
                self.focus = self.focus.next();
                return None;
            }
            KeyCode::BackTab => {
                self.focus = self.focus.prev();
                return None;
            }
            _ => {}
        }

        match self.focus {
            Focus::Name => match key.code {
                KeyCode::Enter | KeyCode::Down => self.focus = self.focus.next(),
                KeyCode::Up => self.focus = self.focus.prev(),
                code => self.edit_text(Field::Name, code, controller),
            },
            Focus::Message => self.edit_text(Field::Message, key.code, controller),
            Focus::Date => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => {
                    let cursor = controller.draft().date.unwrap_or(self.today);
                    self.overlay = Some(Overlay::DatePicker(DatePicker { cursor }));
                }
                KeyCode::Down => self.focus = self.focus.next(),
                KeyCode::Up => self.focus = self.focus.prev(),
                // Keystroke entry is suppressed; only the picker sets the date.
                _ => {}
            },
            Focus::Rating => {
                let current = controller.draft().rating;
                match key.code {
                    KeyCode::Left | KeyCode::Char('-') => controller.set_rating(current.lower()),
                    KeyCode::Right | KeyCode::Char('+') => controller.set_rating(current.raise()),
                    KeyCode::Char(c) => {
                        if let Some(rating) = c
                            .to_digit(10)
                            .and_then(|d| u8::try_from(d).ok())
                            .and_then(Rating::new)
                        {
                            controller.set_rating(rating);
                        }
                    }
                    KeyCode::Enter | KeyCode::Down => self.focus = self.focus.next(),
                    KeyCode::Up => self.focus = self.focus.prev(),
                    _ => {}
                }
            }
            Focus::Photo => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => {
                    self.overlay = Some(Overlay::PhotoPrompt(LineEditor::default()));
                }
                KeyCode::Backspace | KeyCode::Delete => controller.clear_image(),
                KeyCode::Down => self.focus = self.focus.next(),
                KeyCode::Up => self.focus = self.focus.prev(),
                _ => {}
            },
            Focus::Submit => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => return self.submit(controller),
                KeyCode::Up => self.focus = self.focus.prev(),
                _ => {}
            },
        }

        None
    }

    fn handle_overlay(
        &mut self,
        overlay: Overlay,
        code: KeyCode,
        controller: &mut FormController,
    ) -> Option<Effect> {
        match overlay {
            Overlay::Alert(_) => None,
            Overlay::DatePicker(mut picker) => {
                match code {
                    KeyCode::Enter => {
                        controller.set_date(picker.cursor);
                        if self.hint == Some(Field::Date) {
                            self.hint = None;
                        }
                    }
                    KeyCode::Esc => {}
                    KeyCode::Home => {
                        picker.cursor = self.today;
                        self.overlay = Some(Overlay::DatePicker(picker));
                    }
                    other => {
                        picker.shift(other);
                        self.overlay = Some(Overlay::DatePicker(picker));
                    }
                }
                None
            }
            Overlay::PhotoPrompt(mut editor) => match code {
                KeyCode::Esc => None,
                KeyCode::Enter => {
                    let raw = editor.value().trim().trim_matches(|c| c == '"' || c == '\'');
                    if raw.is_empty() {
                        None
                    } else {
                        Some(Effect::LoadImage(PathBuf::from(raw)))
                    }
                }
                other => {
                    editor.apply(other, false);
                    self.overlay = Some(Overlay::PhotoPrompt(editor));
                    None
                }
            },
        }
    }

    fn edit_text(&mut self, field: Field, code: KeyCode, controller: &mut FormController) {
        let (current, cursor) = match field {
            Field::Name => (controller.draft().name.clone(), self.name_cursor),
            Field::Message => (controller.draft().message.clone(), self.message_cursor),
            Field::Date => return,
        };

        let mut editor = LineEditor::new(current, cursor);
        let changed = editor.apply(code, field == Field::Message);

        match field {
            Field::Name => self.name_cursor = editor.cursor(),
            Field::Message => self.message_cursor = editor.cursor(),
            Field::Date => {}
        }

        if changed {
            if self.hint == Some(field) && !editor.value().is_empty() {
                self.hint = None;
            }
            controller.set_text(field, editor.value().to_string());
        }
    }

    fn submit(&mut self, controller: &mut FormController) -> Option<Effect> {
        match controller.begin_submit() {
            Ok(submission) => {
                self.hint = None;
                Some(Effect::Deliver(submission))
            }
            Err(SubmitRejected::Invalid(FormError::MissingField(field))) => {
                self.focus = field.into();
                self.hint = Some(field);
                None
            }
            Err(SubmitRejected::AlreadySubmitting) | Err(SubmitRejected::Misconfigured(_)) => None,
            Err(e) => {
                tracing::error!(error = %e, "Submit failed before sending");
                self.alert(e.to_string());
                None
            }
        }
    }

    fn reset_cursors(&mut self) {
        self.focus = Focus::Name;
        self.name_cursor = 0;
        self.message_cursor = 0;
        self.hint = None;
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use reqwest::Url;

    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn setup() -> (ViewState, FormController) {
        let endpoint = Url::parse("http://guestbook.test/exec").unwrap();
        (ViewState::new(today()), FormController::new(Ok(endpoint)))
    }

    fn type_str(view: &mut ViewState, controller: &mut FormController, text: &str) {
        for c in text.chars() {
            view.handle_key(press(KeyCode::Char(c)), controller);
        }
    }

    #[test]
    fn line_editor_handles_multibyte_text() {
        let mut editor = LineEditor::new("ab".into(), 1);
        editor.apply(KeyCode::Char('é'), false);
        assert_eq!(editor.value(), "aéb");
        assert_eq!(editor.cursor(), 3);

        editor.apply(KeyCode::Backspace, false);
        assert_eq!(editor.value(), "ab");

        editor.apply(KeyCode::End, false);
        editor.apply(KeyCode::Left, false);
        editor.apply(KeyCode::Delete, false);
        assert_eq!(editor.value(), "a");
    }

    #[test]
    fn line_editor_clamps_cursor_to_char_boundary() {
        let editor = LineEditor::new("é".into(), 1);
        assert_eq!(editor.cursor(), 0);
    }

    #[test]
    fn typing_edits_name_only() {
        let (mut view, mut controller) = setup();
        type_str(&mut view, &mut controller, "Anil");
        view.handle_key(press(KeyCode::Backspace), &mut controller);

        assert_eq!(controller.draft().name, "Ani");
        assert_eq!(controller.draft().message, "");
    }

    #[test]
    fn typing_on_date_field_is_suppressed() {
        let (mut view, mut controller) = setup();
        view.focus = Focus::Date;
        type_str(&mut view, &mut controller, "2024-01-01");
        view.handle_key(press(KeyCode::Backspace), &mut controller);

        assert_eq!(controller.draft().date, None);
        assert!(view.overlay.is_none());
    }

    #[test]
    fn date_picker_sets_date() {
        let (mut view, mut controller) = setup();
        view.focus = Focus::Date;

        view.handle_key(press(KeyCode::Enter), &mut controller);
        view.handle_key(press(KeyCode::Right), &mut controller);
        view.handle_key(press(KeyCode::Down), &mut controller);
        view.handle_key(press(KeyCode::PageDown), &mut controller);
        view.handle_key(press(KeyCode::Enter), &mut controller);

        assert_eq!(
            controller.draft().date,
            NaiveDate::from_ymd_opt(2024, 4, 23)
        );
        assert!(view.overlay.is_none());
    }

    #[test]
    fn date_picker_escape_keeps_previous_date() {
        let (mut view, mut controller) = setup();
        view.focus = Focus::Date;
        view.handle_key(press(KeyCode::Enter), &mut controller);
        view.handle_key(press(KeyCode::Left), &mut controller);
        view.handle_key(press(KeyCode::Esc), &mut controller);

        assert_eq!(controller.draft().date, None);
        assert!(view.overlay.is_none());
    }

    #[test]
    fn rating_keys_set_and_step() {
        let (mut view, mut controller) = setup();
        view.focus = Focus::Rating;

        view.handle_key(press(KeyCode::Char('2')), &mut controller);
        assert_eq!(controller.draft().rating.get(), 2);

        view.handle_key(press(KeyCode::Left), &mut controller);
        view.handle_key(press(KeyCode::Left), &mut controller);
        assert_eq!(controller.draft().rating.get(), 1);

        view.handle_key(press(KeyCode::Char('9')), &mut controller);
        assert_eq!(controller.draft().rating.get(), 1);
    }

    #[test]
    fn photo_prompt_yields_load_effect() {
        let (mut view, mut controller) = setup();
        view.focus = Focus::Photo;
        view.handle_key(press(KeyCode::Enter), &mut controller);
        type_str(&mut view, &mut controller, "'/tmp/hall.png'");

        let effect = view.handle_key(press(KeyCode::Enter), &mut controller);
        assert_eq!(effect, Some(Effect::LoadImage(PathBuf::from("/tmp/hall.png"))));
        assert!(view.overlay.is_none());
    }

    #[test]
    fn blocked_submit_focuses_missing_field() {
        let (mut view, mut controller) = setup();
        type_str(&mut view, &mut controller, "Anil");
        view.focus = Focus::Submit;

        let effect = view.handle_key(press(KeyCode::Enter), &mut controller);

        assert_eq!(effect, None);
        assert_eq!(view.focus, Focus::Date);
        assert_eq!(view.hint, Some(Field::Date));
        assert_eq!(controller.status(), &Status::Idle);
    }

    #[test]
    fn ctrl_s_submits_complete_form_once() {
        let (mut view, mut controller) = setup();
        type_str(&mut view, &mut controller, "Anil");
        controller.set_date(today());
        view.focus = Focus::Message;
        type_str(&mut view, &mut controller, "Great food");

        let first = view.handle_key(ctrl('s'), &mut controller);
        assert_matches!(first, Some(Effect::Deliver(s)) if s.body.contains("Great food"));

        let second = view.handle_key(ctrl('s'), &mut controller);
        assert_eq!(second, None);
    }

    #[test]
    fn success_screen_write_another() {
        let (mut view, mut controller) = setup();
        type_str(&mut view, &mut controller, "Anil");
        controller.set_date(today());
        controller.set_text(Field::Message, "Hi".into());
        controller.begin_submit().unwrap();
        controller.finish_submit(Ok(()));

        view.handle_key(press(KeyCode::Enter), &mut controller);

        assert_eq!(controller.status(), &Status::Idle);
        assert_eq!(view.focus, Focus::Name);
        assert_eq!(view.name_cursor, 0);
    }

    #[test]
    fn alert_is_dismissed_by_any_key() {
        let (mut view, mut controller) = setup();
        view.alert("File is too large!".into());
        view.handle_key(press(KeyCode::Char('x')), &mut controller);

        assert!(view.overlay.is_none());
        assert_eq!(controller.draft().name, "");
    }

    #[test]
    fn alert_waits_for_open_picker_to_close() {
        let (mut view, mut controller) = setup();
        view.focus = Focus::Date;
        view.handle_key(press(KeyCode::Enter), &mut controller);
        view.handle_key(press(KeyCode::Right), &mut controller);

        view.alert("File is too large!".into());
        assert_matches!(view.overlay, Some(Overlay::DatePicker(p)) if p.cursor == today().succ_opt().unwrap());

        view.handle_key(press(KeyCode::Enter), &mut controller);
        assert_eq!(controller.draft().date, today().succ_opt());
        assert_eq!(view.overlay, Some(Overlay::Alert("File is too large!".into())));

        view.handle_key(press(KeyCode::Esc), &mut controller);
        assert!(view.overlay.is_none());
    }

    #[test]
    fn ctrl_c_quits_from_anywhere() {
        let (mut view, mut controller) = setup();
        view.focus = Focus::Date;
        view.handle_key(press(KeyCode::Enter), &mut controller);

        assert_eq!(view.handle_key(ctrl('c'), &mut controller), Some(Effect::Quit));
    }
}
