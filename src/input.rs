//! The search box and keyboard input handling.
//!
//! [`InputBinding`] ties the text widget to the [`QueryModel`] in both
//! directions:
//!
//! * edits made while the box has focus are pushed into the model with
//!   [`QueryModel::set_query`], which handles the debounce;
//! * query changes coming back from the model are copied into the box only
//!   while it does **not** have focus, so a mirrored value can never fight a
//!   keystroke in progress.  After mirroring, the box takes focus back.
//!
//! [`handle_key_event`] maps terminal keys to actions on [`App`].  Adding a
//! keybinding is a single match arm there.

use std::sync::mpsc::Receiver;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::App;
use crate::observer::SubscriptionId;
use crate::query::{QueryEvent, QueryModel, QueryOrigin};

/// Single-line editable text with a byte-offset cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    pub text: String,
    pub cursor: usize,
}

impl TextInput {
    pub fn insert_char(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn delete_char_before(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.text.drain(prev..self.cursor);
            self.cursor = prev;
        }
    }

    pub fn delete_char_at(&mut self) {
        if let Some(next) = self.next_boundary() {
            self.text.drain(self.cursor..next);
        }
    }

    pub fn move_left(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.cursor = prev;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(next) = self.next_boundary() {
            self.cursor = next;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.len();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Replace the whole value, leaving the cursor at the end.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.text.len();
    }

    /// Cursor position in characters, for placing the terminal cursor.
    pub fn cursor_column(&self) -> usize {
        self.text[..self.cursor].chars().count()
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.text[..self.cursor].char_indices().next_back().map(|(i, _)| i)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.text[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
    }
}

/// Who holds keyboard focus.  The search box is "focused" only in `Input`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Suggestions,
}

pub struct InputBinding {
    pub widget: TextInput,
    focus: Focus,
    subscription: SubscriptionId,
    changes: Receiver<QueryEvent>,
}

impl InputBinding {
    /// Bind a new search box to `model`.  The box starts with the model's
    /// current query and with focus.
    pub fn bind(model: &mut QueryModel) -> Self {
        let (subscription, changes) = model.subscribe();
        let mut widget = TextInput::default();
        widget.set_text(model.query());
        Self {
            widget,
            focus: Focus::Input,
            subscription,
            changes,
        }
    }

    pub fn unbind(self, model: &mut QueryModel) {
        model.unsubscribe(self.subscription);
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn is_focused(&self) -> bool {
        self.focus == Focus::Input
    }

    pub fn claim_focus(&mut self) {
        self.focus = Focus::Input;
    }

    /// Hand focus to the suggestion list.
    pub fn blur(&mut self) {
        self.focus = Focus::Suggestions;
    }

    /// Apply a local edit and push the resulting value into the model.
    ///
    /// Ignored unless the box has focus.  Returns whether the query changed;
    /// cursor-only edits leave it unchanged and are no-ops for the model.
    pub fn edit(
        &mut self,
        model: &mut QueryModel,
        now: Instant,
        f: impl FnOnce(&mut TextInput),
    ) -> bool {
        if !self.is_focused() {
            return false;
        }
        f(&mut self.widget);
        model.set_query(&self.widget.text, QueryOrigin::Local, now)
    }

    /// Apply pending model changes to the box.  Only the newest value is
    /// mirrored; returns whether the widget was updated.
    pub fn sync(&mut self) -> bool {
        let latest = self
            .changes
            .try_iter()
            .map(|QueryEvent::Changed { query, .. }| query)
            .last();
        match latest {
            Some(query) => self.mirror(&query),
            None => false,
        }
    }

    fn mirror(&mut self, query: &str) -> bool {
        if self.is_focused() {
            return false;
        }
        self.widget.set_text(query);
        self.claim_focus();
        true
    }
}

/// Process a single key event, updating app state accordingly.
///
/// Only reacts to key-press events (ignoring release / repeat) so that each
/// physical keypress triggers exactly one action.
pub fn handle_key_event(app: &mut App, key: KeyEvent, now: Instant) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => app.quit = true,
            KeyCode::Char('u') => {
                app.edit(now, TextInput::clear);
            }
            _ => {}
        }
        return;
    }

    match app.binding.focus() {
        Focus::Input => match key.code {
            KeyCode::Esc => app.quit = true,
            KeyCode::Enter => app.search_now(),
            KeyCode::Down | KeyCode::Tab => app.enter_suggestions(),
            KeyCode::PageDown => app.results.select_next(),
            KeyCode::PageUp => app.results.select_previous(),
            KeyCode::Backspace => {
                app.edit(now, TextInput::delete_char_before);
            }
            KeyCode::Delete => {
                app.edit(now, TextInput::delete_char_at);
            }
            KeyCode::Left => {
                app.edit(now, TextInput::move_left);
            }
            KeyCode::Right => {
                app.edit(now, TextInput::move_right);
            }
            KeyCode::Home => {
                app.edit(now, TextInput::move_home);
            }
            KeyCode::End => {
                app.edit(now, TextInput::move_end);
            }
            KeyCode::Char(c) => {
                app.edit(now, |w| w.insert_char(c));
            }
            _ => {}
        },
        Focus::Suggestions => match key.code {
            KeyCode::Esc | KeyCode::BackTab => app.binding.claim_focus(),
            KeyCode::Down | KeyCode::Char('j') => app.suggestions.select_next(),
            KeyCode::Up | KeyCode::Char('k') => app.suggestion_up(),
            KeyCode::Home | KeyCode::Char('g') => app.suggestions.select_first(),
            KeyCode::End | KeyCode::Char('G') => app.suggestions.select_last(),
            KeyCode::Enter => app.choose_suggestion(now),
            _ => {}
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::DEFAULT_MIN_UPDATE_INTERVAL;
    use crate::source::tests::make_source;
    use crate::source::SourceKind;

    fn model() -> QueryModel {
        let (results, _) = make_source(SourceKind::Results, false);
        QueryModel::new(vec![results], DEFAULT_MIN_UPDATE_INTERVAL)
    }

    // -- TextInput -----------------------------------------------------------

    #[test]
    fn insert_and_delete_respect_utf8_boundaries() {
        let mut w = TextInput::default();
        for c in "héllo".chars() {
            w.insert_char(c);
        }
        w.move_left();
        w.move_left();
        w.move_left();
        w.move_left();
        assert_eq!(w.cursor_column(), 1);
        w.delete_char_at();
        assert_eq!(w.text, "hllo");
        w.delete_char_before();
        assert_eq!(w.text, "llo");
        assert_eq!(w.cursor, 0);
    }

    #[test]
    fn cursor_moves_clamp_at_ends() {
        let mut w = TextInput::default();
        w.move_left();
        w.delete_char_before();
        assert_eq!(w.cursor, 0);
        w.set_text("ab");
        w.move_right();
        w.delete_char_at();
        assert_eq!(w.cursor, 2);
        assert_eq!(w.text, "ab");
        w.move_home();
        assert_eq!(w.cursor, 0);
        w.move_end();
        assert_eq!(w.cursor, 2);
    }

    // -- InputBinding --------------------------------------------------------

    #[test]
    fn bind_starts_focused_with_model_query() {
        let mut m = model();
        m.set_query("lost", QueryOrigin::Initial, Instant::now());
        let b = InputBinding::bind(&mut m);
        assert!(b.is_focused());
        assert_eq!(b.widget.text, "lost");
    }

    #[test]
    fn local_edits_push_into_model() {
        let mut m = model();
        let mut b = InputBinding::bind(&mut m);
        let now = Instant::now();

        assert!(b.edit(&mut m, now, |w| w.insert_char('u')));
        assert!(b.edit(&mut m, now, |w| w.insert_char('p')));
        assert_eq!(m.query(), "up");
        assert!(m.is_pending());
    }

    #[test]
    fn cursor_keys_do_not_change_query() {
        let mut m = model();
        let mut b = InputBinding::bind(&mut m);
        let now = Instant::now();
        b.edit(&mut m, now, |w| w.set_text("abc"));
        let before = m.time_until_fire(now);

        assert!(!b.edit(&mut m, now + DEFAULT_MIN_UPDATE_INTERVAL / 2, TextInput::move_left));
        assert_eq!(m.time_until_fire(now), before);
    }

    #[test]
    fn focused_box_is_never_overwritten() {
        let mut m = model();
        let mut b = InputBinding::bind(&mut m);
        let now = Instant::now();
        b.edit(&mut m, now, |w| w.set_text("typing"));

        m.set_query("elsewhere", QueryOrigin::Selection, now);

        assert!(!b.sync());
        assert_eq!(b.widget.text, "typing");
        assert!(b.is_focused());
    }

    #[test]
    fn unfocused_box_mirrors_and_reclaims_focus() {
        let mut m = model();
        let mut b = InputBinding::bind(&mut m);
        b.blur();

        m.set_query("lost girl", QueryOrigin::Selection, Instant::now());

        assert!(b.sync());
        assert_eq!(b.widget.text, "lost girl");
        assert_eq!(b.widget.cursor, "lost girl".len());
        assert!(b.is_focused());
    }

    #[test]
    fn queued_changes_mirror_the_newest_value() {
        let mut m = model();
        let mut b = InputBinding::bind(&mut m);
        b.blur();
        let now = Instant::now();

        m.set_query("first", QueryOrigin::Selection, now);
        m.set_query("second", QueryOrigin::Selection, now);

        assert!(b.sync());
        assert_eq!(b.widget.text, "second");
        assert_eq!(b.widget.text, m.query());
        assert!(b.is_focused());
        assert!(!b.sync(), "queue is drained");
    }

    #[test]
    fn edits_are_ignored_without_focus() {
        let mut m = model();
        let mut b = InputBinding::bind(&mut m);
        b.blur();
        assert!(!b.edit(&mut m, Instant::now(), |w| w.insert_char('x')));
        assert_eq!(m.query(), "");
        assert_eq!(b.widget.text, "");
    }

    #[test]
    fn unbind_releases_the_subscription() {
        let mut m = model();
        let b = InputBinding::bind(&mut m);
        assert_eq!(m.subscriber_count(), 1);
        b.unbind(&mut m);
        assert_eq!(m.subscriber_count(), 0);
    }
}
