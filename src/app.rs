use std::sync::mpsc::Receiver;
use std::time::Instant;

use ratatui::widgets::ListState;
use tracing::info;

use crate::fetch::FetchMsg;
use crate::input::{InputBinding, TextInput};
use crate::observer::SubscriptionId;
use crate::query::{QueryModel, QueryOrigin};
use crate::render::{FairRenderer, RenderConfig};
use crate::source::{Item, SourceEvent, SourceKind};

/// The painted view of one item source.
pub struct Pane {
    pub kind: SourceKind,
    renderer: FairRenderer,
    /// Indices into the source's items, in paint order.
    pub rendered: Vec<usize>,
    /// List selection state for scrolling.
    pub list_state: ListState,
}

impl Pane {
    pub fn new(kind: SourceKind, config: RenderConfig) -> Self {
        Self {
            kind,
            renderer: FairRenderer::new(config),
            rendered: Vec::new(),
            list_state: ListState::default(),
        }
    }

    /// Recompute the capped view from scratch.
    pub fn refresh(&mut self, items: &[Item]) {
        self.rendered = self.renderer.render(items);
        self.list_state.select(None);
    }

    /// The painted items, borrowed from `items`.
    pub fn visible<'a>(&self, items: &'a [Item]) -> Vec<&'a Item> {
        self.rendered.iter().filter_map(|&i| items.get(i)).collect()
    }

    /// Index into the source's items of the selected entry.
    pub fn selected(&self) -> Option<usize> {
        self.list_state
            .selected()
            .and_then(|i| self.rendered.get(i).copied())
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        if self.rendered.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(self.rendered.len() - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_previous(&mut self) {
        if self.rendered.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_first(&mut self) {
        if !self.rendered.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        if !self.rendered.is_empty() {
            self.list_state.select(Some(self.rendered.len() - 1));
        }
    }
}

pub struct App {
    pub model: QueryModel,
    pub binding: InputBinding,
    pub suggestions: Pane,
    pub results: Pane,
    source_events: Vec<(SourceKind, SubscriptionId, Receiver<SourceEvent>)>,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Last fetch status message.
    pub status: String,
}

impl App {
    pub fn new(mut model: QueryModel, suggestions: RenderConfig, results: RenderConfig) -> Self {
        let binding = InputBinding::bind(&mut model);
        let mut source_events = Vec::new();
        for kind in [SourceKind::Suggestions, SourceKind::Results] {
            if let Some(source) = model.source_mut(kind) {
                let (id, rx) = source.subscribe();
                source_events.push((kind, id, rx));
            }
        }
        Self {
            model,
            binding,
            suggestions: Pane::new(SourceKind::Suggestions, suggestions),
            results: Pane::new(SourceKind::Results, results),
            source_events,
            quit: false,
            status: "Type to search".into(),
        }
    }

    pub fn items(&self, kind: SourceKind) -> &[Item] {
        self.model.source(kind).map(|s| s.items()).unwrap_or(&[])
    }

    /// Hand a completed fetch to the model.
    pub fn handle_fetch(&mut self, msg: FetchMsg) {
        self.model.deliver(msg);
    }

    /// One turn of the event loop: fire the debounce timer if due, then
    /// apply whatever the sources and the model have published.
    pub fn tick(&mut self, now: Instant) {
        self.model.poll_timer(now);
        self.process_source_events();
        self.binding.sync();
    }

    fn process_source_events(&mut self) {
        let events: Vec<SourceEvent> = self
            .source_events
            .iter()
            .flat_map(|(_, _, rx)| rx.try_iter())
            .collect();

        for event in events {
            match event {
                SourceEvent::Reset { kind, query, count } => {
                    let items = self.model.source(kind).map(|s| s.items()).unwrap_or(&[]);
                    let pane = match kind {
                        SourceKind::Suggestions => &mut self.suggestions,
                        SourceKind::Results => &mut self.results,
                    };
                    pane.refresh(items);
                    if kind == SourceKind::Results {
                        self.status = if query.trim().is_empty() {
                            "Type to search".into()
                        } else {
                            format!("{count} results for \"{query}\"")
                        };
                    }
                }
                SourceEvent::FetchFailed { kind, query, error } => {
                    self.status = format!("Error fetching {kind} for \"{query}\": {error}");
                }
            }
        }
    }

    /// Apply a local edit to the search box.
    pub fn edit(&mut self, now: Instant, f: impl FnOnce(&mut TextInput)) -> bool {
        self.binding.edit(&mut self.model, now, f)
    }

    /// Skip the rest of the quiet window and search immediately.
    pub fn search_now(&mut self) {
        self.model.flush();
    }

    /// Move focus from the search box into the suggestion list.
    pub fn enter_suggestions(&mut self) {
        if self.suggestions.rendered.is_empty() {
            return;
        }
        self.binding.blur();
        self.suggestions.select_first();
    }

    /// Up in the suggestion list; from the first entry, back to the box.
    pub fn suggestion_up(&mut self) {
        if self.suggestions.list_state.selected().unwrap_or(0) == 0 {
            self.suggestions.list_state.select(None);
            self.binding.claim_focus();
        } else {
            self.suggestions.select_previous();
        }
    }

    /// Put the selected suggestion into the query.
    pub fn choose_suggestion(&mut self, now: Instant) {
        let text = self
            .suggestions
            .selected()
            .and_then(|i| self.items(SourceKind::Suggestions).get(i))
            .and_then(Item::suggestion_text)
            .map(str::to_string);

        if let Some(text) = text {
            info!(suggestion = %text, "suggestion chosen");
            if self.model.set_query(&text, QueryOrigin::Selection, now) {
                // The box is mirrored and refocused on the next sync.
                return;
            }
        }
        self.binding.claim_focus();
    }

    /// Release model subscriptions before teardown.
    pub fn close(self) -> QueryModel {
        let Self {
            mut model,
            binding,
            source_events,
            ..
        } = self;
        binding.unbind(&mut model);
        for (kind, id, _) in source_events {
            if let Some(source) = model.source_mut(kind) {
                source.unsubscribe(id);
            }
        }
        model
    }
}
