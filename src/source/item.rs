//! The value type shared by every item source.
//!
//! An [`Item`] is one entry returned by the search backend: either an
//! autocomplete suggestion or a full search result (movie, episode or
//! series).  Every item carries the `provider` it came from so the renderer
//! can balance the visible list across providers.
//!
//! ## Wire shape
//!
//! Items decode from JSON objects tagged by `type`:
//!
//! ```json
//! { "provider": "hulu", "type": "episode", "series_title": "Lost",
//!   "season_number": 1, "episode_number": 4 }
//! ```
//!
//! `originator` is accepted as an alias of `provider`, and `suggestion` as an
//! alias of a suggestion's `text`.  Every display field except the tag is
//! optional.

use serde::Deserialize;

/// A single entry from an item source.  Immutable once decoded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Item {
    /// Origin or brand of this item (e.g. "hulu").
    #[serde(alias = "originator")]
    pub provider: String,

    /// Kind-specific payload.
    #[serde(flatten)]
    pub body: ItemBody,
}

/// The kind-specific part of an [`Item`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemBody {
    Suggestion {
        #[serde(alias = "suggestion")]
        text: String,
    },
    Movie(Movie),
    Episode(Episode),
    Series(Series),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Movie {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Rating normalised to `0.0..=1.0`.
    pub rating_fraction: Option<f64>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub duration_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Episode {
    pub series_title: Option<String>,
    pub episode_title: Option<String>,
    pub season_number: Option<u32>,
    pub episode_number: Option<u32>,
    pub description: Option<String>,
    pub rating_fraction: Option<f64>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub duration_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Series {
    pub title: Option<String>,
    pub season_count: Option<u32>,
    pub episode_count: Option<u32>,
    pub description: Option<String>,
    pub rating_fraction: Option<f64>,
    pub url: Option<String>,
    pub image_url: Option<String>,
}

impl Item {
    /// Build a suggestion item.
    pub fn suggestion(provider: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            body: ItemBody::Suggestion { text: text.into() },
        }
    }

    /// The text a suggestion would put into the search box, if this is one.
    pub fn suggestion_text(&self) -> Option<&str> {
        match &self.body {
            ItemBody::Suggestion { text } => Some(text),
            _ => None,
        }
    }

    /// Headline shown for this item.
    pub fn headline(&self) -> String {
        match &self.body {
            ItemBody::Suggestion { text } => text.clone(),
            ItemBody::Movie(m) => m.title.clone().unwrap_or_else(|| "(untitled)".into()),
            ItemBody::Series(s) => s.title.clone().unwrap_or_else(|| "(untitled)".into()),
            ItemBody::Episode(e) => {
                let series = e.series_title.as_deref().unwrap_or("(unknown series)");
                let code = match (e.season_number, e.episode_number) {
                    (Some(s), Some(n)) => format!(" S{s:02}E{n:02}"),
                    (None, Some(n)) => format!(" E{n:02}"),
                    _ => String::new(),
                };
                match &e.episode_title {
                    Some(title) => format!("{series}{code}: {title}"),
                    None => format!("{series}{code}"),
                }
            }
        }
    }

    /// Short kind label ("movie", "episode", ...).
    pub fn kind_label(&self) -> &'static str {
        match self.body {
            ItemBody::Suggestion { .. } => "suggestion",
            ItemBody::Movie(_) => "movie",
            ItemBody::Episode(_) => "episode",
            ItemBody::Series(_) => "series",
        }
    }

    /// Compact metadata line: duration, rating, season/episode counts.
    pub fn details(&self) -> Option<String> {
        let mut parts = Vec::new();
        let (duration, rating) = match &self.body {
            ItemBody::Suggestion { .. } => return None,
            ItemBody::Movie(m) => (m.duration_seconds, m.rating_fraction),
            ItemBody::Episode(e) => (e.duration_seconds, e.rating_fraction),
            ItemBody::Series(s) => {
                if let Some(n) = s.season_count {
                    parts.push(format!("{n} seasons"));
                }
                if let Some(n) = s.episode_count {
                    parts.push(format!("{n} episodes"));
                }
                (None, s.rating_fraction)
            }
        };
        if let Some(secs) = duration {
            parts.push(format_duration(secs));
        }
        if let Some(r) = rating {
            parts.push(format!("{:.0}%", r * 100.0));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" · "))
        }
    }
}

fn format_duration(secs: u64) -> String {
    let (h, m) = (secs / 3600, (secs % 3600) / 60);
    if h > 0 {
        format!("{h}h{m:02}m")
    } else {
        format!("{m}m")
    }
}
