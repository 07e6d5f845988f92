//! Playlist cursor and play order.

use std::{fmt, str::FromStr, time::Duration};

use {
    rand::Rng,
    serde::{Deserialize, Serialize},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayOrder {
    #[default]
    Sequential,
    Random,
}

impl fmt::Display for PlayOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sequential => "sequential",
            Self::Random => "random",
        })
    }
}

impl FromStr for PlayOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" | "seq" => Ok(Self::Sequential),
            "random" => Ok(Self::Random),
            other => Err(format!("unknown play order '{other}'")),
        }
    }
}

/// Ordered content references plus the rotation state.
///
/// `cursor` points at the next item sequential order will play. Random
/// forward picks never move it; `pick_prev` always does (see its docs).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistState {
    items: Vec<String>,
    cursor: usize,
    pub order: PlayOrder,
    pub interval: Duration,
}

impl Default for PlaylistState {
    fn default() -> Self {
        Self::new(Vec::new(), PlayOrder::Sequential, Duration::from_secs(120))
    }
}

impl PlaylistState {
    pub fn new(items: Vec<String>, order: PlayOrder, interval: Duration) -> Self {
        Self {
            items,
            cursor: 0,
            order,
            interval,
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(String::as_str)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replace the items; the cursor restarts at the beginning.
    pub fn set_items(&mut self, items: Vec<String>) {
        self.items = items;
        self.cursor = 0;
    }

    /// Index to play next. Sequential: the cursor's item, then advance with
    /// wrap-around. Random: a uniform pick, cursor untouched.
    pub fn pick_next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<usize> {
        let n = self.items.len();
        if n == 0 {
            return None;
        }
        match self.order {
            PlayOrder::Random => Some(rng.random_range(0..n)),
            PlayOrder::Sequential => {
                let idx = self.cursor % n;
                self.cursor = (idx + 1) % n;
                Some(idx)
            },
        }
    }

    /// Index to play when stepping back.
    ///
    /// The cursor is decremented (with wrap) in both orders; in random order
    /// the returned index is still a random pick. Switching back to
    /// sequential therefore resumes from the moved cursor.
    pub fn pick_prev<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<usize> {
        let n = self.items.len();
        if n == 0 {
            return None;
        }
        self.cursor = (self.cursor % n + n - 1) % n;
        match self.order {
            PlayOrder::Random => Some(rng.random_range(0..n)),
            PlayOrder::Sequential => Some(self.cursor),
        }
    }
}
