//! Per-kind synchronization cursors.
//!
//! A [`Cursor`] marks "everything at or before this point has been merged".
//! It starts at [`Cursor::Epoch`], which forces a snapshot, and moves forward
//! after each successful cycle. Provider-issued tokens are preferred over the
//! local clock because they are immune to clock skew.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque point-in-time marker of synchronization progress.
///
/// Variants are ordered `Epoch < At(..) < Token(..)`, so once a provider token
/// has been seen the cursor never falls back to a clock value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Cursor {
    /// Nothing incorporated yet.
    #[default]
    Epoch,
    /// Local-clock marker.
    At(DateTime<Utc>),
    /// Provider-issued sequence token (e.g. a `last` value).
    Token(i64),
}

impl Cursor {
    #[must_use]
    pub const fn is_epoch(&self) -> bool {
        matches!(self, Self::Epoch)
    }

    /// Move forward to `candidate`, never backwards.
    #[must_use]
    pub fn advance(self, candidate: Cursor) -> Cursor {
        self.max(candidate)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Epoch => f.write_str("epoch"),
            Self::At(ts) => write!(f, "{}", ts.to_rfc3339()),
            Self::Token(t) => write!(f, "#{t}"),
        }
    }
}
