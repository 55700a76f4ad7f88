use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use groupage_core::{CarrierId, Entity, GroupId, LocationId, MovementTypeId, PartnerId, TransferId};

/// Transfer lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferState {
    Draft,
    Confirmed,
    Waiting,
    PartiallyAvailable,
    Assigned,
    Done,
    Cancelled,
}

impl TransferState {
    /// States in which a transfer can still receive moves.
    pub fn is_open(self) -> bool {
        matches!(
            self,
            TransferState::Draft
                | TransferState::Confirmed
                | TransferState::Waiting
                | TransferState::PartiallyAvailable
                | TransferState::Assigned
        )
    }
}

/// Shipping policy of a transfer: ship each batch as soon as it is ready, or
/// only once everything is available. Consolidation never mixes the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    Direct,
    OneShot,
}

/// A batch of moves executed together (picking/shipment document).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    pub state: TransferState,
    /// Set when the warehouse prints the picking list; the transfer is then
    /// considered started on the floor.
    pub printed: bool,
    /// Immediate transfers bypass planning and never take part in grouping.
    pub immediate: bool,
    pub movement_type: MovementTypeId,
    pub partner: Option<PartnerId>,
    pub carrier: Option<CarrierId>,
    pub delivery_policy: DeliveryPolicy,
    pub source: LocationId,
    pub destination: LocationId,
    /// Free-form, append-only source-document text ("SO1 SO2 ...").
    pub origin: String,
    pub group: GroupId,
    pub created_at: DateTime<Utc>,
}

impl Transfer {
    /// Once printed or done, group assignment and move membership are fixed.
    pub fn is_frozen(&self) -> bool {
        self.printed || self.state == TransferState::Done
    }

    /// Whole-word check against the origin text, so "SO1" does not match
    /// inside "SO12".
    pub fn origin_mentions(&self, name: &str) -> bool {
        contains_word(&self.origin, name)
    }

    pub fn append_origin(&mut self, name: &str) {
        self.origin.push(' ');
        self.origin.push_str(name);
    }
}

impl Entity for Transfer {
    type Id = TransferId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `word` occurs in `text` delimited by non-word characters (or the ends of
/// the text).
pub fn contains_word(text: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    let mut from = 0;
    while let Some(pos) = text[from..].find(word) {
        let at = from + pos;
        let end = at + word.len();
        let boundary_before = text[..at].chars().next_back().is_none_or(|c| !is_word_char(c));
        let boundary_after = text[end..].chars().next().is_none_or(|c| !is_word_char(c));
        if boundary_before && boundary_after {
            return true;
        }
        // step past one char so shifted occurrences are still found
        from = at + text[at..].chars().next().map_or(1, char::len_utf8);
    }
    false
}
