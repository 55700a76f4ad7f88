//! Grouping key derivation.
//!
//! Two moves may share a transfer under the baseline rule iff their grouping
//! keys are equal. The key is a strict left-to-right ordered tuple, not a set:
//! lower-priority rule layers append discriminators without disturbing the
//! equality semantics of the components already in place.

use serde::{Deserialize, Serialize};

use groupage_core::{GroupId, LocationId, MovementTypeId, PartnerId, ValueObject};

use crate::r#move::Move;
use crate::sale::{SaleOrder, ShipPolicy};

/// Fulfillment policy wrapped as an identity-bearing key component.
///
/// Downstream matching treats every key component uniformly as an entity with
/// an identifier, so the bare policy enum is given a stable comparable id here
/// instead of flowing through as a loose scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyKey(ShipPolicy);

impl PolicyKey {
    pub fn new(policy: ShipPolicy) -> Self {
        Self(policy)
    }

    /// Stable identifier of the wrapped policy.
    pub fn id(&self) -> &'static str {
        match self.0 {
            ShipPolicy::AsAvailable => "as_available",
            ShipPolicy::Complete => "complete",
        }
    }

    pub fn policy(&self) -> ShipPolicy {
        self.0
    }
}

impl ValueObject for PolicyKey {}

/// One appended key component. Compared structurally, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyPart {
    Group(GroupId),
    Location(LocationId),
    MovementType(MovementTypeId),
    Partner(PartnerId),
    Policy(PolicyKey),
    Text(String),
}

/// Composite grouping key of a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupKey {
    partner: PartnerId,
    policy: PolicyKey,
    extra: Vec<KeyPart>,
}

impl GroupKey {
    pub fn partner(&self) -> PartnerId {
        self.partner
    }

    pub fn policy(&self) -> PolicyKey {
        self.policy
    }

    pub fn extra(&self) -> &[KeyPart] {
        &self.extra
    }

    /// Append a discriminator contributed by a lower-priority rule layer.
    pub fn push(&mut self, part: KeyPart) {
        self.extra.push(part);
    }
}

impl ValueObject for GroupKey {}

/// Pure derivation of a move's grouping key.
pub struct GroupKeyBuilder;

impl GroupKeyBuilder {
    /// Leading components are the sale's shipping destination and fulfillment
    /// policy; the baseline stock discriminators (group, locations, movement
    /// type) follow as appended parts.
    pub fn key(mv: &Move, sale: &SaleOrder) -> GroupKey {
        let mut key = GroupKey {
            partner: sale.shipping_partner,
            policy: PolicyKey::new(sale.ship_policy),
            extra: Vec::new(),
        };
        key.push(KeyPart::Group(mv.group));
        key.push(KeyPart::Location(mv.source));
        key.push(KeyPart::Location(mv.destination));
        key.push(KeyPart::MovementType(mv.movement_type));
        key
    }
}
