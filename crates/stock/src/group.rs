use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use groupage_core::{CarrierId, Entity, GroupId, PartnerId, SaleOrderId};

use crate::transfer::DeliveryPolicy;

/// Procurement group: the logical batch identity correlating moves to their
/// originating demand(s).
///
/// Groups are immutable once their transfers have started: a merge creates a
/// *new* group rather than editing the old one, so history stays intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    /// Sale orders whose demand this group correlates.
    pub sale_ids: BTreeSet<SaleOrderId>,
    pub partner: Option<PartnerId>,
    pub carrier: Option<CarrierId>,
    pub delivery_policy: DeliveryPolicy,
    pub created_at: DateTime<Utc>,
}

impl Group {
    /// Joint group for a merge: partner, carrier and policy are copied from
    /// the base group, while the name and sale set come from the contributing
    /// original groups.
    pub fn merged_from(base: &Group, name: String, sale_ids: BTreeSet<SaleOrderId>) -> Self {
        Self {
            id: GroupId::new(),
            name,
            sale_ids,
            partner: base.partner,
            carrier: base.carrier,
            delivery_policy: base.delivery_policy,
            created_at: Utc::now(),
        }
    }
}

impl Entity for Group {
    type Id = GroupId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
