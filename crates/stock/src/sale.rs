use serde::{Deserialize, Serialize};

use groupage_core::{Entity, PartnerId, SaleOrderId};

/// Fulfillment policy of a sale order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipPolicy {
    /// Lines may ship as soon as they are available, split across transfers.
    AsAvailable,
    /// All lines of the order must ship together; the order is never mixed
    /// with moves of other orders.
    Complete,
}

/// The slice of a sale order this core needs: identity, shipping destination
/// and fulfillment policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleOrder {
    pub id: SaleOrderId,
    pub name: String,
    pub shipping_partner: PartnerId,
    pub ship_policy: ShipPolicy,
}

impl Entity for SaleOrder {
    type Id = SaleOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
