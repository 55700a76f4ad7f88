use serde::{Deserialize, Serialize};

use groupage_core::{Entity, GroupId, LocationId, MoveId, MovementTypeId, ProductId, SaleOrderId, TransferId};

/// Broad category of a movement type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementCategory {
    Incoming,
    Outgoing,
    Internal,
}

/// Operation type of a warehouse flow (receipt, delivery, internal transfer).
///
/// `group_transfers` controls whether moves of this type participate in
/// partner/carrier-based consolidation at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementType {
    pub id: MovementTypeId,
    pub name: String,
    pub category: MovementCategory,
    pub group_transfers: bool,
}

/// Back-reference from a move to the sale order line that demanded it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLineRef {
    pub order: SaleOrderId,
}

/// A planned unit of stock movement.
///
/// `original_group` records the first group the move was in when created. It is
/// set once and never rewritten afterwards: when transfers are merged and moves
/// are moved to a joint group, the original group keeps track of which demand
/// the move came from (and of the original group's name, used when naming the
/// joint group).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub id: MoveId,
    pub product: ProductId,
    pub quantity: i64,
    pub source: LocationId,
    pub destination: LocationId,
    pub movement_type: MovementTypeId,
    pub transfer: Option<TransferId>,
    pub group: GroupId,
    original_group: GroupId,
    pub sale_line: Option<SaleLineRef>,
}

impl Move {
    /// Create an unassigned move. The creation group doubles as the original
    /// group for the rest of the move's life.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: MoveId,
        product: ProductId,
        quantity: i64,
        source: LocationId,
        destination: LocationId,
        movement_type: MovementTypeId,
        group: GroupId,
        sale_line: Option<SaleLineRef>,
    ) -> Self {
        Self {
            id,
            product,
            quantity,
            source,
            destination,
            movement_type,
            transfer: None,
            group,
            original_group: group,
            sale_line,
        }
    }

    pub fn original_group(&self) -> GroupId {
        self.original_group
    }
}

impl Entity for Move {
    type Id = MoveId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
