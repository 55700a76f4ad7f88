//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $t:ident) => {
        $(#[$doc])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s).map_err(|e| {
                    DomainError::invalid_id(format!("{}: {}", stringify!($t), e))
                })?;
                Ok(Self(uuid))
            }
        }
    };
}

uuid_id!(
    /// Identifier of an owning company.
    CompanyId
);
uuid_id!(
    /// Identifier of a business partner (customer, shipping destination).
    PartnerId
);
uuid_id!(
    /// Identifier of a delivery carrier.
    CarrierId
);
uuid_id!(
    /// Identifier of a stock location.
    LocationId
);
uuid_id!(
    /// Identifier of a product.
    ProductId
);
uuid_id!(
    /// Identifier of a sale order.
    SaleOrderId
);
uuid_id!(
    /// Identifier of a planned stock move.
    MoveId
);
uuid_id!(
    /// Identifier of a move line (the unit lots are assigned to).
    MoveLineId
);
uuid_id!(
    /// Identifier of a transfer (picking/shipment batch).
    TransferId
);
uuid_id!(
    /// Identifier of a procurement group.
    GroupId
);
uuid_id!(
    /// Identifier of a movement type (operation type of a warehouse).
    MovementTypeId
);
uuid_id!(
    /// Identifier of a lot/serial traceability token.
    LotId
);
