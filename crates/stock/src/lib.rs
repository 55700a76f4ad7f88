//! Stock consolidation domain module.
//!
//! This crate contains the business rules for consolidating outbound stock
//! moves into shared transfers (grouping by partner and carrier), reconciling
//! procurement groups when several sale orders end up on one transfer, and
//! batch-assigning lot/serial identifiers to move lines. All logic is
//! deterministic domain code (no IO, no HTTP, no storage); persistence is
//! reached through the narrow repository traits in [`repository`].

pub mod assign;
pub mod group;
pub mod group_key;
pub mod lots;
pub mod matcher;
pub mod merger;
pub mod r#move;
pub mod repository;
pub mod sale;
pub mod transfer;

pub use assign::{AssignOutcome, AssignmentEngine, OriginNotifier};
pub use group::Group;
pub use group_key::{GroupKey, GroupKeyBuilder, KeyPart, PolicyKey};
pub use lots::{Lot, LotBatchAssigner, MoveLine, NewLot, SerialExhaustionPolicy, Tracking};
pub use matcher::{CarrierConstraint, MatchContext, MatchStrategy, TransferFilter, TransferMatcher};
pub use merger::GroupMerger;
pub use r#move::{Move, MovementCategory, MovementType, SaleLineRef};
pub use repository::{LotRepository, StockRepository};
pub use sale::{SaleOrder, ShipPolicy};
pub use transfer::{DeliveryPolicy, Transfer, TransferState};
