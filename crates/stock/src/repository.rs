//! Narrow persistence seams consumed by the domain services.
//!
//! The engine assumes an ambient transactional boundary supplied by the
//! implementation: a search-then-assign sequence must not interleave with a
//! concurrent writer over the same partner/carrier scope. Implementations are
//! expected to serialize writes (a store-wide lock is enough) or re-validate
//! the match predicate inside the transaction that performs the assignment.

use groupage_core::{DomainResult, GroupId, MoveId, MovementTypeId, SaleOrderId, TransferId};

use crate::group::Group;
use crate::lots::{Lot, NewLot};
use crate::matcher::TransferFilter;
use crate::r#move::{Move, MovementType};
use crate::sale::SaleOrder;
use crate::transfer::Transfer;

/// Record lookups and writes used by the matcher, merger and assignment engine.
pub trait StockRepository {
    fn stock_move(&self, id: MoveId) -> DomainResult<Move>;
    fn transfer(&self, id: TransferId) -> DomainResult<Transfer>;
    fn group(&self, id: GroupId) -> DomainResult<Group>;
    fn sale_order(&self, id: SaleOrderId) -> DomainResult<SaleOrder>;
    fn movement_type(&self, id: MovementTypeId) -> DomainResult<MovementType>;

    /// Moves currently attached to the transfer, in creation order.
    fn moves_of_transfer(&self, id: TransferId) -> DomainResult<Vec<Move>>;

    /// Transfers whose *current* group is `id`, in creation order.
    fn transfers_in_group(&self, id: GroupId) -> DomainResult<Vec<Transfer>>;

    /// At most one transfer satisfying the filter. Ties are broken by the
    /// implementation's ordering; absence of a match is a normal outcome.
    fn find_transfer(&self, filter: &TransferFilter) -> DomainResult<Option<Transfer>>;

    fn create_transfer(&self, transfer: Transfer) -> DomainResult<TransferId>;
    fn create_group(&self, group: Group) -> DomainResult<GroupId>;

    /// Attach a move to a transfer. Fails with `InvariantViolation` when the
    /// transfer is frozen (printed or done).
    fn attach_move(&self, mv: MoveId, transfer: TransferId) -> DomainResult<()>;

    /// Reassign a group at transfer level: the transfer and all of its moves
    /// take the group at once, so the transfer stays internally consistent.
    /// Fails with `InvariantViolation` when the transfer is frozen.
    fn set_transfer_group(&self, transfer: TransferId, group: GroupId) -> DomainResult<()>;

    /// Append a reference to the transfer's origin text.
    fn append_origin(&self, transfer: TransferId, name: &str) -> DomainResult<()>;
}

/// Batch creation of lot/serial identifiers.
pub trait LotRepository {
    /// Create all requested identifiers in one batch call, returned in
    /// request order.
    fn create_lots(&self, requests: Vec<NewLot>) -> DomainResult<Vec<Lot>>;
}
