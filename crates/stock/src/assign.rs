//! Assignment engine: find-or-create a transfer for a move, attach it,
//! reconcile groups and link sale-order origins.

use chrono::Utc;
use tracing::debug;

use groupage_core::{DomainResult, GroupId, MoveId, TransferId};

use crate::matcher::{MatchContext, TransferMatcher};
use crate::merger::GroupMerger;
use crate::r#move::Move;
use crate::repository::StockRepository;
use crate::sale::SaleOrder;
use crate::transfer::{Transfer, TransferState};

/// One-way side effect fired when a sale order is first associated with a
/// transfer. Excluded from this core's correctness properties; the engine
/// guarantees it fires exactly once per (transfer, sale) pair.
pub trait OriginNotifier {
    fn link_origin(&self, transfer: &Transfer, sale: &SaleOrder);
}

/// Result of assigning one move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignOutcome {
    pub transfer: TransferId,
    /// No open transfer matched; a fresh one was created.
    pub created: bool,
    /// Joint group created by the reconciliation, if any.
    pub merged_group: Option<GroupId>,
}

/// Orchestrates the move-to-transfer flow around the matcher and merger.
pub struct AssignmentEngine<'a> {
    repo: &'a dyn StockRepository,
    notifier: &'a dyn OriginNotifier,
}

impl<'a> AssignmentEngine<'a> {
    pub fn new(repo: &'a dyn StockRepository, notifier: &'a dyn OriginNotifier) -> Self {
        Self { repo, notifier }
    }

    /// Route a move into a transfer.
    ///
    /// Runs inside the caller's transactional boundary; the repository is
    /// expected to serialize the search-then-assign sequence against
    /// concurrent writers of the same partner/carrier scope.
    pub fn assign(&self, move_id: MoveId, ctx: &MatchContext) -> DomainResult<AssignOutcome> {
        let mv = self.repo.stock_move(move_id)?;
        let (transfer_id, created) =
            match TransferMatcher::matching_transfer(self.repo, &mv, ctx)? {
                Some(transfer) => (transfer.id, false),
                None => (self.repo.create_transfer(self.transfer_for(&mv)?)?, true),
            };
        self.repo.attach_move(mv.id, transfer_id)?;

        let merged_group = GroupMerger::reconcile_after_assign(self.repo, transfer_id)?;

        // Origin links are only appended when the move joined an existing
        // transfer; a fresh transfer already carries its group's origin.
        if !created {
            self.link_origin(transfer_id, &mv)?;
        }

        debug!(
            move_id = %move_id,
            transfer = %transfer_id,
            created,
            merged = merged_group.is_some(),
            "assigned move to transfer"
        );
        Ok(AssignOutcome {
            transfer: transfer_id,
            created,
            merged_group,
        })
    }

    /// Fresh transfer carrying the move's routing and its group's
    /// partner/carrier/policy; the origin starts as the group name.
    fn transfer_for(&self, mv: &Move) -> DomainResult<Transfer> {
        let group = self.repo.group(mv.group)?;
        Ok(Transfer {
            id: TransferId::new(),
            state: TransferState::Draft,
            printed: false,
            immediate: false,
            movement_type: mv.movement_type,
            partner: group.partner,
            carrier: group.carrier,
            delivery_policy: group.delivery_policy,
            source: mv.source,
            destination: mv.destination,
            origin: group.name.clone(),
            group: mv.group,
            created_at: Utc::now(),
        })
    }

    fn link_origin(&self, transfer_id: TransferId, mv: &Move) -> DomainResult<()> {
        let Some(line) = mv.sale_line else {
            return Ok(());
        };
        let sale = self.repo.sale_order(line.order)?;
        let transfer = self.repo.transfer(transfer_id)?;
        // whole-word check keeps the append idempotent per sale order
        if transfer.origin_mentions(&sale.name) {
            return Ok(());
        }
        self.repo.append_origin(transfer_id, &sale.name)?;
        let transfer = self.repo.transfer(transfer_id)?;
        self.notifier.link_origin(&transfer, &sale);
        Ok(())
    }
}
