//! Group reconciliation after a move joins a transfer.

use std::collections::BTreeSet;

use tracing::{debug, info};

use groupage_core::{DomainResult, GroupId, SaleOrderId, TransferId};

use crate::group::Group;
use crate::r#move::MovementCategory;
use crate::repository::StockRepository;
use crate::transfer::TransferState;

/// Detects when a transfer's moves span several originating groups and, if
/// so, rolls the still-mutable transfers of the old group onto a fresh joint
/// group. Printed or done transfers keep their existing group: they are
/// started on the floor and their grouping identity is fixed, which also
/// keeps old, done sale orders out of new groups forever.
pub struct GroupMerger;

impl GroupMerger {
    /// Reconcile the transfer's group after a move was attached.
    ///
    /// Returns the id of the joint group when a merge happened. Re-invoking
    /// after no further divergence is a no-op: the sale sets compare equal.
    pub fn reconcile_after_assign(
        repo: &dyn StockRepository,
        transfer_id: TransferId,
    ) -> DomainResult<Option<GroupId>> {
        let transfer = repo.transfer(transfer_id)?;
        let movement_type = repo.movement_type(transfer.movement_type)?;
        if !movement_type.group_transfers || movement_type.category != MovementCategory::Outgoing {
            return Ok(None);
        }

        // Contributing groups come from each move's immutable original-group
        // back-reference, not its current (possibly already merged) group.
        let moves = repo.moves_of_transfer(transfer_id)?;
        let mut contributing: Vec<Group> = Vec::new();
        for mv in &moves {
            let original = mv.original_group();
            if contributing.iter().all(|g| g.id != original) {
                contributing.push(repo.group(original)?);
            }
        }

        let move_sales: BTreeSet<SaleOrderId> = contributing
            .iter()
            .flat_map(|g| g.sale_ids.iter().copied())
            .collect();

        let base_group = repo.group(transfer.group)?;
        if move_sales == base_group.sale_ids {
            return Ok(None);
        }

        // Moves from another sale order were merged into this transfer:
        // create a joint group covering every contributing order.
        let name = contributing
            .iter()
            .map(|g| g.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let joint = Group::merged_from(&base_group, name, move_sales);
        let joint_id = repo.create_group(joint)?;

        for candidate in repo.transfers_in_group(base_group.id)? {
            let candidate_type = repo.movement_type(candidate.movement_type)?;
            if !candidate_type.group_transfers {
                continue;
            }
            if candidate.printed || candidate.state == TransferState::Done {
                debug!(
                    transfer = %candidate.id,
                    "skipping frozen transfer during group merge"
                );
                continue;
            }
            repo.set_transfer_group(candidate.id, joint_id)?;
        }

        info!(
            transfer = %transfer_id,
            old_group = %base_group.id,
            joint_group = %joint_id,
            orders = base_group.sale_ids.len(),
            "merged procurement groups after transfer assignment"
        );
        Ok(Some(joint_id))
    }
}
