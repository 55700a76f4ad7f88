//! Transfer matching: decide which existing transfer a move should join.

use serde::{Deserialize, Serialize};

use groupage_core::{
    CarrierId, DomainError, DomainResult, GroupId, LocationId, MovementTypeId, PartnerId,
    TransferId, ValueObject,
};

use crate::group::Group;
use crate::r#move::{Move, MovementCategory, MovementType};
use crate::repository::StockRepository;
use crate::sale::{SaleOrder, ShipPolicy};
use crate::transfer::{DeliveryPolicy, Transfer};

/// Caller context for a match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchContext {
    /// Set while splitting a backorder: the move must not be re-matched to
    /// the transfer it is being split out of.
    pub exclude_current_transfer: bool,
}

/// Carrier requirement of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CarrierConstraint {
    /// Carrier is not part of the predicate (baseline rule).
    Any,
    /// The transfer's carrier must equal the value exactly; `Exactly(None)`
    /// requires a transfer without carrier.
    Exactly(Option<CarrierId>),
}

/// Filter predicate over candidate transfers, built by a [`MatchStrategy`]
/// and evaluated by the repository. First-class value: the same filter that
/// selected a candidate can be re-evaluated inside the assigning transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFilter {
    pub group: Option<GroupId>,
    pub partner: Option<PartnerId>,
    pub carrier: CarrierConstraint,
    pub delivery_policy: Option<DeliveryPolicy>,
    pub source: LocationId,
    pub destination: LocationId,
    pub movement_type: MovementTypeId,
    pub exclude: Option<TransferId>,
}

impl TransferFilter {
    /// Evaluate the predicate against one candidate. Printed, immediate,
    /// done and cancelled transfers never match.
    pub fn matches(&self, transfer: &Transfer) -> bool {
        if transfer.printed || transfer.immediate || !transfer.state.is_open() {
            return false;
        }
        if self.exclude == Some(transfer.id) {
            return false;
        }
        if let Some(group) = self.group {
            if transfer.group != group {
                return false;
            }
        }
        if let Some(partner) = self.partner {
            if transfer.partner != Some(partner) {
                return false;
            }
        }
        if let CarrierConstraint::Exactly(carrier) = self.carrier {
            if transfer.carrier != carrier {
                return false;
            }
        }
        if let Some(policy) = self.delivery_policy {
            if transfer.delivery_policy != policy {
                return false;
            }
        }
        transfer.source == self.source
            && transfer.destination == self.destination
            && transfer.movement_type == self.movement_type
    }
}

impl ValueObject for TransferFilter {}

/// Delivery-policy predicate of the partner/carrier rule.
///
/// Extension point: deployments with stricter mixing rules swap the returned
/// constraint without touching the strategy itself. The default forbids
/// mixing shipping policies by requiring the group's policy on the transfer.
pub fn delivery_policy_predicate(group: &Group) -> Option<DeliveryPolicy> {
    Some(group.delivery_policy)
}

/// Matching rule, selected from the move's movement type and sale policy.
/// Closed set: the baseline same-group rule, or partner/carrier consolidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    Baseline,
    PartnerCarrier,
}

impl MatchStrategy {
    /// Partner/carrier consolidation applies only when the movement type
    /// groups transfers and the originating sale does not demand a complete,
    /// single-order shipment.
    pub fn select(movement_type: &MovementType, sale: Option<&SaleOrder>) -> Self {
        let complete = sale.is_some_and(|s| s.ship_policy == ShipPolicy::Complete);
        if !movement_type.group_transfers || complete {
            MatchStrategy::Baseline
        } else {
            MatchStrategy::PartnerCarrier
        }
    }

    /// Build the filter predicate for a move.
    ///
    /// Read-only; failing to resolve the destination partner under the
    /// partner/carrier rule is a precondition error, never a silent default.
    pub fn build_predicate(
        self,
        mv: &Move,
        group: &Group,
        movement_type: &MovementType,
        ctx: &MatchContext,
    ) -> DomainResult<TransferFilter> {
        let mut filter = TransferFilter {
            group: None,
            partner: None,
            carrier: CarrierConstraint::Any,
            delivery_policy: None,
            source: mv.source,
            destination: mv.destination,
            movement_type: mv.movement_type,
            exclude: None,
        };
        match self {
            MatchStrategy::Baseline => {
                filter.group = Some(mv.group);
            }
            MatchStrategy::PartnerCarrier => {
                let partner = group.partner.ok_or_else(|| {
                    DomainError::precondition(
                        "partner/carrier grouping needs a resolved destination partner on the group",
                    )
                })?;
                filter.partner = Some(partner);
                filter.delivery_policy = delivery_policy_predicate(group);
                // same carrier only for outgoing transfers; other categories
                // must join carrier-less transfers
                filter.carrier = if movement_type.category == MovementCategory::Outgoing {
                    CarrierConstraint::Exactly(group.carrier)
                } else {
                    CarrierConstraint::Exactly(None)
                };
            }
        }
        if ctx.exclude_current_transfer {
            filter.exclude = mv.transfer;
        }
        Ok(filter)
    }
}

/// Read-only selection of the transfer a move should join.
pub struct TransferMatcher;

impl TransferMatcher {
    /// Select at most one open transfer for the move, or `None` when the
    /// caller must create a fresh one.
    pub fn matching_transfer(
        repo: &dyn StockRepository,
        mv: &Move,
        ctx: &MatchContext,
    ) -> DomainResult<Option<Transfer>> {
        let movement_type = repo.movement_type(mv.movement_type)?;
        let group = repo.group(mv.group)?;
        let sale = match mv.sale_line {
            Some(line) => Some(repo.sale_order(line.order)?),
            None => None,
        };
        let strategy = MatchStrategy::select(&movement_type, sale.as_ref());
        let filter = strategy.build_predicate(mv, &group, &movement_type, ctx)?;
        repo.find_transfer(&filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use groupage_core::{MoveId, ProductId, SaleOrderId};
    use std::collections::BTreeSet;

    use crate::transfer::TransferState;

    fn movement_type(category: MovementCategory, group_transfers: bool) -> MovementType {
        MovementType {
            id: MovementTypeId::new(),
            name: "Delivery Orders".to_string(),
            category,
            group_transfers,
        }
    }

    fn group(partner: Option<PartnerId>, carrier: Option<CarrierId>) -> Group {
        Group {
            id: GroupId::new(),
            name: "SO1".to_string(),
            sale_ids: BTreeSet::new(),
            partner,
            carrier,
            delivery_policy: DeliveryPolicy::Direct,
            created_at: Utc::now(),
        }
    }

    fn mv(group: &Group, mt: &MovementType, source: LocationId, destination: LocationId) -> Move {
        Move::new(
            MoveId::new(),
            ProductId::new(),
            3,
            source,
            destination,
            mt.id,
            group.id,
            None,
        )
    }

    fn transfer_for(mv: &Move, group: &Group) -> Transfer {
        Transfer {
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
            group: group.id,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn complete_policy_falls_back_to_baseline() {
        let mt = movement_type(MovementCategory::Outgoing, true);
        let sale = SaleOrder {
            id: SaleOrderId::new(),
            name: "SO1".to_string(),
            shipping_partner: PartnerId::new(),
            ship_policy: ShipPolicy::Complete,
        };
        assert_eq!(
            MatchStrategy::select(&mt, Some(&sale)),
            MatchStrategy::Baseline
        );
    }

    #[test]
    fn non_grouping_movement_type_falls_back_to_baseline() {
        let mt = movement_type(MovementCategory::Outgoing, false);
        assert_eq!(MatchStrategy::select(&mt, None), MatchStrategy::Baseline);
    }

    #[test]
    fn grouping_outgoing_selects_partner_carrier() {
        let mt = movement_type(MovementCategory::Outgoing, true);
        assert_eq!(MatchStrategy::select(&mt, None), MatchStrategy::PartnerCarrier);
    }

    #[test]
    fn partner_carrier_filter_matches_only_identical_carrier() {
        let mt = movement_type(MovementCategory::Outgoing, true);
        let carrier = CarrierId::new();
        let g = group(Some(PartnerId::new()), Some(carrier));
        let m = mv(&g, &mt, LocationId::new(), LocationId::new());
        let filter = MatchStrategy::PartnerCarrier
            .build_predicate(&m, &g, &mt, &MatchContext::default())
            .unwrap();

        let candidate = transfer_for(&m, &g);
        assert!(filter.matches(&candidate));

        let mut other_carrier = candidate.clone();
        other_carrier.carrier = Some(CarrierId::new());
        assert!(!filter.matches(&other_carrier));

        let mut no_carrier = candidate.clone();
        no_carrier.carrier = None;
        assert!(!filter.matches(&no_carrier));
    }

    #[test]
    fn non_outgoing_requires_a_carrier_less_transfer() {
        let mt = movement_type(MovementCategory::Internal, true);
        let g = group(Some(PartnerId::new()), Some(CarrierId::new()));
        let m = mv(&g, &mt, LocationId::new(), LocationId::new());
        let filter = MatchStrategy::PartnerCarrier
            .build_predicate(&m, &g, &mt, &MatchContext::default())
            .unwrap();
        assert_eq!(filter.carrier, CarrierConstraint::Exactly(None));
    }

    #[test]
    fn printed_and_done_transfers_never_match() {
        let mt = movement_type(MovementCategory::Outgoing, true);
        let g = group(Some(PartnerId::new()), None);
        let m = mv(&g, &mt, LocationId::new(), LocationId::new());
        let filter = MatchStrategy::PartnerCarrier
            .build_predicate(&m, &g, &mt, &MatchContext::default())
            .unwrap();

        let mut printed = transfer_for(&m, &g);
        printed.printed = true;
        assert!(!filter.matches(&printed));

        let mut done = transfer_for(&m, &g);
        done.state = TransferState::Done;
        assert!(!filter.matches(&done));

        let mut immediate = transfer_for(&m, &g);
        immediate.immediate = true;
        assert!(!filter.matches(&immediate));
    }

    #[test]
    fn backorder_context_excludes_the_current_transfer() {
        let mt = movement_type(MovementCategory::Outgoing, true);
        let g = group(Some(PartnerId::new()), None);
        let mut m = mv(&g, &mt, LocationId::new(), LocationId::new());
        let current = transfer_for(&m, &g);
        m.transfer = Some(current.id);

        let ctx = MatchContext { exclude_current_transfer: true };
        let filter = MatchStrategy::PartnerCarrier
            .build_predicate(&m, &g, &mt, &ctx)
            .unwrap();
        assert!(!filter.matches(&current));

        let other = transfer_for(&m, &g);
        assert!(filter.matches(&other));
    }

    #[test]
    fn missing_partner_is_a_precondition_error() {
        let mt = movement_type(MovementCategory::Outgoing, true);
        let g = group(None, None);
        let m = mv(&g, &mt, LocationId::new(), LocationId::new());
        let err = MatchStrategy::PartnerCarrier
            .build_predicate(&m, &g, &mt, &MatchContext::default())
            .unwrap_err();
        assert!(matches!(err, DomainError::Precondition(_)));
    }

    #[test]
    fn baseline_filter_keys_on_the_group() {
        let mt = movement_type(MovementCategory::Outgoing, false);
        let g = group(Some(PartnerId::new()), None);
        let m = mv(&g, &mt, LocationId::new(), LocationId::new());
        let filter = MatchStrategy::Baseline
            .build_predicate(&m, &g, &mt, &MatchContext::default())
            .unwrap();
        assert_eq!(filter.group, Some(g.id));
        assert_eq!(filter.partner, None);
        assert_eq!(filter.carrier, CarrierConstraint::Any);

        let candidate = transfer_for(&m, &g);
        assert!(filter.matches(&candidate));
        let mut other_group = candidate.clone();
        other_group.group = GroupId::new();
        assert!(!filter.matches(&other_group));
    }
}
