//! Batch lot/serial assignment for move lines.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use groupage_core::{
    CompanyId, DomainError, DomainResult, Entity, LotId, MoveId, MoveLineId, ProductId,
};

use crate::repository::LotRepository;

/// Per-product tracking discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tracking {
    None,
    Lot,
    Serial,
}

/// The unit lots/serials are assigned to: one detail line of a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveLine {
    pub id: MoveLineId,
    pub move_id: MoveId,
    pub product: ProductId,
    pub company: CompanyId,
    /// Tracking kind of the line's product, resolved at line creation.
    pub tracking: Tracking,
    pub lot: Option<LotId>,
}

impl Entity for MoveLine {
    type Id = MoveLineId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Creation request for one identifier, keyed by product and owning company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLot {
    pub product: ProductId,
    pub company: CompanyId,
    pub tracking: Tracking,
}

impl NewLot {
    pub fn for_line(line: &MoveLine) -> Self {
        Self {
            product: line.product,
            company: line.company,
            tracking: line.tracking,
        }
    }
}

/// A created lot/serial traceability token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    pub id: LotId,
    pub name: String,
    pub product: ProductId,
    pub company: CompanyId,
    pub tracking: Tracking,
}

impl Entity for Lot {
    type Id = LotId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// What to do when a serial-tracked product needs more identifiers than the
/// batch produced for it (two lines of the same serial product deplete the
/// product's slot after the first assignment).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SerialExhaustionPolicy {
    /// Surface an `IdentifierConflict`; the caller decides how to recover.
    StrictFail,
    /// Create one replacement identifier on demand for the starved line.
    #[default]
    LazyReplenish,
}

/// Assigns lot/serial identifiers to a batch of move lines with one batch
/// creation call rather than one call per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LotBatchAssigner {
    policy: SerialExhaustionPolicy,
}

impl LotBatchAssigner {
    pub fn new(policy: SerialExhaustionPolicy) -> Self {
        Self { policy }
    }

    /// Create identifiers for `lines` and assign them.
    ///
    /// One creation request per line, deliberately not deduplicated: the
    /// duplicates for repeated products are pruned when the product map is
    /// built (last created wins; none has been consumed yet, so any of them
    /// is interchangeable). A lot identifier is then shared by every line of
    /// the same lot-tracked product, while a serial identifier is consumed by
    /// one line and removed from the pool.
    pub fn assign(&self, repo: &dyn LotRepository, lines: &mut [MoveLine]) -> DomainResult<()> {
        if lines.is_empty() {
            return Err(DomainError::validation(
                "lot assignment needs at least one move line",
            ));
        }

        let requests: Vec<NewLot> = lines.iter().map(NewLot::for_line).collect();
        let created = repo.create_lots(requests)?;
        debug!(lines = lines.len(), lots = created.len(), "created lot batch");

        let mut by_product: HashMap<ProductId, Lot> = HashMap::with_capacity(created.len());
        for lot in created {
            by_product.insert(lot.product, lot);
        }

        for line in lines.iter_mut() {
            let lot = match by_product.remove(&line.product) {
                Some(lot) => lot,
                None => self.replenish(repo, line)?,
            };
            line.lot = Some(lot.id);
            // a serial is consumed by a single line; lots stay shareable
            if lot.tracking != Tracking::Serial {
                by_product.insert(lot.product, lot);
            }
        }
        Ok(())
    }

    fn replenish(&self, repo: &dyn LotRepository, line: &MoveLine) -> DomainResult<Lot> {
        match self.policy {
            SerialExhaustionPolicy::StrictFail => Err(DomainError::identifier_conflict(format!(
                "serial pool exhausted for product {}",
                line.product
            ))),
            SerialExhaustionPolicy::LazyReplenish => {
                let mut created = repo.create_lots(vec![NewLot::for_line(line)])?;
                created.pop().ok_or_else(|| {
                    DomainError::conflict("lot repository returned an empty batch")
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Counts batch calls and hands out sequentially named lots.
    struct FakeLotRepo {
        calls: Mutex<Vec<usize>>,
        seq: Mutex<u64>,
    }

    impl FakeLotRepo {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                seq: Mutex::new(0),
            }
        }

        fn batch_sizes(&self) -> Vec<usize> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl LotRepository for FakeLotRepo {
        fn create_lots(&self, requests: Vec<NewLot>) -> DomainResult<Vec<Lot>> {
            self.calls.lock().unwrap().push(requests.len());
            let mut seq = self.seq.lock().unwrap();
            Ok(requests
                .into_iter()
                .map(|req| {
                    *seq += 1;
                    Lot {
                        id: LotId::new(),
                        name: format!("LOT{:07}", *seq),
                        product: req.product,
                        company: req.company,
                        tracking: req.tracking,
                    }
                })
                .collect())
        }
    }

    fn line(product: ProductId, tracking: Tracking) -> MoveLine {
        MoveLine {
            id: MoveLineId::new(),
            move_id: MoveId::new(),
            product,
            company: CompanyId::new(),
            tracking,
            lot: None,
        }
    }

    #[test]
    fn empty_batch_is_rejected() {
        let repo = FakeLotRepo::new();
        let err = LotBatchAssigner::default()
            .assign(&repo, &mut [])
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn lot_tracked_lines_share_one_identifier_per_product() {
        let repo = FakeLotRepo::new();
        let (p1, p2) = (ProductId::new(), ProductId::new());
        let mut lines = vec![
            line(p1, Tracking::Lot),
            line(p1, Tracking::Lot),
            line(p2, Tracking::Lot),
            line(p1, Tracking::Lot),
        ];
        LotBatchAssigner::default().assign(&repo, &mut lines).unwrap();

        // one single batch call covering every line
        assert_eq!(repo.batch_sizes(), vec![4]);
        for l in &lines {
            assert!(l.lot.is_some());
        }
        // all p1 lines share one lot, distinct from p2's
        assert_eq!(lines[0].lot, lines[1].lot);
        assert_eq!(lines[0].lot, lines[3].lot);
        assert_ne!(lines[0].lot, lines[2].lot);
    }

    #[test]
    fn serial_lines_each_consume_a_distinct_identifier() {
        let repo = FakeLotRepo::new();
        let product = ProductId::new();
        let mut lines = vec![line(product, Tracking::Serial), line(product, Tracking::Serial)];
        LotBatchAssigner::new(SerialExhaustionPolicy::LazyReplenish)
            .assign(&repo, &mut lines)
            .unwrap();

        assert_ne!(lines[0].lot, lines[1].lot);
        // the first batch plus one lazy replenishment
        assert_eq!(repo.batch_sizes(), vec![2, 1]);
    }

    #[test]
    fn strict_policy_fails_on_serial_pool_exhaustion() {
        let repo = FakeLotRepo::new();
        let product = ProductId::new();
        let mut lines = vec![line(product, Tracking::Serial), line(product, Tracking::Serial)];
        let err = LotBatchAssigner::new(SerialExhaustionPolicy::StrictFail)
            .assign(&repo, &mut lines)
            .unwrap_err();
        assert!(matches!(err, DomainError::IdentifierConflict(_)));
    }

    #[test]
    fn mixed_batch_assigns_matching_products() {
        let repo = FakeLotRepo::new();
        let (serial_p, lot_p) = (ProductId::new(), ProductId::new());
        let mut lines = vec![
            line(lot_p, Tracking::Lot),
            line(serial_p, Tracking::Serial),
            line(lot_p, Tracking::Lot),
        ];
        LotBatchAssigner::default().assign(&repo, &mut lines).unwrap();
        assert_eq!(lines[0].lot, lines[2].lot);
        assert!(lines[1].lot.is_some());
        assert_ne!(lines[0].lot, lines[1].lot);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 128,
                ..ProptestConfig::default()
            })]

            /// Property: for N lines over K distinct lot-tracked products,
            /// exactly one batch of N requests is issued, and every line's
            /// assigned lot exists and is shared exactly by the lines of its
            /// product.
            #[test]
            fn lot_tracked_batches_create_one_identifier_per_product(
                layout in prop::collection::vec(0usize..5, 1..20)
            ) {
                let products: Vec<ProductId> = (0..5).map(|_| ProductId::new()).collect();
                let mut lines: Vec<MoveLine> = layout
                    .iter()
                    .map(|&i| line(products[i], Tracking::Lot))
                    .collect();

                let repo = FakeLotRepo::new();
                LotBatchAssigner::default().assign(&repo, &mut lines).unwrap();

                prop_assert_eq!(repo.batch_sizes(), vec![lines.len()]);
                for (i, a) in lines.iter().enumerate() {
                    prop_assert!(a.lot.is_some());
                    for b in lines.iter().skip(i + 1) {
                        if a.product == b.product {
                            prop_assert_eq!(a.lot, b.lot);
                        } else {
                            prop_assert_ne!(a.lot, b.lot);
                        }
                    }
                }
            }

            /// Property: serial lines never share an identifier, whatever the
            /// interleaving of products.
            #[test]
            fn serial_lines_never_share_identifiers(
                layout in prop::collection::vec(0usize..3, 1..12)
            ) {
                let products: Vec<ProductId> = (0..3).map(|_| ProductId::new()).collect();
                let mut lines: Vec<MoveLine> = layout
                    .iter()
                    .map(|&i| line(products[i], Tracking::Serial))
                    .collect();

                let repo = FakeLotRepo::new();
                LotBatchAssigner::new(SerialExhaustionPolicy::LazyReplenish)
                    .assign(&repo, &mut lines)
                    .unwrap();

                let mut seen = std::collections::HashSet::new();
                for l in &lines {
                    prop_assert!(seen.insert(l.lot.unwrap()));
                }
            }
        }
    }
}
