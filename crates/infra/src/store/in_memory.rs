use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use groupage_core::{
    DomainError, DomainResult, GroupId, LotId, MoveId, MovementTypeId, SaleOrderId, TransferId,
};
use groupage_stock::{
    Group, Lot, LotRepository, Move, MovementType, NewLot, SaleOrder, StockRepository, Transfer,
    TransferFilter,
};

#[derive(Debug, Default)]
struct StoreInner {
    moves: BTreeMap<MoveId, Move>,
    transfers: BTreeMap<TransferId, Transfer>,
    groups: BTreeMap<GroupId, Group>,
    sales: BTreeMap<SaleOrderId, SaleOrder>,
    movement_types: BTreeMap<MovementTypeId, MovementType>,
    lots: BTreeMap<LotId, Lot>,
    lot_seq: u64,
}

/// In-memory record store.
///
/// Intended for tests/dev. Every write takes the single store lock, which
/// also serializes search-then-assign sequences: the single-writer model the
/// domain services assume. Keys are UUIDv7, so iteration order over the
/// `BTreeMap`s is creation order.
#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    inner: RwLock<StoreInner>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DomainResult<RwLockReadGuard<'_, StoreInner>> {
        self.inner
            .read()
            .map_err(|_| DomainError::conflict("store lock poisoned"))
    }

    fn write(&self) -> DomainResult<RwLockWriteGuard<'_, StoreInner>> {
        self.inner
            .write()
            .map_err(|_| DomainError::conflict("store lock poisoned"))
    }

    // Seeding helpers for tests and record-lifecycle callers.

    pub fn insert_movement_type(&self, movement_type: MovementType) -> DomainResult<()> {
        self.write()?
            .movement_types
            .insert(movement_type.id, movement_type);
        Ok(())
    }

    pub fn insert_sale_order(&self, sale: SaleOrder) -> DomainResult<()> {
        self.write()?.sales.insert(sale.id, sale);
        Ok(())
    }

    pub fn insert_group(&self, group: Group) -> DomainResult<()> {
        self.write()?.groups.insert(group.id, group);
        Ok(())
    }

    pub fn insert_move(&self, mv: Move) -> DomainResult<()> {
        self.write()?.moves.insert(mv.id, mv);
        Ok(())
    }

    pub fn insert_transfer(&self, transfer: Transfer) -> DomainResult<()> {
        self.write()?.transfers.insert(transfer.id, transfer);
        Ok(())
    }

    /// Flip state/printed flags on a transfer, bypassing freeze checks.
    /// Test seam for putting a transfer into a frozen state.
    pub fn force_transfer_state(
        &self,
        id: TransferId,
        state: groupage_stock::TransferState,
        printed: bool,
    ) -> DomainResult<()> {
        let mut inner = self.write()?;
        let transfer = inner
            .transfers
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("transfer {id}")))?;
        transfer.state = state;
        transfer.printed = printed;
        Ok(())
    }

    pub fn lot(&self, id: LotId) -> DomainResult<Lot> {
        self.read()?
            .lots
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("lot {id}")))
    }
}

impl StockRepository for InMemoryStockStore {
    fn stock_move(&self, id: MoveId) -> DomainResult<Move> {
        self.read()?
            .moves
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("move {id}")))
    }

    fn transfer(&self, id: TransferId) -> DomainResult<Transfer> {
        self.read()?
            .transfers
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("transfer {id}")))
    }

    fn group(&self, id: GroupId) -> DomainResult<Group> {
        self.read()?
            .groups
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("group {id}")))
    }

    fn sale_order(&self, id: SaleOrderId) -> DomainResult<SaleOrder> {
        self.read()?
            .sales
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("sale order {id}")))
    }

    fn movement_type(&self, id: MovementTypeId) -> DomainResult<MovementType> {
        self.read()?
            .movement_types
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("movement type {id}")))
    }

    fn moves_of_transfer(&self, id: TransferId) -> DomainResult<Vec<Move>> {
        Ok(self
            .read()?
            .moves
            .values()
            .filter(|m| m.transfer == Some(id))
            .cloned()
            .collect())
    }

    fn transfers_in_group(&self, id: GroupId) -> DomainResult<Vec<Transfer>> {
        Ok(self
            .read()?
            .transfers
            .values()
            .filter(|t| t.group == id)
            .cloned()
            .collect())
    }

    fn find_transfer(&self, filter: &TransferFilter) -> DomainResult<Option<Transfer>> {
        // first match in creation order is the implementation-chosen tie-break
        Ok(self
            .read()?
            .transfers
            .values()
            .find(|t| filter.matches(t))
            .cloned())
    }

    fn create_transfer(&self, transfer: Transfer) -> DomainResult<TransferId> {
        let mut inner = self.write()?;
        let id = transfer.id;
        if inner.transfers.insert(id, transfer).is_some() {
            return Err(DomainError::conflict(format!("transfer {id} already exists")));
        }
        Ok(id)
    }

    fn create_group(&self, group: Group) -> DomainResult<GroupId> {
        let mut inner = self.write()?;
        let id = group.id;
        if inner.groups.insert(id, group).is_some() {
            return Err(DomainError::conflict(format!("group {id} already exists")));
        }
        Ok(id)
    }

    fn attach_move(&self, mv: MoveId, transfer: TransferId) -> DomainResult<()> {
        let mut guard = self.write()?;
        let inner = &mut *guard;
        let target = inner
            .transfers
            .get(&transfer)
            .ok_or_else(|| DomainError::not_found(format!("transfer {transfer}")))?;
        if target.is_frozen() {
            return Err(DomainError::invariant(format!(
                "transfer {transfer} is frozen; its move membership is fixed"
            )));
        }
        let record = inner
            .moves
            .get_mut(&mv)
            .ok_or_else(|| DomainError::not_found(format!("move {mv}")))?;
        record.transfer = Some(transfer);
        Ok(())
    }

    fn set_transfer_group(&self, transfer: TransferId, group: GroupId) -> DomainResult<()> {
        let mut guard = self.write()?;
        let inner = &mut *guard;
        if !inner.groups.contains_key(&group) {
            return Err(DomainError::not_found(format!("group {group}")));
        }
        let target = inner
            .transfers
            .get_mut(&transfer)
            .ok_or_else(|| DomainError::not_found(format!("transfer {transfer}")))?;
        if target.is_frozen() {
            return Err(DomainError::invariant(format!(
                "transfer {transfer} is frozen; its group is fixed"
            )));
        }
        target.group = group;
        // transfer-level reassignment: every move of the transfer at once
        for mv in inner.moves.values_mut().filter(|m| m.transfer == Some(transfer)) {
            mv.group = group;
        }
        Ok(())
    }

    fn append_origin(&self, transfer: TransferId, name: &str) -> DomainResult<()> {
        let mut inner = self.write()?;
        let target = inner
            .transfers
            .get_mut(&transfer)
            .ok_or_else(|| DomainError::not_found(format!("transfer {transfer}")))?;
        target.append_origin(name);
        Ok(())
    }
}

impl LotRepository for InMemoryStockStore {
    fn create_lots(&self, requests: Vec<NewLot>) -> DomainResult<Vec<Lot>> {
        let mut inner = self.write()?;
        let mut created = Vec::with_capacity(requests.len());
        for req in requests {
            inner.lot_seq += 1;
            let lot = Lot {
                id: LotId::new(),
                name: format!("LOT{:07}", inner.lot_seq),
                product: req.product,
                company: req.company,
                tracking: req.tracking,
            };
            inner.lots.insert(lot.id, lot.clone());
            created.push(lot);
        }
        Ok(created)
    }
}
