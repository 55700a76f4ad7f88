//! Origin-link notification adapters.

use std::sync::Mutex;

use tracing::info;

use groupage_core::{SaleOrderId, TransferId};
use groupage_stock::{OriginNotifier, SaleOrder, Transfer};

/// Notifier that only logs the association.
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl OriginNotifier for NoopNotifier {
    fn link_origin(&self, transfer: &Transfer, sale: &SaleOrder) {
        info!(transfer = %transfer.id, sale = %sale.name, "linked sale order to transfer");
    }
}

/// Notifier that records every association, for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    links: Mutex<Vec<(TransferId, SaleOrderId)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn links(&self) -> Vec<(TransferId, SaleOrderId)> {
        self.links.lock().expect("notifier lock poisoned").clone()
    }
}

impl OriginNotifier for RecordingNotifier {
    fn link_origin(&self, transfer: &Transfer, sale: &SaleOrder) {
        self.links
            .lock()
            .expect("notifier lock poisoned")
            .push((transfer.id, sale.id));
    }
}
