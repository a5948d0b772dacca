//! Contract mutation handler chain.

use std::sync::Arc;

use parking_lot::RwLock;

use courier_contracts::{Contract, ContractHandler, HandlerError};

/// Ordered chain of contract mutation hooks.
///
/// Handlers run in registration order and each receives the previous
/// handler's output. A failing handler aborts the chain; there is no retry
/// and no skip.
#[derive(Default)]
pub(crate) struct HandlerChain {
    handlers: RwLock<Vec<Arc<dyn ContractHandler>>>,
}

impl HandlerChain {
    /// Adds a handler, rejecting duplicate names.
    pub(crate) fn add(&self, handler: Arc<dyn ContractHandler>) -> bool {
        let mut handlers = self.handlers.write();
        if handlers.iter().any(|existing| existing.name() == handler.name()) {
            return false;
        }
        handlers.push(handler);
        true
    }

    /// Removes the handler registered under a name.
    pub(crate) fn remove(&self, name: &str) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|handler| handler.name() != name);
        handlers.len() < before
    }

    /// Threads the contract through every handler in order.
    pub(crate) fn apply(&self, contract: Contract) -> Result<Contract, HandlerError> {
        let handlers = self.handlers.read().clone();
        let mut contract = contract;
        for handler in handlers {
            contract = handler.update_contract(contract)?;
        }
        Ok(contract)
    }
}
