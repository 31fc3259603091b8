//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and the session port, and remain testable
//! against in-memory adapters.

use std::sync::Arc;

use crate::domain::ports::SessionStore;
use crate::domain::{
    AccountService, DirectoryService, PaymentService, SchedulingService,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<AccountService>,
    pub scheduling: Arc<SchedulingService>,
    pub payments: Arc<PaymentService>,
    pub directory: Arc<DirectoryService>,
    pub sessions: Arc<dyn SessionStore>,
}

impl HttpState {
    pub fn new(
        accounts: Arc<AccountService>,
        scheduling: Arc<SchedulingService>,
        payments: Arc<PaymentService>,
        directory: Arc<DirectoryService>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            accounts,
            scheduling,
            payments,
            directory,
            sessions,
        }
    }
}
