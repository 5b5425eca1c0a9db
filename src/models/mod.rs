//! # Data Models
//!
//! SeaORM entities for gyms, members and ledger entries, plus their API representations.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod gym;
pub mod ledger_entry;
pub mod member;

pub use gym::Entity as Gym;
pub use ledger_entry::Entity as LedgerEntry;
pub use member::Entity as Member;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "gymledger".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
