//! Storage Module
//!
//! Abstract storage traits and the SQLite implementation.

pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteStore;
pub use traits::{
    AccountStore, AdminStore, DonationFilter, DonationStore, HospitalStore, NotificationStore,
    RequestFilter, RequestStore, StorageError, StorageResult, UserStore, WilayaStore,
};
