//! Storage Trait Definitions
//!
//! Abstract storage interfaces, one per persisted resource, plus the
//! polymorphic account lookup used by token verification. The production
//! implementation is SQLite; tests run against the same implementation
//! opened in memory.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::types::blood::BloodType;
use crate::types::donation::{Donation, DonationStatus};
use crate::types::hospital::Hospital;
use crate::types::notification::Notification;
use crate::types::request::{DonationRequest, RequestStatus, UrgencyLevel};
use crate::types::user::{Account, Admin, Role, User};
use crate::types::wilaya::Wilaya;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Filters for donation listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct DonationFilter {
    pub status: Option<DonationStatus>,
    pub donor_id: Option<Uuid>,
}

/// Filters for donation-request listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub urgency: Option<UrgencyLevel>,
}

/// User storage interface
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: &User) -> StorageResult<()>;

    async fn update_user(&self, user: &User) -> StorageResult<()>;

    async fn get_user(&self, id: Uuid) -> StorageResult<Option<User>>;

    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>>;

    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>>;

    async fn list_users(&self, offset: u64, limit: u32) -> StorageResult<Vec<User>>;

    async fn count_users(&self) -> StorageResult<u64>;

    async fn delete_user(&self, id: Uuid) -> StorageResult<bool>;

    /// All donors, optionally restricted to the given blood types.
    async fn get_donors(&self, blood_types: Option<&[BloodType]>) -> StorageResult<Vec<User>>;

    async fn count_donors(&self) -> StorageResult<u64>;

    /// Donor counts grouped by blood type.
    async fn donors_by_blood_type(&self) -> StorageResult<HashMap<String, u64>>;
}

/// Admin storage interface
#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn insert_admin(&self, admin: &Admin) -> StorageResult<()>;

    async fn get_admin(&self, id: Uuid) -> StorageResult<Option<Admin>>;

    async fn get_admin_by_email(&self, email: &str) -> StorageResult<Option<Admin>>;

    async fn get_admin_by_username(&self, username: &str) -> StorageResult<Option<Admin>>;

    async fn list_admins(&self, offset: u64, limit: u32) -> StorageResult<Vec<Admin>>;

    async fn count_admins(&self) -> StorageResult<u64>;

    async fn delete_admin(&self, id: Uuid) -> StorageResult<bool>;
}

/// Polymorphic account lookup.
///
/// Token verification resolves its subject through this single capability
/// instead of branching on role at every call site.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_account(&self, id: Uuid, role: Role) -> StorageResult<Option<Account>>;
}

/// Donation storage interface
#[async_trait]
pub trait DonationStore: Send + Sync {
    async fn insert_donation(&self, donation: &Donation) -> StorageResult<()>;

    async fn update_donation(&self, donation: &Donation) -> StorageResult<()>;

    async fn get_donation(&self, id: Uuid) -> StorageResult<Option<Donation>>;

    async fn list_donations(
        &self,
        filter: DonationFilter,
        offset: u64,
        limit: u32,
    ) -> StorageResult<Vec<Donation>>;

    async fn count_donations(&self, filter: DonationFilter) -> StorageResult<u64>;

    async fn donations_by_status(&self) -> StorageResult<HashMap<String, u64>>;
}

/// Donation request storage interface
#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn insert_request(&self, request: &DonationRequest) -> StorageResult<()>;

    async fn update_request(&self, request: &DonationRequest) -> StorageResult<()>;

    async fn get_request(&self, id: Uuid) -> StorageResult<Option<DonationRequest>>;

    async fn list_requests(
        &self,
        filter: RequestFilter,
        offset: u64,
        limit: u32,
    ) -> StorageResult<Vec<DonationRequest>>;

    async fn count_requests(&self, filter: RequestFilter) -> StorageResult<u64>;

    /// All active requests, for map display and expiry sweeps.
    async fn list_active_requests(&self) -> StorageResult<Vec<DonationRequest>>;

    async fn requests_by_status(&self) -> StorageResult<HashMap<String, u64>>;

    async fn requests_by_urgency(&self) -> StorageResult<HashMap<String, u64>>;
}

/// Hospital storage interface
#[async_trait]
pub trait HospitalStore: Send + Sync {
    async fn insert_hospital(&self, hospital: &Hospital) -> StorageResult<()>;

    async fn update_hospital(&self, hospital: &Hospital) -> StorageResult<()>;

    async fn get_hospital(&self, id: Uuid) -> StorageResult<Option<Hospital>>;

    async fn list_hospitals(&self, offset: u64, limit: u32) -> StorageResult<Vec<Hospital>>;

    /// Every hospital, for nearest-neighbor scans and map display.
    async fn all_hospitals(&self) -> StorageResult<Vec<Hospital>>;

    async fn count_hospitals(&self) -> StorageResult<u64>;

    async fn delete_hospital(&self, id: Uuid) -> StorageResult<bool>;
}

/// Wilaya storage interface
#[async_trait]
pub trait WilayaStore: Send + Sync {
    async fn insert_wilaya(&self, wilaya: &Wilaya) -> StorageResult<()>;

    async fn update_wilaya(&self, wilaya: &Wilaya) -> StorageResult<()>;

    async fn get_wilaya(&self, code: u32) -> StorageResult<Option<Wilaya>>;

    async fn list_wilayas(&self, offset: u64, limit: u32) -> StorageResult<Vec<Wilaya>>;

    async fn count_wilayas(&self) -> StorageResult<u64>;

    async fn delete_wilaya(&self, code: u32) -> StorageResult<bool>;
}

/// Notification storage interface
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert_notification(&self, notification: &Notification) -> StorageResult<()>;

    async fn update_notification(&self, notification: &Notification) -> StorageResult<()>;

    async fn get_notification(&self, id: Uuid) -> StorageResult<Option<Notification>>;

    /// Recipient's non-archived notifications, unread first, newest first.
    async fn list_notifications(
        &self,
        recipient_id: Uuid,
        offset: u64,
        limit: u32,
    ) -> StorageResult<Vec<Notification>>;

    async fn count_notifications(&self, recipient_id: Uuid) -> StorageResult<u64>;

    async fn unread_count(&self, recipient_id: Uuid) -> StorageResult<u64>;
}
