//! Hayat Backend - Blood Donation Coordination Platform
//!
//! REST backend for coordinating blood donations across Algerian wilayas:
//! user and admin accounts, hospital and wilaya directories, donation and
//! donation-request workflows, notifications, and aggregate statistics,
//! backed by SQLite.
//!
//! Control flow per request: token verification (where the route requires
//! it) → handler → storage calls → JSON response. No background workers,
//! no event bus; expiry of stale requests happens lazily on read.

pub mod api;
pub mod auth;
pub mod common;
pub mod config;
pub mod logging;
pub mod matching;
pub mod storage;
pub mod types;

// Re-exports: API surface
pub use api::{create_router, start_server, ApiError, AppState, SharedAppState};

// Re-exports: Auth
pub use auth::{hash_password, verify_password, AuthError, Claims, TokenService};

// Re-exports: Infrastructure
pub use common::{AppError, Result};
pub use config::{AppConfig, ConfigError, Environment};

// Re-exports: Matching
pub use matching::{compatible_donors, haversine_km, rank_donors, RankedDonor, RankedDonors};

// Re-exports: Storage
pub use storage::{SqliteStore, StorageError};
