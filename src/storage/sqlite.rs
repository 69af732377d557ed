//! SQLite Persistent Storage
//!
//! Durable storage for every platform resource, pooled via r2d2. Embedded
//! sub-documents (donor responses, blood centers) are stored as JSON text
//! columns. Tests run against the same implementation opened in memory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

use super::traits::{
    AccountStore, AdminStore, DonationFilter, DonationStore, HospitalStore, NotificationStore,
    RequestFilter, RequestStore, StorageError, StorageResult, UserStore, WilayaStore,
};
use crate::types::blood::{BloodType, NeededBloodType};
use crate::types::donation::Donation;
use crate::types::geo::Coordinates;
use crate::types::hospital::Hospital;
use crate::types::notification::Notification;
use crate::types::request::{DonationRequest, DonorResponse};
use crate::types::user::{Account, Admin, Role, User};
use crate::types::wilaya::{BloodCenter, Wilaya};

/// SQLite-backed store with connection pooling
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStore {
    /// Create a new store with the given database path
    ///
    /// Creates the database file and runs migrations if needed.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, StorageError> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.as_ref().parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(10)
            .build(manager)
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations()?;

        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, StorageError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations()?;

        Ok(store)
    }

    /// Get a connection from the pool
    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, StorageError> {
        self.pool
            .get()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<(), StorageError> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                full_name TEXT NOT NULL,
                phone TEXT,
                blood_type TEXT NOT NULL DEFAULT 'unknown',
                is_donor INTEGER NOT NULL DEFAULT 0,
                lat REAL,
                lng REAL,
                wilaya_code INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS admins (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'admin',
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS donations (
                id TEXT PRIMARY KEY,
                donor_id TEXT NOT NULL,
                recipient_id TEXT,
                hospital_id TEXT NOT NULL,
                request_id TEXT,
                status TEXT NOT NULL DEFAULT 'requested',
                scheduled_at TEXT,
                completed_at TEXT,
                cancelled_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS requests (
                id TEXT PRIMARY KEY,
                requester_id TEXT NOT NULL,
                patient_name TEXT NOT NULL,
                needed_blood_type TEXT NOT NULL DEFAULT 'any',
                lat REAL NOT NULL,
                lng REAL NOT NULL,
                wilaya_code INTEGER,
                urgency TEXT NOT NULL DEFAULT 'medium',
                status TEXT NOT NULL DEFAULT 'active',
                responses TEXT NOT NULL DEFAULT '[]',
                expires_at TEXT,
                fulfilled_at TEXT,
                cancelled_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS hospitals (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                lat REAL NOT NULL,
                lng REAL NOT NULL,
                wilaya_code INTEGER NOT NULL,
                phone TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS wilayas (
                code INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                lat REAL NOT NULL,
                lng REAL NOT NULL,
                centers TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS notifications (
                id TEXT PRIMARY KEY,
                recipient_id TEXT NOT NULL,
                notification_type TEXT NOT NULL,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                priority TEXT NOT NULL DEFAULT 'normal',
                is_read INTEGER NOT NULL DEFAULT 0,
                read_at TEXT,
                is_archived INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_users_is_donor ON users(is_donor);
            CREATE INDEX IF NOT EXISTS idx_users_blood_type ON users(blood_type);
            CREATE INDEX IF NOT EXISTS idx_donations_status ON donations(status);
            CREATE INDEX IF NOT EXISTS idx_donations_donor_id ON donations(donor_id);
            CREATE INDEX IF NOT EXISTS idx_requests_status ON requests(status);
            CREATE INDEX IF NOT EXISTS idx_requests_urgency ON requests(urgency);
            CREATE INDEX IF NOT EXISTS idx_hospitals_wilaya_code ON hospitals(wilaya_code);
            CREATE INDEX IF NOT EXISTS idx_notifications_recipient_id ON notifications(recipient_id);
            "#,
        )
        .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(())
    }

    // Row conversion helpers

    fn parse_uuid(value: String) -> rusqlite::Result<Uuid> {
        value
            .parse()
            .map_err(|e: uuid::Error| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
    }

    fn parse_uuid_opt(value: Option<String>) -> rusqlite::Result<Option<Uuid>> {
        value.map(Self::parse_uuid).transpose()
    }

    fn parse_datetime(value: String) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
    }

    fn parse_datetime_opt(value: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
        value.map(Self::parse_datetime).transpose()
    }

    fn parse_json<T: serde::de::DeserializeOwned>(value: String) -> rusqlite::Result<T> {
        serde_json::from_str(&value)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
    }

    fn point_from(lat: Option<f64>, lng: Option<f64>) -> Option<Coordinates> {
        match (lat, lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        }
    }

    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        let blood_type: String = row.get("blood_type")?;

        Ok(User {
            id: Self::parse_uuid(row.get("id")?)?,
            username: row.get("username")?,
            email: row.get("email")?,
            password_hash: row.get("password_hash")?,
            full_name: row.get("full_name")?,
            phone: row.get("phone")?,
            blood_type: blood_type.parse().unwrap_or(BloodType::Unknown),
            is_donor: row.get("is_donor")?,
            location: Self::point_from(row.get("lat")?, row.get("lng")?),
            wilaya_code: row.get::<_, Option<i64>>("wilaya_code")?.map(|v| v as u32),
            created_at: Self::parse_datetime(row.get("created_at")?)?,
            updated_at: Self::parse_datetime(row.get("updated_at")?)?,
        })
    }

    fn row_to_admin(row: &rusqlite::Row) -> rusqlite::Result<Admin> {
        let role: String = row.get("role")?;

        Ok(Admin {
            id: Self::parse_uuid(row.get("id")?)?,
            username: row.get("username")?,
            email: row.get("email")?,
            password_hash: row.get("password_hash")?,
            role: role.parse().unwrap_or(Role::Admin),
            created_at: Self::parse_datetime(row.get("created_at")?)?,
        })
    }

    fn row_to_donation(row: &rusqlite::Row) -> rusqlite::Result<Donation> {
        let status: String = row.get("status")?;

        Ok(Donation {
            id: Self::parse_uuid(row.get("id")?)?,
            donor_id: Self::parse_uuid(row.get("donor_id")?)?,
            recipient_id: Self::parse_uuid_opt(row.get("recipient_id")?)?,
            hospital_id: Self::parse_uuid(row.get("hospital_id")?)?,
            request_id: Self::parse_uuid_opt(row.get("request_id")?)?,
            status: status.parse().unwrap_or_default(),
            scheduled_at: Self::parse_datetime_opt(row.get("scheduled_at")?)?,
            completed_at: Self::parse_datetime_opt(row.get("completed_at")?)?,
            cancelled_at: Self::parse_datetime_opt(row.get("cancelled_at")?)?,
            created_at: Self::parse_datetime(row.get("created_at")?)?,
            updated_at: Self::parse_datetime(row.get("updated_at")?)?,
        })
    }

    fn row_to_request(row: &rusqlite::Row) -> rusqlite::Result<DonationRequest> {
        let needed: String = row.get("needed_blood_type")?;
        let urgency: String = row.get("urgency")?;
        let status: String = row.get("status")?;
        let responses: Vec<DonorResponse> = Self::parse_json(row.get("responses")?)?;

        Ok(DonationRequest {
            id: Self::parse_uuid(row.get("id")?)?,
            requester_id: Self::parse_uuid(row.get("requester_id")?)?,
            patient_name: row.get("patient_name")?,
            needed_blood_type: NeededBloodType::parse(&needed),
            location: Coordinates::new(row.get("lat")?, row.get("lng")?),
            wilaya_code: row.get::<_, Option<i64>>("wilaya_code")?.map(|v| v as u32),
            urgency: urgency.parse().unwrap_or_default(),
            status: status.parse().unwrap_or_default(),
            responses,
            expires_at: Self::parse_datetime_opt(row.get("expires_at")?)?,
            fulfilled_at: Self::parse_datetime_opt(row.get("fulfilled_at")?)?,
            cancelled_at: Self::parse_datetime_opt(row.get("cancelled_at")?)?,
            created_at: Self::parse_datetime(row.get("created_at")?)?,
            updated_at: Self::parse_datetime(row.get("updated_at")?)?,
        })
    }

    fn row_to_hospital(row: &rusqlite::Row) -> rusqlite::Result<Hospital> {
        Ok(Hospital {
            id: Self::parse_uuid(row.get("id")?)?,
            name: row.get("name")?,
            location: Coordinates::new(row.get("lat")?, row.get("lng")?),
            wilaya_code: row.get::<_, i64>("wilaya_code")? as u32,
            phone: row.get("phone")?,
            created_at: Self::parse_datetime(row.get("created_at")?)?,
        })
    }

    fn row_to_wilaya(row: &rusqlite::Row) -> rusqlite::Result<Wilaya> {
        let centers: Vec<BloodCenter> = Self::parse_json(row.get("centers")?)?;

        Ok(Wilaya {
            code: row.get::<_, i64>("code")? as u32,
            name: row.get("name")?,
            location: Coordinates::new(row.get("lat")?, row.get("lng")?),
            centers,
            created_at: Self::parse_datetime(row.get("created_at")?)?,
        })
    }

    fn row_to_notification(row: &rusqlite::Row) -> rusqlite::Result<Notification> {
        let notification_type: String = row.get("notification_type")?;
        let priority: String = row.get("priority")?;

        Ok(Notification {
            id: Self::parse_uuid(row.get("id")?)?,
            recipient_id: Self::parse_uuid(row.get("recipient_id")?)?,
            notification_type: notification_type
                .parse()
                .unwrap_or(crate::types::notification::NotificationType::System),
            title: row.get("title")?,
            body: row.get("body")?,
            priority: priority.parse().unwrap_or_default(),
            read: row.get("is_read")?,
            read_at: Self::parse_datetime_opt(row.get("read_at")?)?,
            archived: row.get("is_archived")?,
            created_at: Self::parse_datetime(row.get("created_at")?)?,
        })
    }

    fn map_insert_err(e: rusqlite::Error, what: &str) -> StorageError {
        if let rusqlite::Error::SqliteFailure(ref err, _) = e {
            if err.extended_code == 1555 || err.extended_code == 2067 {
                return StorageError::Duplicate(what.to_string());
            }
        }
        StorageError::Database(e.to_string())
    }

    fn counts_grouped(&self, sql: &str) -> StorageResult<HashMap<String, u64>> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let mut counts = HashMap::new();
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
            .map_err(|e| StorageError::Database(e.to_string()))?;

        for row in rows {
            let (key, count) = row.map_err(|e| StorageError::Database(e.to_string()))?;
            counts.insert(key, count as u64);
        }

        Ok(counts)
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn insert_user(&self, user: &User) -> StorageResult<()> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO users (
                id, username, email, password_hash, full_name, phone,
                blood_type, is_donor, lat, lng, wilaya_code,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                user.id.to_string(),
                user.username,
                user.email,
                user.password_hash,
                user.full_name,
                user.phone,
                user.blood_type.to_string(),
                user.is_donor,
                user.location.map(|p| p.lat),
                user.location.map(|p| p.lng),
                user.wilaya_code.map(|v| v as i64),
                user.created_at.to_rfc3339(),
                user.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| Self::map_insert_err(e, &user.email))?;

        Ok(())
    }

    async fn update_user(&self, user: &User) -> StorageResult<()> {
        let conn = self.conn()?;

        let rows_affected = conn
            .execute(
                r#"
                UPDATE users SET
                    username = ?2, email = ?3, password_hash = ?4, full_name = ?5,
                    phone = ?6, blood_type = ?7, is_donor = ?8, lat = ?9, lng = ?10,
                    wilaya_code = ?11, updated_at = ?12
                WHERE id = ?1
                "#,
                params![
                    user.id.to_string(),
                    user.username,
                    user.email,
                    user.password_hash,
                    user.full_name,
                    user.phone,
                    user.blood_type.to_string(),
                    user.is_donor,
                    user.location.map(|p| p.lat),
                    user.location.map(|p| p.lng),
                    user.wilaya_code.map(|v| v as i64),
                    user.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| Self::map_insert_err(e, &user.email))?;

        if rows_affected == 0 {
            return Err(StorageError::NotFound(user.id.to_string()));
        }

        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> StorageResult<Option<User>> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT * FROM users WHERE id = ?1",
            params![id.to_string()],
            Self::row_to_user,
        )
        .optional()
        .map_err(|e| StorageError::Database(e.to_string()))
    }

    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT * FROM users WHERE email = ?1",
            params![email],
            Self::row_to_user,
        )
        .optional()
        .map_err(|e| StorageError::Database(e.to_string()))
    }

    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT * FROM users WHERE username = ?1",
            params![username],
            Self::row_to_user,
        )
        .optional()
        .map_err(|e| StorageError::Database(e.to_string()))
    }

    async fn list_users(&self, offset: u64, limit: u32) -> StorageResult<Vec<User>> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare("SELECT * FROM users ORDER BY created_at DESC LIMIT ?1 OFFSET ?2")
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let users = stmt
            .query_map(params![limit as i64, offset as i64], Self::row_to_user)
            .map_err(|e| StorageError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(users)
    }

    async fn count_users(&self) -> StorageResult<u64> {
        let conn = self.conn()?;

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(count as u64)
    }

    async fn delete_user(&self, id: Uuid) -> StorageResult<bool> {
        let conn = self.conn()?;

        let rows_affected = conn
            .execute("DELETE FROM users WHERE id = ?1", params![id.to_string()])
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(rows_affected > 0)
    }

    async fn get_donors(&self, blood_types: Option<&[BloodType]>) -> StorageResult<Vec<User>> {
        let conn = self.conn()?;

        let mut sql = "SELECT * FROM users WHERE is_donor = 1".to_string();
        let mut values: Vec<String> = Vec::new();

        if let Some(types) = blood_types {
            let placeholders = vec!["?"; types.len()].join(", ");
            sql.push_str(&format!(" AND blood_type IN ({})", placeholders));
            values.extend(types.iter().map(|t| t.to_string()));
        }

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let donors = stmt
            .query_map(params_from_iter(values.iter()), Self::row_to_user)
            .map_err(|e| StorageError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(donors)
    }

    async fn count_donors(&self) -> StorageResult<u64> {
        let conn = self.conn()?;

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users WHERE is_donor = 1", [], |row| {
                row.get(0)
            })
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(count as u64)
    }

    async fn donors_by_blood_type(&self) -> StorageResult<HashMap<String, u64>> {
        self.counts_grouped(
            "SELECT blood_type, COUNT(*) FROM users WHERE is_donor = 1 GROUP BY blood_type",
        )
    }
}

#[async_trait]
impl AdminStore for SqliteStore {
    async fn insert_admin(&self, admin: &Admin) -> StorageResult<()> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO admins (id, username, email, password_hash, role, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                admin.id.to_string(),
                admin.username,
                admin.email,
                admin.password_hash,
                admin.role.to_string(),
                admin.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| Self::map_insert_err(e, &admin.email))?;

        Ok(())
    }

    async fn get_admin(&self, id: Uuid) -> StorageResult<Option<Admin>> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT * FROM admins WHERE id = ?1",
            params![id.to_string()],
            Self::row_to_admin,
        )
        .optional()
        .map_err(|e| StorageError::Database(e.to_string()))
    }

    async fn get_admin_by_email(&self, email: &str) -> StorageResult<Option<Admin>> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT * FROM admins WHERE email = ?1",
            params![email],
            Self::row_to_admin,
        )
        .optional()
        .map_err(|e| StorageError::Database(e.to_string()))
    }

    async fn get_admin_by_username(&self, username: &str) -> StorageResult<Option<Admin>> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT * FROM admins WHERE username = ?1",
            params![username],
            Self::row_to_admin,
        )
        .optional()
        .map_err(|e| StorageError::Database(e.to_string()))
    }

    async fn list_admins(&self, offset: u64, limit: u32) -> StorageResult<Vec<Admin>> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare("SELECT * FROM admins ORDER BY created_at ASC LIMIT ?1 OFFSET ?2")
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let admins = stmt
            .query_map(params![limit as i64, offset as i64], Self::row_to_admin)
            .map_err(|e| StorageError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(admins)
    }

    async fn count_admins(&self) -> StorageResult<u64> {
        let conn = self.conn()?;

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM admins", [], |row| row.get(0))
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(count as u64)
    }

    async fn delete_admin(&self, id: Uuid) -> StorageResult<bool> {
        let conn = self.conn()?;

        let rows_affected = conn
            .execute("DELETE FROM admins WHERE id = ?1", params![id.to_string()])
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(rows_affected > 0)
    }
}

#[async_trait]
impl AccountStore for SqliteStore {
    async fn find_account(&self, id: Uuid, role: Role) -> StorageResult<Option<Account>> {
        match role {
            Role::User => Ok(self.get_user(id).await?.map(Account::User)),
            Role::Admin | Role::Superadmin => Ok(self.get_admin(id).await?.map(Account::Admin)),
        }
    }
}

#[async_trait]
impl DonationStore for SqliteStore {
    async fn insert_donation(&self, donation: &Donation) -> StorageResult<()> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO donations (
                id, donor_id, recipient_id, hospital_id, request_id, status,
                scheduled_at, completed_at, cancelled_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                donation.id.to_string(),
                donation.donor_id.to_string(),
                donation.recipient_id.map(|v| v.to_string()),
                donation.hospital_id.to_string(),
                donation.request_id.map(|v| v.to_string()),
                donation.status.to_string(),
                donation.scheduled_at.map(|t| t.to_rfc3339()),
                donation.completed_at.map(|t| t.to_rfc3339()),
                donation.cancelled_at.map(|t| t.to_rfc3339()),
                donation.created_at.to_rfc3339(),
                donation.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| Self::map_insert_err(e, &donation.id.to_string()))?;

        Ok(())
    }

    async fn update_donation(&self, donation: &Donation) -> StorageResult<()> {
        let conn = self.conn()?;

        let rows_affected = conn
            .execute(
                r#"
                UPDATE donations SET
                    donor_id = ?2, recipient_id = ?3, hospital_id = ?4, request_id = ?5,
                    status = ?6, scheduled_at = ?7, completed_at = ?8, cancelled_at = ?9,
                    updated_at = ?10
                WHERE id = ?1
                "#,
                params![
                    donation.id.to_string(),
                    donation.donor_id.to_string(),
                    donation.recipient_id.map(|v| v.to_string()),
                    donation.hospital_id.to_string(),
                    donation.request_id.map(|v| v.to_string()),
                    donation.status.to_string(),
                    donation.scheduled_at.map(|t| t.to_rfc3339()),
                    donation.completed_at.map(|t| t.to_rfc3339()),
                    donation.cancelled_at.map(|t| t.to_rfc3339()),
                    donation.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| StorageError::Database(e.to_string()))?;

        if rows_affected == 0 {
            return Err(StorageError::NotFound(donation.id.to_string()));
        }

        Ok(())
    }

    async fn get_donation(&self, id: Uuid) -> StorageResult<Option<Donation>> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT * FROM donations WHERE id = ?1",
            params![id.to_string()],
            Self::row_to_donation,
        )
        .optional()
        .map_err(|e| StorageError::Database(e.to_string()))
    }

    async fn list_donations(
        &self,
        filter: DonationFilter,
        offset: u64,
        limit: u32,
    ) -> StorageResult<Vec<Donation>> {
        let conn = self.conn()?;

        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(status) = filter.status {
            clauses.push("status = ?");
            values.push(status.to_string());
        }
        if let Some(donor_id) = filter.donor_id {
            clauses.push("donor_id = ?");
            values.push(donor_id.to_string());
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT * FROM donations{} ORDER BY created_at DESC LIMIT {} OFFSET {}",
            where_sql, limit, offset
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let donations = stmt
            .query_map(params_from_iter(values.iter()), Self::row_to_donation)
            .map_err(|e| StorageError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(donations)
    }

    async fn count_donations(&self, filter: DonationFilter) -> StorageResult<u64> {
        let conn = self.conn()?;

        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(status) = filter.status {
            clauses.push("status = ?");
            values.push(status.to_string());
        }
        if let Some(donor_id) = filter.donor_id {
            clauses.push("donor_id = ?");
            values.push(donor_id.to_string());
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let sql = format!("SELECT COUNT(*) FROM donations{}", where_sql);

        let count: i64 = conn
            .query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(count as u64)
    }

    async fn donations_by_status(&self) -> StorageResult<HashMap<String, u64>> {
        self.counts_grouped("SELECT status, COUNT(*) FROM donations GROUP BY status")
    }
}

#[async_trait]
impl RequestStore for SqliteStore {
    async fn insert_request(&self, request: &DonationRequest) -> StorageResult<()> {
        let conn = self.conn()?;

        let responses = serde_json::to_string(&request.responses)
            .map_err(|e| StorageError::InvalidData(e.to_string()))?;

        conn.execute(
            r#"
            INSERT INTO requests (
                id, requester_id, patient_name, needed_blood_type, lat, lng,
                wilaya_code, urgency, status, responses, expires_at,
                fulfilled_at, cancelled_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                request.id.to_string(),
                request.requester_id.to_string(),
                request.patient_name,
                request.needed_blood_type.to_string(),
                request.location.lat,
                request.location.lng,
                request.wilaya_code.map(|v| v as i64),
                request.urgency.to_string(),
                request.status.to_string(),
                responses,
                request.expires_at.map(|t| t.to_rfc3339()),
                request.fulfilled_at.map(|t| t.to_rfc3339()),
                request.cancelled_at.map(|t| t.to_rfc3339()),
                request.created_at.to_rfc3339(),
                request.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| Self::map_insert_err(e, &request.id.to_string()))?;

        Ok(())
    }

    async fn update_request(&self, request: &DonationRequest) -> StorageResult<()> {
        let conn = self.conn()?;

        let responses = serde_json::to_string(&request.responses)
            .map_err(|e| StorageError::InvalidData(e.to_string()))?;

        let rows_affected = conn
            .execute(
                r#"
                UPDATE requests SET
                    requester_id = ?2, patient_name = ?3, needed_blood_type = ?4,
                    lat = ?5, lng = ?6, wilaya_code = ?7, urgency = ?8, status = ?9,
                    responses = ?10, expires_at = ?11, fulfilled_at = ?12,
                    cancelled_at = ?13, updated_at = ?14
                WHERE id = ?1
                "#,
                params![
                    request.id.to_string(),
                    request.requester_id.to_string(),
                    request.patient_name,
                    request.needed_blood_type.to_string(),
                    request.location.lat,
                    request.location.lng,
                    request.wilaya_code.map(|v| v as i64),
                    request.urgency.to_string(),
                    request.status.to_string(),
                    responses,
                    request.expires_at.map(|t| t.to_rfc3339()),
                    request.fulfilled_at.map(|t| t.to_rfc3339()),
                    request.cancelled_at.map(|t| t.to_rfc3339()),
                    request.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| StorageError::Database(e.to_string()))?;

        if rows_affected == 0 {
            return Err(StorageError::NotFound(request.id.to_string()));
        }

        Ok(())
    }

    async fn get_request(&self, id: Uuid) -> StorageResult<Option<DonationRequest>> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT * FROM requests WHERE id = ?1",
            params![id.to_string()],
            Self::row_to_request,
        )
        .optional()
        .map_err(|e| StorageError::Database(e.to_string()))
    }

    async fn list_requests(
        &self,
        filter: RequestFilter,
        offset: u64,
        limit: u32,
    ) -> StorageResult<Vec<DonationRequest>> {
        let conn = self.conn()?;

        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(status) = filter.status {
            clauses.push("status = ?");
            values.push(status.to_string());
        }
        if let Some(urgency) = filter.urgency {
            clauses.push("urgency = ?");
            values.push(urgency.to_string());
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT * FROM requests{} ORDER BY created_at DESC LIMIT {} OFFSET {}",
            where_sql, limit, offset
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let requests = stmt
            .query_map(params_from_iter(values.iter()), Self::row_to_request)
            .map_err(|e| StorageError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(requests)
    }

    async fn count_requests(&self, filter: RequestFilter) -> StorageResult<u64> {
        let conn = self.conn()?;

        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(status) = filter.status {
            clauses.push("status = ?");
            values.push(status.to_string());
        }
        if let Some(urgency) = filter.urgency {
            clauses.push("urgency = ?");
            values.push(urgency.to_string());
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let sql = format!("SELECT COUNT(*) FROM requests{}", where_sql);

        let count: i64 = conn
            .query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(count as u64)
    }

    async fn list_active_requests(&self) -> StorageResult<Vec<DonationRequest>> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare("SELECT * FROM requests WHERE status = 'active' ORDER BY created_at DESC")
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let requests = stmt
            .query_map([], Self::row_to_request)
            .map_err(|e| StorageError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(requests)
    }

    async fn requests_by_status(&self) -> StorageResult<HashMap<String, u64>> {
        self.counts_grouped("SELECT status, COUNT(*) FROM requests GROUP BY status")
    }

    async fn requests_by_urgency(&self) -> StorageResult<HashMap<String, u64>> {
        self.counts_grouped("SELECT urgency, COUNT(*) FROM requests GROUP BY urgency")
    }
}

#[async_trait]
impl HospitalStore for SqliteStore {
    async fn insert_hospital(&self, hospital: &Hospital) -> StorageResult<()> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO hospitals (id, name, lat, lng, wilaya_code, phone, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                hospital.id.to_string(),
                hospital.name,
                hospital.location.lat,
                hospital.location.lng,
                hospital.wilaya_code as i64,
                hospital.phone,
                hospital.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| Self::map_insert_err(e, &hospital.name))?;

        Ok(())
    }

    async fn update_hospital(&self, hospital: &Hospital) -> StorageResult<()> {
        let conn = self.conn()?;

        let rows_affected = conn
            .execute(
                r#"
                UPDATE hospitals SET name = ?2, lat = ?3, lng = ?4, wilaya_code = ?5, phone = ?6
                WHERE id = ?1
                "#,
                params![
                    hospital.id.to_string(),
                    hospital.name,
                    hospital.location.lat,
                    hospital.location.lng,
                    hospital.wilaya_code as i64,
                    hospital.phone,
                ],
            )
            .map_err(|e| StorageError::Database(e.to_string()))?;

        if rows_affected == 0 {
            return Err(StorageError::NotFound(hospital.id.to_string()));
        }

        Ok(())
    }

    async fn get_hospital(&self, id: Uuid) -> StorageResult<Option<Hospital>> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT * FROM hospitals WHERE id = ?1",
            params![id.to_string()],
            Self::row_to_hospital,
        )
        .optional()
        .map_err(|e| StorageError::Database(e.to_string()))
    }

    async fn list_hospitals(&self, offset: u64, limit: u32) -> StorageResult<Vec<Hospital>> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare("SELECT * FROM hospitals ORDER BY name ASC LIMIT ?1 OFFSET ?2")
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let hospitals = stmt
            .query_map(params![limit as i64, offset as i64], Self::row_to_hospital)
            .map_err(|e| StorageError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(hospitals)
    }

    async fn all_hospitals(&self) -> StorageResult<Vec<Hospital>> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare("SELECT * FROM hospitals ORDER BY name ASC")
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let hospitals = stmt
            .query_map([], Self::row_to_hospital)
            .map_err(|e| StorageError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(hospitals)
    }

    async fn count_hospitals(&self) -> StorageResult<u64> {
        let conn = self.conn()?;

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM hospitals", [], |row| row.get(0))
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(count as u64)
    }

    async fn delete_hospital(&self, id: Uuid) -> StorageResult<bool> {
        let conn = self.conn()?;

        let rows_affected = conn
            .execute("DELETE FROM hospitals WHERE id = ?1", params![id.to_string()])
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(rows_affected > 0)
    }
}

#[async_trait]
impl WilayaStore for SqliteStore {
    async fn insert_wilaya(&self, wilaya: &Wilaya) -> StorageResult<()> {
        let conn = self.conn()?;

        let centers = serde_json::to_string(&wilaya.centers)
            .map_err(|e| StorageError::InvalidData(e.to_string()))?;

        conn.execute(
            r#"
            INSERT INTO wilayas (code, name, lat, lng, centers, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                wilaya.code as i64,
                wilaya.name,
                wilaya.location.lat,
                wilaya.location.lng,
                centers,
                wilaya.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| Self::map_insert_err(e, &wilaya.name))?;

        Ok(())
    }

    async fn update_wilaya(&self, wilaya: &Wilaya) -> StorageResult<()> {
        let conn = self.conn()?;

        let centers = serde_json::to_string(&wilaya.centers)
            .map_err(|e| StorageError::InvalidData(e.to_string()))?;

        let rows_affected = conn
            .execute(
                "UPDATE wilayas SET name = ?2, lat = ?3, lng = ?4, centers = ?5 WHERE code = ?1",
                params![
                    wilaya.code as i64,
                    wilaya.name,
                    wilaya.location.lat,
                    wilaya.location.lng,
                    centers,
                ],
            )
            .map_err(|e| StorageError::Database(e.to_string()))?;

        if rows_affected == 0 {
            return Err(StorageError::NotFound(wilaya.code.to_string()));
        }

        Ok(())
    }

    async fn get_wilaya(&self, code: u32) -> StorageResult<Option<Wilaya>> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT * FROM wilayas WHERE code = ?1",
            params![code as i64],
            Self::row_to_wilaya,
        )
        .optional()
        .map_err(|e| StorageError::Database(e.to_string()))
    }

    async fn list_wilayas(&self, offset: u64, limit: u32) -> StorageResult<Vec<Wilaya>> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare("SELECT * FROM wilayas ORDER BY code ASC LIMIT ?1 OFFSET ?2")
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let wilayas = stmt
            .query_map(params![limit as i64, offset as i64], Self::row_to_wilaya)
            .map_err(|e| StorageError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(wilayas)
    }

    async fn count_wilayas(&self) -> StorageResult<u64> {
        let conn = self.conn()?;

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM wilayas", [], |row| row.get(0))
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(count as u64)
    }

    async fn delete_wilaya(&self, code: u32) -> StorageResult<bool> {
        let conn = self.conn()?;

        let rows_affected = conn
            .execute("DELETE FROM wilayas WHERE code = ?1", params![code as i64])
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(rows_affected > 0)
    }
}

#[async_trait]
impl NotificationStore for SqliteStore {
    async fn insert_notification(&self, notification: &Notification) -> StorageResult<()> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO notifications (
                id, recipient_id, notification_type, title, body, priority,
                is_read, read_at, is_archived, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                notification.id.to_string(),
                notification.recipient_id.to_string(),
                notification.notification_type.to_string(),
                notification.title,
                notification.body,
                notification.priority.to_string(),
                notification.read,
                notification.read_at.map(|t| t.to_rfc3339()),
                notification.archived,
                notification.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| Self::map_insert_err(e, &notification.id.to_string()))?;

        Ok(())
    }

    async fn update_notification(&self, notification: &Notification) -> StorageResult<()> {
        let conn = self.conn()?;

        let rows_affected = conn
            .execute(
                r#"
                UPDATE notifications SET is_read = ?2, read_at = ?3, is_archived = ?4
                WHERE id = ?1
                "#,
                params![
                    notification.id.to_string(),
                    notification.read,
                    notification.read_at.map(|t| t.to_rfc3339()),
                    notification.archived,
                ],
            )
            .map_err(|e| StorageError::Database(e.to_string()))?;

        if rows_affected == 0 {
            return Err(StorageError::NotFound(notification.id.to_string()));
        }

        Ok(())
    }

    async fn get_notification(&self, id: Uuid) -> StorageResult<Option<Notification>> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT * FROM notifications WHERE id = ?1",
            params![id.to_string()],
            Self::row_to_notification,
        )
        .optional()
        .map_err(|e| StorageError::Database(e.to_string()))
    }

    async fn list_notifications(
        &self,
        recipient_id: Uuid,
        offset: u64,
        limit: u32,
    ) -> StorageResult<Vec<Notification>> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(
                r#"
                SELECT * FROM notifications
                WHERE recipient_id = ?1 AND is_archived = 0
                ORDER BY is_read ASC, created_at DESC
                LIMIT ?2 OFFSET ?3
                "#,
            )
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let notifications = stmt
            .query_map(
                params![recipient_id.to_string(), limit as i64, offset as i64],
                Self::row_to_notification,
            )
            .map_err(|e| StorageError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(notifications)
    }

    async fn count_notifications(&self, recipient_id: Uuid) -> StorageResult<u64> {
        let conn = self.conn()?;

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1 AND is_archived = 0",
                params![recipient_id.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(count as u64)
    }

    async fn unread_count(&self, recipient_id: Uuid) -> StorageResult<u64> {
        let conn = self.conn()?;

        let count: i64 = conn
            .query_row(
                r#"
                SELECT COUNT(*) FROM notifications
                WHERE recipient_id = ?1 AND is_read = 0 AND is_archived = 0
                "#,
                params![recipient_id.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::donation::DonationStatus;
    use crate::types::notification::{NotificationType, Priority};
    use crate::types::request::{RequestStatus, ResponseStatus, UrgencyLevel};

    fn test_user(username: &str) -> User {
        User::new(
            username.to_string(),
            format!("{}@example.com", username),
            "hash".to_string(),
            username.to_string(),
        )
    }

    #[tokio::test]
    async fn test_insert_and_get_user() {
        let store = SqliteStore::in_memory().unwrap();
        let user = test_user("amine");

        store.insert_user(&user).await.unwrap();

        let retrieved = store.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(retrieved.username, "amine");
        assert_eq!(retrieved.email, "amine@example.com");
        assert_eq!(retrieved.blood_type, BloodType::Unknown);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = SqliteStore::in_memory().unwrap();

        let first = test_user("amine");
        let mut second = test_user("karim");
        second.email = first.email.clone();

        store.insert_user(&first).await.unwrap();
        let result = store.insert_user(&second).await;

        assert!(matches!(result, Err(StorageError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_user_location_round_trip() {
        let store = SqliteStore::in_memory().unwrap();

        let mut user = test_user("amine");
        user.location = Some(Coordinates::new(36.7538, 3.0588));
        user.blood_type = BloodType::ONeg;
        user.is_donor = true;

        store.insert_user(&user).await.unwrap();

        let retrieved = store.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(retrieved.location, Some(Coordinates::new(36.7538, 3.0588)));
        assert_eq!(retrieved.blood_type, BloodType::ONeg);
        assert!(retrieved.is_donor);
    }

    #[tokio::test]
    async fn test_get_donors_filters_by_blood_type() {
        let store = SqliteStore::in_memory().unwrap();

        let mut o_neg = test_user("oneg");
        o_neg.is_donor = true;
        o_neg.blood_type = BloodType::ONeg;

        let mut a_pos = test_user("apos");
        a_pos.is_donor = true;
        a_pos.blood_type = BloodType::APos;

        let mut not_donor = test_user("bystander");
        not_donor.blood_type = BloodType::ONeg;

        store.insert_user(&o_neg).await.unwrap();
        store.insert_user(&a_pos).await.unwrap();
        store.insert_user(&not_donor).await.unwrap();

        let all = store.get_donors(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let only_o_neg = store.get_donors(Some(&[BloodType::ONeg])).await.unwrap();
        assert_eq!(only_o_neg.len(), 1);
        assert_eq!(only_o_neg[0].username, "oneg");
    }

    #[tokio::test]
    async fn test_find_account_resolves_both_roles() {
        let store = SqliteStore::in_memory().unwrap();

        let user = test_user("amine");
        let admin = Admin::new(
            "root".to_string(),
            "root@example.com".to_string(),
            "hash".to_string(),
            Role::Superadmin,
        );

        store.insert_user(&user).await.unwrap();
        store.insert_admin(&admin).await.unwrap();

        let found = store.find_account(user.id, Role::User).await.unwrap().unwrap();
        assert!(matches!(found, Account::User(_)));

        let found = store
            .find_account(admin.id, Role::Superadmin)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(found, Account::Admin(_)));

        // User id does not resolve under an admin role
        let missing = store.find_account(user.id, Role::Admin).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_donation_update_persists_transition() {
        let store = SqliteStore::in_memory().unwrap();

        let mut donation = Donation::new(Uuid::new_v4(), Uuid::new_v4());
        store.insert_donation(&donation).await.unwrap();

        donation.mark_completed();
        store.update_donation(&donation).await.unwrap();

        let retrieved = store.get_donation(donation.id).await.unwrap().unwrap();
        assert_eq!(retrieved.status, DonationStatus::Completed);
        assert!(retrieved.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_list_donations_filtered() {
        let store = SqliteStore::in_memory().unwrap();
        let donor = Uuid::new_v4();

        let mine = Donation::new(donor, Uuid::new_v4());
        let mut completed = Donation::new(Uuid::new_v4(), Uuid::new_v4());
        completed.mark_completed();

        store.insert_donation(&mine).await.unwrap();
        store.insert_donation(&completed).await.unwrap();

        let filter = DonationFilter {
            donor_id: Some(donor),
            ..Default::default()
        };
        let by_donor = store.list_donations(filter, 0, 10).await.unwrap();
        assert_eq!(by_donor.len(), 1);
        assert_eq!(store.count_donations(filter).await.unwrap(), 1);

        let filter = DonationFilter {
            status: Some(DonationStatus::Completed),
            ..Default::default()
        };
        let by_status = store.list_donations(filter, 0, 10).await.unwrap();
        assert_eq!(by_status.len(), 1);
    }

    #[tokio::test]
    async fn test_request_responses_survive_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        let donor = Uuid::new_v4();

        let mut request = DonationRequest::new(
            Uuid::new_v4(),
            "patient".to_string(),
            NeededBloodType::Specific(BloodType::ONeg),
            Coordinates::new(36.7538, 3.0588),
            UrgencyLevel::Critical,
        );
        store.insert_request(&request).await.unwrap();

        request.record_response(donor, ResponseStatus::Confirmed);
        store.update_request(&request).await.unwrap();

        let retrieved = store.get_request(request.id).await.unwrap().unwrap();
        assert_eq!(retrieved.responses.len(), 1);
        assert_eq!(retrieved.responses[0].donor_id, donor);
        assert_eq!(retrieved.responses[0].status, ResponseStatus::Confirmed);
        assert_eq!(retrieved.urgency, UrgencyLevel::Critical);
    }

    #[tokio::test]
    async fn test_active_requests_listing() {
        let store = SqliteStore::in_memory().unwrap();

        let active = DonationRequest::new(
            Uuid::new_v4(),
            "patient".to_string(),
            NeededBloodType::Any,
            Coordinates::new(36.0, 3.0),
            UrgencyLevel::Medium,
        );
        let mut cancelled = DonationRequest::new(
            Uuid::new_v4(),
            "other".to_string(),
            NeededBloodType::Any,
            Coordinates::new(35.0, 1.0),
            UrgencyLevel::Low,
        );
        cancelled.mark_cancelled();

        store.insert_request(&active).await.unwrap();
        store.insert_request(&cancelled).await.unwrap();

        let listed = store.list_active_requests().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, RequestStatus::Active);
    }

    #[tokio::test]
    async fn test_wilaya_centers_embedded() {
        let store = SqliteStore::in_memory().unwrap();

        let mut wilaya = Wilaya::new(16, "Alger".to_string(), Coordinates::new(36.7538, 3.0588));
        store.insert_wilaya(&wilaya).await.unwrap();

        wilaya.centers.push(BloodCenter {
            name: "CTS Mustapha".to_string(),
            address: "Place du 1er Mai".to_string(),
            phone: None,
            location: None,
        });
        store.update_wilaya(&wilaya).await.unwrap();

        let retrieved = store.get_wilaya(16).await.unwrap().unwrap();
        assert_eq!(retrieved.centers.len(), 1);
        assert_eq!(retrieved.centers[0].name, "CTS Mustapha");
    }

    #[tokio::test]
    async fn test_duplicate_wilaya_code_rejected() {
        let store = SqliteStore::in_memory().unwrap();

        let first = Wilaya::new(31, "Oran".to_string(), Coordinates::new(35.6969, -0.6492));
        let second = Wilaya::new(31, "Oran bis".to_string(), Coordinates::new(35.7, -0.65));

        store.insert_wilaya(&first).await.unwrap();
        assert!(matches!(
            store.insert_wilaya(&second).await,
            Err(StorageError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_notifications_unread_first_and_counted() {
        let store = SqliteStore::in_memory().unwrap();
        let recipient = Uuid::new_v4();

        let mut read = Notification::new(
            recipient,
            NotificationType::DonationScheduled,
            "seen".to_string(),
            "body".to_string(),
            Priority::Normal,
        );
        read.mark_read();

        let unread = Notification::new(
            recipient,
            NotificationType::RequestResponse,
            "new".to_string(),
            "body".to_string(),
            Priority::High,
        );

        store.insert_notification(&read).await.unwrap();
        store.insert_notification(&unread).await.unwrap();

        let listed = store.list_notifications(recipient, 0, 10).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "new");

        assert_eq!(store.unread_count(recipient).await.unwrap(), 1);
        assert_eq!(store.count_notifications(recipient).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_archived_notifications_hidden() {
        let store = SqliteStore::in_memory().unwrap();
        let recipient = Uuid::new_v4();

        let mut notification = Notification::new(
            recipient,
            NotificationType::System,
            "old".to_string(),
            "body".to_string(),
            Priority::Low,
        );
        store.insert_notification(&notification).await.unwrap();

        notification.mark_archived();
        store.update_notification(&notification).await.unwrap();

        assert!(store.list_notifications(recipient, 0, 10).await.unwrap().is_empty());
        assert_eq!(store.count_notifications(recipient).await.unwrap(), 0);
    }
}
