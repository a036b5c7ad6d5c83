use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Staff;

/// StaffRepository
///
/// Read access to the staff directory. The session extractor resolves a token
/// subject to a staff record (and therefore a role) through this trait.
#[async_trait]
pub trait StaffRepository: Send + Sync {
    async fn get_staff(&self, id: Uuid) -> Option<Staff>;
}

/// Shared handle used in the application state.
pub type StaffRepositoryState = Arc<dyn StaffRepository>;

/// PostgresStaffRepository
///
/// Directory backed by the `staff(id, email, role)` table.
pub struct PostgresStaffRepository {
    pool: PgPool,
}

impl PostgresStaffRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StaffRepository for PostgresStaffRepository {
    async fn get_staff(&self, id: Uuid) -> Option<Staff> {
        // A failed query is treated like a missing record: the visitor is
        // sent to sign in rather than shown an error page.
        sqlx::query_as::<_, Staff>("SELECT id, email, role FROM staff WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, staff_id = %id, "staff lookup failed");
                None
            })
    }
}

/// InMemoryStaffRepository
///
/// Directory held in process memory, used for local runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryStaffRepository {
    staff: RwLock<HashMap<Uuid, Staff>>,
}

impl InMemoryStaffRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds one staff member per common role with fixed ids
    /// (`...0001` ADMIN, `...0002` STAFF, `...0003` VIEWER).
    pub fn with_demo_staff() -> Self {
        let repo = Self::new();
        for (n, email, role) in [
            (1, "admin@portal.local", "ADMIN"),
            (2, "staff@portal.local", "STAFF"),
            (3, "viewer@portal.local", "VIEWER"),
        ] {
            repo.insert(Staff {
                id: Uuid::from_u128(n),
                email: email.to_string(),
                role: role.to_string(),
            });
        }
        repo
    }

    pub fn insert(&self, staff: Staff) {
        let mut guard = match self.staff.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.insert(staff.id, staff);
    }
}

#[async_trait]
impl StaffRepository for InMemoryStaffRepository {
    async fn get_staff(&self, id: Uuid) -> Option<Staff> {
        let guard = match self.staff.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.get(&id).cloned()
    }
}
