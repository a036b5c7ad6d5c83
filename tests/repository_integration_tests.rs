use portal_gate::{
    models::Staff,
    repository::{InMemoryStaffRepository, PostgresStaffRepository, StaffRepository},
};
use sqlx::PgPool;
use uuid::Uuid;

// --- Test Context and Setup ---

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresStaffRepository {
        PostgresStaffRepository::new(self.pool.clone())
    }
}

async fn create_test_staff(pool: &PgPool, role: &str) -> Staff {
    let id = Uuid::new_v4();
    sqlx::query_as::<_, Staff>(
        "INSERT INTO staff (id, email, role) VALUES ($1, $2, $3) RETURNING id, email, role",
    )
    .bind(id)
    .bind(format!("{}@test.com", id))
    .bind(role)
    .fetch_one(pool)
    .await
    .expect("Failed to insert test staff")
}

// --- Postgres ---

#[tokio::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_postgres_get_staff() {
    let ctx = DbTestContext::setup().await;
    let created = create_test_staff(&ctx.pool, "VIEWER").await;

    let found = ctx.repository().get_staff(created.id).await;

    assert_eq!(found, Some(created));
}

#[tokio::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_postgres_get_missing_staff() {
    let ctx = DbTestContext::setup().await;

    let found = ctx.repository().get_staff(Uuid::new_v4()).await;

    assert!(found.is_none());
}

// --- In-memory ---

#[tokio::test]
async fn test_in_memory_insert_and_get() {
    let repo = InMemoryStaffRepository::new();
    let staff = Staff {
        id: Uuid::new_v4(),
        email: "a@b.c".to_string(),
        role: "STAFF".to_string(),
    };
    repo.insert(staff.clone());

    assert_eq!(repo.get_staff(staff.id).await, Some(staff));
    assert_eq!(repo.get_staff(Uuid::new_v4()).await, None);
}

#[tokio::test]
async fn test_in_memory_insert_replaces_role() {
    let repo = InMemoryStaffRepository::new();
    let id = Uuid::new_v4();
    for role in ["VIEWER", "ADMIN"] {
        repo.insert(Staff {
            id,
            email: "a@b.c".to_string(),
            role: role.to_string(),
        });
    }

    assert_eq!(repo.get_staff(id).await.map(|s| s.role).as_deref(), Some("ADMIN"));
}

#[tokio::test]
async fn test_demo_staff_seed() {
    let repo = InMemoryStaffRepository::with_demo_staff();
    let roles: Vec<String> = seeded_roles(&repo).await;
    assert_eq!(roles, ["ADMIN", "STAFF", "VIEWER"]);
}

async fn seeded_roles(repo: &InMemoryStaffRepository) -> Vec<String> {
    let mut roles = Vec::new();
    for n in 1..=3 {
        if let Some(staff) = repo.get_staff(Uuid::from_u128(n)).await {
            roles.push(staff.role);
        }
    }
    roles
}
