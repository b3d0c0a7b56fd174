use sqlx::{postgres::PgPoolOptions, PgPool};

/// Creates the `customers` table when it does not exist yet.
const CREATE_CUSTOMERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS customers (
    customer_id   VARCHAR(5)   PRIMARY KEY,
    company_name  VARCHAR(40)  NOT NULL,
    contact_name  VARCHAR(30),
    contact_title VARCHAR(30),
    address       VARCHAR(60),
    city          VARCHAR(15),
    region        VARCHAR(15),
    postal_code   VARCHAR(10),
    country       VARCHAR(15),
    phone         VARCHAR(24),
    fax           VARCHAR(24),
    contact_email VARCHAR(100),
    created_at    TIMESTAMPTZ  NOT NULL,
    updated_at    TIMESTAMPTZ  NOT NULL,
    CONSTRAINT customers_timestamps_ordered CHECK (created_at <= updated_at)
)
"#;

pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Bootstraps the schema. Safe to run on every start.
    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        sqlx::query(CREATE_CUSTOMERS_TABLE)
            .execute(&self.pool)
            .await?;
        tracing::info!("Customer schema ready");
        Ok(())
    }
}
