use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::errors::{AppError, ResultExt};
use crate::models::{Customer, CustomerChanges, CustomerSearch};

/// Persistence of customer records keyed by `customer_id`.
///
/// Absent ids surface as `AppError::NotFound` and an existing id on insert
/// as `AppError::DuplicateId`.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Persists a new record unless the id is already taken.
    async fn insert(&self, customer: &Customer) -> Result<Customer, AppError>;

    async fn find_by_id(&self, customer_id: &str) -> Result<Customer, AppError>;

    /// Records matching every supplied filter, ordered by id.
    async fn search(&self, filter: &CustomerSearch) -> Result<Vec<Customer>, AppError>;

    /// Applies the supplied fields and refreshes `updated_at`.
    async fn update(
        &self,
        customer_id: &str,
        changes: &CustomerChanges,
        now: DateTime<Utc>,
    ) -> Result<Customer, AppError>;

    /// Permanently removes the record.
    async fn delete(&self, customer_id: &str) -> Result<(), AppError>;
}

pub(crate) fn not_found(customer_id: &str) -> AppError {
    AppError::NotFound(format!("Customer with id {} not found", customer_id))
}

pub(crate) fn duplicate(customer_id: &str) -> AppError {
    AppError::DuplicateId(format!("Customer with id {} already exists", customer_id))
}

/// PostgreSQL-backed customer store.
pub struct PgCustomerStore {
    pool: PgPool,
}

impl PgCustomerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerStore for PgCustomerStore {
    async fn insert(&self, customer: &Customer) -> Result<Customer, AppError> {
        // The primary key makes insert-if-absent atomic across requests
        let inserted = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (
                customer_id, company_name, contact_name, contact_title, address,
                city, region, postal_code, country, phone, fax, contact_email,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (customer_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(&customer.customer_id)
        .bind(&customer.company_name)
        .bind(&customer.contact_name)
        .bind(&customer.contact_title)
        .bind(&customer.address)
        .bind(&customer.city)
        .bind(&customer.region)
        .bind(&customer.postal_code)
        .bind(&customer.country)
        .bind(&customer.phone)
        .bind(&customer.fax)
        .bind(&customer.contact_email)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to insert customer {}", customer.customer_id))?;

        inserted.ok_or_else(|| duplicate(&customer.customer_id))
    }

    async fn find_by_id(&self, customer_id: &str) -> Result<Customer, AppError> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE customer_id = $1")
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load customer")?
            .ok_or_else(|| not_found(customer_id))
    }

    async fn search(&self, filter: &CustomerSearch) -> Result<Vec<Customer>, AppError> {
        // strpos keeps `%` and `_` literal, unlike LIKE
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE ($1::text IS NULL OR strpos(lower(company_name), lower($1)) > 0)
              AND ($2::text IS NULL OR strpos(lower(contact_name), lower($2)) > 0)
              AND ($3::text IS NULL OR strpos(lower(contact_email), lower($3)) > 0)
              AND ($4::text IS NULL OR strpos(lower(phone), lower($4)) > 0)
            ORDER BY customer_id COLLATE "C"
            "#,
        )
        .bind(filter.company_name.as_deref())
        .bind(filter.contact_name.as_deref())
        .bind(filter.contact_email.as_deref())
        .bind(filter.phone.as_deref())
        .fetch_all(&self.pool)
        .await
        .context("Failed to search customers")?;

        Ok(customers)
    }

    async fn update(
        &self,
        customer_id: &str,
        changes: &CustomerChanges,
        now: DateTime<Utc>,
    ) -> Result<Customer, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to open update transaction")?;

        let mut customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE customer_id = $1 FOR UPDATE",
        )
        .bind(customer_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to lock customer for update")?
        .ok_or_else(|| not_found(customer_id))?;

        customer.apply(changes, now);

        let updated = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET company_name = $2,
                contact_name = $3,
                contact_title = $4,
                address = $5,
                city = $6,
                region = $7,
                postal_code = $8,
                country = $9,
                phone = $10,
                fax = $11,
                contact_email = $12,
                updated_at = $13
            WHERE customer_id = $1
            RETURNING *
            "#,
        )
        .bind(&customer.customer_id)
        .bind(&customer.company_name)
        .bind(&customer.contact_name)
        .bind(&customer.contact_title)
        .bind(&customer.address)
        .bind(&customer.city)
        .bind(&customer.region)
        .bind(&customer.postal_code)
        .bind(&customer.country)
        .bind(&customer.phone)
        .bind(&customer.fax)
        .bind(&customer.contact_email)
        .bind(customer.updated_at)
        .fetch_one(&mut *tx)
        .await
        .with_context(|| format!("Failed to update customer {}", customer_id))?;

        tx.commit().await.context("Failed to commit update")?;

        Ok(updated)
    }

    async fn delete(&self, customer_id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM customers WHERE customer_id = $1")
            .bind(customer_id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete customer {}", customer_id))?;

        if result.rows_affected() == 0 {
            return Err(not_found(customer_id));
        }

        Ok(())
    }
}
