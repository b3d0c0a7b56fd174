use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::db_storage::{duplicate, not_found, CustomerStore};
use crate::errors::AppError;
use crate::models::{Customer, CustomerChanges, CustomerSearch};

/// In-process customer store.
///
/// Records live in a `BTreeMap`, so iteration (and therefore search
/// results) is ordered by id. Used for local runs and tests.
#[derive(Default)]
pub struct MemoryCustomerStore {
    customers: RwLock<BTreeMap<String, Customer>>,
}

impl MemoryCustomerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.customers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.customers.read().await.is_empty()
    }
}

#[async_trait]
impl CustomerStore for MemoryCustomerStore {
    async fn insert(&self, customer: &Customer) -> Result<Customer, AppError> {
        let mut customers = self.customers.write().await;
        match customers.entry(customer.customer_id.clone()) {
            Entry::Occupied(_) => Err(duplicate(&customer.customer_id)),
            Entry::Vacant(slot) => Ok(slot.insert(customer.clone()).clone()),
        }
    }

    async fn find_by_id(&self, customer_id: &str) -> Result<Customer, AppError> {
        self.customers
            .read()
            .await
            .get(customer_id)
            .cloned()
            .ok_or_else(|| not_found(customer_id))
    }

    async fn search(&self, filter: &CustomerSearch) -> Result<Vec<Customer>, AppError> {
        Ok(self
            .customers
            .read()
            .await
            .values()
            .filter(|customer| filter.matches(customer))
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        customer_id: &str,
        changes: &CustomerChanges,
        now: DateTime<Utc>,
    ) -> Result<Customer, AppError> {
        let mut customers = self.customers.write().await;
        let customer = customers
            .get_mut(customer_id)
            .ok_or_else(|| not_found(customer_id))?;
        customer.apply(changes, now);
        Ok(customer.clone())
    }

    async fn delete(&self, customer_id: &str) -> Result<(), AppError> {
        self.customers
            .write()
            .await
            .remove(customer_id)
            .map(|_| ())
            .ok_or_else(|| not_found(customer_id))
    }
}
