use std::sync::Arc;

use crate::db_storage::{not_found, CustomerStore};
use crate::errors::AppError;
use crate::models::{current_timestamp, Customer, CustomerChanges, CustomerSearch, NewCustomer};
use crate::validation::{validate_changes, validate_new_customer};

/// Customer operations: validation, timestamping and store calls.
#[derive(Clone)]
pub struct CustomerService {
    store: Arc<dyn CustomerStore>,
}

impl CustomerService {
    pub fn new(store: Arc<dyn CustomerStore>) -> Self {
        Self { store }
    }

    /// Validates and persists a new customer.
    ///
    /// # Errors
    ///
    /// * `AppError::Validation` when any field breaks its rules.
    /// * `AppError::DuplicateId` when the id is already taken.
    pub async fn create_customer(&self, request: NewCustomer) -> Result<Customer, AppError> {
        validate_new_customer(&request).map_err(AppError::Validation)?;

        let customer = Customer::from_new(request, current_timestamp());
        let created = self.store.insert(&customer).await?;

        tracing::info!("Created customer {}", created.customer_id);
        Ok(created)
    }

    pub async fn get_customer_by_id(&self, customer_id: &str) -> Result<Customer, AppError> {
        self.store.find_by_id(storable_id(customer_id)?).await
    }

    /// Returns every customer matching the filter; blank parameters are
    /// ignored. An empty result is not an error.
    pub async fn search_customers(
        &self,
        filter: CustomerSearch,
    ) -> Result<Vec<Customer>, AppError> {
        let filter = filter.normalized();
        if !filter.can_match() {
            return Ok(Vec::new());
        }
        let customers = self.store.search(&filter).await?;

        tracing::debug!("Search {:?} matched {} customers", filter, customers.len());
        Ok(customers)
    }

    /// Applies a partial update.
    ///
    /// The payload is validated before the record is looked up, so an
    /// invalid body is rejected even for an unknown id.
    pub async fn update_customer(
        &self,
        customer_id: &str,
        changes: CustomerChanges,
    ) -> Result<Customer, AppError> {
        validate_changes(&changes).map_err(AppError::Validation)?;

        let updated = self
            .store
            .update(storable_id(customer_id)?, &changes, current_timestamp())
            .await?;

        tracing::info!("Updated customer {}", customer_id);
        Ok(updated)
    }

    /// Hard-deletes a customer.
    pub async fn delete_customer(&self, customer_id: &str) -> Result<(), AppError> {
        self.store.delete(storable_id(customer_id)?).await?;

        tracing::info!("Deleted customer {}", customer_id);
        Ok(())
    }
}

/// Ids holding NUL were never accepted on create, so they cannot exist.
fn storable_id(customer_id: &str) -> Result<&str, AppError> {
    if customer_id.contains('\0') {
        return Err(not_found(customer_id));
    }
    Ok(customer_id)
}
