use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use moka::future::Cache;

use crate::model::employee::Employee;
use crate::model::role::Role;
use crate::store::{EmployeeDirectory, StoreError};

/// Directory decorator caching lookups by id. Misses are not cached so a
/// newly created employee can mark in right away.
pub struct CachedDirectory {
    inner: Arc<dyn EmployeeDirectory>,
    by_id: Cache<u64, Employee>,
}

impl CachedDirectory {
    pub fn new(inner: Arc<dyn EmployeeDirectory>, capacity: u64, ttl: Duration) -> Self {
        Self {
            inner,
            by_id: Cache::builder()
                .max_capacity(capacity) // tune based on memory
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Batch insert employees into the cache
    async fn batch_insert(&self, employees: Vec<Employee>) {
        let futures: Vec<_> = employees
            .into_iter()
            .map(|e| self.by_id.insert(e.id, e))
            .collect();

        // Await all insertions concurrently
        futures::future::join_all(futures).await;
    }

    /// Preload every non-admin identity.
    pub async fn warmup(&self) -> Result<()> {
        let mut total = 0usize;
        for role in [Role::Employee, Role::Hr] {
            let employees = self.inner.list_by_role(role).await?;
            total += employees.len();
            self.batch_insert(employees).await;
        }

        log::info!("Employee cache warmup complete: {} identities", total);
        Ok(())
    }
}

#[async_trait]
impl EmployeeDirectory for CachedDirectory {
    async fn find_by_id(&self, id: u64) -> Result<Option<Employee>, StoreError> {
        if let Some(hit) = self.by_id.get(&id).await {
            return Ok(Some(hit));
        }

        let found = self.inner.find_by_id(id).await?;
        if let Some(employee) = &found {
            self.by_id.insert(id, employee.clone()).await;
        }
        Ok(found)
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<Employee>, StoreError> {
        self.inner.list_by_role(role).await
    }

    async fn find_by_emails(&self, emails: &[String]) -> Result<Vec<Employee>, StoreError> {
        self.inner.find_by_emails(emails).await
    }
}
