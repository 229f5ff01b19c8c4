//! Repository trait definitions
//!
//! The trait uses RPITIT (Return Position Impl Trait In Traits), so
//! implementations can write plain `async fn` without `async_trait`.

use std::future::Future;

use super::error::RepositoryError;
use super::pagination::Pagination;
use crate::condition::Condition;
use crate::query::FindQuery;

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Base repository trait for CRUD operations
///
/// # Type Parameters
///
/// - `Id`: The identifier type for the entity
/// - `Entity`: The full entity type returned from queries
/// - `Create`: The data transfer object for creating new entities
/// - `Update`: The data transfer object for updating existing entities
pub trait Repository<Id, Entity, Create, Update>: Send + Sync {
    /// Find an entity by its unique identifier
    ///
    /// Returns `Ok(None)` if there is no such entity.
    fn find_by_id(&self, id: &Id) -> impl Future<Output = RepositoryResult<Option<Entity>>> + Send;

    /// Find the entities matching `query`, within the `pagination` window
    ///
    /// Columns left out of the query's projection come back with their
    /// default values.
    fn find_all(
        &self,
        query: &FindQuery,
        pagination: Pagination,
    ) -> impl Future<Output = RepositoryResult<Vec<Entity>>> + Send;

    /// Count the entities matching `condition`, ignoring any window
    fn count(&self, condition: &Condition) -> impl Future<Output = RepositoryResult<u64>> + Send;

    /// Create a new entity, returning it with its generated identifier
    fn create(&self, data: Create) -> impl Future<Output = RepositoryResult<Entity>> + Send;

    /// Update an existing entity
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` with `NotFound` kind if the entity doesn't exist.
    fn update(
        &self,
        id: &Id,
        data: Update,
    ) -> impl Future<Output = RepositoryResult<Entity>> + Send;

    /// Delete an entity by its identifier
    ///
    /// Returns `true` if the entity was deleted, `false` if it didn't exist.
    fn delete(&self, id: &Id) -> impl Future<Output = RepositoryResult<bool>> + Send;
}
