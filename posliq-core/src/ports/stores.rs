use crate::models::{Store, StoreId};

/// Repository interface for point-of-sale stores.
pub trait StoreRepository: super::Repository {
    /// Register a store under its idpos code.
    fn create_store(&self, idpos: &str, name: &str) -> Result<Store, Self::Error>;

    /// Fetch a store by id.
    fn get_store(&self, store_id: StoreId) -> Result<Option<Store>, Self::Error>;

    /// Fetch a store by its idpos code.
    fn find_store_by_idpos(&self, idpos: &str) -> Result<Option<Store>, Self::Error>;

    /// Activate or deactivate a store. Returns false if the store does not
    /// exist. Inactive stores keep their balance and history but cannot be
    /// liquidated.
    fn set_store_active(&self, store_id: StoreId, active: bool) -> Result<bool, Self::Error>;
}
