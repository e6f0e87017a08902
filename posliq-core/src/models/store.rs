use super::StoreId;

/// A retail point of sale.
///
/// Owns liquidations and receives balance movements. Inactive stores cannot
/// be liquidated.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Store {
    /// Identifier of this store
    pub id: StoreId,
    /// Point-of-sale code assigned by the operator (unique)
    pub idpos: String,
    /// Display name
    pub name: String,
    /// Whether the store may receive new liquidations
    pub active: bool,
}
