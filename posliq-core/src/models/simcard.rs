use super::{Iccid, SimcardId};

/// The identity anchor shared by all three data sources.
///
/// Created on first sighting from any feed; never deleted; the ICCID is
/// immutable once created.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Simcard {
    /// Identifier of this simcard
    pub id: SimcardId,
    /// Canonical ICCID (unique)
    pub iccid: Iccid,
    /// Phone number, when any feed reported one
    pub phone: Option<String>,
}
