use crate::models::{Iccid, Simcard};

/// Repository interface for simcard identity resolution.
///
/// All three feeds funnel through this port so that an ICCID seen in the
/// operator report, the recharge feed and the sales conditions resolves to
/// the same record. Cleaning the raw value is the caller's job via
/// [`Iccid::parse`]; a row whose ICCID does not parse must be rejected
/// before ever reaching this port.
pub trait IdentityRepository: super::Repository {
    /// Find or create the simcard for a canonical ICCID.
    ///
    /// Idempotent: resolving the same ICCID twice yields the same simcard.
    /// A phone number is recorded on first sighting and filled in later if
    /// the simcard was first seen without one; it never overwrites an
    /// existing number.
    fn resolve_simcard(
        &self,
        iccid: &Iccid,
        phone: Option<&str>,
    ) -> Result<Simcard, Self::Error>;

    /// Look up a simcard without creating it.
    fn find_simcard(&self, iccid: &Iccid) -> Result<Option<Simcard>, Self::Error>;
}
