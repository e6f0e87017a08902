/// A canonical SIM identity.
///
/// The operator's uploads carry ICCIDs in several encodings: padded with
/// whitespace, broken up by separators, and usually suffixed with a single
/// `F` filler/check character. All three feeds must agree on one canonical
/// form, so the cleaning rule is fixed and deterministic:
///
/// 1. strip whitespace, hyphens and dots;
/// 2. uppercase, then drop one trailing `F` if present;
/// 3. the remainder must be non-empty and all digits.
///
/// Parsing the same raw value twice always yields the same canonical ICCID,
/// which is what makes simcard resolution idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Iccid(String);

/// The raw value did not contain a usable ICCID. Callers must reject the
/// source row without creating any record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unusable ICCID: {0:?}")]
pub struct InvalidIdentity(pub String);

impl Iccid {
    /// Clean a raw ICCID into its canonical form.
    pub fn parse(raw: &str) -> Result<Self, InvalidIdentity> {
        let mut cleaned: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '.')
            .collect::<String>()
            .to_ascii_uppercase();

        if cleaned.ends_with('F') {
            cleaned.pop();
        }

        if cleaned.is_empty() || !cleaned.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidIdentity(raw.to_owned()));
        }

        Ok(Self(cleaned))
    }

    /// The canonical digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap an already-canonical value, e.g. read back from storage.
    ///
    /// The value is trusted to have been produced by [`Iccid::parse`].
    pub fn from_canonical(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Iccid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_filler_and_separators() {
        let a = Iccid::parse("8934 0712-3456.7890123F").unwrap();
        assert_eq!(a.as_str(), "8934071234567890123");
    }

    #[test]
    fn equivalent_raw_inputs_are_equal() {
        let a = Iccid::parse("8934071234567890123f").unwrap();
        let b = Iccid::parse(" 8934071234567890123 ").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert!(Iccid::parse("").is_err());
        assert!(Iccid::parse("F").is_err());
        assert!(Iccid::parse("not-an-iccid").is_err());
    }
}
