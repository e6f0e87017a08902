/// A billing period: one calendar month of operator activity.
///
/// Periods are the unit of consolidation and liquidation. They order
/// chronologically and render as `YYYY-MM`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct Period {
    /// Calendar year
    pub year: i32,
    /// Calendar month, 1..=12
    pub month: u8,
}

/// Error for an unparseable or out-of-range period.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid period: {0}")]
pub struct InvalidPeriod(pub String);

impl Period {
    /// Construct a period, validating the month range.
    pub fn new(year: i32, month: u8) -> Result<Self, InvalidPeriod> {
        if !(1..=12).contains(&month) {
            return Err(InvalidPeriod(format!("month {month} out of range")));
        }
        Ok(Self { year, month })
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for Period {
    type Err = InvalidPeriod;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (year, month) = value
            .split_once('-')
            .ok_or_else(|| InvalidPeriod(value.to_owned()))?;
        let year = year
            .parse::<i32>()
            .map_err(|_| InvalidPeriod(value.to_owned()))?;
        let month = month
            .parse::<u8>()
            .map_err(|_| InvalidPeriod(value.to_owned()))?;
        Self::new(year, month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_round_trip() {
        let period: Period = "2024-03".parse().unwrap();
        assert_eq!(period, Period::new(2024, 3).unwrap());
        assert_eq!(period.to_string(), "2024-03");
    }

    #[test]
    fn rejects_bad_months() {
        assert!("2024-00".parse::<Period>().is_err());
        assert!("2024-13".parse::<Period>().is_err());
        assert!("2024".parse::<Period>().is_err());
    }

    #[test]
    fn orders_chronologically() {
        let a = Period::new(2023, 12).unwrap();
        let b = Period::new(2024, 1).unwrap();
        assert!(a < b);
    }
}
