//! The per-line commission calculation.
//!
//! This is a pure function over already-consolidated inputs: one
//! consolidated operator report, the simcard's total recharge for the
//! period, and the sales condition that attributes the line to a store. It
//! performs no I/O and no writes; the liquidation generator and the
//! crossing preview both call it so a previewed amount is exactly what a
//! generation run would pay.

use crate::models::{LineWarningKind, OperatorReport, SalesCondition};
use rust_decimal::{Decimal, RoundingStrategy};

/// Money is rounded half-away-from-zero at 2 decimals, and only at the very
/// end of the calculation; percentages and the multiplier keep full decimal
/// precision so no drift accumulates across the multiplier.
pub const MONEY_DECIMALS: u32 = 2;

/// The computed breakdown for one liquidation line, before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDraft {
    /// Total commission before any discount
    pub raw_commission: Decimal,
    /// `total_recharge * payment_percentage`
    pub recharge_discount: Decimal,
    /// `raw_commission - recharge_discount`; negative values propagate
    pub commission_after_discount: Decimal,
    /// `condition.commission_percentage / payment_percentage`
    pub multiplier: Decimal,
    /// `commission_after_discount * multiplier`, rounded to 2 decimals
    pub final_amount: Decimal,
}

impl LineDraft {
    /// A negative commission after discount surfaces as a loss alert in the
    /// preview; it is propagated, never clamped.
    pub fn is_loss(&self) -> bool {
        self.commission_after_discount < Decimal::ZERO
    }
}

/// A line that cannot be priced. These recover locally: the caller skips
/// the line, reports a structured warning and continues the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CalcError {
    /// Payment percentage was zero or absent, so the multiplier has no
    /// denominator
    #[error("payment percentage is zero or absent")]
    MissingRateBasis,
    /// Neither the split commission fields nor the explicit total were
    /// present
    #[error("no commission figure in any fallback field")]
    MissingCommissionBasis,
}

impl From<CalcError> for LineWarningKind {
    fn from(value: CalcError) -> Self {
        match value {
            CalcError::MissingRateBasis => LineWarningKind::MissingRateBasis,
            CalcError::MissingCommissionBasis => LineWarningKind::MissingCommissionBasis,
        }
    }
}

/// Normalize a percentage that feeds supply either as `18` or as `0.18`.
pub fn normalize_percentage(value: Decimal) -> Decimal {
    if value > Decimal::ONE {
        value / Decimal::ONE_HUNDRED
    } else {
        value
    }
}

/// Ordered fallback chain for the commission figure: the split disbursement
/// fields when either is present, else the explicit total.
pub fn commission_basis(
    paid_80: Option<Decimal>,
    paid_20: Option<Decimal>,
    total: Option<Decimal>,
) -> Option<Decimal> {
    match (paid_80, paid_20) {
        (None, None) => total,
        (a, b) => Some(a.unwrap_or_default() + b.unwrap_or_default()),
    }
}

fn total_commission(report: &OperatorReport) -> Result<Decimal, CalcError> {
    commission_basis(
        report.commission_paid_80,
        report.commission_paid_20,
        report.total_commission,
    )
    .ok_or(CalcError::MissingCommissionBasis)
}

/// Compute the payable amount for one simcard-period line.
///
/// `total_recharge` is the summed recharge feed for the simcard-period;
/// callers fall back to the consolidated report's own recharge amount when
/// the feed has no rows.
pub fn calculate_line(
    report: &OperatorReport,
    total_recharge: Decimal,
    condition: &SalesCondition,
) -> Result<LineDraft, CalcError> {
    let raw_commission = total_commission(report)?;

    let payment_percentage = normalize_percentage(report.payment_percentage);
    if payment_percentage <= Decimal::ZERO {
        return Err(CalcError::MissingRateBasis);
    }

    let recharge_discount = total_recharge * payment_percentage;
    let commission_after_discount = raw_commission - recharge_discount;

    // The condition percentage is used raw: terms of `2` against a reported
    // 18% yield a multiplier of 2 / 0.18, not 0.02 / 0.18.
    let multiplier = condition.commission_percentage / payment_percentage;

    let final_amount = (commission_after_discount * multiplier)
        .round_dp_with_strategy(MONEY_DECIMALS, RoundingStrategy::MidpointAwayFromZero);

    Ok(LineDraft {
        raw_commission,
        recharge_discount,
        commission_after_discount,
        multiplier,
        final_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ConditionId, Period, ReportId, SimcardId, StoreId,
    };
    use rust_decimal_macros::dec;

    fn report(
        paid_80: Option<Decimal>,
        paid_20: Option<Decimal>,
        total: Option<Decimal>,
        recharge: Decimal,
        pct: Decimal,
    ) -> OperatorReport {
        OperatorReport {
            id: ReportId::new(),
            simcard_id: SimcardId::new(),
            import_id: None,
            period: Period::new(2024, 3).unwrap(),
            cutoff_date: None,
            activation_date: None,
            commission_paid_80: paid_80,
            commission_paid_20: paid_20,
            total_commission: total,
            recharge_amount: recharge,
            recharge_period: None,
            payment_percentage: pct,
            is_consolidated: true,
            liquidation_item_id: None,
            raw_payload: None,
        }
    }

    fn condition(pct: Decimal) -> SalesCondition {
        SalesCondition {
            id: ConditionId::new(),
            simcard_id: SimcardId::new(),
            store_id: StoreId::new(),
            period: Period::new(2024, 3).unwrap(),
            commission_percentage: pct,
            sale_price: None,
        }
    }

    #[test]
    fn scenario_a_exact_rounding() {
        // total 10000, recharge 5000, 18% -> 0.18, condition 2:
        // discount 900, after 9100, multiplier 2/0.18, final 101111.11
        let r = report(None, None, Some(dec!(10000)), dec!(5000), dec!(18));
        let draft = calculate_line(&r, dec!(5000), &condition(dec!(2))).unwrap();
        assert_eq!(draft.recharge_discount, dec!(900.00));
        assert_eq!(draft.commission_after_discount, dec!(9100.00));
        assert_eq!(draft.final_amount, dec!(101111.11));
        assert!(!draft.is_loss());
    }

    #[test]
    fn split_fields_take_precedence_over_total() {
        let r = report(
            Some(dec!(80)),
            Some(dec!(20)),
            Some(dec!(999)),
            Decimal::ZERO,
            dec!(0.18),
        );
        let draft = calculate_line(&r, Decimal::ZERO, &condition(dec!(2))).unwrap();
        assert_eq!(draft.raw_commission, dec!(100));
    }

    #[test]
    fn one_split_field_alone_is_enough() {
        let r = report(Some(dec!(80)), None, None, Decimal::ZERO, dec!(0.18));
        let draft = calculate_line(&r, Decimal::ZERO, &condition(dec!(2))).unwrap();
        assert_eq!(draft.raw_commission, dec!(80));
    }

    #[test]
    fn exhausted_fallbacks_are_a_named_error() {
        let r = report(None, None, None, Decimal::ZERO, dec!(0.18));
        assert_eq!(
            calculate_line(&r, Decimal::ZERO, &condition(dec!(2))),
            Err(CalcError::MissingCommissionBasis)
        );
    }

    #[test]
    fn zero_payment_percentage_has_no_rate_basis() {
        let r = report(None, None, Some(dec!(100)), Decimal::ZERO, Decimal::ZERO);
        assert_eq!(
            calculate_line(&r, Decimal::ZERO, &condition(dec!(2))),
            Err(CalcError::MissingRateBasis)
        );
    }

    #[test]
    fn fractional_percentage_is_not_renormalized() {
        let r = report(None, None, Some(dec!(100)), Decimal::ZERO, dec!(0.18));
        let a = calculate_line(&r, Decimal::ZERO, &condition(dec!(2))).unwrap();
        let r = report(None, None, Some(dec!(100)), Decimal::ZERO, dec!(18));
        let b = calculate_line(&r, Decimal::ZERO, &condition(dec!(2))).unwrap();
        assert_eq!(a.final_amount, b.final_amount);
    }

    #[test]
    fn negative_commission_propagates_unclamped() {
        // discount 1800 on a 1000 commission: after = -800
        let r = report(None, None, Some(dec!(1000)), dec!(10000), dec!(18));
        let draft = calculate_line(&r, dec!(10000), &condition(dec!(2))).unwrap();
        assert_eq!(draft.commission_after_discount, dec!(-800.00));
        assert!(draft.is_loss());
        assert!(draft.final_amount < Decimal::ZERO);
    }
}
