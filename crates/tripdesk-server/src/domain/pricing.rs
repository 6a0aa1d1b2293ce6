//! Pricing and commission math for activities and trips.
//!
//! Two supplier arrangements are supported:
//!
//! - **Net**: the agency buys at a net cost and sells with a markup.
//! - **Commissionable**: the client pays the supplier's gross rate and the
//!   supplier pays the agency a commission on it.
//!
//! Either way the agency may add a service fee. Agency revenue is then shared
//! with the advisor who owns the trip.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::money::{apply_bps, ratio_bps, BPS_SCALE, MAX_AMOUNT_CENTS};

/// Largest accepted markup (1000%).
pub const MAX_MARKUP_BPS: i32 = 100_000;

/// Pricing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("{field} must not be negative")]
    NegativeAmount { field: &'static str },

    #[error("{field} must not exceed {max} cents")]
    AmountTooLarge { field: &'static str, max: i64 },

    #[error("{field} must be between 0 and {max} basis points, got {value}")]
    RateOutOfRange {
        field: &'static str,
        value: i32,
        max: i32,
    },

    #[error("Unknown pricing model: {0}")]
    UnknownModel(String),
}

/// Supplier arrangement for an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PricingModel {
    #[default]
    Net,
    Commissionable,
}

impl PricingModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingModel::Net => "net",
            PricingModel::Commissionable => "commissionable",
        }
    }
}

impl std::str::FromStr for PricingModel {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "net" => Ok(PricingModel::Net),
            "commissionable" => Ok(PricingModel::Commissionable),
            other => Err(PricingError::UnknownModel(other.to_string())),
        }
    }
}

/// Raw pricing fields of an activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PriceInputs {
    #[serde(default)]
    pub model: PricingModel,

    /// Net cost (net model) or gross supplier rate (commissionable model).
    #[serde(default)]
    pub cost_cents: i64,

    /// Markup applied to the net cost when no sell price is given.
    #[serde(default)]
    pub markup_bps: i32,

    /// Explicit client price, overriding the markup.
    #[serde(default)]
    pub sell_price_cents: Option<i64>,

    /// Supplier commission on the sell price (commissionable model only).
    #[serde(default)]
    pub commission_bps: i32,

    #[serde(default)]
    pub tax_cents: i64,

    #[serde(default)]
    pub service_fee_cents: i64,
}

/// Computed price of one activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PriceBreakdown {
    pub cost_cents: i64,
    pub sell_price_cents: i64,
    pub markup_cents: i64,
    pub commission_cents: i64,
    pub tax_cents: i64,
    pub service_fee_cents: i64,
    /// What the client pays.
    pub client_total_cents: i64,
    /// Markup + commission + service fee.
    pub agency_revenue_cents: i64,
    pub advisor_payout_cents: i64,
    pub agency_net_cents: i64,
    /// Agency revenue as a share of the client total.
    pub margin_bps: i32,
}

impl PriceInputs {
    pub fn validate(&self) -> Result<(), PricingError> {
        amount_in_range("cost_cents", self.cost_cents)?;
        amount_in_range("tax_cents", self.tax_cents)?;
        amount_in_range("service_fee_cents", self.service_fee_cents)?;
        if let Some(sell) = self.sell_price_cents {
            amount_in_range("sell_price_cents", sell)?;
        }
        rate_in_range("markup_bps", self.markup_bps, MAX_MARKUP_BPS)?;
        rate_in_range("commission_bps", self.commission_bps, BPS_SCALE as i32)?;
        Ok(())
    }
}

fn amount_in_range(field: &'static str, value: i64) -> Result<(), PricingError> {
    if value < 0 {
        return Err(PricingError::NegativeAmount { field });
    }
    if value > MAX_AMOUNT_CENTS {
        return Err(PricingError::AmountTooLarge {
            field,
            max: MAX_AMOUNT_CENTS,
        });
    }
    Ok(())
}

fn rate_in_range(field: &'static str, value: i32, max: i32) -> Result<(), PricingError> {
    if !(0..=max).contains(&value) {
        return Err(PricingError::RateOutOfRange { field, value, max });
    }
    Ok(())
}

/// Price an activity and split its revenue with the advisor.
pub fn quote(inputs: &PriceInputs, advisor_share_bps: i32) -> Result<PriceBreakdown, PricingError> {
    inputs.validate()?;
    rate_in_range("advisor_share_bps", advisor_share_bps, BPS_SCALE as i32)?;

    let (sell, commission) = match inputs.model {
        PricingModel::Net => {
            let sell = inputs
                .sell_price_cents
                .unwrap_or_else(|| inputs.cost_cents + apply_bps(inputs.cost_cents, inputs.markup_bps));
            (sell, 0)
        }
        PricingModel::Commissionable => {
            let sell = inputs.sell_price_cents.unwrap_or(inputs.cost_cents);
            (sell, apply_bps(sell, inputs.commission_bps))
        }
    };

    let markup = sell - inputs.cost_cents;
    let client_total = sell + inputs.tax_cents + inputs.service_fee_cents;
    let agency_revenue = markup + commission + inputs.service_fee_cents;
    let advisor_payout = apply_bps(agency_revenue.max(0), advisor_share_bps);

    Ok(PriceBreakdown {
        cost_cents: inputs.cost_cents,
        sell_price_cents: sell,
        markup_cents: markup,
        commission_cents: commission,
        tax_cents: inputs.tax_cents,
        service_fee_cents: inputs.service_fee_cents,
        client_total_cents: client_total,
        agency_revenue_cents: agency_revenue,
        advisor_payout_cents: advisor_payout,
        agency_net_cents: agency_revenue - advisor_payout,
        margin_bps: ratio_bps(agency_revenue, client_total),
    })
}

/// Trip-level totals across activities and payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TripTotals {
    pub activity_count: usize,
    pub cost_cents: i64,
    pub sell_price_cents: i64,
    pub commission_cents: i64,
    pub tax_cents: i64,
    pub service_fee_cents: i64,
    pub client_total_cents: i64,
    pub agency_revenue_cents: i64,
    pub advisor_payout_cents: i64,
    pub agency_net_cents: i64,
    pub margin_bps: i32,
    pub paid_cents: i64,
    pub balance_due_cents: i64,
}

impl TripTotals {
    /// Sum activity breakdowns and settle against what has been paid.
    ///
    /// Sums saturate instead of wrapping.
    pub fn from_breakdowns<'a>(
        breakdowns: impl IntoIterator<Item = &'a PriceBreakdown>,
        paid_cents: i64,
    ) -> Self {
        let mut totals = breakdowns
            .into_iter()
            .fold(TripTotals::default(), |mut acc, b| {
                acc.activity_count += 1;
                acc.cost_cents = acc.cost_cents.saturating_add(b.cost_cents);
                acc.sell_price_cents = acc.sell_price_cents.saturating_add(b.sell_price_cents);
                acc.commission_cents = acc.commission_cents.saturating_add(b.commission_cents);
                acc.tax_cents = acc.tax_cents.saturating_add(b.tax_cents);
                acc.service_fee_cents = acc.service_fee_cents.saturating_add(b.service_fee_cents);
                acc.client_total_cents = acc.client_total_cents.saturating_add(b.client_total_cents);
                acc.agency_revenue_cents =
                    acc.agency_revenue_cents.saturating_add(b.agency_revenue_cents);
                acc.advisor_payout_cents =
                    acc.advisor_payout_cents.saturating_add(b.advisor_payout_cents);
                acc.agency_net_cents = acc.agency_net_cents.saturating_add(b.agency_net_cents);
                acc
            });

        totals.margin_bps = ratio_bps(totals.agency_revenue_cents, totals.client_total_cents);
        totals.paid_cents = paid_cents;
        totals.balance_due_cents = totals.client_total_cents.saturating_sub(paid_cents);
        totals
    }
}
