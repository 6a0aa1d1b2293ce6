//! Stateless price quotes.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::domain::money::{format_minor, validate_currency};
use crate::domain::{quote as price, PriceBreakdown, PriceInputs};
use crate::error::{AppError, AppResult};
use crate::extract::Json;

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    #[serde(flatten)]
    pub inputs: PriceInputs,

    /// Defaults to the server's `default_advisor_share_bps`
    #[serde(default)]
    pub advisor_share_bps: Option<i32>,

    /// When set, the response carries formatted amounts
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub advisor_share_bps: i32,
    #[serde(flatten)]
    pub price: PriceBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<BTreeMap<String, String>>,
}

/// Price one activity without storing anything.
///
/// `POST /api/v1/pricing/quote`
///
/// ```json
/// {"model": "net", "cost_cents": 100000, "markup_bps": 1500, "tax_cents": 8000}
/// ```
pub async fn quote(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<QuoteRequest>,
) -> AppResult<Json<QuoteResponse>> {
    let share = request
        .advisor_share_bps
        .unwrap_or(config.default_advisor_share_bps);
    let breakdown = price(&request.inputs, share)?;

    let formatted = match request.currency {
        Some(code) => {
            let code = validate_currency(&code)
                .ok_or_else(|| AppError::Validation(format!("Invalid currency code: {}", code)))?;
            let mut amounts = BTreeMap::new();
            for (key, cents) in [
                ("cost", breakdown.cost_cents),
                ("sell_price", breakdown.sell_price_cents),
                ("client_total", breakdown.client_total_cents),
                ("agency_revenue", breakdown.agency_revenue_cents),
                ("advisor_payout", breakdown.advisor_payout_cents),
            ] {
                amounts.insert(key.to_string(), format_minor(cents, &code));
            }
            Some(amounts)
        }
        None => None,
    };

    Ok(Json(QuoteResponse {
        advisor_share_bps: share,
        price: breakdown,
        formatted,
    }))
}
