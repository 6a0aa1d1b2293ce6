//! Agency (tenant) service.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::models::{clean, Agency, AgencyCreateRequest, AgencyUpdateRequest};
use crate::db::queries::agency as queries;
use crate::db::DbPool;
use crate::domain::money::{validate_currency, BPS_SCALE};
use crate::domain::ActivityNamer;
use crate::error::{AppError, AppResult};

/// Service for agency operations.
#[derive(Clone)]
pub struct AgencyService {
    pool: DbPool,
    config: Arc<AppConfig>,
}

impl AgencyService {
    pub fn new(pool: DbPool, config: Arc<AppConfig>) -> Self {
        Self { pool, config }
    }

    /// Register a new agency.
    pub async fn create(&self, request: AgencyCreateRequest) -> AppResult<Agency> {
        let name = required(Some(request.name), "name")?;
        let slug = validate_slug(&request.slug)?;
        let currency = currency_or(request.default_currency, &self.config.default_currency)?;
        let share = share_bps(
            request
                .advisor_share_bps
                .unwrap_or(self.config.default_advisor_share_bps),
        )?;
        ActivityNamer::with_overrides(&request.naming_templates)?;

        let id = queries::insert_agency(
            &self.pool,
            &name,
            &slug,
            &currency,
            share,
            &request.naming_templates,
        )
        .await?;

        tracing::info!(agency_id = id, slug = %slug, "Agency created");
        self.get(id).await
    }

    pub async fn get(&self, agency_id: i64) -> AppResult<Agency> {
        queries::get_agency(&self.pool, agency_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Agency {} not found", agency_id)))
    }

    /// Update the current agency; templates are validated before saving.
    pub async fn update(&self, agency_id: i64, request: AgencyUpdateRequest) -> AppResult<Agency> {
        let agency = self.get(agency_id).await?;

        let name = match request.name {
            Some(name) => required(Some(name), "name")?,
            None => agency.name,
        };
        let currency = currency_or(request.default_currency, &agency.default_currency)?;
        let share = share_bps(request.advisor_share_bps.unwrap_or(agency.advisor_share_bps))?;
        let templates: HashMap<String, String> = request
            .naming_templates
            .unwrap_or(agency.naming_templates.0);
        ActivityNamer::with_overrides(&templates)?;

        queries::update_agency(&self.pool, agency_id, &name, &currency, share, &templates).await?;
        tracing::debug!(agency_id, "Agency updated");
        self.get(agency_id).await
    }

    /// Activity namer with the agency's template overrides.
    pub async fn namer(&self, agency_id: i64) -> AppResult<ActivityNamer> {
        let agency = self.get(agency_id).await?;
        Ok(ActivityNamer::with_overrides(&agency.naming_templates.0)?)
    }
}

pub(crate) fn required(value: Option<String>, field: &str) -> AppResult<String> {
    clean(value).ok_or_else(|| AppError::Validation(format!("{} must not be blank", field)))
}

pub(crate) fn currency_or(code: Option<String>, fallback: &str) -> AppResult<String> {
    let code = clean(code).unwrap_or_else(|| fallback.to_string());
    validate_currency(&code)
        .ok_or_else(|| AppError::Validation(format!("Invalid currency code: {}", code)))
}

pub(crate) fn share_bps(value: i32) -> AppResult<i32> {
    if !(0..=BPS_SCALE as i32).contains(&value) {
        return Err(AppError::Validation(format!(
            "advisor_share_bps must be between 0 and {}, got {}",
            BPS_SCALE, value
        )));
    }
    Ok(value)
}

fn validate_slug(slug: &str) -> AppResult<String> {
    let slug = slug.trim().to_lowercase();
    let valid = !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid {
        return Err(AppError::Validation(format!(
            "Invalid slug '{}': use lowercase letters, digits and dashes",
            slug
        )));
    }
    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_slug() {
        assert_eq!(validate_slug(" Acme-Travel ").unwrap(), "acme-travel");
        assert!(validate_slug("").is_err());
        assert!(validate_slug("acme travel").is_err());
        assert!(validate_slug("-acme").is_err());
    }

    #[test]
    fn test_currency_or() {
        assert_eq!(currency_or(None, "USD").unwrap(), "USD");
        assert_eq!(currency_or(Some("eur".to_string()), "USD").unwrap(), "EUR");
        assert_eq!(currency_or(Some(" ".to_string()), "GBP").unwrap(), "GBP");
        assert!(currency_or(Some("euro".to_string()), "USD").is_err());
    }

    #[test]
    fn test_share_bps_range() {
        assert_eq!(share_bps(7_000).unwrap(), 7_000);
        assert!(share_bps(-1).is_err());
        assert!(share_bps(10_001).is_err());
    }

    #[test]
    fn test_required() {
        assert!(matches!(required(Some("  ".to_string()), "name"), Err(AppError::Validation(_))));
        assert_eq!(required(Some(" Acme ".to_string()), "name").unwrap(), "Acme");
    }
}
