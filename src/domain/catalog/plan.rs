//! Subscription plan entity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::PlanDuration;
use crate::domain::foundation::{PlanId, Timestamp, ValidationError};

/// Whether a plan is meant to renew on its own when a period ends.
///
/// Only recorded; no component renews memberships automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenewalType {
    Automatic,
    #[default]
    Manual,
}

impl RenewalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenewalType::Automatic => "automatic",
            RenewalType::Manual => "manual",
        }
    }
}

impl fmt::Display for RenewalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenewalType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "automatic" => Ok(RenewalType::Automatic),
            "manual" => Ok(RenewalType::Manual),
            other => Err(ValidationError::invalid_format(
                "renewal_type",
                format!("'{}' must be 'automatic' or 'manual'", other),
            )),
        }
    }
}

/// A purchasable membership offering.
///
/// # Invariants
///
/// - `name` is non-empty after trimming
/// - `price` is strictly positive, in minor currency units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    pub id: PlanId,
    pub name: String,
    pub duration: PlanDuration,
    pub price: i64,
    pub renewal_type: RenewalType,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SubscriptionPlan {
    pub fn new(
        id: PlanId,
        name: impl Into<String>,
        duration: PlanDuration,
        price: i64,
        renewal_type: RenewalType,
    ) -> Result<Self, ValidationError> {
        let name = validate_name(name.into())?;
        validate_price(price)?;
        let now = Timestamp::now();
        Ok(Self {
            id,
            name,
            duration,
            price,
            renewal_type,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), ValidationError> {
        self.name = validate_name(name.into())?;
        self.touch();
        Ok(())
    }

    /// Changes the list price. Existing payment records keep their amount.
    pub fn reprice(&mut self, price: i64) -> Result<(), ValidationError> {
        validate_price(price)?;
        self.price = price;
        self.touch();
        Ok(())
    }

    pub fn set_renewal_type(&mut self, renewal_type: RenewalType) {
        self.renewal_type = renewal_type;
        self.touch();
    }

    /// Changes the duration. Callers must first make sure no active period
    /// depends on the old duration.
    pub fn change_duration(&mut self, duration: PlanDuration) {
        self.duration = duration;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}

fn validate_name(name: String) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::empty_field("name"));
    }
    Ok(trimmed.to_string())
}

fn validate_price(price: i64) -> Result<(), ValidationError> {
    if price <= 0 {
        return Err(ValidationError::below_minimum("price", 1, price));
    }
    Ok(())
}
