//! Lens product and mass price adjustments

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use otica_shared::utils::blank_to_none;
use otica_shared::EntityId;

use crate::domain::money;
use crate::error::DomainError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lens {
    pub id: EntityId,
    pub code: String,
    pub description: String,
    pub family_id: EntityId,
    pub family_name: Option<String>,
    pub supplier_id: Option<EntityId>,
    pub supplier_name: Option<String>,
    pub index_id: Option<EntityId>,
    pub index_name: Option<String>,
    pub treatment_id: Option<EntityId>,
    pub treatment_name: Option<String>,
    pub cost_price: Decimal,
    pub sale_price: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct LensInput {
    #[validate(length(min = 1, max = 50, message = "must have between 1 and 50 characters"))]
    pub code: String,
    #[validate(length(min = 2, max = 255, message = "must have between 2 and 255 characters"))]
    pub description: String,
    pub family_id: EntityId,
    #[serde(default)]
    pub supplier_id: Option<EntityId>,
    #[serde(default)]
    pub index_id: Option<EntityId>,
    #[serde(default)]
    pub treatment_id: Option<EntityId>,
    #[serde(default)]
    pub cost_price: Decimal,
    pub sale_price: Decimal,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl LensInput {
    pub fn normalize(self) -> Result<Self, DomainError> {
        let input = Self {
            code: self.code.trim().to_uppercase(),
            description: self.description.trim().to_string(),
            cost_price: money::round(self.cost_price),
            sale_price: money::round(self.sale_price),
            ..self
        };
        input.validate()?;
        money::ensure_non_negative("cost_price", input.cost_price)?;
        money::ensure_non_negative("sale_price", input.sale_price)?;
        money::ensure_within_limit("cost_price", input.cost_price)?;
        money::ensure_within_limit("sale_price", input.sale_price)?;
        Ok(input)
    }
}

/// Query string of `GET /lenses`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LensFilter {
    pub q: Option<String>,
    pub family_id: Option<EntityId>,
    pub supplier_id: Option<EntityId>,
    pub index_id: Option<EntityId>,
    pub treatment_id: Option<EntityId>,
    pub active: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl LensFilter {
    pub fn search(&self) -> Option<String> {
        blank_to_none(self.q.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentMode {
    /// `price * (1 + value / 100)`
    Percent,
    /// `price + value`
    Amount,
    /// `value`
    Set,
}

impl AdjustmentMode {
    /// Adjusted price rounded to cents. Results past the money limit are rejected.
    pub fn apply(&self, price: Decimal, value: Decimal) -> Result<Decimal, DomainError> {
        let adjusted = match self {
            AdjustmentMode::Percent => value
                .checked_div(Decimal::ONE_HUNDRED)
                .and_then(|v| Decimal::ONE.checked_add(v))
                .and_then(|factor| price.checked_mul(factor)),
            AdjustmentMode::Amount => price.checked_add(value),
            AdjustmentMode::Set => Some(value),
        };
        adjusted
            .map(money::round)
            .filter(|v| v.abs() <= money::MAX_AMOUNT)
            .ok_or_else(|| {
                DomainError::validation(format!("value: adjusted price must not exceed {}", money::MAX_AMOUNT))
            })
    }
}

/// Body of `POST /lenses/price-adjustments`. Every given target narrows the selection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PriceAdjustment {
    #[serde(default)]
    pub lens_ids: Vec<EntityId>,
    #[serde(default)]
    pub family_id: Option<EntityId>,
    #[serde(default)]
    pub supplier_id: Option<EntityId>,
    pub mode: AdjustmentMode,
    pub value: Decimal,
}

impl PriceAdjustment {
    pub fn validate_target(&self) -> Result<(), DomainError> {
        if self.lens_ids.is_empty() && self.family_id.is_none() && self.supplier_id.is_none() {
            return Err(DomainError::validation(
                "at least one of lens_ids, family_id or supplier_id is required",
            ));
        }
        if self.mode == AdjustmentMode::Set {
            money::ensure_non_negative("value", self.value)?;
        }
        money::ensure_within_limit("value", self.value)?;
        Ok(())
    }

    /// New sale price for one lens, rejecting results below zero.
    pub fn new_price(&self, lens_id: EntityId, current: Decimal) -> Result<Decimal, DomainError> {
        let price = self.mode.apply(current, self.value)?;
        if price < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "adjustment would make the price of lens {} negative ({})",
                lens_id, price
            )));
        }
        Ok(price)
    }
}
