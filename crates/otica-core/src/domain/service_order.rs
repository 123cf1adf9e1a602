//! Service order (ordem de serviço): client, prescription and lenses before checkout

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use otica_shared::utils::blank_to_none;
use otica_shared::EntityId;

use crate::domain::money;
use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceOrderStatus {
    Open,
    Completed,
    Cancelled,
}

impl ServiceOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceOrderStatus::Open => "open",
            ServiceOrderStatus::Completed => "completed",
            ServiceOrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ServiceOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceOrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(ServiceOrderStatus::Open),
            "completed" => Ok(ServiceOrderStatus::Completed),
            "cancelled" => Ok(ServiceOrderStatus::Cancelled),
            other => Err(DomainError::InternalError(format!("unknown service order status: {}", other))),
        }
    }
}

/// Optical prescription. Right eye is OD, left eye is OE.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Prescription {
    #[validate(custom(function = "validate_sphere"))]
    pub right_sphere: Option<Decimal>,
    #[validate(custom(function = "validate_cylinder"))]
    pub right_cylinder: Option<Decimal>,
    #[validate(range(min = 0, max = 180, message = "must be between 0 and 180"))]
    pub right_axis: Option<i16>,
    #[validate(custom(function = "validate_addition"))]
    pub right_addition: Option<Decimal>,
    #[validate(custom(function = "validate_sphere"))]
    pub left_sphere: Option<Decimal>,
    #[validate(custom(function = "validate_cylinder"))]
    pub left_cylinder: Option<Decimal>,
    #[validate(range(min = 0, max = 180, message = "must be between 0 and 180"))]
    pub left_axis: Option<i16>,
    #[validate(custom(function = "validate_addition"))]
    pub left_addition: Option<Decimal>,
    #[validate(custom(function = "validate_millimeters"))]
    pub pupillary_distance: Option<Decimal>,
    #[validate(custom(function = "validate_millimeters"))]
    pub fitting_height: Option<Decimal>,
}

fn within(value: &Decimal, min: i64, max: i64, code: &'static str) -> Result<(), ValidationError> {
    if *value < Decimal::from(min) || *value > Decimal::from(max) {
        let mut err = ValidationError::new(code);
        err.message = Some(format!("must be between {} and {}", min, max).into());
        return Err(err);
    }
    Ok(())
}

fn validate_sphere(value: &Decimal) -> Result<(), ValidationError> {
    within(value, -30, 30, "sphere")
}

fn validate_cylinder(value: &Decimal) -> Result<(), ValidationError> {
    within(value, -15, 15, "cylinder")
}

fn validate_addition(value: &Decimal) -> Result<(), ValidationError> {
    within(value, 0, 5, "addition")
}

fn validate_millimeters(value: &Decimal) -> Result<(), ValidationError> {
    within(value, 0, 100, "millimeters")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceOrderItem {
    pub id: EntityId,
    pub lens_id: EntityId,
    pub lens_code: Option<String>,
    pub lens_description: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceOrder {
    pub id: EntityId,
    pub client_id: EntityId,
    pub client_name: Option<String>,
    pub seller_id: EntityId,
    pub seller_name: Option<String>,
    pub status: ServiceOrderStatus,
    pub prescription: Prescription,
    pub notes: Option<String>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    /// Empty in list results
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ServiceOrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceOrder {
    pub fn is_open(&self) -> bool {
        self.status == ServiceOrderStatus::Open
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ServiceOrderItemInput {
    pub lens_id: EntityId,
    #[validate(range(min = 1, max = 1000, message = "must be between 1 and 1000"))]
    pub quantity: i32,
    /// Defaults to the lens sale price
    #[serde(default)]
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct ServiceOrderInput {
    pub client_id: EntityId,
    #[serde(default)]
    #[validate(nested)]
    pub prescription: Prescription,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[serde(default)]
    pub discount: Decimal,
    #[validate(length(min = 1, message = "at least one item is required"), nested)]
    pub items: Vec<ServiceOrderItemInput>,
}

impl ServiceOrderInput {
    pub fn normalize(self) -> Result<Self, DomainError> {
        let input = Self {
            notes: blank_to_none(self.notes),
            discount: money::round(self.discount),
            ..self
        };
        input.validate()?;
        money::ensure_non_negative("discount", input.discount)?;
        money::ensure_within_limit("discount", input.discount)?;
        for item in &input.items {
            if let Some(price) = item.unit_price {
                money::ensure_non_negative("unit_price", price)?;
                money::ensure_within_limit("unit_price", price)?;
            }
        }
        Ok(input)
    }
}

/// Item with its price resolved, ready to persist
#[derive(Debug, Clone, PartialEq)]
pub struct PricedItem {
    pub lens_id: EntityId,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl PricedItem {
    pub fn total(&self) -> Result<Decimal, DomainError> {
        money::checked_mul("items.total", self.unit_price, Decimal::from(self.quantity))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

impl Totals {
    /// `total = Σ items - discount`; a discount above the subtotal is rejected.
    pub fn compute(items: &[PricedItem], discount: Decimal) -> Result<Self, DomainError> {
        let totals = items.iter().map(PricedItem::total).collect::<Result<Vec<_>, _>>()?;
        let subtotal = money::checked_sum("subtotal", totals)?;
        Self::from_subtotal(subtotal, discount)
    }

    pub fn from_subtotal(subtotal: Decimal, discount: Decimal) -> Result<Self, DomainError> {
        money::ensure_non_negative("discount", discount)?;
        if discount > subtotal {
            return Err(DomainError::validation(format!(
                "discount: {} exceeds subtotal {}",
                discount, subtotal
            )));
        }
        Ok(Self {
            subtotal,
            discount,
            total: subtotal - discount,
        })
    }
}

/// Fully resolved order written by the repository in one transaction
#[derive(Debug, Clone, PartialEq)]
pub struct NewServiceOrder {
    pub client_id: EntityId,
    pub seller_id: EntityId,
    pub prescription: Prescription,
    pub notes: Option<String>,
    pub totals: Totals,
    pub items: Vec<PricedItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServiceOrderFilter {
    pub status: Option<ServiceOrderStatus>,
    pub client_id: Option<EntityId>,
    /// Substring of the client name
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ServiceOrderFilter {
    pub fn search(&self) -> Option<String> {
        blank_to_none(self.q.clone())
    }
}
