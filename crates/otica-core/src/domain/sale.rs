//! Sale, its items and payments

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use otica_shared::utils::blank_to_none;
use otica_shared::EntityId;

use crate::domain::money;
use crate::domain::service_order::{PricedItem, ServiceOrderStatus, Totals};
use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Completed,
    Cancelled,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaleStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(SaleStatus::Completed),
            "cancelled" => Ok(SaleStatus::Cancelled),
            other => Err(DomainError::InternalError(format!("unknown sale status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: EntityId,
    pub lens_id: EntityId,
    pub lens_code: Option<String>,
    pub lens_description: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalePayment {
    pub id: EntityId,
    pub payment_method_id: EntityId,
    pub payment_method_name: Option<String>,
    pub amount: Decimal,
    pub installments: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: EntityId,
    pub cash_register_id: EntityId,
    pub client_id: Option<EntityId>,
    pub client_name: Option<String>,
    pub service_order_id: Option<EntityId>,
    pub user_id: EntityId,
    pub user_name: Option<String>,
    pub status: SaleStatus,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<SaleItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payments: Vec<SalePayment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SaleItemInput {
    pub lens_id: EntityId,
    #[validate(range(min = 1, max = 1000, message = "must be between 1 and 1000"))]
    pub quantity: i32,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PaymentInput {
    pub payment_method_id: EntityId,
    pub amount: Decimal,
    #[serde(default = "default_installments")]
    #[validate(range(min = 1, max = 24, message = "must be between 1 and 24"))]
    pub installments: i32,
}

fn default_installments() -> i32 {
    1
}

/// Body of `POST /sales`: either a service order or direct items.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct SaleInput {
    #[serde(default)]
    pub client_id: Option<EntityId>,
    #[serde(default)]
    pub service_order_id: Option<EntityId>,
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<SaleItemInput>,
    #[serde(default)]
    pub discount: Decimal,
    #[validate(length(min = 1, message = "at least one payment is required"), nested)]
    pub payments: Vec<PaymentInput>,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl SaleInput {
    pub fn normalize(self) -> Result<Self, DomainError> {
        let input = Self {
            discount: money::round(self.discount),
            notes: blank_to_none(self.notes),
            payments: self
                .payments
                .into_iter()
                .map(|p| PaymentInput { amount: money::round(p.amount), ..p })
                .collect(),
            ..self
        };
        input.validate()?;

        match (input.service_order_id, input.items.is_empty()) {
            (Some(_), false) => {
                return Err(DomainError::validation(
                    "items: must be empty when service_order_id is given",
                ))
            }
            (None, true) => {
                return Err(DomainError::validation(
                    "either service_order_id or items is required",
                ))
            }
            _ => {}
        }

        money::ensure_non_negative("discount", input.discount)?;
        money::ensure_within_limit("discount", input.discount)?;
        for item in &input.items {
            if let Some(price) = item.unit_price {
                money::ensure_non_negative("unit_price", price)?;
                money::ensure_within_limit("unit_price", price)?;
            }
        }
        for payment in &input.payments {
            money::ensure_positive("payments.amount", payment.amount)?;
            money::ensure_within_limit("payments.amount", payment.amount)?;
        }
        Ok(input)
    }
}

/// Payments must cover the total exactly.
pub fn check_payments(total: Decimal, payments: &[PaymentInput]) -> Result<(), DomainError> {
    let paid = money::checked_sum("payments.amount", payments.iter().map(|p| p.amount))?;
    if paid != total {
        return Err(DomainError::validation(format!(
            "payments: sum {} does not match sale total {}",
            paid, total
        )));
    }
    Ok(())
}

/// The service order, as locked at checkout, must still be open and priced
/// as it was when the sale totals were computed.
pub fn check_locked_order(
    order_id: EntityId,
    status: ServiceOrderStatus,
    order_total: Decimal,
    sale_subtotal: Decimal,
) -> Result<(), DomainError> {
    if status != ServiceOrderStatus::Open {
        return Err(DomainError::InvalidState(format!(
            "service order {} is no longer open",
            order_id
        )));
    }
    if order_total != sale_subtotal {
        return Err(DomainError::Conflict(format!(
            "service order {} changed during checkout (total {}, sale priced at {})",
            order_id, order_total, sale_subtotal
        )));
    }
    Ok(())
}

/// Fully resolved sale written by the repository in one transaction
#[derive(Debug, Clone, PartialEq)]
pub struct NewSale {
    pub cash_register_id: EntityId,
    pub client_id: Option<EntityId>,
    pub service_order_id: Option<EntityId>,
    pub user_id: EntityId,
    pub totals: Totals,
    pub notes: Option<String>,
    pub items: Vec<PricedItem>,
    pub payments: Vec<PaymentInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SaleFilter {
    pub cash_register_id: Option<EntityId>,
    pub client_id: Option<EntityId>,
    pub status: Option<SaleStatus>,
    /// Inclusive start date
    pub from: Option<NaiveDate>,
    /// Inclusive end date
    pub to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl SaleFilter {
    pub fn validate_range(&self) -> Result<(), DomainError> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(DomainError::validation("from: must not be after to"));
            }
        }
        Ok(())
    }
}
