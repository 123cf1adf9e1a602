//! Cash register (caixa) sessions

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use otica_shared::utils::blank_to_none;
use otica_shared::EntityId;

use crate::domain::money;
use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashRegisterStatus {
    Open,
    Closed,
}

impl CashRegisterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CashRegisterStatus::Open => "open",
            CashRegisterStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for CashRegisterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CashRegisterStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(CashRegisterStatus::Open),
            "closed" => Ok(CashRegisterStatus::Closed),
            other => Err(DomainError::InternalError(format!("unknown cash register status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashRegister {
    pub id: EntityId,
    pub status: CashRegisterStatus,
    pub opened_by: EntityId,
    pub opened_by_name: Option<String>,
    pub opened_at: DateTime<Utc>,
    pub opening_balance: Decimal,
    pub closed_by: Option<EntityId>,
    pub closed_by_name: Option<String>,
    pub closed_at: Option<DateTime<Utc>>,
    pub closing_balance: Option<Decimal>,
    pub expected_balance: Option<Decimal>,
    pub difference: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CashRegister {
    pub fn is_open(&self) -> bool {
        self.status == CashRegisterStatus::Open
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethodTotal {
    pub payment_method_id: EntityId,
    pub payment_method_name: String,
    pub total: Decimal,
}

/// Live figures of a register, computed from its completed sales
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashRegisterSummary {
    pub sales_count: i64,
    pub cancelled_count: i64,
    pub sales_total: Decimal,
    pub expected_balance: Decimal,
    pub by_payment_method: Vec<PaymentMethodTotal>,
}

/// Raw aggregates as read from storage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesAggregate {
    pub sales_count: i64,
    pub cancelled_count: i64,
    pub sales_total: Decimal,
    pub by_payment_method: Vec<PaymentMethodTotal>,
}

impl CashRegisterSummary {
    pub fn new(opening_balance: Decimal, aggregate: SalesAggregate) -> Self {
        Self {
            sales_count: aggregate.sales_count,
            cancelled_count: aggregate.cancelled_count,
            sales_total: aggregate.sales_total,
            expected_balance: opening_balance + aggregate.sales_total,
            by_payment_method: aggregate.by_payment_method,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashRegisterDetail {
    #[serde(flatten)]
    pub register: CashRegister,
    pub summary: CashRegisterSummary,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OpenCashRegisterInput {
    #[serde(default)]
    pub opening_balance: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
}

impl OpenCashRegisterInput {
    pub fn normalize(self) -> Result<Self, DomainError> {
        let opening_balance = money::round(self.opening_balance);
        money::ensure_non_negative("opening_balance", opening_balance)?;
        money::ensure_within_limit("opening_balance", opening_balance)?;
        Ok(Self { opening_balance, notes: blank_to_none(self.notes) })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CloseCashRegisterInput {
    pub closing_balance: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CloseCashRegisterInput {
    pub fn normalize(self) -> Result<Self, DomainError> {
        let closing_balance = money::round(self.closing_balance);
        money::ensure_non_negative("closing_balance", closing_balance)?;
        money::ensure_within_limit("closing_balance", closing_balance)?;
        Ok(Self { closing_balance, notes: blank_to_none(self.notes) })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCashRegister {
    pub opened_by: EntityId,
    pub opening_balance: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CashRegisterClosing {
    pub id: EntityId,
    pub closed_by: EntityId,
    pub closing_balance: Decimal,
    pub expected_balance: Decimal,
    pub difference: Decimal,
    pub notes: Option<String>,
}

impl CashRegisterClosing {
    /// `difference = counted - expected`; negative means cash is missing.
    pub fn new(id: EntityId, closed_by: EntityId, summary: &CashRegisterSummary, input: CloseCashRegisterInput) -> Self {
        Self {
            id,
            closed_by,
            closing_balance: input.closing_balance,
            expected_balance: summary.expected_balance,
            difference: input.closing_balance - summary.expected_balance,
            notes: input.notes,
        }
    }
}
