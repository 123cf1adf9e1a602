//! Cash register (caixa) open/close lifecycle

use std::sync::Arc;

use tracing::{info, warn};

use otica_shared::{EntityId, Page};

use crate::domain::{
    CashRegister, CashRegisterDetail, CashRegisterSummary, CloseCashRegisterInput, ListQuery, NewCashRegister,
    OpenCashRegisterInput,
};
use crate::error::DomainError;
use crate::repositories::CashRegisterRepository;

pub struct CashRegisterService {
    registers: Arc<dyn CashRegisterRepository>,
}

impl CashRegisterService {
    pub fn new(registers: Arc<dyn CashRegisterRepository>) -> Self {
        Self { registers }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Page<CashRegister>, DomainError> {
        self.registers.list(query).await
    }

    pub async fn get(&self, id: EntityId) -> Result<CashRegisterDetail, DomainError> {
        let register = self
            .registers
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("cash register", id))?;
        self.with_summary(register).await
    }

    /// The open register with its live summary, if any
    pub async fn current(&self) -> Result<Option<CashRegisterDetail>, DomainError> {
        match self.registers.find_open().await? {
            Some(register) => Ok(Some(self.with_summary(register).await?)),
            None => Ok(None),
        }
    }

    pub async fn open(&self, input: OpenCashRegisterInput, user_id: EntityId) -> Result<CashRegisterDetail, DomainError> {
        let input = input.normalize()?;

        if let Some(open) = self.registers.find_open().await? {
            warn!("Cash register open refused: {} is already open", open.id);
            return Err(DomainError::Conflict(format!("cash register {} is already open", open.id)));
        }

        let id = self
            .registers
            .open(&NewCashRegister {
                opened_by: user_id,
                opening_balance: input.opening_balance,
                notes: input.notes,
            })
            .await?;

        info!("Cash register {} opened by user {} with {}", id, user_id, input.opening_balance);
        self.get(id).await
    }

    pub async fn close(
        &self,
        id: EntityId,
        input: CloseCashRegisterInput,
        user_id: EntityId,
    ) -> Result<CashRegisterDetail, DomainError> {
        let input = input.normalize()?;
        let register = self
            .registers
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("cash register", id))?;
        if !register.is_open() {
            return Err(DomainError::InvalidState(format!("cash register {} is already closed", id)));
        }

        let closing = self
            .registers
            .close(id, user_id, &input)
            .await?
            .ok_or_else(|| DomainError::InvalidState(format!("cash register {} is already closed", id)))?;

        info!(
            "Cash register {} closed by user {}: expected {}, counted {}, difference {}",
            id, user_id, closing.expected_balance, closing.closing_balance, closing.difference
        );
        self.get(id).await
    }

    async fn summary(&self, register: &CashRegister) -> Result<CashRegisterSummary, DomainError> {
        let aggregate = self.registers.sales_aggregate(register.id).await?;
        Ok(CashRegisterSummary::new(register.opening_balance, aggregate))
    }

    async fn with_summary(&self, register: CashRegister) -> Result<CashRegisterDetail, DomainError> {
        let summary = self.summary(&register).await?;
        Ok(CashRegisterDetail { register, summary })
    }
}
