//! Cash register repository trait (port)

use async_trait::async_trait;

use otica_shared::{EntityId, Page};

use crate::domain::{
    CashRegister, CashRegisterClosing, CloseCashRegisterInput, ListQuery, NewCashRegister, SalesAggregate,
};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait CashRegisterRepository: Send + Sync {
    async fn list(&self, query: &ListQuery) -> Result<Page<CashRegister>, DomainError>;
    async fn find_by_id(&self, id: EntityId) -> Result<Option<CashRegister>, DomainError>;
    async fn find_open(&self) -> Result<Option<CashRegister>, DomainError>;
    /// Fails with `Conflict` when another register is open
    async fn open(&self, register: &NewCashRegister) -> Result<EntityId, DomainError>;
    /// Locks the register, derives the expected balance from its sales and
    /// closes it in one transaction. `None` when the register was not open.
    async fn close(
        &self,
        id: EntityId,
        closed_by: EntityId,
        input: &CloseCashRegisterInput,
    ) -> Result<Option<CashRegisterClosing>, DomainError>;
    async fn sales_aggregate(&self, id: EntityId) -> Result<SalesAggregate, DomainError>;
}
