//! Supplier domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use otica_shared::constants::CNPJ_LENGTH;
use otica_shared::utils::{blank_to_none, only_digits};
use otica_shared::EntityId;

use crate::error::DomainError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: EntityId,
    pub name: String,
    pub cnpj: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub contact_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct SupplierInput {
    #[validate(length(min = 2, max = 150, message = "must have between 2 and 150 characters"))]
    pub name: String,
    #[serde(default)]
    pub cnpj: Option<String>,
    #[serde(default)]
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(email(message = "must be a valid email"))]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub contact_name: Option<String>,
}

impl SupplierInput {
    pub fn normalize(self) -> Result<Self, DomainError> {
        let input = Self {
            name: self.name.trim().to_string(),
            cnpj: blank_to_none(self.cnpj).map(|c| only_digits(&c)),
            phone: blank_to_none(self.phone),
            email: blank_to_none(self.email).map(|e| e.to_lowercase()),
            contact_name: blank_to_none(self.contact_name),
        };
        input.validate()?;

        if let Some(cnpj) = &input.cnpj {
            if !is_valid_cnpj(cnpj) {
                return Err(DomainError::validation("cnpj: invalid CNPJ"));
            }
        }
        Ok(input)
    }
}

/// CNPJ check: 14 digits, not a repeated digit, both verifier digits match.
pub fn is_valid_cnpj(cnpj: &str) -> bool {
    let digits: Vec<u32> = cnpj.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != CNPJ_LENGTH || cnpj.len() != CNPJ_LENGTH {
        return false;
    }
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    const FIRST: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
    const SECOND: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

    let verifier = |weights: &[u32]| -> u32 {
        let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
        match sum % 11 {
            0 | 1 => 0,
            rest => 11 - rest,
        }
    };

    verifier(&FIRST) == digits[12] && verifier(&SECOND) == digits[13]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cnpj_check_digits() {
        assert!(is_valid_cnpj("11222333000181"));
        assert!(!is_valid_cnpj("11222333000180"));
        assert!(!is_valid_cnpj("00000000000000"));
        assert!(!is_valid_cnpj("112223330001"));
    }

    #[test]
    fn test_normalize() {
        let input = SupplierInput {
            name: " Zeiss ".into(),
            cnpj: Some("11.222.333/0001-81".into()),
            phone: Some("".into()),
            email: Some("Vendas@Zeiss.com".into()),
            contact_name: None,
        }
        .normalize()
        .unwrap();

        assert_eq!(input.name, "Zeiss");
        assert_eq!(input.cnpj.as_deref(), Some("11222333000181"));
        assert_eq!(input.phone, None);
        assert_eq!(input.email.as_deref(), Some("vendas@zeiss.com"));
    }
}
