//! Client domain entity

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use otica_shared::constants::CPF_LENGTH;
use otica_shared::utils::{blank_to_none, only_digits};
use otica_shared::EntityId;

use crate::error::DomainError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: EntityId,
    pub name: String,
    pub cpf: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /clients` and `PUT /clients/{id}`
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct ClientInput {
    #[validate(length(min = 2, max = 150, message = "must have between 2 and 150 characters"))]
    pub name: String,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(email(message = "must be a valid email"))]
    pub email: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl ClientInput {
    /// Validates the input and returns it in storage form (trimmed, CPF as digits).
    pub fn normalize(self) -> Result<Self, DomainError> {
        let input = Self {
            name: self.name.trim().to_string(),
            cpf: blank_to_none(self.cpf).map(|c| only_digits(&c)),
            phone: blank_to_none(self.phone),
            email: blank_to_none(self.email).map(|e| e.to_lowercase()),
            birth_date: self.birth_date,
            address: blank_to_none(self.address),
            notes: blank_to_none(self.notes),
        };
        input.validate()?;

        if let Some(cpf) = &input.cpf {
            if !is_valid_cpf(cpf) {
                return Err(DomainError::validation("cpf: invalid CPF"));
            }
        }
        if let Some(birth_date) = input.birth_date {
            if birth_date > Utc::now().date_naive() {
                return Err(DomainError::validation("birth_date: must not be in the future"));
            }
        }
        Ok(input)
    }
}

/// CPF check: 11 digits, not a repeated digit, both verifier digits match.
pub fn is_valid_cpf(cpf: &str) -> bool {
    let digits: Vec<u32> = cpf.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != CPF_LENGTH || cpf.len() != CPF_LENGTH {
        return false;
    }
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let verifier = |len: usize| -> u32 {
        let sum: u32 = digits[..len]
            .iter()
            .enumerate()
            .map(|(i, d)| d * (len as u32 + 1 - i as u32))
            .sum();
        let rest = (sum * 10) % 11;
        if rest == 10 { 0 } else { rest }
    };

    verifier(9) == digits[9] && verifier(10) == digits[10]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, cpf: Option<&str>) -> ClientInput {
        ClientInput {
            name: name.to_string(),
            cpf: cpf.map(String::from),
            phone: None,
            email: None,
            birth_date: None,
            address: None,
            notes: None,
        }
    }

    #[test]
    fn test_cpf_check_digits() {
        assert!(is_valid_cpf("52998224725"));
        assert!(is_valid_cpf("11144477735"));
        assert!(!is_valid_cpf("52998224724"));
        assert!(!is_valid_cpf("11111111111"));
        assert!(!is_valid_cpf("1234"));
    }

    #[test]
    fn test_normalize_strips_cpf_punctuation() {
        let normalized = input("  Maria Souza ", Some("529.982.247-25")).normalize().unwrap();
        assert_eq!(normalized.name, "Maria Souza");
        assert_eq!(normalized.cpf.as_deref(), Some("52998224725"));
    }

    #[test]
    fn test_blank_cpf_becomes_none() {
        let normalized = input("Maria", Some("  ")).normalize().unwrap();
        assert_eq!(normalized.cpf, None);
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        assert!(matches!(input("M", None).normalize(), Err(DomainError::ValidationError(_))));
        assert!(matches!(
            input("Maria", Some("123.456.789-00")).normalize(),
            Err(DomainError::ValidationError(_))
        ));

        let mut bad_email = input("Maria", None);
        bad_email.email = Some("not-an-email".into());
        assert!(bad_email.normalize().is_err());
    }
}
