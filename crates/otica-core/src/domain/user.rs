//! User domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use otica_shared::constants::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
use otica_shared::utils::normalize_email;
use otica_shared::EntityId;

use crate::error::DomainError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    /// Role names, used as JWT claims
    pub roles: Vec<String>,
    pub role_ids: Vec<EntityId>,
    pub sector_ids: Vec<EntityId>,
    pub company_ids: Vec<EntityId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn can_login(&self) -> bool {
        self.active
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAssociations {
    #[serde(default)]
    pub role_ids: Vec<EntityId>,
    #[serde(default)]
    pub sector_ids: Vec<EntityId>,
    #[serde(default)]
    pub company_ids: Vec<EntityId>,
}

impl UserAssociations {
    fn dedup(mut self) -> Self {
        for ids in [&mut self.role_ids, &mut self.sector_ids, &mut self.company_ids] {
            ids.sort_unstable();
            ids.dedup();
        }
        self
    }
}

/// Body of `POST /users` and `PUT /users/{id}`. `password` is required on create only.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct UserInput {
    #[validate(length(min = 2, max = 150, message = "must have between 2 and 150 characters"))]
    pub name: String,
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(flatten)]
    pub associations: UserAssociations,
}

fn default_active() -> bool {
    true
}

impl UserInput {
    pub fn normalize(self, password_required: bool) -> Result<Self, DomainError> {
        let input = Self {
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
            password: self.password.filter(|p| !p.is_empty()),
            active: self.active,
            associations: self.associations.dedup(),
        };
        input.validate()?;

        match &input.password {
            Some(password) => validate_password(password)?,
            None if password_required => {
                return Err(DomainError::validation("password: is required"));
            }
            None => {}
        }
        Ok(input)
    }
}

pub fn validate_password(password: &str) -> Result<(), DomainError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(DomainError::validation(format!(
            "password: must have at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(DomainError::validation(format!(
            "password: must have at most {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// User row ready to insert, password already hashed
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub active: bool,
    pub associations: UserAssociations,
}

/// Replacement values for an existing user; `None` keeps the current hash.
#[derive(Debug, Clone, PartialEq)]
pub struct UserUpdate {
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub active: bool,
    pub associations: UserAssociations,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(password: Option<&str>) -> UserInput {
        UserInput {
            name: "Ana Lima".into(),
            email: "  Ana@Otica.COM ".into(),
            password: password.map(String::from),
            active: true,
            associations: UserAssociations {
                role_ids: vec![2, 1, 2],
                sector_ids: vec![],
                company_ids: vec![5],
            },
        }
    }

    #[test]
    fn test_normalize_email_and_associations() {
        let normalized = input(Some("s3cret-pass")).normalize(true).unwrap();
        assert_eq!(normalized.email, "ana@otica.com");
        assert_eq!(normalized.associations.role_ids, vec![1, 2]);
    }

    #[test]
    fn test_password_rules() {
        assert!(input(None).normalize(true).is_err());
        assert!(input(None).normalize(false).is_ok());
        assert!(input(Some("short")).normalize(false).is_err());
        let long = "x".repeat(MAX_PASSWORD_LENGTH + 1);
        assert!(input(Some(&long)).normalize(true).is_err());
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let now = Utc::now();
        let user = User {
            id: 1,
            name: "Ana".into(),
            email: "ana@otica.com".into(),
            password_hash: "$argon2id$secret".into(),
            active: true,
            last_login_at: None,
            roles: vec!["Admin".into()],
            role_ids: vec![1],
            sector_ids: vec![],
            company_ids: vec![],
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(user.has_role("admin"));
    }

    #[test]
    fn test_flattened_association_fields() {
        let input: UserInput = serde_json::from_str(
            r#"{"name":"Ana","email":"ana@otica.com","password":"12345678","role_ids":[1],"sector_ids":[3]}"#,
        )
        .unwrap();
        assert_eq!(input.associations.role_ids, vec![1]);
        assert_eq!(input.associations.sector_ids, vec![3]);
        assert!(input.associations.company_ids.is_empty());
    }
}
