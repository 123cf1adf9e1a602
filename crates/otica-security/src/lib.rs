//! # Otica Security
//! 
//! Security utilities: JWT access tokens, password hashing, opaque refresh tokens.

pub mod jwt;
pub mod password;
pub mod refresh_token;

pub use jwt::{Claims, IssuedToken, JwtError, JwtService};
pub use password::{PasswordError, PasswordService};
