//! Application-wide constants

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_BEARER: &str = "Bearer";
pub const DEFAULT_ACCESS_TOKEN_EXPIRY: i64 = 900;
pub const DEFAULT_REFRESH_TOKEN_EXPIRY: i64 = 604800;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;
pub const DEFAULT_ADMIN_ROLE: &str = "admin";
pub const DEFAULT_LOGIN_ATTEMPTS_PER_MINUTE: u32 = 10;
pub const CPF_LENGTH: usize = 11;
pub const CNPJ_LENGTH: usize = 14;
