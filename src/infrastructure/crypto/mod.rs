pub mod jwt;
pub mod password;
pub mod token;

pub use jwt::{create_token, verify_token, JwtConfig, TokenClaims};
pub use password::{hash_password, verify_password};
pub use token::{generate_otp, generate_reset_token};
