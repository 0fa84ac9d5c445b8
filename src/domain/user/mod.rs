//! User aggregate
//!
//! Accounts for all four roles, their profile data and the password reset
//! state machine.

pub mod model;
pub mod repository;
pub mod reset;

mod dto;

pub use dto::{CreateUserDto, GetUserDto, UpdateUserDto};
pub use model::{ProfilePhoto, StudentProfile, User, UserRole};
pub use repository::UserRepository;
pub use reset::PasswordReset;
