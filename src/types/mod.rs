//! Type definitions

pub mod customer;
pub mod debt;
pub mod import;
pub mod user;

pub use customer::*;
pub use debt::*;
pub use import::*;
pub use user::*;
