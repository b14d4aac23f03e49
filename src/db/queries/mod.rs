//! Database queries

pub mod customer;
pub mod debt;
pub mod payment;
pub mod user;
