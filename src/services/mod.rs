//! Business logic services

pub mod customer_store;
pub mod customers;
pub mod debts;
pub mod import;
