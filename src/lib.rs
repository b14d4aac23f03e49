//! debtbook library: customer import pipeline and debt ledger

pub mod admin;
pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod handlers;
pub mod services;
pub mod types;
