//! Core business logic for Cuadra.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `register` - Cash register sessions, the cash ledger and closing reconciliation

pub mod register;
