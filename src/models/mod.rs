//! Database models for the ERP records read by the dashboard.

pub mod employee;
pub mod material;
pub mod order;
pub mod party;
pub mod user;
