//! Row models and request DTOs.

pub mod customer;
pub mod ticket;
