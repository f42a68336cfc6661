//! Route handlers of the starter service.

pub mod health;
pub mod info;
pub mod sample;
