//! Shared helpers for the tokenforge contracts and client: the ecrecover
//! backend trait, decimal unit conversion and address display.

pub mod address;
pub mod crypto;
pub mod units;
