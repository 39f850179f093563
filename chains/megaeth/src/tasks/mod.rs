//! Per-account task bodies, one module per workflow family.

pub mod faucet;
pub mod mint;
