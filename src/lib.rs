//! CardIdle - idle clicker collectible card game library
//!
//! Currency ledger, passive production, loot packs with pity, the card
//! inventory and its filtered view, achievements, and save/load. Front ends
//! drive a [`core::Game`] with explicit timestamps.

pub mod achievements;
pub mod booster;
pub mod build_info;
pub mod cards;
pub mod collection;
pub mod core;
pub mod currency;
pub mod persistence;
pub mod production;
