#![cfg_attr(not(feature = "std"), no_std)]

#[macro_use]
mod fmt;

pub mod datatypes;
pub mod peripheral_traits;
pub mod power_manager;
pub mod services;
pub mod utils;
pub mod xerror;
