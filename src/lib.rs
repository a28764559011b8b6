// src/lib.rs

//! mintwatch: watches the National Bank of Ukraine coin catalog and announces
//! new listings and availability changes.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
