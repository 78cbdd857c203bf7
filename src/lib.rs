// src/lib.rs

//! sheetsync: mirrors a Google Sheets export into a document store and
//! serves department views of it.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
