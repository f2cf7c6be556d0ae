// src/backend/utils/mod.rs

pub mod guards;
pub mod log;
pub mod rate_limit;
pub mod time;
