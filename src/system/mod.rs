// src/system/mod.rs

pub mod executor;
pub mod shortcuts;
pub mod vtools;
