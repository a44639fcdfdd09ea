// src/core/mod.rs

pub mod locks;
pub mod ops;
pub mod paths;
pub mod printer;
pub mod store;
pub mod template;
