//! Library crate for `chaintool`: named, parameterized commandlines and
//! ordered sequences of them, stored as flat files and guarded by
//! cooperative multi-process file locks.

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod session;
pub mod system;
