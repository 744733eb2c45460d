//! # Authentication
//!
//! Session tokens (`token`) and the extractor that turns them back into an
//! account (`middleware`).

pub mod middleware;
pub mod token;
