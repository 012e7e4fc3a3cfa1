// src/engine/mod.rs

pub mod bridge;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod timer;
