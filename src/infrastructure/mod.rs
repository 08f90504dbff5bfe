//! Infrastructure adapters implementing the domain ports.

pub mod scripted;
