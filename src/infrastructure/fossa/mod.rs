//! FOSSA compliance service integration

mod client;

pub use client::{FossaClient, FossaConfig};
