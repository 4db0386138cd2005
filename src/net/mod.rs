//! Network utilities.

pub mod public_ip;

pub use public_ip::PublicIpResolver;
