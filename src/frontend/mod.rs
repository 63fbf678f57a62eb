//! On-screen frontends.
//!
//! Only compiled when a frontend feature is enabled (see `Cargo.toml`).

#[cfg(feature = "frontend-gtk")]
pub mod gtk;
