//! API Controller modules
//!
//! Routes are registered at the server root.

pub mod farms;
pub mod liquidity;
pub mod price;
pub mod version;
