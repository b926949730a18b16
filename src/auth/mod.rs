//! Authentication: credential token derivation and the SSO session manager.

pub mod encoder;
pub mod session;
