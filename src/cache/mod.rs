//! Content/config-addressed stage cache.

pub(crate) mod fingerprint;
pub(crate) mod store;
