//! Input collaborator: enumerate photos in natural order, fingerprint, and decode them.

pub(crate) mod decode;
pub(crate) mod natural;
pub(crate) mod scan;
