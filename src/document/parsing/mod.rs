//! Document parsing utilities
//!
//! Style conversion and list numbering used when building the rich legacy
//! document model.

pub(crate) mod formatting;
pub mod numbering;
