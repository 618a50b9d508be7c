//! Helper functions for page templates
//!
//! URL building, timestamp display and text shortening shared by the
//! server handlers and the Tera filters.

mod date;
mod text;
mod url;

pub use date::*;
pub use text::*;
pub use url::*;
