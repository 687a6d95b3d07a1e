//! Shared utility functions.
//!
//! - `text`: number parsing from rendered labels
//! - `url`: place URL preparation

mod text;
mod url;

pub use self::text::first_integer;
pub use self::url::{normalize_place_url, resolve_place_url, UrlError};
