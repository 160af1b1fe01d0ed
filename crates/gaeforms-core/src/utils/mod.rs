//! Utility types and functions.
//!
//! - [`MultiValueDict`]: an insertion-ordered dictionary holding several values per key.
//! - [`text`]: string helpers used to derive field labels.

mod multi_value_dict;
pub mod text;

pub use multi_value_dict::MultiValueDict;
