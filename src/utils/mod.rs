//! Generic helpers over plain data.
//!
//! - `arrays` - Array set operations and falsiness
//! - `io` - File I/O with consistent error handling
//! - `objects` - JSON object traversal, merge and patch
//! - `pattern` - Wildcard patterns as regexes
//! - `strings` - Word splitting and case conversion

pub mod arrays;
pub mod io;
pub mod objects;
pub mod pattern;
pub mod strings;
