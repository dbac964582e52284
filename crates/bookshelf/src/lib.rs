//! bookshelf: Publisher/Book walkthrough over typed-surreal
//!
//! Creates a publisher and two books, relates them, exercises CONTENT and
//! MERGE updates and a parameterised query, then cleans up.

pub mod library;
pub mod model;
pub mod walkthrough;

pub use library::Library;
pub use model::{Book, Publisher};
