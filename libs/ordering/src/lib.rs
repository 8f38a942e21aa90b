//! `order_by` sort clauses
//!
//! Parses clauses such as `author.name desc, title` into an [`OrderBy`] and checks
//! them against a message schema:
//!
//! ```ignore
//! let order = aip_ordering::OrderBy::parse("rating desc, title")?;
//! order.validate(book.as_ref())?;
//! ```

pub mod error;
pub mod order_by;

pub use error::{Error, Result};
pub use order_by::{Direction, OrderBy, OrderField};
