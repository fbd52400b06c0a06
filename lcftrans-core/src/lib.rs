pub mod cli;
pub mod error;
pub mod model;
pub mod parsers;
pub mod services;

pub use error::{Error, ParseError, Result};
pub use model::catalog::Catalog;
pub use model::entry::Entry;
