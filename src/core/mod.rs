pub mod ent;
pub mod error;
pub mod fetcher;
pub mod logger;
pub mod transformer;
pub use ent::*;
pub use error::{Error, Result};
pub use fetcher::Fetcher;
pub use transformer::{discover, transform};
