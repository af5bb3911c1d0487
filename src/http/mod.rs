//! Built-in HTTP collaborators: the reqwest executor and the JSON path
//! extractor.
mod executor;
mod extract;


pub use executor::{ClientSettings, ReqwestExecutor};
pub use extract::JsonPathExtractor;
