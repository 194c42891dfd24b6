//! # Convenience
//!
//! `convenience` provides two small in-process data structures:
//!
//! - [`BidiMap`], a one-to-one map that is looked up by either member of a pair.
//! - [`CachingFactory`] and [`CachingFactory2`], which wrap a production
//!   function and produce each distinct argument at most once until evicted.
//!
//! ```rust
//! use std::sync::Arc;
//! use convenience::prelude::*;
//!
//! fn main() {
//!     let mut ports = bidimap! { "http" => 80, "https" => 443 }.unwrap();
//!     assert_eq!(ports.get_by_first(&"https"), Ok(&443));
//!     assert_eq!(ports.get_by_second(&80), Ok(&"http"));
//!     assert_eq!(ports.add_by_first("www", 80), Err(Error::DuplicateKey(Side::Second)));
//!
//!     let mut lengths = CachingFactory::new(|s: &String| s.len());
//!     let first = lengths.get("foo".to_string());
//!     assert!(Arc::ptr_eq(&first, &lengths.get("foo".to_string())));
//! }
//! ```
//!
//! Neither structure is synchronized. Wrap it in a lock if it has to be
//! shared between threads.

#![allow(clippy::needless_doctest_main)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod bidimap;
mod config;
mod error;
mod factory;

pub use crate::bidimap::{BidiMap, IntoIter, Iter};
pub use crate::config::{EvictionPolicy, FactoryConfig};
pub use crate::error::{Error, Side};
pub use crate::factory::{CachingFactory, CachingFactory2};

pub mod prelude {
    //! Re-exports important traits and types.

    pub use crate::bidimap;
    pub use crate::bidimap::BidiMap;
    pub use crate::config::{EvictionPolicy, FactoryConfig};
    pub use crate::error::{Error, Side};
    pub use crate::factory::{CachingFactory, CachingFactory2};
}

/// A typedef of the result returned by many methods.
pub type Result<T, E = crate::error::Error> = std::result::Result<T, E>;
