//! DNS MX resolution.
//!
//! [`resolve_exchangers`] normalises the domain (IDNA), queries a [`LookupMx`]
//! implementation and returns exchanger hostnames by ascending preference.
//! An empty answer is reported as [`MxError::NoMailExchanger`].

mod error;
mod provider;
mod resolver;
mod types;

pub use error::MxError;
pub use provider::MxProvider;
pub use resolver::{CachingResolver, LookupMx, SystemResolver, normalize_domain, resolve_exchangers};
pub use types::MxRecord;
