//! `airtrack` - In-memory query and aggregation engine for flight analytics
//!
//! This library loads a flight dataset into an immutable in-memory record
//! store and answers a catalog of canned analytical queries over flights,
//! aircraft, airports, and airlines.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod aggregate;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod logging;
pub mod model;
pub mod store;

pub use catalog::{Catalog, QueryParams, QueryResult};
pub use config::Config;
pub use error::{Error, Result};
pub use filter::FilterSpec;
pub use logging::init_logging;
pub use model::{Aircraft, Airline, Airport, Flight, FlightStatus};
pub use store::{Dataset, DatasetBuilder, RecordStore};
