pub mod config;
pub mod core;
pub mod dom;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::CardSettings;
pub use crate::core::{card::TimezoneCard, view::CardView};
pub use dom::{Document, NodeRef};
pub use domain::model::{CardConfiguration, ElementsQuery, ServiceRef, UpdateRequest};
pub use domain::ports::{TimeBroadcast, TimeHandler};
pub use utils::error::{CardError, Result};
