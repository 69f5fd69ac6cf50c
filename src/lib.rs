mod classifier;
mod config;
mod devices;
mod error;
mod mobile_agents;
mod pattern;
mod query;
mod resolver;
pub mod testing;
mod types;

pub use classifier::{classify, Decision, MobileClassifier};
pub use config::{ConfigBuilder, Configuration};
pub use devices::{DeviceRegistry, MOBILE};
pub use error::{Error, Result};
pub use mobile_agents::MOBILE_USER_AGENTS;
pub use pattern::DevicePattern;
pub use query::build_search_expression;
pub use resolver::{FormatResolver, TemplateLookup};
pub use types::*;
