pub mod actions;
pub mod browser;
pub mod core;
pub mod dom;
pub mod errors;
pub mod intent;
pub mod locator;
pub mod testing;
pub mod types;
pub mod utils;

pub use actions::{Outcome, OutcomeStatus};
#[cfg(feature = "chrome")]
pub use browser::{run, ChromeDriver};
pub use browser::{RunReport, Session};
pub use crate::core::{Config, DriverHandle, SiteProfile};
pub use errors::{ProbeError, Result};
pub use intent::{interpret, Intent, Role};
pub use locator::{ElementResolver, Resolution, ResolverState};
pub use types::*;
