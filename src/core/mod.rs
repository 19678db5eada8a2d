pub mod config;
pub mod driver;
pub mod locator;
pub mod profile;

pub use config::{BrowserConfig, Config, Viewport, WaitConfig};
pub use driver::{DriverHandle, ScriptArg, WaitCondition};
pub use locator::{AttributePredicate, Locator, LocatorKind, LocatorStrategy, StrategyKind};
pub use profile::{LoginForm, RoleProfile, RoleTable, SignupForm, SiteFixtures, SiteProfile};
