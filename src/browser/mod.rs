#[cfg(feature = "chrome")]
pub mod chrome;
pub mod navigation;
pub mod session;

#[cfg(feature = "chrome")]
pub use chrome::ChromeDriver;
pub use navigation::{NavigationManager, NavigationResult};
#[cfg(feature = "chrome")]
pub use session::run;
pub use session::{parse_target, RunReport, Session};
