pub mod base;
pub mod login;
pub mod registry;
pub mod search;
pub mod signup;
pub mod title;

pub use base::{failure, ActionContext, ActionScript, Outcome, OutcomeStatus};
pub use login::LoginScript;
pub use registry::ScriptRegistry;
pub use search::SearchBarScript;
pub use signup::SignUpScript;
pub use title::CheckTitleScript;
