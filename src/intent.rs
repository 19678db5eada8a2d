//! Maps an instruction onto one of the supported checks.
//!
//! Matching is a literal, case-sensitive substring test of
//! `"Run tests on <subject>"` against a fixed trigger table. There is no
//! fuzzy matching and no synonyms: an instruction that names none of the
//! subjects is unsupported.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Carrier every trigger phrase is embedded in.
pub const CARRIER: &str = "Run tests on ";

/// Trigger subjects, checked in this order.
pub const TRIGGERS: [(Intent, &str); 4] = [
    (Intent::Login, "login button"),
    (Intent::CheckTitle, "check title"),
    (Intent::SignUp, "sign up"),
    (Intent::SearchBar, "search bar"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CheckTitle,
    Login,
    SignUp,
    SearchBar,
}

/// The UI affordance an intent exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    LoginControl,
    SignupControl,
    SearchInput,
}

impl Intent {
    pub fn role(&self) -> Option<Role> {
        match self {
            Intent::CheckTitle => None,
            Intent::Login => Some(Role::LoginControl),
            Intent::SignUp => Some(Role::SignupControl),
            Intent::SearchBar => Some(Role::SearchInput),
        }
    }

    /// The full instruction that selects this intent.
    pub fn trigger_phrase(&self) -> String {
        let subject = TRIGGERS
            .iter()
            .find(|(intent, _)| intent == self)
            .map(|(_, subject)| *subject)
            .unwrap_or_default();
        format!("{}{}", CARRIER, subject)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Intent::CheckTitle => "check title",
            Intent::Login => "login",
            Intent::SignUp => "sign up",
            Intent::SearchBar => "search bar",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::LoginControl => "login control",
            Role::SignupControl => "signup control",
            Role::SearchInput => "search input",
        };
        f.write_str(name)
    }
}

pub fn interpret(instruction: &str) -> Option<Intent> {
    TRIGGERS
        .iter()
        .find(|(_, subject)| instruction.contains(&format!("{}{}", CARRIER, subject)))
        .map(|(intent, _)| *intent)
}
