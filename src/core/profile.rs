//! Per-site configuration table: which strategies run for each role, in
//! what order, with which keywords and attribute predicates, plus the fixed
//! identifiers the credentialed flows need on a given site.

use crate::core::{AttributePredicate, Locator, StrategyKind};
use crate::intent::Role;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    pub name: String,
    pub expected_title: Option<String>,
    pub search_query: String,
    pub roles: RoleTable,
    pub fixtures: SiteFixtures,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleTable {
    pub login_control: RoleProfile,
    pub signup_control: RoleProfile,
    pub search_input: RoleProfile,
}

/// Strategy tables for one role. An empty table turns its strategy into a
/// no-op without disturbing the order of the others.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleProfile {
    pub strategy_order: Vec<StrategyKind>,
    /// Button-like tags scanned by the keyword strategy.
    pub text_tags: Vec<String>,
    /// Lower-case keywords matched against visible text.
    pub keywords: Vec<String>,
    pub attribute_predicates: Vec<AttributePredicate>,
    /// Address attribute-predicate matches by their `id` afterwards.
    pub return_identifier: bool,
    /// Fragments looked for inside `id` or `class` attributes.
    pub identifier_fragments: Vec<String>,
    pub fallback_tag: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteFixtures {
    pub login_form: Option<LoginForm>,
    pub signup_form: Option<SignupForm>,
    /// Marker that appears once the sign-up area has finished loading.
    pub signup_overlay: Option<Locator>,
    /// Marker that appears once search results are rendered.
    pub search_results: Option<Locator>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginForm {
    pub container: Locator,
    pub email_field: Locator,
    pub password_field: Locator,
    pub submit: Locator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupForm {
    pub email_field: Locator,
    pub mobile_field: Locator,
    #[serde(default = "default_submit_tags")]
    pub submit_tags: Vec<String>,
    pub submit_keywords: Vec<String>,
}

fn default_submit_tags() -> Vec<String> {
    vec!["button".to_string()]
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl RoleTable {
    pub fn get(&self, role: Role) -> &RoleProfile {
        match role {
            Role::LoginControl => &self.login_control,
            Role::SignupControl => &self.signup_control,
            Role::SearchInput => &self.search_input,
        }
    }

    pub fn get_mut(&mut self, role: Role) -> &mut RoleProfile {
        match role {
            Role::LoginControl => &mut self.login_control,
            Role::SignupControl => &mut self.signup_control,
            Role::SearchInput => &mut self.search_input,
        }
    }
}

impl RoleProfile {
    /// Profile with every strategy in priority order and empty tables.
    pub fn empty() -> Self {
        Self {
            strategy_order: StrategyKind::PRIORITY.to_vec(),
            text_tags: vec![],
            keywords: vec![],
            attribute_predicates: vec![],
            return_identifier: false,
            identifier_fragments: vec![],
            fallback_tag: None,
        }
    }
}

impl Default for RoleProfile {
    fn default() -> Self {
        Self::empty()
    }
}

impl Default for RoleTable {
    fn default() -> Self {
        Self {
            login_control: RoleProfile {
                text_tags: strings(&["button", "a"]),
                keywords: strings(&["login", "sign in"]),
                identifier_fragments: strings(&["login"]),
                ..RoleProfile::empty()
            },
            signup_control: RoleProfile {
                text_tags: strings(&["button", "a"]),
                keywords: strings(&["sign up", "register"]),
                identifier_fragments: strings(&["signup"]),
                ..RoleProfile::empty()
            },
            search_input: RoleProfile {
                attribute_predicates: vec![AttributePredicate::new("input").with("type", "search")],
                return_identifier: true,
                ..RoleProfile::empty()
            },
        }
    }
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            name: "generic".to_string(),
            expected_title: None,
            search_query: "DevOps".to_string(),
            roles: RoleTable::default(),
            fixtures: SiteFixtures::default(),
        }
    }
}

impl SiteProfile {
    pub fn from_toml_str(raw: &str) -> crate::errors::Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}
