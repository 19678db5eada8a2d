use crate::core::DriverHandle;
use crate::dom::ElementRef;
use crate::errors::Result;
use crate::intent::Role;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How a query addresses nodes in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorKind {
    Id,
    ClassName,
    TagName,
    Css,
    #[serde(rename = "xpath")]
    XPath,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub kind: LocatorKind,
    pub value: String,
}

impl Locator {
    pub fn new(kind: LocatorKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn id(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::Id, value)
    }

    pub fn class_name(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::ClassName, value)
    }

    pub fn tag(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::TagName, value)
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::Css, value)
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::XPath, value)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            LocatorKind::Id => "id",
            LocatorKind::ClassName => "class",
            LocatorKind::TagName => "tag",
            LocatorKind::Css => "css",
            LocatorKind::XPath => "xpath",
        };
        write!(f, "{}={}", kind, self.value)
    }
}

/// Conjunction of exact attribute matches on one tag, e.g.
/// `input[type="search"]` or `input[id="search"][name="search_query"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributePredicate {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl AttributePredicate {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Attribute-filtered structural query for this predicate.
    pub fn to_locator(&self) -> Locator {
        let mut selector = self.tag.clone();
        for (name, value) in &self.attributes {
            selector.push_str(&format!("[{}=\"{}\"]", name, escape_css_string(value)));
        }
        Locator::css(selector)
    }
}

pub(crate) fn escape_css_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// The heuristics available to resolve a role, named as they appear in site
/// profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    KeywordText,
    AttributePredicate,
    IdentifierSubstring,
    TagOnly,
}

impl StrategyKind {
    pub const PRIORITY: [StrategyKind; 4] = [
        StrategyKind::KeywordText,
        StrategyKind::AttributePredicate,
        StrategyKind::IdentifierSubstring,
        StrategyKind::TagOnly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::KeywordText => "keyword_text",
            StrategyKind::AttributePredicate => "attribute_predicate",
            StrategyKind::IdentifierSubstring => "identifier_substring",
            StrategyKind::TagOnly => "tag_only",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One heuristic for mapping a role onto nodes of the current page.
///
/// Implementations hold only their configuration; every call re-queries the
/// live page through the driver.
#[async_trait]
pub trait LocatorStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Candidates in document order, possibly empty.
    async fn locate(&self, driver: &dyn DriverHandle, role: Role) -> Result<Vec<ElementRef>>;

    /// Whether a match should be addressed by its `id` attribute afterwards.
    fn identifies_by_id(&self) -> bool {
        false
    }
}
