use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies the page a handle was issued for: the driver session plus the
/// navigation epoch inside that session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageScope {
    pub session: Uuid,
    pub epoch: u64,
}

impl PageScope {
    pub fn new(session: Uuid) -> Self {
        Self { session, epoch: 0 }
    }

    pub fn next_page(self) -> Self {
        Self {
            session: self.session,
            epoch: self.epoch + 1,
        }
    }
}

/// Descriptor a driver produces for every node a query matched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub handle: String,
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub text: String,
}

impl ElementSnapshot {
    pub fn into_ref(self, scope: PageScope) -> ElementRef {
        ElementRef {
            handle: self.handle,
            scope,
            tag_name: self.tag.to_lowercase(),
            element_id: self.id.filter(|id| !id.is_empty()),
            class_list: self.classes,
            text: self.text,
        }
    }
}

/// Opaque handle to a live DOM node, plus the attributes captured when it was
/// resolved. Only the driver that issued it can act on it, and only until that
/// driver navigates away or closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementRef {
    handle: String,
    scope: PageScope,
    tag_name: String,
    element_id: Option<String>,
    class_list: Vec<String>,
    text: String,
}

impl ElementRef {
    pub fn handle(&self) -> &str {
        &self.handle
    }

    pub fn scope(&self) -> PageScope {
        self.scope
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn element_id(&self) -> Option<&str> {
        self.element_id.as_deref()
    }

    pub fn class_list(&self) -> &[String] {
        &self.class_list
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// True when both handles point at the same node of the same page.
    pub fn same_node(&self, other: &ElementRef) -> bool {
        self.handle == other.handle && self.scope == other.scope
    }

    /// Short CSS-like description used in diagnostics, e.g. `button#go.primary`.
    pub fn describe(&self) -> String {
        let mut description = self.tag_name.clone();
        if let Some(id) = &self.element_id {
            description.push('#');
            description.push_str(id);
        }
        for class in &self.class_list {
            description.push('.');
            description.push_str(class);
        }
        description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(handle: &str) -> ElementSnapshot {
        ElementSnapshot {
            handle: handle.to_string(),
            tag: "BUTTON".to_string(),
            id: Some(String::new()),
            classes: vec!["btn".to_string(), "login".to_string()],
            text: "Log in".to_string(),
        }
    }

    #[test]
    fn snapshot_normalises_tag_and_empty_id() {
        let scope = PageScope::new(Uuid::new_v4());
        let element = snapshot("7").into_ref(scope);

        assert_eq!(element.tag_name(), "button");
        assert_eq!(element.element_id(), None);
        assert_eq!(element.describe(), "button.btn.login");
    }

    #[test]
    fn same_node_requires_same_page() {
        let scope = PageScope::new(Uuid::new_v4());
        let first = snapshot("7").into_ref(scope);
        let again = snapshot("7").into_ref(scope);
        let after_navigation = snapshot("7").into_ref(scope.next_page());

        assert!(first.same_node(&again));
        assert!(!first.same_node(&after_navigation));
    }
}
