//! Multi-strategy element descriptors.

use serde::{Deserialize, Serialize};

/// Accessibility role plus optional accessible name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleLocator {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A set of independent strategies for finding one element.
///
/// Every field is optional but a usable descriptor carries at least one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocatorDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<RoleLocator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aria_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xpath: Option<String>,
}

/// Named locator strategy, in resolution priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LocatorStrategy {
    TestId,
    Role,
    AriaLabel,
    Name,
    Id,
    Text,
    Css,
    Xpath,
    /// No strategy matched.
    None,
}

impl LocatorStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocatorStrategy::TestId => "testId",
            LocatorStrategy::Role => "role",
            LocatorStrategy::AriaLabel => "ariaLabel",
            LocatorStrategy::Name => "name",
            LocatorStrategy::Id => "id",
            LocatorStrategy::Text => "text",
            LocatorStrategy::Css => "css",
            LocatorStrategy::Xpath => "xpath",
            LocatorStrategy::None => "none",
        }
    }
}

impl std::fmt::Display for LocatorStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl LocatorDescriptor {
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            css: Some(selector.into()),
            ..Default::default()
        }
    }

    pub fn test_id(id: impl Into<String>) -> Self {
        Self {
            test_id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: impl Into<String>, name: Option<String>) -> Self {
        self.role = Some(RoleLocator {
            role: role.into(),
            name,
        });
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// True when no strategy is present.
    pub fn is_empty(&self) -> bool {
        self.test_id.is_none()
            && self.role.is_none()
            && self.aria_label.is_none()
            && self.name.is_none()
            && self.id.is_none()
            && self.text.is_none()
            && self.css.is_none()
            && self.xpath.is_none()
    }

    /// Drop strategies whose value is an empty string.
    pub fn without_empty(mut self) -> Self {
        fn keep(v: Option<String>) -> Option<String> {
            v.filter(|s| !s.trim().is_empty())
        }
        self.test_id = keep(self.test_id);
        self.aria_label = keep(self.aria_label);
        self.name = keep(self.name);
        self.id = keep(self.id);
        self.text = keep(self.text);
        self.css = keep(self.css);
        self.xpath = keep(self.xpath);
        self.role = self.role.filter(|r| !r.role.trim().is_empty()).map(|r| RoleLocator {
            role: r.role,
            name: keep(r.name),
        });
        self
    }

    /// The most specific human-readable hint for descriptions and logs.
    pub fn hint(&self) -> String {
        if let Some(v) = &self.test_id {
            return format!("[data-testid={}]", v);
        }
        if let Some(r) = &self.role {
            return match &r.name {
                Some(n) => format!("{} \"{}\"", r.role, n),
                None => r.role.clone(),
            };
        }
        if let Some(v) = &self.aria_label {
            return format!("[aria-label={}]", v);
        }
        if let Some(v) = &self.name {
            return format!("[name={}]", v);
        }
        if let Some(v) = &self.id {
            return format!("#{}", v);
        }
        if let Some(v) = &self.text {
            return format!("\"{}\"", v);
        }
        if let Some(v) = &self.css {
            return v.clone();
        }
        self.xpath.clone().unwrap_or_default()
    }
}
