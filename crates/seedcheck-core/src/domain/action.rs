//! Canonical browser actions consumed by an executor.
//!
//! Raw payloads arrive loosely typed; [`crate::normalize`] resolves them into
//! this closed set once so downstream code never re-tests type strings.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use serde_json::{Map, Value};

/// How a selector locates an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, Deserialize)]
pub enum SelectorKind {
    #[serde(rename = "xpathSelector")]
    Xpath,
    #[serde(rename = "attributeValueSelector")]
    Attribute,
}

/// Element locator.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct Selector {
    #[serde(rename = "type")]
    pub kind: SelectorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    pub value: String,
    #[serde(default)]
    pub case_sensitive: bool,
}

impl Selector {
    pub fn xpath(value: impl Into<String>) -> Self {
        Self {
            kind: SelectorKind::Xpath,
            attribute: None,
            value: value.into(),
            case_sensitive: false,
        }
    }

    pub fn attribute(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: SelectorKind::Attribute,
            attribute: Some(attribute.into()),
            value: value.into(),
            case_sensitive: false,
        }
    }
}

/// Discriminant of [`Action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Navigate,
    Click,
    Type,
    Wait,
    SelectOption,
    Other,
}

impl ActionKind {
    /// Interactive actions target an element and are useless without a selector
    /// (or coordinates, for clicks).
    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Click | Self::Type | Self::SelectOption)
    }
}

/// One canonical browser action.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Navigate {
        selector: Option<Selector>,
        url: Option<String>,
        go_back: bool,
        go_forward: bool,
    },
    Click {
        selector: Option<Selector>,
        x: Option<i64>,
        y: Option<i64>,
    },
    Type {
        selector: Option<Selector>,
        text: String,
    },
    Wait {
        selector: Option<Selector>,
        time_seconds: Option<f64>,
    },
    SelectOption {
        selector: Option<Selector>,
        text: String,
    },
    /// An action type outside the known set, kept under a best-guess tag.
    Other {
        tag: String,
        selector: Option<Selector>,
        fields: Map<String, Value>,
    },
}

impl Action {
    pub fn navigate(url: impl Into<String>) -> Self {
        Self::Navigate {
            selector: None,
            url: Some(url.into()),
            go_back: false,
            go_forward: false,
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Navigate { .. } => ActionKind::Navigate,
            Self::Click { .. } => ActionKind::Click,
            Self::Type { .. } => ActionKind::Type,
            Self::Wait { .. } => ActionKind::Wait,
            Self::SelectOption { .. } => ActionKind::SelectOption,
            Self::Other { .. } => ActionKind::Other,
        }
    }

    /// Wire tag, e.g. `NavigateAction`.
    pub fn tag(&self) -> &str {
        match self {
            Self::Navigate { .. } => "NavigateAction",
            Self::Click { .. } => "ClickAction",
            Self::Type { .. } => "TypeAction",
            Self::Wait { .. } => "WaitAction",
            Self::SelectOption { .. } => "SelectDropDownOptionAction",
            Self::Other { tag, .. } => tag,
        }
    }

    pub fn selector(&self) -> Option<&Selector> {
        match self {
            Self::Navigate { selector, .. }
            | Self::Click { selector, .. }
            | Self::Type { selector, .. }
            | Self::Wait { selector, .. }
            | Self::SelectOption { selector, .. }
            | Self::Other { selector, .. } => selector.as_ref(),
        }
    }

    /// Navigation target, if this is a URL navigation.
    pub fn navigate_url(&self) -> Option<&str> {
        match self {
            Self::Navigate { url, .. } => url.as_deref(),
            _ => None,
        }
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.tag())?;
        if let Some(selector) = self.selector() {
            map.serialize_entry("selector", selector)?;
        }
        match self {
            Self::Navigate {
                url,
                go_back,
                go_forward,
                ..
            } => {
                if let Some(url) = url {
                    map.serialize_entry("url", url)?;
                }
                map.serialize_entry("go_back", go_back)?;
                map.serialize_entry("go_forward", go_forward)?;
            }
            Self::Click { x, y, .. } => {
                if let (Some(x), Some(y)) = (x, y) {
                    map.serialize_entry("x", x)?;
                    map.serialize_entry("y", y)?;
                }
            }
            Self::Type { text, .. } | Self::SelectOption { text, .. } => {
                map.serialize_entry("text", text)?;
            }
            Self::Wait { time_seconds, .. } => {
                if let Some(secs) = time_seconds {
                    map.serialize_entry("time_seconds", secs)?;
                }
            }
            Self::Other {
                fields, selector, ..
            } => {
                for (key, value) in fields {
                    if key == "type" || (key == "selector" && selector.is_some()) {
                        continue;
                    }
                    map.serialize_entry(key, value)?;
                }
            }
        }
        map.end()
    }
}
