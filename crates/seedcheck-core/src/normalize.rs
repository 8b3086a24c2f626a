//! Canonicalization of loosely typed action payloads.
//!
//! Solutions arrive from external sources with inconsistent type names,
//! legacy field names and half-filled selectors. Each payload is resolved
//! into an [`Action`] or dropped; drops never affect sibling actions.

use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::action::{Action, ActionKind, Selector, SelectorKind};
use crate::metrics::METRICS;

/// Default wait duration when a wait action names neither selector nor time.
pub const DEFAULT_WAIT_SECONDS: f64 = 1.0;

/// Why a payload was dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DropReason {
    #[error("payload is not an object")]
    NotAnObject,
    #[error("missing action type")]
    MissingType,
    #[error("navigate action needs url, go_back or go_forward")]
    NoNavigationTarget,
    #[error("{0} action needs non-blank text")]
    BlankText(&'static str),
    #[error("click action needs a selector or x/y coordinates")]
    NoClickTarget,
    #[error("selector is not an object")]
    MalformedSelector,
    #[error("selector value is blank")]
    BlankSelector,
}

enum SelectorField {
    Absent,
    Present(Selector),
    Malformed,
    Blank,
}

/// Resolve `raw` into a canonical action, or `None` if it cannot be used.
pub fn normalize_action(raw: &Value) -> Option<Action> {
    match try_normalize_action(raw) {
        Ok(action) => Some(action),
        Err(reason) => {
            METRICS.inc_actions_dropped();
            debug!(reason = %reason, "dropping action");
            None
        }
    }
}

/// Normalize a batch. The result may be shorter than the input; callers
/// decide whether an emptied batch is an error.
pub fn normalize_actions(raw: &[Value]) -> Vec<Action> {
    let actions: Vec<Action> = raw.iter().filter_map(normalize_action).collect();
    if actions.len() < raw.len() {
        debug!(
            received = raw.len(),
            kept = actions.len(),
            "normalized action batch with drops"
        );
    }
    actions
}

/// Like [`normalize_action`] but reports why a payload was dropped.
pub fn try_normalize_action(raw: &Value) -> Result<Action, DropReason> {
    let mut fields = flatten_attributes(raw.as_object().ok_or(DropReason::NotAnObject)?);

    let raw_type = fields
        .get("type")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(DropReason::MissingType)?
        .to_string();
    let resolved = resolve_type(&raw_type);
    let kind = resolved.kind();

    let selector = match read_selector(fields.get("selector")) {
        SelectorField::Absent => None,
        SelectorField::Present(selector) => Some(selector),
        SelectorField::Malformed if kind.is_interactive() => {
            return Err(DropReason::MalformedSelector)
        }
        SelectorField::Blank if kind.is_interactive() => return Err(DropReason::BlankSelector),
        SelectorField::Malformed => {
            // Opaque actions keep the raw selector among their fields.
            if kind != ActionKind::Other {
                fields.remove("selector");
            }
            None
        }
        SelectorField::Blank => {
            fields.remove("selector");
            None
        }
    };

    match resolved {
        ResolvedType::Navigate => {
            let url = non_blank_str(fields.get("url"));
            let go_back = truthy(fields.get("go_back"));
            let go_forward = truthy(fields.get("go_forward"));
            if url.is_none() && !go_back && !go_forward {
                return Err(DropReason::NoNavigationTarget);
            }
            Ok(Action::Navigate {
                selector,
                url,
                go_back,
                go_forward,
            })
        }
        ResolvedType::Wait => {
            let time_seconds = fields
                .get("time_seconds")
                .filter(|v| !v.is_null())
                .or_else(|| fields.get("timeout_seconds"))
                .and_then(as_f64);
            let time_seconds = match (&selector, time_seconds) {
                (None, None) => Some(DEFAULT_WAIT_SECONDS),
                (_, secs) => secs,
            };
            Ok(Action::Wait {
                selector,
                time_seconds,
            })
        }
        ResolvedType::Type => {
            let text = fields
                .get("text")
                .filter(|v| !v.is_null())
                .or_else(|| fields.get("value"));
            let text = non_blank_text(text).ok_or(DropReason::BlankText("type"))?;
            Ok(Action::Type { selector, text })
        }
        ResolvedType::SelectOption => {
            let text =
                non_blank_text(fields.get("text")).ok_or(DropReason::BlankText("select option"))?;
            Ok(Action::SelectOption { selector, text })
        }
        ResolvedType::Click => {
            let x = fields.get("x").and_then(as_coordinate);
            let y = fields.get("y").and_then(as_coordinate);
            if selector.is_none() && (x.is_none() || y.is_none()) {
                return Err(DropReason::NoClickTarget);
            }
            Ok(Action::Click { selector, x, y })
        }
        ResolvedType::Other(tag) => {
            fields.remove("type");
            if selector.is_some() {
                fields.remove("selector");
            }
            Ok(Action::Other {
                tag,
                selector,
                fields,
            })
        }
    }
}

fn flatten_attributes(raw: &Map<String, Value>) -> Map<String, Value> {
    let mut fields = raw.clone();
    if let Some(Value::Object(nested)) = fields.remove("attributes") {
        for (key, value) in nested {
            fields.insert(key, value);
        }
    } else if let Some(other) = raw.get("attributes") {
        fields.insert("attributes".to_string(), other.clone());
    }
    fields
}

enum ResolvedType {
    Navigate,
    Click,
    Type,
    Wait,
    SelectOption,
    Other(String),
}

impl ResolvedType {
    fn kind(&self) -> ActionKind {
        match self {
            Self::Navigate => ActionKind::Navigate,
            Self::Click => ActionKind::Click,
            Self::Type => ActionKind::Type,
            Self::Wait => ActionKind::Wait,
            Self::SelectOption => ActionKind::SelectOption,
            Self::Other(_) => ActionKind::Other,
        }
    }
}

fn resolve_type(raw: &str) -> ResolvedType {
    let lower = raw.to_lowercase();
    let base = lower.strip_suffix("action").unwrap_or(lower.as_str());
    match base.trim_end_matches(['_', '-']) {
        "navigate" => ResolvedType::Navigate,
        "click" => ResolvedType::Click,
        "input" | "type" => ResolvedType::Type,
        "wait" => ResolvedType::Wait,
        "selectdropdownoption" | "select" => ResolvedType::SelectOption,
        _ if raw.ends_with("Action") => ResolvedType::Other(raw.to_string()),
        _ => ResolvedType::Other(format!("{}Action", title_case(strip_action_suffix(raw)))),
    }
}

/// `raw` without a trailing `action` in any letter case.
fn strip_action_suffix(raw: &str) -> &str {
    const SUFFIX: &str = "action";
    raw.len()
        .checked_sub(SUFFIX.len())
        .filter(|&at| raw.is_char_boundary(at) && raw[at..].eq_ignore_ascii_case(SUFFIX))
        .map_or(raw, |at| &raw[..at])
}

/// `"hover_element"` → `"HoverElement"`.
fn title_case(raw: &str) -> String {
    raw.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

fn read_selector(raw: Option<&Value>) -> SelectorField {
    let obj = match raw {
        None | Some(Value::Null) => return SelectorField::Absent,
        Some(Value::Object(obj)) => obj,
        Some(_) => return SelectorField::Malformed,
    };

    let Some(value) = non_blank_text(obj.get("value")) else {
        return SelectorField::Blank;
    };

    let declared = obj
        .get("type")
        .and_then(Value::as_str)
        .and_then(|t| match t.trim().to_lowercase().as_str() {
            "xpathselector" | "xpath" => Some(SelectorKind::Xpath),
            "attributevalueselector" | "attribute" => Some(SelectorKind::Attribute),
            _ => None,
        });
    let kind = declared.unwrap_or_else(|| {
        if value.starts_with("//") || value.starts_with("(//") {
            SelectorKind::Xpath
        } else {
            SelectorKind::Attribute
        }
    });

    SelectorField::Present(Selector {
        kind,
        attribute: non_blank_str(obj.get("attribute")),
        value,
        case_sensitive: obj
            .get("case_sensitive")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::Null) | None => false,
    }
}

fn non_blank_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// Text-like field: strings as-is, numbers and booleans stringified.
fn non_blank_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.trim().is_empty()).then_some(text)
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_coordinate(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        _ => None,
    }
}
