//! Clickability heuristics for host elements.
//!
//! The host describes an element as an [`ElementInfo`] snapshot; an
//! [`Interactivity`] implementation decides whether a hover should be allowed
//! to turn into a click. [`HeuristicInteractivity`] applies an ordered list of
//! checks and stops at the first match.

use serde::{Deserialize, Serialize};

const CLICKABLE_TAGS: &[&str] = &[
    "a", "button", "input", "select", "textarea", "label", "summary", "details",
];

const INTERACTIVE_ROLES: &[&str] = &[
    "button",
    "link",
    "menuitem",
    "menuitemcheckbox",
    "menuitemradio",
    "option",
    "tab",
    "checkbox",
    "radio",
    "switch",
    "slider",
    "spinbutton",
    "textbox",
    "combobox",
    "gridcell",
    "treeitem",
];

const INTERACTIVE_DATA_HINTS: &[&str] =
    &["click", "action", "handler", "toggle", "trigger", "interact"];

const INTERACTIVE_CLASS_PATTERNS: &[&str] = &[
    "btn",
    "button",
    "click",
    "link",
    "interactive",
    "action",
    "menu",
    "tab",
    "toggle",
    "card",
    "tile",
    "item",
    "trigger",
    "handle",
];

/// Computed style properties relevant to clickability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedStyle {
    pub cursor: String,
    pub pointer_events: String,
    pub transition: String,
    pub transform: String,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            cursor: "auto".to_string(),
            pointer_events: "auto".to_string(),
            transition: "all 0s ease 0s".to_string(),
            transform: "none".to_string(),
        }
    }
}

/// Results of probing framework internals. `None` means the probe found no
/// framework data on the element (or could not run), which never counts as
/// interactive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameworkHints {
    pub props_click_handler: Option<bool>,
    pub fiber_click_handler: Option<bool>,
    pub component_click_handler: Option<bool>,
    pub registered_click_listener: Option<bool>,
}

/// Snapshot of an element as seen by the clickability check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementInfo {
    /// Lowercase tag name
    pub tag: String,
    /// Attribute name/value pairs in document order
    pub attributes: Vec<(String, String)>,
    /// Class attribute when it is a plain string (absent for e.g. SVG animated classes)
    pub class_name: Option<String>,
    pub style: ComputedStyle,
    #[serde(default)]
    pub framework: FrameworkHints,
}

impl ElementInfo {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            class_name: None,
            style: ComputedStyle::default(),
            framework: FrameworkHints::default(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        if name.eq_ignore_ascii_case("class") {
            self.class_name = Some(value.to_string());
        }
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_class(self, class_name: &str) -> Self {
        self.with_attribute("class", class_name)
    }

    pub fn with_cursor(mut self, cursor: &str) -> Self {
        self.style.cursor = cursor.to_string();
        self
    }

    pub fn with_style(mut self, style: ComputedStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_framework(mut self, framework: FrameworkHints) -> Self {
        self.framework = framework;
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attr, _)| attr.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    fn attribute_names(&self) -> impl Iterator<Item = String> + '_ {
        self.attributes.iter().map(|(name, _)| name.to_ascii_lowercase())
    }
}

/// The individual checks, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heuristic {
    Tag,
    OnClickAttribute,
    EventHandlerAttribute,
    PointerCursor,
    AriaRole,
    TabIndex,
    DataAttribute,
    ContentEditable,
    ClassName,
    FrameworkProps,
    FrameworkFiber,
    FrameworkComponent,
    RegisteredListener,
    VisualAffordance,
}

impl Heuristic {
    pub const ORDER: [Heuristic; 14] = [
        Heuristic::Tag,
        Heuristic::OnClickAttribute,
        Heuristic::EventHandlerAttribute,
        Heuristic::PointerCursor,
        Heuristic::AriaRole,
        Heuristic::TabIndex,
        Heuristic::DataAttribute,
        Heuristic::ContentEditable,
        Heuristic::ClassName,
        Heuristic::FrameworkProps,
        Heuristic::FrameworkFiber,
        Heuristic::FrameworkComponent,
        Heuristic::RegisteredListener,
        Heuristic::VisualAffordance,
    ];

    pub fn is_framework_probe(self) -> bool {
        matches!(
            self,
            Heuristic::FrameworkProps
                | Heuristic::FrameworkFiber
                | Heuristic::FrameworkComponent
                | Heuristic::RegisteredListener
        )
    }

    pub fn matches(self, element: &ElementInfo) -> bool {
        match self {
            Heuristic::Tag => CLICKABLE_TAGS.contains(&element.tag.as_str()),
            Heuristic::OnClickAttribute => element.has_attribute("onclick"),
            Heuristic::EventHandlerAttribute => element.attribute_names().any(|name| {
                name.starts_with("on")
                    || name.starts_with('@')
                    || name.starts_with('(')
                    || name.contains(":click")
                    || name.contains("v-on")
            }),
            Heuristic::PointerCursor => element.style.cursor == "pointer",
            Heuristic::AriaRole => element
                .attribute("role")
                .map(|role| INTERACTIVE_ROLES.contains(&role))
                .unwrap_or(false),
            Heuristic::TabIndex => element
                .attribute("tabindex")
                .and_then(parse_leading_int)
                .map(|index| index >= 0)
                .unwrap_or(false),
            Heuristic::DataAttribute => element.attribute_names().any(|name| {
                name.starts_with("data-")
                    && INTERACTIVE_DATA_HINTS.iter().any(|hint| name.contains(hint))
            }),
            Heuristic::ContentEditable => element.has_attribute("contenteditable"),
            Heuristic::ClassName => element
                .class_name
                .as_deref()
                .map(|class_name| {
                    let lower = class_name.to_ascii_lowercase();
                    INTERACTIVE_CLASS_PATTERNS
                        .iter()
                        .any(|pattern| lower.contains(pattern))
                })
                .unwrap_or(false),
            Heuristic::FrameworkProps => element.framework.props_click_handler == Some(true),
            Heuristic::FrameworkFiber => element.framework.fiber_click_handler == Some(true),
            Heuristic::FrameworkComponent => {
                element.framework.component_click_handler == Some(true)
            }
            Heuristic::RegisteredListener => {
                element.framework.registered_click_listener == Some(true)
            }
            Heuristic::VisualAffordance => {
                let style = &element.style;
                if style.pointer_events == "none" {
                    return false;
                }
                let has_visual_effects = style.transition.contains("transform")
                    || style.transition.contains("opacity")
                    || style.transition.contains("background")
                    || style.transform != "none";
                has_visual_effects
                    && element
                        .class_name
                        .as_deref()
                        .map(|class_name| !class_name.is_empty())
                        .unwrap_or(false)
            }
        }
    }
}

/// Decides whether an element should accept a hold-to-click
pub trait Interactivity: Send + Sync {
    fn is_interactive(&self, element: &ElementInfo) -> bool;
}

/// Ordered heuristic check. Framework probes can be switched off for hosts
/// that do not expose framework internals.
#[derive(Debug, Clone)]
pub struct HeuristicInteractivity {
    probe_frameworks: bool,
}

impl HeuristicInteractivity {
    pub fn new() -> Self {
        Self {
            probe_frameworks: true,
        }
    }

    pub fn without_framework_probes() -> Self {
        Self {
            probe_frameworks: false,
        }
    }

    /// First heuristic that accepts the element
    pub fn matching_heuristic(&self, element: &ElementInfo) -> Option<Heuristic> {
        Heuristic::ORDER
            .iter()
            .copied()
            .filter(|heuristic| self.probe_frameworks || !heuristic.is_framework_probe())
            .find(|heuristic| heuristic.matches(element))
    }
}

impl Default for HeuristicInteractivity {
    fn default() -> Self {
        Self::new()
    }
}

impl Interactivity for HeuristicInteractivity {
    fn is_interactive(&self, element: &ElementInfo) -> bool {
        self.matching_heuristic(element).is_some()
    }
}

/// Integer prefix parse: leading whitespace, optional sign, then digits.
/// `"2px"` parses as 2, `"abc"` does not parse.
fn parse_leading_int(value: &str) -> Option<i64> {
    let trimmed = value.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
