//! Document types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle status of a document version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    #[default]
    Draft,
    Preview,
    Prod,
    Archived,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Preview => "preview",
            DocumentStatus::Prod => "prod",
            DocumentStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(DocumentStatus::Draft),
            "preview" => Ok(DocumentStatus::Preview),
            "prod" | "production" => Ok(DocumentStatus::Prod),
            "archived" => Ok(DocumentStatus::Archived),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

/// A versioned UI configuration document.
///
/// Wire format is camelCase JSON. Keys the schema does not know are kept in
/// `unknown` so the validator can report them by name. Token and flag
/// leaves are held as raw JSON: a draft with a mistyped value still saves,
/// and the validator names the offending path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiConfigDocument {
    pub version: String,

    #[serde(default)]
    pub status: DocumentStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Tokens>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub micro_interactions: Option<MicroInteractions>,

    /// Per-component variant configuration, keyed by component name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<BTreeMap<String, Value>>,

    /// Per-screen layout configuration, keyed by screen name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screens: Option<BTreeMap<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_flags: Option<BTreeMap<String, FeatureFlag>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<Audience>,

    /// Copy overrides, key to text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub i18n_overrides: Option<BTreeMap<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(flatten)]
    pub unknown: BTreeMap<String, Value>,
}

impl UiConfigDocument {
    /// An empty draft with only a version set.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            status: DocumentStatus::Draft,
            tokens: None,
            micro_interactions: None,
            components: None,
            screens: None,
            feature_flags: None,
            audience: None,
            i18n_overrides: None,
            meta: None,
            unknown: BTreeMap::new(),
        }
    }

    /// Copy of this document with its status replaced.
    ///
    /// Used for response shaping (preview links) without touching the
    /// stored record.
    pub fn with_status(&self, status: DocumentStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// Whether everything except `version` and `status` matches `other`.
    pub fn same_content(&self, other: &UiConfigDocument) -> bool {
        self.tokens == other.tokens
            && self.micro_interactions == other.micro_interactions
            && self.components == other.components
            && self.screens == other.screens
            && self.feature_flags == other.feature_flags
            && self.audience == other.audience
            && self.i18n_overrides == other.i18n_overrides
            && self.meta == other.meta
            && self.unknown == other.unknown
    }

    pub fn author(&self) -> Option<&str> {
        self.meta.as_ref().and_then(|m| m.author.as_deref())
    }
}

/// Design tokens.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tokens {
    /// Semantic colors, `#RRGGBB`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<BTreeMap<String, Value>>,

    /// Spacing scale in points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing: Option<BTreeMap<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radii: Option<BTreeMap<String, Value>>,

    /// `{ scale: { <name>: { size, lineHeight, weight } } }`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typography: Option<Value>,

    /// `{ duration, easing, scale, opacity }` groups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motion: Option<Value>,

    /// Elevation levels `"1"` to `"4"`, each `{ radius, offset, opacity }`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<Palette>,

    #[serde(flatten)]
    pub unknown: BTreeMap<String, Value>,
}

/// Color palette; gradients are lists of 2 to 4 colors.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    #[serde(default)]
    pub gradients: BTreeMap<String, Value>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Micro-interaction settings.
///
/// Individual effects (`pressFeedback`, `shimmer`, ...) are open-ended
/// objects carrying at least an `enabled` flag.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicroInteractions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guards: Option<InteractionGuards>,

    #[serde(flatten)]
    pub effects: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionGuards {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respect_reduced_motion: Option<Value>,

    /// Kept raw so an unrecognized policy can be saved in a draft and
    /// reported by the validator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_end_device_policy: Option<Value>,
}

impl InteractionGuards {
    pub fn policy(&self) -> Option<LowEndDevicePolicy> {
        self.low_end_device_policy
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|p| p.parse().ok())
    }
}

/// How clients degrade effects on low-end hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LowEndDevicePolicy {
    Skip,
    Simplify,
    Full,
}

impl LowEndDevicePolicy {
    pub const ALL: [&'static str; 3] = ["skip", "simplify", "full"];
}

impl FromStr for LowEndDevicePolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => Ok(LowEndDevicePolicy::Skip),
            "simplify" => Ok(LowEndDevicePolicy::Simplify),
            "full" => Ok(LowEndDevicePolicy::Full),
            _ => Err(()),
        }
    }
}

/// A feature flag: a plain toggle or a staged rollout.
///
/// Anything else lands in `Unrecognized` so the draft still saves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureFlag {
    Toggle(bool),
    Rollout(RolloutDescriptor),
    Unrecognized(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolloutDescriptor {
    pub enabled: bool,

    /// Share of clients that see the flag, 0 to 100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,

    /// Restrict the rollout to these environments. Empty means all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environments: Vec<String>,
}

/// Audience targeting.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audience {
    /// `dev`, `stage` or `prod`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Value>,

    /// Share of clients, 0 to 100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pct: Option<Value>,

    /// ISO 3166 alpha-2 codes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_allow: Option<Value>,
}

/// Free-form authoring metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_camel_case_document() {
        let doc: UiConfigDocument = serde_json::from_value(json!({
            "version": "1.2.0",
            "tokens": { "colors": { "primary": "#FF6B6B" }, "spacing": { "md": 16 } },
            "microInteractions": {
                "guards": { "respectReducedMotion": true, "lowEndDevicePolicy": "simplify" },
                "shimmer": { "enabled": true }
            },
            "featureFlags": { "newHeader": true, "chat": { "enabled": true, "percentage": 25 } },
            "meta": { "author": "ops", "ticket": "UI-12" },
            "legacyTheme": "dark"
        }))
        .unwrap();

        assert_eq!(doc.status, DocumentStatus::Draft);
        let guards = doc.micro_interactions.as_ref().unwrap().guards.as_ref().unwrap();
        assert_eq!(guards.policy(), Some(LowEndDevicePolicy::Simplify));
        assert!(doc.micro_interactions.as_ref().unwrap().effects.contains_key("shimmer"));

        let flags = doc.feature_flags.as_ref().unwrap();
        assert_eq!(flags["newHeader"], FeatureFlag::Toggle(true));
        assert!(matches!(flags["chat"], FeatureFlag::Rollout(ref r) if r.percentage == Some(25.0)));

        assert_eq!(doc.author(), Some("ops"));
        assert_eq!(doc.meta.as_ref().unwrap().extra["ticket"], json!("UI-12"));
        assert_eq!(doc.unknown["legacyTheme"], json!("dark"));
    }

    #[test]
    fn test_mistyped_leaves_still_parse() {
        let doc: UiConfigDocument = serde_json::from_value(json!({
            "version": "1.2.0",
            "tokens": {
                "colors": { "primary": 42 },
                "spacing": { "md": "16" },
                "palette": { "gradients": { "hero": "#FF6B6B" } }
            },
            "microInteractions": { "guards": { "respectReducedMotion": "yes", "lowEndDevicePolicy": 1 } },
            "featureFlags": { "chat": { "enabled": true, "percentage": "25" }, "beta": "on" }
        }))
        .unwrap();

        let tokens = doc.tokens.as_ref().unwrap();
        assert_eq!(tokens.spacing.as_ref().unwrap()["md"], json!("16"));
        assert_eq!(doc.micro_interactions.as_ref().unwrap().guards.as_ref().unwrap().policy(), None);
        let flags = doc.feature_flags.as_ref().unwrap();
        assert!(matches!(flags["chat"], FeatureFlag::Unrecognized(_)));
        assert_eq!(flags["beta"], FeatureFlag::Unrecognized(json!("on")));

        // Raw leaves serialize back unchanged.
        let back = serde_json::to_value(&doc).unwrap();
        assert_eq!(back["featureFlags"]["chat"]["percentage"], json!("25"));
        assert_eq!(back["tokens"]["colors"]["primary"], json!(42));
    }

    #[test]
    fn test_with_status_leaves_content_alone() {
        let mut doc = UiConfigDocument::new("2.0.0-rc1");
        doc.screens = Some(BTreeMap::from([("Home".to_string(), json!({"header": "compact"}))]));

        let shown = doc.with_status(DocumentStatus::Preview);
        assert_eq!(shown.status, DocumentStatus::Preview);
        assert_eq!(doc.status, DocumentStatus::Draft);
        assert!(shown.same_content(&doc));
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("Preview".parse::<DocumentStatus>(), Ok(DocumentStatus::Preview));
        assert_eq!("production".parse::<DocumentStatus>(), Ok(DocumentStatus::Prod));
        assert!("staged".parse::<DocumentStatus>().is_err());
    }
}
