//! Schema rules for [`UiConfigDocument`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::{
    is_valid_version, Audience, FeatureFlag, LowEndDevicePolicy, MicroInteractions, Tokens,
    UiConfigDocument,
};

/// Top-level keys every promotable document must carry.
pub const REQUIRED_KEYS: [&str; 6] = [
    "tokens",
    "microInteractions",
    "components",
    "screens",
    "featureFlags",
    "meta",
];

const REQUIRED_TOKEN_KEYS: [&str; 7] = [
    "colors",
    "spacing",
    "radii",
    "typography",
    "motion",
    "shadow",
    "palette",
];

const AUDIENCE_ENVS: [&str; 3] = ["dev", "stage", "prod"];

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Dotted path of the offending key, e.g. `tokens.colors.primary`.
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Outcome of [`validate_document`]: `{valid, errors[]}` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn from_issues(errors: Vec<ValidationIssue>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Report holding a single issue.
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::from_issues(vec![ValidationIssue {
            path: path.into(),
            message: message.into(),
        }])
    }

    /// Whether any error sits at `path` or below it.
    pub fn mentions(&self, path: &str) -> bool {
        self.errors.iter().any(|e| {
            e.path == path
                || e.path
                    .strip_prefix(path)
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }
}

#[derive(Default)]
struct Issues(Vec<ValidationIssue>);

impl Issues {
    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(ValidationIssue {
            path: path.into(),
            message: message.into(),
        });
    }

    fn missing(&mut self, path: impl Into<String>) {
        self.push(path, "missing required key");
    }
}

/// Validate a document against the UI config schema.
pub fn validate_document(doc: &UiConfigDocument) -> ValidationReport {
    let mut issues = Issues::default();

    if !is_valid_version(&doc.version) {
        issues.push(
            "version",
            "must be 1-64 characters of [0-9A-Za-z.+-] starting with a letter or digit",
        );
    }

    for key in doc.unknown.keys() {
        issues.push(key.as_str(), "unknown top-level key");
    }

    match &doc.tokens {
        Some(tokens) => check_tokens(tokens, &mut issues),
        None => issues.missing("tokens"),
    }

    match &doc.micro_interactions {
        Some(mi) => check_micro_interactions(mi, &mut issues),
        None => issues.missing("microInteractions"),
    }

    match &doc.components {
        Some(components) => check_object_map("components", components, &mut issues),
        None => issues.missing("components"),
    }

    match &doc.screens {
        Some(screens) => check_object_map("screens", screens, &mut issues),
        None => issues.missing("screens"),
    }

    match &doc.feature_flags {
        Some(flags) => check_feature_flags(flags, &mut issues),
        None => issues.missing("featureFlags"),
    }

    if let Some(audience) = &doc.audience {
        check_audience(audience, &mut issues);
    }

    if let Some(overrides) = &doc.i18n_overrides {
        check_i18n_overrides(overrides, &mut issues);
    }

    if doc.meta.is_none() {
        issues.missing("meta");
    }

    ValidationReport::from_issues(issues.0)
}

/// `#RRGGBB`.
pub fn is_valid_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

fn check_tokens(tokens: &Tokens, issues: &mut Issues) {
    let present = [
        tokens.colors.is_some(),
        tokens.spacing.is_some(),
        tokens.radii.is_some(),
        tokens.typography.is_some(),
        tokens.motion.is_some(),
        tokens.shadow.is_some(),
        tokens.palette.is_some(),
    ];
    for (key, present) in REQUIRED_TOKEN_KEYS.iter().zip(present) {
        if !present {
            issues.missing(format!("tokens.{}", key));
        }
    }

    for key in tokens.unknown.keys() {
        issues.push(format!("tokens.{}", key), "unknown token group");
    }

    if let Some(colors) = &tokens.colors {
        for (name, value) in colors {
            check_color(format!("tokens.colors.{}", name), value, issues);
        }
    }

    for (group, scale, limits) in [
        ("spacing", &tokens.spacing, &SPACING_MAX[..]),
        ("radii", &tokens.radii, &RADII_MAX[..]),
    ] {
        let Some(scale) = scale else { continue };
        for (name, value) in scale {
            let path = format!("tokens.{}.{}", group, name);
            match limits.iter().find(|(step, _)| step == name) {
                Some((_, max)) => check_range(path, value, 0.0, *max, issues),
                None => check_non_negative(path, value, issues),
            }
        }
    }

    if let Some(typography) = &tokens.typography {
        check_typography(typography, issues);
    }
    if let Some(motion) = &tokens.motion {
        check_motion(motion, issues);
    }
    if let Some(shadow) = &tokens.shadow {
        check_shadow(shadow, issues);
    }

    if let Some(palette) = &tokens.palette {
        for (name, stops) in &palette.gradients {
            let path = format!("tokens.palette.gradients.{}", name);
            let Some(stops) = stops.as_array() else {
                issues.push(path, "must be a list of 2 to 4 colors");
                continue;
            };
            if !(2..=4).contains(&stops.len()) {
                issues.push(
                    path.clone(),
                    format!("gradient needs 2 to 4 colors, got {}", stops.len()),
                );
            }
            for (i, stop) in stops.iter().enumerate() {
                check_color(format!("{}[{}]", path, i), stop, issues);
            }
        }
    }
}

/// Upper bounds of the named spacing steps. Other names only need to be
/// non-negative.
const SPACING_MAX: [(&str, f64); 8] = [
    ("xs", 100.0),
    ("sm", 200.0),
    ("md", 300.0),
    ("lg", 400.0),
    ("xl", 500.0),
    ("2xl", 800.0),
    ("3xl", 1000.0),
    ("4xl", 1200.0),
];

const RADII_MAX: [(&str, f64); 9] = [
    ("none", 0.0),
    ("xs", 4.0),
    ("sm", 8.0),
    ("md", 12.0),
    ("lg", 16.0),
    ("xl", 24.0),
    ("2xl", 32.0),
    ("pill", 9999.0),
    ("full", 9999.0),
];

/// Text styles with their size and line-height ranges.
const TYPE_SCALE: [(&str, (f64, f64), (f64, f64)); 6] = [
    ("caption", (10.0, 20.0), (12.0, 28.0)),
    ("body", (12.0, 24.0), (16.0, 36.0)),
    ("h4", (14.0, 28.0), (20.0, 40.0)),
    ("h3", (18.0, 32.0), (24.0, 48.0)),
    ("h2", (24.0, 40.0), (32.0, 56.0)),
    ("h1", (32.0, 56.0), (40.0, 72.0)),
];

const FONT_WEIGHTS: [&str; 4] = ["400", "500", "600", "700"];

const DURATION_MAX: [(&str, f64); 5] = [
    ("xfast", 200.0),
    ("fast", 300.0),
    ("base", 500.0),
    ("slow", 800.0),
    ("xslow", 1200.0),
];

const MOTION_SCALE: [(&str, f64, f64); 2] = [("pressed", 0.5, 1.0), ("lift", 1.0, 1.2)];

const SHADOW_LEVELS: [&str; 4] = ["1", "2", "3", "4"];

/// Field limits of the known micro-interaction effects.
struct EffectRule {
    name: &'static str,
    bounds: &'static [(&'static str, f64, f64)],
    haptics: &'static [&'static str],
}

const EFFECT_RULES: [EffectRule; 6] = [
    EffectRule {
        name: "pressFeedback",
        bounds: &[("scale", 0.5, 1.0), ("durationMs", 0.0, 500.0)],
        haptics: &["none", "light", "medium", "success"],
    },
    EffectRule {
        name: "successMorph",
        bounds: &[("durationMs", 0.0, 1000.0)],
        haptics: &["success", "none"],
    },
    EffectRule {
        name: "elasticPullToRefresh",
        bounds: &[("maxStretch", 1.0, 3.0)],
        haptics: &[],
    },
    EffectRule {
        name: "sharedElement",
        bounds: &[("durationMs", 0.0, 1000.0)],
        haptics: &[],
    },
    EffectRule {
        name: "confettiLite",
        bounds: &[("maxParticles", 0.0, 200.0), ("cooldownSec", 0.0, 60.0)],
        haptics: &[],
    },
    EffectRule {
        name: "shimmer",
        bounds: &[("sweepMs", 500.0, 3000.0), ("opacity", 0.0, 1.0)],
        haptics: &[],
    },
];

fn check_typography(typography: &Value, issues: &mut Issues) {
    let Some(typography) = object_at("tokens.typography", typography, issues) else {
        return;
    };
    let Some(scale) = typography.get("scale") else {
        return;
    };
    let Some(scale) = object_at("tokens.typography.scale", scale, issues) else {
        return;
    };
    for (name, style) in scale {
        let path = format!("tokens.typography.scale.{}", name);
        let Some(style) = object_at(&path, style, issues) else {
            continue;
        };
        let ranges = TYPE_SCALE.iter().find(|(step, _, _)| step == name);
        for (field, range) in [
            ("size", ranges.map(|(_, size, _)| *size)),
            ("lineHeight", ranges.map(|(_, _, line)| *line)),
        ] {
            let field_path = format!("{}.{}", path, field);
            match (style.get(field), range) {
                (None, _) => issues.missing(field_path),
                (Some(value), Some((min, max))) => check_range(field_path, value, min, max, issues),
                (Some(value), None) => check_non_negative(field_path, value, issues),
            }
        }
        match style.get("weight") {
            None => issues.missing(format!("{}.weight", path)),
            Some(weight) => {
                let text = match weight {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                };
                if !text.is_some_and(|t| FONT_WEIGHTS.contains(&t.as_str())) {
                    issues.push(
                        format!("{}.weight", path),
                        format!("{} is not one of {}", weight, FONT_WEIGHTS.join(", ")),
                    );
                }
            }
        }
    }
}

fn check_motion(motion: &Value, issues: &mut Issues) {
    let Some(motion) = object_at("tokens.motion", motion, issues) else {
        return;
    };

    if let Some(durations) = motion.get("duration") {
        if let Some(durations) = object_at("tokens.motion.duration", durations, issues) {
            for (name, value) in durations {
                let path = format!("tokens.motion.duration.{}", name);
                match DURATION_MAX.iter().find(|(step, _)| step == name) {
                    Some((_, max)) => check_range(path, value, 0.0, *max, issues),
                    None => check_non_negative(path, value, issues),
                }
            }
        }
    }

    if let Some(easings) = motion.get("easing") {
        if let Some(easings) = object_at("tokens.motion.easing", easings, issues) {
            for (name, value) in easings {
                check_bezier(format!("tokens.motion.easing.{}", name), value, issues);
            }
        }
    }

    if let Some(scales) = motion.get("scale") {
        if let Some(scales) = object_at("tokens.motion.scale", scales, issues) {
            for (name, value) in scales {
                let path = format!("tokens.motion.scale.{}", name);
                match MOTION_SCALE.iter().find(|(step, _, _)| step == name) {
                    Some((_, min, max)) => check_range(path, value, *min, *max, issues),
                    None => check_non_negative(path, value, issues),
                }
            }
        }
    }

    if let Some(opacities) = motion.get("opacity") {
        if let Some(opacities) = object_at("tokens.motion.opacity", opacities, issues) {
            for (name, value) in opacities {
                check_range(format!("tokens.motion.opacity.{}", name), value, 0.0, 1.0, issues);
            }
        }
    }
}

fn check_shadow(shadow: &Value, issues: &mut Issues) {
    let Some(levels) = object_at("tokens.shadow", shadow, issues) else {
        return;
    };
    for (level, value) in levels {
        let path = format!("tokens.shadow.{}", level);
        if !SHADOW_LEVELS.contains(&level.as_str()) {
            issues.push(path, "shadow levels are 1 to 4");
            continue;
        }
        let Some(value) = object_at(&path, value, issues) else {
            continue;
        };
        match value.get("radius") {
            Some(radius) => check_range(format!("{}.radius", path), radius, 0.0, 50.0, issues),
            None => issues.missing(format!("{}.radius", path)),
        }
        match value.get("opacity") {
            Some(opacity) => check_range(format!("{}.opacity", path), opacity, 0.0, 1.0, issues),
            None => issues.missing(format!("{}.opacity", path)),
        }
        match value.get("offset").map(|o| o.as_array()) {
            Some(Some(offset)) if offset.len() == 2 && offset.iter().all(Value::is_number) => {}
            Some(_) => issues.push(format!("{}.offset", path), "must be an [x, y] pair of numbers"),
            None => issues.missing(format!("{}.offset", path)),
        }
    }
}

fn check_micro_interactions(mi: &MicroInteractions, issues: &mut Issues) {
    match &mi.guards {
        Some(guards) => {
            match &guards.respect_reduced_motion {
                Some(Value::Bool(true)) => {}
                Some(_) => issues.push(
                    "microInteractions.guards.respectReducedMotion",
                    "must be true",
                ),
                None => issues.missing("microInteractions.guards.respectReducedMotion"),
            }
            match &guards.low_end_device_policy {
                Some(_) if guards.policy().is_some() => {}
                Some(policy) => issues.push(
                    "microInteractions.guards.lowEndDevicePolicy",
                    format!(
                        "{} is not one of {}",
                        policy,
                        LowEndDevicePolicy::ALL.join(", ")
                    ),
                ),
                None => issues.missing("microInteractions.guards.lowEndDevicePolicy"),
            }
        }
        None => issues.missing("microInteractions.guards"),
    }

    for (name, effect) in &mi.effects {
        let path = format!("microInteractions.{}", name);
        let Some(effect) = object_at(&path, effect, issues) else {
            continue;
        };
        if !effect.get("enabled").is_some_and(Value::is_boolean) {
            issues.push(format!("{}.enabled", path), "must be a boolean");
        }
        if let Some(easing) = effect.get("easing") {
            check_bezier(format!("{}.easing", path), easing, issues);
        }
        let Some(rule) = EFFECT_RULES.iter().find(|r| r.name == name) else {
            continue;
        };
        for (field, min, max) in rule.bounds {
            if let Some(value) = effect.get(*field) {
                check_range(format!("{}.{}", path, field), value, *min, *max, issues);
            }
        }
        if let Some(haptic) = effect.get("haptic") {
            if !haptic.as_str().is_some_and(|h| rule.haptics.contains(&h)) {
                let allowed = if rule.haptics.is_empty() {
                    "not supported by this effect".to_string()
                } else {
                    format!("{} is not one of {}", haptic, rule.haptics.join(", "))
                };
                issues.push(format!("{}.haptic", path), allowed);
            }
        }
    }
}

fn check_object_map(section: &str, entries: &BTreeMap<String, Value>, issues: &mut Issues) {
    for (name, value) in entries {
        if name.trim().is_empty() {
            issues.push(section, "names must be non-empty");
        } else if !value.is_object() {
            issues.push(format!("{}.{}", section, name), "must be an object");
        }
    }
}

fn check_feature_flags(flags: &BTreeMap<String, FeatureFlag>, issues: &mut Issues) {
    for (name, flag) in flags {
        if name.trim().is_empty() {
            issues.push("featureFlags", "flag names must be non-empty");
            continue;
        }
        let path = format!("featureFlags.{}", name);
        match flag {
            FeatureFlag::Toggle(_) => {}
            FeatureFlag::Rollout(rollout) => {
                if let Some(pct) = rollout.percentage {
                    if !(0.0..=100.0).contains(&pct) {
                        issues.push(
                            format!("{}.percentage", path),
                            format!("{} is outside 0..=100", pct),
                        );
                    }
                }
                if rollout.environments.iter().any(|e| e.trim().is_empty()) {
                    issues.push(
                        format!("{}.environments", path),
                        "environment names must be non-empty",
                    );
                }
            }
            FeatureFlag::Unrecognized(value) => check_malformed_flag(&path, value, issues),
        }
    }
}

/// Name the field that kept `value` from reading as a rollout.
fn check_malformed_flag(path: &str, value: &Value, issues: &mut Issues) {
    let Some(rollout) = value.as_object() else {
        issues.push(path, "must be a boolean or a rollout object");
        return;
    };
    if !rollout.get("enabled").is_some_and(Value::is_boolean) {
        issues.push(format!("{}.enabled", path), "must be a boolean");
    }
    if let Some(pct) = rollout.get("percentage") {
        check_range(format!("{}.percentage", path), pct, 0.0, 100.0, issues);
    }
    if let Some(envs) = rollout.get("environments") {
        let all_text = envs
            .as_array()
            .is_some_and(|list| list.iter().all(Value::is_string));
        if !all_text {
            issues.push(format!("{}.environments", path), "must be a list of names");
        }
    }
}

fn check_audience(audience: &Audience, issues: &mut Issues) {
    if let Some(env) = &audience.env {
        if !env.as_str().is_some_and(|e| AUDIENCE_ENVS.contains(&e)) {
            issues.push(
                "audience.env",
                format!("{} is not one of {}", env, AUDIENCE_ENVS.join(", ")),
            );
        }
    }
    if let Some(pct) = &audience.pct {
        check_range("audience.pct".to_string(), pct, 0.0, 100.0, issues);
    }
    if let Some(countries) = &audience.country_allow {
        let Some(countries) = countries.as_array() else {
            issues.push("audience.countryAllow", "must be a list of country codes");
            return;
        };
        for country in countries {
            let ok = country
                .as_str()
                .is_some_and(|c| c.len() == 2 && c.chars().all(|ch| ch.is_ascii_uppercase()));
            if !ok {
                issues.push(
                    "audience.countryAllow",
                    format!("{} is not an ISO 3166 alpha-2 code", country),
                );
            }
        }
    }
}

fn check_i18n_overrides(overrides: &BTreeMap<String, Value>, issues: &mut Issues) {
    for (key, text) in overrides {
        if key.trim().is_empty() {
            issues.push("i18nOverrides", "keys must be non-empty");
        } else if !text.is_string() {
            issues.push(format!("i18nOverrides.{}", key), "must be a string");
        }
    }
}

fn object_at<'a>(path: &str, value: &'a Value, issues: &mut Issues) -> Option<&'a Map<String, Value>> {
    let object = value.as_object();
    if object.is_none() {
        issues.push(path, "must be an object");
    }
    object
}

fn check_color(path: String, value: &Value, issues: &mut Issues) {
    if !value.as_str().is_some_and(is_valid_color) {
        issues.push(path, format!("{} is not a #RRGGBB color", value));
    }
}

fn check_range(path: String, value: &Value, min: f64, max: f64, issues: &mut Issues) {
    match value.as_f64() {
        Some(n) if (min..=max).contains(&n) => {}
        Some(n) => issues.push(path, format!("{} is outside {}..={}", n, min, max)),
        None => issues.push(path, format!("{} is not a number", value)),
    }
}

fn check_non_negative(path: String, value: &Value, issues: &mut Issues) {
    if !value.as_f64().is_some_and(|n| n >= 0.0) {
        issues.push(path, format!("{} must be a non-negative number", value));
    }
}

fn check_bezier(path: String, value: &Value, issues: &mut Issues) {
    let ok = value
        .as_array()
        .is_some_and(|points| points.len() == 4 && points.iter().all(Value::is_number));
    if !ok {
        issues.push(path, "must be a cubic-bezier tuple of 4 numbers");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_json() -> Value {
        json!({
            "version": "1.2.0",
            "tokens": {
                "colors": { "primary": "#FF6B6B", "bg": "#ffffff" },
                "spacing": { "sm": 8, "md": 16 },
                "radii": { "none": 0, "md": 12 },
                "typography": {
                    "scale": {
                        "body": { "size": 16, "lineHeight": 22, "weight": "400" },
                        "h1": { "size": 34, "lineHeight": 41, "weight": 700 }
                    }
                },
                "motion": {
                    "duration": { "fast": 150, "base": 250 },
                    "easing": { "standard": [0.2, 0, 0, 1] },
                    "scale": { "pressed": 0.97, "lift": 1.02 },
                    "opacity": { "disabled": 0.4 }
                },
                "shadow": { "1": { "radius": 4, "offset": [0, 2], "opacity": 0.12 } },
                "palette": { "gradients": { "sunset": ["#FF6B6B", "#FFD93D"] } }
            },
            "microInteractions": {
                "guards": { "respectReducedMotion": true, "lowEndDevicePolicy": "skip" },
                "pressFeedback": { "enabled": true, "scale": 0.97, "haptic": "light", "easing": [0.2, 0, 0, 1] },
                "shimmer": { "enabled": false, "sweepMs": 1200 }
            },
            "components": { "button": { "variant": "primary" } },
            "screens": { "Home": { "header": "compact" } },
            "i18nOverrides": { "home.title": "Discover" },
            "featureFlags": { "stories": true, "chat": { "enabled": true, "percentage": 50 } },
            "meta": { "author": "ops", "anything": [1, 2, 3] }
        })
    }

    fn doc(value: Value) -> UiConfigDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_valid_document_passes() {
        let report = validate_document(&doc(valid_json()));
        assert!(report.valid, "unexpected errors: {:?}", report.errors);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_each_missing_required_key_is_named() {
        for key in REQUIRED_KEYS {
            let mut value = valid_json();
            value.as_object_mut().unwrap().remove(key);
            let report = validate_document(&doc(value));
            assert!(!report.valid);
            assert!(
                report.errors.iter().any(|e| e.path == key),
                "{} not named in {:?}",
                key,
                report.errors
            );
        }
    }

    #[test]
    fn test_unknown_top_level_key_rejected_but_meta_is_free_form() {
        let mut value = valid_json();
        value["theme"] = json!("dark");
        value["meta"]["whatever"] = json!({"nested": true});

        let report = validate_document(&doc(value));
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, "theme");
    }

    #[test]
    fn test_token_value_rules() {
        let mut value = valid_json();
        value["tokens"]["colors"]["primary"] = json!("red");
        value["tokens"]["spacing"]["md"] = json!(-4);
        value["tokens"]["radii"]["lg"] = json!(-1.5);
        value["tokens"]["palette"]["gradients"]["mono"] = json!(["#000000"]);

        let report = validate_document(&doc(value));
        assert!(report.mentions("tokens.colors.primary"));
        assert!(report.mentions("tokens.spacing.md"));
        assert!(report.mentions("tokens.radii.lg"));
        assert!(report.mentions("tokens.palette.gradients.mono"));
        assert!(!report.mentions("tokens.colors.bg"));
    }

    #[test]
    fn test_typography_rules() {
        let mut value = valid_json();
        value["tokens"]["typography"]["scale"]["body"]["size"] = json!(40);
        value["tokens"]["typography"]["scale"]["h1"]["weight"] = json!("450");
        value["tokens"]["typography"]["scale"]["caption"] = json!({ "size": 12, "weight": "500" });

        let report = validate_document(&doc(value));
        assert!(report.mentions("tokens.typography.scale.body.size"));
        assert!(report.mentions("tokens.typography.scale.h1.weight"));
        assert!(report.mentions("tokens.typography.scale.caption.lineHeight"));
        assert!(!report.mentions("tokens.typography.scale.caption.size"));
        assert_eq!(report.errors.len(), 3, "{:?}", report.errors);
    }

    #[test]
    fn test_motion_rules() {
        let mut value = valid_json();
        value["tokens"]["motion"]["duration"]["fast"] = json!(900);
        value["tokens"]["motion"]["easing"]["emphasized"] = json!([0.2, 0, 1]);
        value["tokens"]["motion"]["scale"]["pressed"] = json!(0.3);
        value["tokens"]["motion"]["opacity"]["shimmer"] = json!(1.5);

        let report = validate_document(&doc(value));
        assert!(report.mentions("tokens.motion.duration.fast"));
        assert!(report.mentions("tokens.motion.easing.emphasized"));
        assert!(report.mentions("tokens.motion.scale.pressed"));
        assert!(report.mentions("tokens.motion.opacity.shimmer"));
        assert!(!report.mentions("tokens.motion.easing.standard"));
    }

    #[test]
    fn test_shadow_rules() {
        let mut value = valid_json();
        value["tokens"]["shadow"]["1"]["radius"] = json!(80);
        value["tokens"]["shadow"]["2"] = json!({ "radius": 8, "offset": [0], "opacity": 0.2 });
        value["tokens"]["shadow"]["3"] = json!({ "offset": [0, 4], "opacity": 0.2 });
        value["tokens"]["shadow"]["5"] = json!({ "radius": 8, "offset": [0, 4], "opacity": 0.2 });

        let report = validate_document(&doc(value));
        assert!(report.mentions("tokens.shadow.1.radius"));
        assert!(report.mentions("tokens.shadow.2.offset"));
        assert!(report.mentions("tokens.shadow.3.radius"));
        assert!(report.mentions("tokens.shadow.5"));
    }

    #[test]
    fn test_effect_rules() {
        let mut value = valid_json();
        value["microInteractions"]["pressFeedback"]["scale"] = json!(0.2);
        value["microInteractions"]["pressFeedback"]["haptic"] = json!("heavy");
        value["microInteractions"]["shimmer"]["sweepMs"] = json!(100);
        value["microInteractions"]["confettiLite"] = json!({ "enabled": true, "maxParticles": 500 });
        value["microInteractions"]["sharedElement"] = json!({ "enabled": true, "haptic": "light" });

        let report = validate_document(&doc(value));
        assert!(report.mentions("microInteractions.pressFeedback.scale"));
        assert!(report.mentions("microInteractions.pressFeedback.haptic"));
        assert!(report.mentions("microInteractions.shimmer.sweepMs"));
        assert!(report.mentions("microInteractions.confettiLite.maxParticles"));
        assert!(report.mentions("microInteractions.sharedElement.haptic"));
    }

    #[test]
    fn test_mistyped_leaves_are_named() {
        let mut value = valid_json();
        value["tokens"]["spacing"]["md"] = json!("16");
        value["tokens"]["colors"]["primary"] = json!(42);
        value["tokens"]["palette"]["gradients"]["sunset"] = json!("#FF6B6B");
        value["microInteractions"]["guards"]["respectReducedMotion"] = json!("yes");
        value["featureFlags"]["chat"]["percentage"] = json!("25");
        value["featureFlags"]["beta"] = json!("on");
        value["audience"] = json!({ "pct": "10", "countryAllow": "US" });
        value["i18nOverrides"]["home.title"] = json!(5);

        let report = validate_document(&doc(value));
        for path in [
            "tokens.spacing.md",
            "tokens.colors.primary",
            "tokens.palette.gradients.sunset",
            "microInteractions.guards.respectReducedMotion",
            "featureFlags.chat.percentage",
            "featureFlags.beta",
            "audience.pct",
            "audience.countryAllow",
            "i18nOverrides.home.title",
        ] {
            assert!(report.mentions(path), "{} not named in {:?}", path, report.errors);
        }
        assert!(!report.mentions("featureFlags.chat.enabled"));
    }

    #[test]
    fn test_guard_rules() {
        let mut value = valid_json();
        value["microInteractions"]["guards"]["lowEndDevicePolicy"] = json!("sometimes");
        value["microInteractions"]["guards"]["respectReducedMotion"] = json!(false);
        value["microInteractions"]["shimmer"] = json!({ "sweepMs": 900 });

        let report = validate_document(&doc(value));
        assert!(report.mentions("microInteractions.guards.lowEndDevicePolicy"));
        assert!(report.mentions("microInteractions.guards.respectReducedMotion"));
        assert!(report.mentions("microInteractions.shimmer.enabled"));
    }

    #[test]
    fn test_rollout_and_audience_bounds() {
        let mut value = valid_json();
        value["featureFlags"]["chat"]["percentage"] = json!(140);
        value["audience"] = json!({ "env": "qa", "pct": -1, "countryAllow": ["US", "gbr"] });

        let report = validate_document(&doc(value));
        assert!(report.mentions("featureFlags.chat.percentage"));
        assert!(report.mentions("audience.env"));
        assert!(report.mentions("audience.pct"));
        assert!(report.mentions("audience.countryAllow"));
    }

    #[test]
    fn test_mentions_matches_whole_segments() {
        let report = ValidationReport::single("tokens.colorsExtra", "unknown token group");
        assert!(report.mentions("tokens"));
        assert!(!report.mentions("tokens.colors"));
    }

    #[test]
    fn test_color_syntax() {
        assert!(is_valid_color("#A1b2C3"));
        assert!(!is_valid_color("#A1B2C"));
        assert!(!is_valid_color("A1B2C3F"));
        assert!(!is_valid_color("#GGGGGG"));
    }
}
