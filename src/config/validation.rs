//! Unknown-key detection for config files
//!
//! serde silently ignores keys it does not know, so a typo such as
//! `[health.oxygen] critcal_below = 4` would quietly fall back to the
//! default. Before deserializing, the raw TOML key tree is compared against
//! the known keys and each unknown key is reported with the closest match.
//! These are warnings only; they never reject a config.

use std::collections::BTreeSet;

/// A non-fatal config warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKey {
    pub key: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for UnknownKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unknown config key '{}'", self.key)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

/// Every valid dotted key path of `TankwatchConfig`.
///
/// Must be kept in step with the structs in `tankwatch_config.rs`.
pub fn known_config_keys() -> BTreeSet<String> {
    let mut keys: BTreeSet<String> = [
        "server",
        "server.addr",
        "storage",
        "storage.backend",
        "storage.path",
        "health",
        "health.ceiling_warning_fraction",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    for band in ["temperature", "ph"] {
        keys.insert(format!("health.{band}"));
        for field in ["critical_min", "critical_max", "ideal", "tolerance"] {
            keys.insert(format!("health.{band}.{field}"));
        }
    }
    keys.insert("health.oxygen".to_string());
    keys.insert("health.oxygen.critical_below".to_string());
    keys.insert("health.oxygen.warning_below".to_string());
    for ceiling in ["ammonia", "nitrite", "nitrate"] {
        keys.insert(format!("health.{ceiling}"));
        keys.insert(format!("health.{ceiling}.max"));
    }

    keys
}

/// Flatten a TOML table into dotted key paths (tables included).
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let Some(table) = value.as_table() else {
        return Vec::new();
    };

    let mut keys = Vec::new();
    for (k, v) in table {
        let path = if prefix.is_empty() {
            k.clone()
        } else {
            format!("{prefix}.{k}")
        };
        if v.is_table() {
            keys.extend(walk_toml_keys(v, &path));
        }
        keys.push(path);
    }
    keys
}

/// Edit distance between two keys.
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = diagonal + usize::from(ca != cb);
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(row[j] + 1).min(row[j + 1] + 1);
        }
    }

    row[b.len()]
}

/// Closest known key within edit distance 3.
fn closest_known(unknown: &str, known: &BTreeSet<String>) -> Option<String> {
    known
        .iter()
        .map(|k| (edit_distance(unknown, k), k))
        .filter(|(d, _)| *d <= 3)
        .min_by_key(|(d, _)| *d)
        .map(|(_, k)| k.clone())
}

/// Report every key in `raw_toml` that the config does not recognize.
///
/// Unparseable input yields no warnings; the real parse reports the error.
pub fn unknown_keys(raw_toml: &str) -> Vec<UnknownKey> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    let mut found = walk_toml_keys(&value, "");
    found.sort();

    found
        .into_iter()
        .filter(|key| !known.contains(key))
        .map(|key| UnknownKey {
            suggestion: closest_known(&key, &known),
            key,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("oxygen", "oxygen"), 0);
        assert_eq!(edit_distance("oxigen", "oxygen"), 1);
        assert_eq!(edit_distance("", "ph"), 2);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_known_keys_pass() {
        let raw = r#"
            [server]
            addr = "127.0.0.1:9000"

            [health.temperature]
            ideal = 25.0
        "#;
        assert!(unknown_keys(raw).is_empty());
    }

    #[test]
    fn test_typo_gets_suggestion() {
        let raw = r#"
            [health.oxygen]
            critcal_below = 4.0
        "#;
        let warnings = unknown_keys(raw);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].key, "health.oxygen.critcal_below");
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("health.oxygen.critical_below")
        );
    }

    #[test]
    fn test_unrelated_key_has_no_suggestion() {
        let warnings = unknown_keys("[telemetry]\nendpoint = \"udp://x\"\n");
        assert!(warnings.iter().all(|w| w.suggestion.is_none()));
        assert_eq!(warnings.len(), 2);
    }
}
