// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Message catalogs for validation issues
//!
//! Rules report a message key plus parameters; turning that into text is
//! the catalog's job. Catalogs are nested JSON documents:
//!
//! ```json
//! { "validation": { "length": { "error": "Line is {length} characters" } } }
//! ```
//!
//! Nested objects are addressed with dotted keys (`validation.length.error`)
//! and `{param}` placeholders are filled from the issue parameters.
//!
//! Besides lookup, this module audits catalogs against a reference catalog
//! (missing keys, extra keys, case-insensitive duplicates) and repairs them:
//! [`prune_extra_keys`] drops what the reference no longer has and
//! [`apply_updates`] merges a batch of new or changed messages.

use atomic_write_file::AtomicWriteFile;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

use crate::validation::rules::BUILTIN_MESSAGE_KEYS;
use crate::validation::types::{Issue, IssueParams};

/// Errors that can occur while loading a catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// File is not valid JSON
    #[error("Invalid catalog JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Top level must be an object
    #[error("Catalog root must be a JSON object")]
    NotAnObject,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of translated issue messages
pub trait MessageCatalog: Send + Sync {
    /// Returns the interpolated message for `key`, if the catalog has one
    fn translate(&self, key: &str, params: &IssueParams) -> Option<String>;
}

/// Catalog backed by a nested JSON document
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    /// Original document, kept for structural diffs
    root: Value,
    /// Leaf strings by dotted key
    messages: BTreeMap<String, String>,
}

impl JsonCatalog {
    /// Parses a catalog from JSON text
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidJson` for malformed input and
    /// `CatalogError::NotAnObject` if the root is not an object.
    pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
        Self::from_value(serde_json::from_str(content)?)
    }

    /// Wraps an already parsed document
    pub fn from_value(root: Value) -> Result<Self, CatalogError> {
        if !root.is_object() {
            return Err(CatalogError::NotAnObject);
        }

        let mut catalog = Self {
            root,
            messages: BTreeMap::new(),
        };
        catalog.reindex();
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Pretty-printed document with a trailing newline
    pub fn to_pretty_json(&self) -> Result<String, CatalogError> {
        let mut json = serde_json::to_string_pretty(&self.root)?;
        json.push('\n');
        Ok(json)
    }

    /// Writes the document to `path` atomically
    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        let json = self.to_pretty_json()?;
        let mut file = AtomicWriteFile::options().open(path)?;
        file.write_all(json.as_bytes())?;
        file.commit()?;
        Ok(())
    }

    /// Rebuilds the dotted-key index after `root` changed
    fn reindex(&mut self) {
        self.messages.clear();
        flatten_into(&self.root, "", &mut self.messages);
    }

    /// Dotted keys of every leaf message, sorted
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }

    /// Raw (uninterpolated) message
    pub fn get(&self, key: &str) -> Option<&str> {
        self.messages.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl MessageCatalog for JsonCatalog {
    fn translate(&self, key: &str, params: &IssueParams) -> Option<String> {
        self.get(key).map(|template| interpolate(template, params))
    }
}

/// Flattens nested objects into dotted keys
///
/// Strings, numbers and booleans become leaves. Arrays and nulls are not
/// messages and are skipped.
fn flatten_into(value: &Value, prefix: &str, out: &mut BTreeMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(child, &join_key(prefix, key), out);
            }
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        Value::Number(n) => {
            out.insert(prefix.to_string(), n.to_string());
        }
        Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        Value::Array(_) | Value::Null => {}
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

/// Replaces `{name}` placeholders with parameter values
///
/// Placeholders without a matching parameter are left untouched.
///
/// # Example
///
/// ```
/// use sto_keybind_manager::i18n::interpolate;
/// use sto_keybind_manager::validation::IssueParams;
///
/// let mut params = IssueParams::new();
/// params.insert("count".to_string(), 3usize.into());
/// assert_eq!(interpolate("{count} commands, {other}", &params), "3 commands, {other}");
/// ```
pub fn interpolate(template: &str, params: &IssueParams) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match params.get(name) {
                    Some(value) => out.push_str(&value.to_string()),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

/// User-facing text for an issue
///
/// Uses the catalog translation, else the rule's default message, else the
/// message key itself.
pub fn render_issue(issue: &Issue, catalog: Option<&dyn MessageCatalog>) -> String {
    catalog
        .and_then(|c| c.translate(&issue.message_key, &issue.params))
        .or_else(|| issue.default_message.clone())
        .unwrap_or_else(|| issue.message_key.clone())
}

/// Message keys the built-in rules can emit
pub fn builtin_message_keys() -> &'static [&'static str] {
    BUILTIN_MESSAGE_KEYS
}

/// Keys present in `reference` but absent from `other`
///
/// When a whole subtree is missing only its root key is reported.
pub fn missing_keys(reference: &JsonCatalog, other: &JsonCatalog) -> Vec<String> {
    let mut out = Vec::new();
    diff_tree(&reference.root, &other.root, "", &mut out);
    out.sort();
    out
}

/// Keys present in `other` but absent from `reference`
pub fn extra_keys(reference: &JsonCatalog, other: &JsonCatalog) -> Vec<String> {
    missing_keys(other, reference)
}

fn diff_tree(reference: &Value, other: &Value, path: &str, out: &mut Vec<String>) {
    if let (Value::Object(ref_map), Value::Object(other_map)) = (reference, other) {
        for (key, ref_child) in ref_map {
            let child_path = join_key(path, key);
            match other_map.get(key) {
                Some(other_child) => diff_tree(ref_child, other_child, &child_path, out),
                None => out.push(child_path),
            }
        }
    }
}

/// Removes every key of `other` that `reference` does not have
///
/// Works on the nested tree, so an extra subtree goes as a whole. Arrays
/// are left alone. Returns the removed dotted keys, sorted.
pub fn prune_extra_keys(reference: &JsonCatalog, other: &mut JsonCatalog) -> Vec<String> {
    let mut removed = Vec::new();
    prune_tree(&reference.root, &mut other.root, "", &mut removed);
    if !removed.is_empty() {
        other.reindex();
    }
    removed.sort();
    removed
}

fn prune_tree(reference: &Value, other: &mut Value, path: &str, removed: &mut Vec<String>) {
    if let (Value::Object(ref_map), Value::Object(other_map)) = (reference, other) {
        other_map.retain(|key, _| {
            let keep = ref_map.contains_key(key);
            if !keep {
                removed.push(join_key(path, key));
            }
            keep
        });
        for (key, other_child) in other_map.iter_mut() {
            if let Some(ref_child) = ref_map.get(key) {
                prune_tree(ref_child, other_child, &join_key(path, key), removed);
            }
        }
    }
}

/// Dotted keys touched by [`apply_updates`]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    /// Leaves that did not exist before
    pub added: Vec<String>,
    /// Existing leaves whose value changed
    pub updated: Vec<String>,
}

impl UpdateReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty()
    }
}

/// Update keys whose location does not exist in `reference`
///
/// A plain key must exist at the top level. A dotted key needs every
/// parent segment to exist; the last segment may be new.
pub fn unknown_update_keys(reference: &JsonCatalog, updates: &Map<String, Value>) -> Vec<String> {
    let mut unknown: Vec<String> = updates
        .keys()
        .filter(|key| {
            let segments: Vec<&str> = key.split('.').collect();
            let required = match segments.split_last() {
                Some((_, parents)) if !parents.is_empty() => parents,
                _ => &segments[..],
            };

            let mut node = &reference.root;
            for segment in required {
                match node.get(*segment) {
                    Some(child) => node = child,
                    None => return true,
                }
            }
            false
        })
        .cloned()
        .collect();
    unknown.sort();
    unknown
}

/// Merges `updates` into `catalog`
///
/// Dotted keys (`a.b.c`) are applied first and address nested objects,
/// creating any that are missing. Plain keys follow. Object values merge
/// into existing objects key by key; any other value replaces what was
/// there, including an object.
pub fn apply_updates(catalog: &mut JsonCatalog, updates: &Map<String, Value>) -> UpdateReport {
    let mut report = UpdateReport::default();
    let Value::Object(root) = &mut catalog.root else {
        return report;
    };

    let (dotted, plain): (Vec<_>, Vec<_>) = updates.iter().partition(|(key, _)| key.contains('.'));

    for (key, value) in dotted {
        let segments: Vec<&str> = key.split('.').collect();
        if let Some((first, rest)) = segments.split_first() {
            merge_value(root, first, &nest(rest, value), "", &mut report);
        }
    }
    for (key, value) in plain {
        merge_value(root, key, value, "", &mut report);
    }

    catalog.reindex();
    report.added.sort();
    report.updated.sort();
    report
}

/// Wraps `value` in one object per segment (`[b, c]` gives `{"b":{"c":value}}`)
fn nest(segments: &[&str], value: &Value) -> Value {
    segments.iter().rev().fold(value.clone(), |inner, segment| {
        let mut map = Map::new();
        map.insert(segment.to_string(), inner);
        Value::Object(map)
    })
}

fn merge_value(
    target: &mut Map<String, Value>,
    key: &str,
    value: &Value,
    path: &str,
    report: &mut UpdateReport,
) {
    let full_path = join_key(path, key);
    match value {
        Value::Object(children) => {
            let slot = target
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(child) = slot {
                for (child_key, child_value) in children {
                    merge_value(child, child_key, child_value, &full_path, report);
                }
            }
        }
        _ => {
            match target.get(key) {
                None => report.added.push(full_path),
                Some(existing) if existing != value => report.updated.push(full_path),
                Some(_) => {}
            }
            target.insert(key.to_string(), value.clone());
        }
    }
}

/// Dotted keys that collide when compared case-insensitively
///
/// Returns one entry per collision group, each group sorted.
pub fn duplicate_keys(catalog: &JsonCatalog) -> Vec<Vec<String>> {
    let mut groups: HashMap<String, Vec<String>> = HashMap::new();
    for key in catalog.keys() {
        groups
            .entry(key.to_lowercase())
            .or_default()
            .push(key.to_string());
    }

    let mut duplicates: Vec<Vec<String>> = groups
        .into_values()
        .filter(|group| group.len() > 1)
        .map(|mut group| {
            group.sort();
            group
        })
        .collect();
    duplicates.sort();
    duplicates
}

/// Built-in keys the catalog does not translate
pub fn untranslated_builtin_keys(catalog: &JsonCatalog) -> Vec<&'static str> {
    builtin_message_keys()
        .iter()
        .copied()
        .filter(|key| catalog.get(key).is_none())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ParamValue;
    use crate::validation::Severity;

    const EN: &str = r#"{
        "validation": {
            "length": {
                "error": "Line is {length} characters (limit {limit})",
                "warning": "Line is {length} characters"
            },
            "unsafe_keybind": "{key} is reserved"
        },
        "ui": { "title": "Keybinds", "tabs": ["space", "ground"] }
    }"#;

    const DE: &str = r#"{
        "validation": {
            "length": { "error": "Zeile hat {length} Zeichen" },
            "Unsafe_Keybind": "{key} ist reserviert",
            "obsolete": "alt"
        }
    }"#;

    fn issue(key: &str, default_message: Option<&str>) -> Issue {
        let mut params = IssueParams::new();
        params.insert("length".to_string(), ParamValue::Int(995));
        params.insert("limit".to_string(), ParamValue::Int(990));
        Issue {
            rule_id: "length".to_string(),
            severity: Severity::Error,
            message_key: key.to_string(),
            params,
            default_message: default_message.map(str::to_string),
        }
    }

    #[test]
    fn test_flattens_nested_keys() {
        let catalog = JsonCatalog::from_json_str(EN).unwrap();
        let keys: Vec<&str> = catalog.keys().collect();

        assert_eq!(
            keys,
            vec![
                "ui.title",
                "validation.length.error",
                "validation.length.warning",
                "validation.unsafe_keybind",
            ]
        );
    }

    #[test]
    fn test_rejects_non_object_root() {
        assert!(matches!(
            JsonCatalog::from_json_str("[1, 2]"),
            Err(CatalogError::NotAnObject)
        ));
        assert!(matches!(
            JsonCatalog::from_json_str("{ nope"),
            Err(CatalogError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_render_prefers_translation() {
        let catalog = JsonCatalog::from_json_str(EN).unwrap();
        let text = render_issue(
            &issue("validation.length.error", Some("fallback")),
            Some(&catalog),
        );
        assert_eq!(text, "Line is 995 characters (limit 990)");
    }

    #[test]
    fn test_render_falls_back_to_default_then_key() {
        let catalog = JsonCatalog::from_json_str(EN).unwrap();

        assert_eq!(
            render_issue(&issue("validation.unknown", Some("fallback")), Some(&catalog)),
            "fallback"
        );
        assert_eq!(
            render_issue(&issue("validation.unknown", None), None),
            "validation.unknown"
        );
    }

    #[test]
    fn test_interpolate_handles_unclosed_brace() {
        let params = IssueParams::new();
        assert_eq!(interpolate("open { brace", &params), "open { brace");
        assert_eq!(interpolate("{}", &params), "{}");
    }

    #[test]
    fn test_missing_and_extra_keys() {
        let en = JsonCatalog::from_json_str(EN).unwrap();
        let de = JsonCatalog::from_json_str(DE).unwrap();

        assert_eq!(
            missing_keys(&en, &de),
            vec![
                "ui".to_string(),
                "validation.length.warning".to_string(),
                "validation.unsafe_keybind".to_string(),
            ]
        );
        assert_eq!(
            extra_keys(&en, &de),
            vec![
                "validation.Unsafe_Keybind".to_string(),
                "validation.obsolete".to_string(),
            ]
        );
    }

    #[test]
    fn test_duplicate_keys_case_insensitive() {
        let catalog = JsonCatalog::from_json_str(
            r#"{ "a": { "Key": "x", "key": "y" }, "b": "z" }"#,
        )
        .unwrap();

        assert_eq!(
            duplicate_keys(&catalog),
            vec![vec!["a.Key".to_string(), "a.key".to_string()]]
        );
    }

    #[test]
    fn test_untranslated_builtin_keys() {
        let catalog = JsonCatalog::from_json_str(EN).unwrap();
        let missing = untranslated_builtin_keys(&catalog);

        assert!(!missing.contains(&"validation.length.error"));
        assert!(missing.contains(&"validation.tray_exec_optimization"));
    }

    #[test]
    fn test_prune_extra_keys_removes_unknown_subtrees() {
        let en = JsonCatalog::from_json_str(EN).unwrap();
        let mut de = JsonCatalog::from_json_str(DE).unwrap();

        let removed = prune_extra_keys(&en, &mut de);

        assert_eq!(
            removed,
            vec![
                "validation.Unsafe_Keybind".to_string(),
                "validation.obsolete".to_string(),
            ]
        );
        assert!(extra_keys(&en, &de).is_empty());
        assert_eq!(de.get("validation.length.error"), Some("Zeile hat {length} Zeichen"));
        assert_eq!(de.len(), 1);
    }

    #[test]
    fn test_prune_leaves_arrays_alone() {
        let en = JsonCatalog::from_json_str(r#"{ "tabs": ["a", "b"] }"#).unwrap();
        let mut de = JsonCatalog::from_json_str(r#"{ "tabs": ["x", "y", "z"] }"#).unwrap();

        assert!(prune_extra_keys(&en, &mut de).is_empty());
        assert!(de.to_pretty_json().unwrap().contains("\"z\""));
    }

    #[test]
    fn test_apply_updates_dotted_and_nested() {
        let mut de = JsonCatalog::from_json_str(DE).unwrap();
        let updates: Map<String, Value> = serde_json::from_str(
            r#"{
                "validation.length.warning": "Zeile hat {length} Zeichen",
                "validation.length.error": "Zeile zu lang",
                "ui": { "title": "Tastenbelegung" }
            }"#,
        )
        .unwrap();

        let report = apply_updates(&mut de, &updates);

        assert_eq!(
            report.added,
            vec!["ui.title".to_string(), "validation.length.warning".to_string()]
        );
        assert_eq!(report.updated, vec!["validation.length.error".to_string()]);
        assert_eq!(de.get("ui.title"), Some("Tastenbelegung"));
        assert_eq!(de.get("validation.length.error"), Some("Zeile zu lang"));
        assert_eq!(de.get("validation.obsolete"), Some("alt"));
    }

    #[test]
    fn test_apply_updates_replaces_leaf_with_object() {
        let mut catalog = JsonCatalog::from_json_str(r#"{ "commands": "flat" }"#).unwrap();
        let updates: Map<String, Value> =
            serde_json::from_str(r#"{ "commands.fire_all": { "name": "Fire All" } }"#).unwrap();

        let report = apply_updates(&mut catalog, &updates);

        assert_eq!(report.added, vec!["commands.fire_all.name".to_string()]);
        assert_eq!(catalog.get("commands.fire_all.name"), Some("Fire All"));
        assert_eq!(catalog.get("commands"), None);
    }

    #[test]
    fn test_unchanged_update_is_not_reported() {
        let mut catalog = JsonCatalog::from_json_str(EN).unwrap();
        let updates: Map<String, Value> =
            serde_json::from_str(r#"{ "ui": { "title": "Keybinds" } }"#).unwrap();

        assert!(apply_updates(&mut catalog, &updates).is_empty());
    }

    #[test]
    fn test_unknown_update_keys() {
        let en = JsonCatalog::from_json_str(EN).unwrap();
        let updates: Map<String, Value> = serde_json::from_str(
            r#"{
                "validation.length.new_key": "ok",
                "ui": {},
                "validation.missing.key": "bad",
                "nowhere": "bad"
            }"#,
        )
        .unwrap();

        assert_eq!(
            unknown_update_keys(&en, &updates),
            vec!["nowhere".to_string(), "validation.missing.key".to_string()]
        );
    }

    #[test]
    fn test_save_round_trips() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("de.json");
        let catalog = JsonCatalog::from_json_str(DE).unwrap();

        catalog.save(&path).unwrap();
        let reloaded = JsonCatalog::load(&path).unwrap();

        assert_eq!(
            reloaded.keys().collect::<Vec<_>>(),
            catalog.keys().collect::<Vec<_>>()
        );
        assert!(fs::read_to_string(&path).unwrap().ends_with("}\n"));
    }
}
