//! Parsing of `/system/build.prop` into a dotted-key tree.
//!
//! `ro.build.version.sdk=34` becomes `ro -> build -> version -> sdk = "34"`.
//! A key may be both a value and a prefix of other keys (`ro.build` and
//! `ro.build.id`); each node keeps an optional value next to its children.

use crate::adb::{AdbClient, AdbResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct PropNode {
    pub value: Option<String>,
    pub children: BTreeMap<String, PropNode>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct PropTree {
    root: PropNode,
    len: usize,
}

impl PropTree {
    pub fn parse(text: &str) -> Self {
        let mut tree = PropTree::default();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) => tree.set(key.trim(), value.trim()),
                None => log::warn!("build.prop line {}: no '=' in {line:?}, skipped", lineno + 1),
            }
        }
        tree
    }

    pub fn set(&mut self, key: &str, value: &str) {
        if key.is_empty() {
            return;
        }
        let mut node = &mut self.root;
        for part in key.split('.') {
            node = node.children.entry(part.to_string()).or_default();
        }
        if node.value.replace(value.to_string()).is_none() {
            self.len += 1;
        }
    }

    fn node(&self, key: &str) -> Option<&PropNode> {
        key.split('.')
            .try_fold(&self.root, |node, part| node.children.get(part))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.node(key)?.value.as_deref()
    }

    pub fn subtree(&self, prefix: &str) -> Option<&PropNode> {
        self.node(prefix)
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All values as `(dotted.key, value)` in key order.
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(self.len);
        flatten_into(&self.root, &mut String::new(), &mut out);
        out
    }
}

fn flatten_into(node: &PropNode, prefix: &mut String, out: &mut Vec<(String, String)>) {
    for (name, child) in &node.children {
        let restore = prefix.len();
        if !prefix.is_empty() {
            prefix.push('.');
        }
        prefix.push_str(name);
        if let Some(value) = &child.value {
            out.push((prefix.clone(), value.clone()));
        }
        flatten_into(child, prefix, out);
        prefix.truncate(restore);
    }
}

impl fmt::Display for PropTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.flatten() {
            writeln!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

/// The few properties worth printing per device.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceSummary {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub android_release: Option<String>,
    pub sdk: Option<String>,
}

impl DeviceSummary {
    pub fn from_props(props: &PropTree) -> Self {
        let get = |key: &str| props.get(key).map(str::to_string);
        Self {
            manufacturer: get("ro.product.manufacturer"),
            model: get("ro.product.model"),
            android_release: get("ro.build.version.release"),
            sdk: get("ro.build.version.sdk"),
        }
    }
}

impl fmt::Display for DeviceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let or_unknown = |v: &Option<String>| v.clone().unwrap_or_else(|| "?".to_string());
        write!(
            f,
            "{} {} (Android {}, SDK {})",
            or_unknown(&self.manufacturer),
            or_unknown(&self.model),
            or_unknown(&self.android_release),
            or_unknown(&self.sdk)
        )
    }
}

pub async fn read_device_props<C: AdbClient>(client: &C) -> AdbResult<PropTree> {
    let text = client.shell("cat /system/build.prop").await?;
    let props = PropTree::parse(&text);
    log::debug!("{}: read {} properties", client.serial(), props.len());
    Ok(props)
}
