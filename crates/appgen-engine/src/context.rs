//! Substitution contexts
//!
//! Each kind of generated file renders against its own context type. The
//! keys a context accepts are declared up front in a [`ContextSchema`], and
//! inserting anything else is an error.

use indexmap::IndexMap;

use appgen_core::{Application, Chart, ChartGroup};

use crate::error::{EngineError, Result};

/// Shape of a context value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Rendered by scalar tokens
    Scalar,
    /// Sequence or mapping, rendered by block markers
    Structured,
}

impl KeyKind {
    fn describe(self) -> &'static str {
        match self {
            KeyKind::Scalar => "scalar",
            KeyKind::Structured => "structured",
        }
    }
}

/// One declared key, in its normalized camelCase form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySpec {
    pub name: &'static str,
    pub kind: KeyKind,
}

impl KeySpec {
    const fn scalar(name: &'static str) -> Self {
        Self {
            name,
            kind: KeyKind::Scalar,
        }
    }

    const fn structured(name: &'static str) -> Self {
        Self {
            name,
            kind: KeyKind::Structured,
        }
    }
}

/// The set of keys a context type accepts
#[derive(Debug, PartialEq, Eq)]
pub struct ContextSchema {
    pub name: &'static str,
    pub keys: &'static [KeySpec],
}

impl ContextSchema {
    /// Declared key matching `key` in any case style
    pub fn resolve(&self, key: &str) -> Option<&KeySpec> {
        let normalized = normalize_key(key);
        self.keys
            .iter()
            .find(|spec| spec.name.eq_ignore_ascii_case(&normalized))
    }

    pub fn key_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.keys.iter().map(|spec| spec.name)
    }
}

/// Application-level files (base namespace)
pub static MANIFEST_SCHEMA: ContextSchema = ContextSchema {
    name: "manifest",
    keys: &[
        KeySpec::scalar("appName"),
        KeySpec::scalar("appVersion"),
        KeySpec::scalar("namespace"),
    ],
};

/// The top-level kustomization
pub static CHART_GROUP_SCHEMA: ContextSchema = ContextSchema {
    name: "chart group",
    keys: &[
        KeySpec::scalar("name"),
        KeySpec::structured("chartNames"),
        KeySpec::scalar("namespace"),
    ],
};

/// Per-chart flux manifests
pub static CHART_SCHEMA: ContextSchema = ContextSchema {
    name: "chart",
    keys: &[
        KeySpec::scalar("name"),
        KeySpec::scalar("version"),
        KeySpec::scalar("namespace"),
        KeySpec::scalar("chartGroup"),
        KeySpec::scalar("path"),
        KeySpec::scalar("subpath"),
        KeySpec::scalar("sourceKind"),
    ],
};

/// Plugin python sources
pub static PLUGIN_SCHEMA: ContextSchema = ContextSchema {
    name: "plugin",
    keys: &[
        KeySpec::scalar("appname"),
        KeySpec::scalar("name"),
        KeySpec::scalar("namespace"),
        KeySpec::scalar("appnameStriped"),
    ],
};

/// A context value
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    Scalar(String),
    Structured(serde_yaml::Value),
}

impl ContextValue {
    fn kind(&self) -> KeyKind {
        match self {
            ContextValue::Scalar(_) => KeyKind::Scalar,
            ContextValue::Structured(_) => KeyKind::Structured,
        }
    }

    /// String form for scalar tokens; structured values have none
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            ContextValue::Scalar(s) => Some(s),
            ContextValue::Structured(_) => None,
        }
    }
}

impl From<&str> for ContextValue {
    fn from(s: &str) -> Self {
        ContextValue::Scalar(s.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(s: String) -> Self {
        ContextValue::Scalar(s)
    }
}

impl From<Vec<String>> for ContextValue {
    fn from(items: Vec<String>) -> Self {
        ContextValue::Structured(serde_yaml::Value::Sequence(
            items.into_iter().map(serde_yaml::Value::String).collect(),
        ))
    }
}

impl From<serde_yaml::Value> for ContextValue {
    fn from(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::String(s) => ContextValue::Scalar(s),
            serde_yaml::Value::Number(n) => ContextValue::Scalar(n.to_string()),
            serde_yaml::Value::Bool(b) => ContextValue::Scalar(b.to_string()),
            other => ContextValue::Structured(other),
        }
    }
}

/// Values for one rendered file
#[derive(Debug, Clone)]
pub struct Context {
    schema: &'static ContextSchema,
    values: IndexMap<&'static str, ContextValue>,
}

impl Context {
    pub fn new(schema: &'static ContextSchema) -> Self {
        Self {
            schema,
            values: IndexMap::new(),
        }
    }

    pub fn schema(&self) -> &'static ContextSchema {
        self.schema
    }

    /// Set a key, given in any case style
    pub fn insert(&mut self, key: &str, value: impl Into<ContextValue>) -> Result<()> {
        let spec = self
            .schema
            .resolve(key)
            .ok_or_else(|| EngineError::UnknownKey {
                context: self.schema.name,
                key: key.to_string(),
            })?;

        let value = value.into();
        if value.kind() != spec.kind {
            return Err(EngineError::KindMismatch {
                context: self.schema.name,
                key: key.to_string(),
                expected: spec.kind.describe(),
            });
        }

        self.values.insert(spec.name, value);
        Ok(())
    }

    pub fn with(mut self, key: &str, value: impl Into<ContextValue>) -> Result<Self> {
        self.insert(key, value)?;
        Ok(self)
    }

    /// Look up a key as written in a template
    pub fn lookup(&self, key: &str) -> Option<&ContextValue> {
        let spec = self.schema.resolve(key)?;
        self.values.get(spec.name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn for_manifest(app: &Application) -> Result<Self> {
        Context::new(&MANIFEST_SCHEMA)
            .with("appName", app.name.as_str())?
            .with("appVersion", app.version.as_str())?
            .with("namespace", app.namespace.as_str())
    }

    pub fn for_chart_group(group: &ChartGroup) -> Result<Self> {
        Context::new(&CHART_GROUP_SCHEMA)
            .with("name", group.name.as_str())?
            .with("chartNames", group.chart_names.clone())?
            .with("namespace", group.namespace.as_str())
    }

    pub fn for_chart(chart: &Chart) -> Result<Self> {
        let mut ctx = Context::new(&CHART_SCHEMA)
            .with("name", chart.name.as_str())?
            .with("version", chart.version.as_str())?
            .with("namespace", chart.namespace.as_str())?
            .with("chartGroup", chart.chart_group.as_str())?
            .with("path", chart.path.as_str())?
            .with("sourceKind", chart.kind().to_string())?;
        if let Some(subpath) = &chart.subpath {
            ctx.insert("subpath", subpath.as_str())?;
        }
        Ok(ctx)
    }

    /// Context for a plugin source file; `name` is file specific
    pub fn for_plugin(app: &Application, name: &str) -> Result<Self> {
        Context::new(&PLUGIN_SCHEMA)
            .with("appname", app.name_underscore())?
            .with("name", name)?
            .with("namespace", app.namespace.as_str())?
            .with("appnameStriped", app.name_camel())
    }
}

/// Normalize a template key into the camelCase key space
///
/// Every letter is lowercased except those following a non-letter, which
/// are uppercased; underscores are then dropped and the first letter is
/// lowercased. `chart_names` and `CHART_NAMES` both become `chartNames`.
/// Schema lookups compare the result case-insensitively.
pub fn normalize_key(key: &str) -> String {
    let mut titled = String::with_capacity(key.len());
    let mut after_letter = false;
    for c in key.chars() {
        if c.is_alphabetic() {
            if after_letter {
                titled.extend(c.to_lowercase());
            } else {
                titled.extend(c.to_uppercase());
            }
            after_letter = true;
        } else {
            titled.push(c);
            after_letter = false;
        }
    }

    let joined: String = titled.chars().filter(|c| *c != '_').collect();
    let mut chars = joined.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
