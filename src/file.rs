//! The file a permalink is built from: its path fields, props and data.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Fields derived from a slash-separated path.
///
/// Mirrors the usual `path.parse` split: `a/b/c.md` has dir `a/b`, base
/// `c.md`, ext `.md` and name `c`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathInfo {
    pub path: String,
    pub root: String,
    pub dir: String,
    pub base: String,
    pub ext: String,
    pub name: String,
}

impl PathInfo {
    pub fn parse(path: &str) -> Self {
        let root = if path.starts_with('/') { "/" } else { "" };

        // Trailing slashes never make an empty basename, but the root stays.
        let trimmed = match path.trim_end_matches('/') {
            "" => root,
            t => t,
        };

        let (dir, base) = match trimmed.rfind('/') {
            Some(0) if trimmed.len() > 1 => ("/", &trimmed[1..]),
            Some(0) => ("/", ""),
            Some(i) => (&trimmed[..i], &trimmed[i + 1..]),
            None => ("", trimmed),
        };

        // A leading dot is part of the name, not an extension (`.gitignore`).
        let (name, ext) = match base.rfind('.') {
            Some(i) if i > 0 => (&base[..i], &base[i..]),
            _ => (base, ""),
        };

        Self {
            path: path.to_owned(),
            root: root.to_owned(),
            dir: dir.to_owned(),
            base: base.to_owned(),
            ext: ext.to_owned(),
            name: name.to_owned(),
        }
    }

    pub fn is_absolute(&self) -> bool {
        !self.root.is_empty()
    }

    /// Template-visible fields, including the common aliases.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        let mut put = |key: &str, value: &str| {
            map.insert(key.to_owned(), Value::String(value.to_owned()));
        };
        put("path", &self.path);
        put("root", &self.root);
        put("dir", &self.dir);
        put("dirname", &self.dir);
        put("base", &self.base);
        put("basename", &self.base);
        put("ext", &self.ext);
        put("extname", &self.ext);
        put("extension", self.ext.trim_start_matches('.'));
        put("name", &self.name);
        put("stem", &self.name);
        map.insert("absolute".to_owned(), Value::Bool(self.is_absolute()));
        map.insert("is_absolute".to_owned(), Value::Bool(self.is_absolute()));
        map
    }
}

/// A file to build a permalink for.
///
/// `props` are string properties that override the fields parsed from the
/// path; `data` is free-form front-matter. A `permalink` entry in `data`
/// (either a string or a table with a `structure` key) takes precedence over
/// the structure passed to `format`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct File {
    path: Option<String>,
    props: BTreeMap<String, String>,
    data: Map<String, Value>,
}

impl File {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// A file with no path, described by properties only.
    pub fn from_props<I, K, V>(props: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            props: props
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn props(&self) -> &BTreeMap<String, String> {
        &self.props
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.data
    }

    pub fn info(&self) -> Option<PathInfo> {
        self.path.as_deref().map(PathInfo::parse)
    }

    /// The structure defined on the file itself, if any.
    pub fn structure(&self) -> Option<&str> {
        match self.data.get("permalink")? {
            Value::String(s) => Some(s.as_str()),
            Value::Object(table) => table.get("structure")?.as_str(),
            _ => None,
        }
    }

    /// Path fields (when `parse_path` is set) overlaid with string props.
    pub fn fields(&self, parse_path: bool) -> Map<String, Value> {
        let mut map = match self.info() {
            Some(info) if parse_path => info.to_map(),
            _ => Map::new(),
        };
        for (key, value) in &self.props {
            map.insert(key.clone(), Value::String(value.clone()));
        }
        map
    }

    /// The file as helpers and templates see it: its fields plus `data`.
    pub fn to_value(&self) -> Value {
        let mut map = self.fields(true);
        map.insert("data".to_owned(), Value::Object(self.data.clone()));
        Value::Object(map)
    }
}

impl From<&str> for File {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for File {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}
