//! The `Permalinks` registry: helpers, presets, global data and context
//! functions, plus the render step that ties them to a converted pattern.

use crate::{
    convert::convert,
    error::{Error, Result},
    file::File,
    helpers::{
        Bridge, Call, Failure, FailureSlot, HELPER_MISSING, HelperFn, Missing, Registry,
        builtins, render_error,
    },
    util::merge,
};
use handlebars::{Context, Handlebars, Helper, HelperDef, RenderContext, RenderError, ScopedJson};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::{collections::BTreeMap, fmt, sync::Arc};

/// Presets may reference other presets up to this depth.
pub const MAX_PRESET_DEPTH: usize = 16;

/// Called at every render with the file and the data assembled so far.
pub type ContextFn = dyn Fn(&File, &mut Map<String, Value>) + Send + Sync;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Named structures usable in place of a pattern or as `:name`.
    pub presets: BTreeMap<String, String>,
    /// Global data merged into every render.
    pub data: Map<String, Value>,
    /// Parse `file.path` into path fields.
    pub parse_file: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            presets: BTreeMap::new(),
            data: Map::new(),
            parse_file: true,
        }
    }
}

pub struct Permalinks {
    options: Options,
    helpers: Registry,
    contexts: Vec<Arc<ContextFn>>,
}

impl Default for Permalinks {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Permalinks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Permalinks")
            .field("options", &self.options)
            .field("helpers", &self.helpers.keys().collect::<Vec<_>>())
            .field("contexts", &self.contexts.len())
            .finish()
    }
}

impl Permalinks {
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Self {
        let mut helpers = Registry::new();
        builtins::register_defaults(&mut helpers);
        Self {
            options,
            helpers,
            contexts: Vec::new(),
        }
    }

    /// Register helper `name`, replacing any previous one.
    ///
    /// Registering `helperMissing` replaces the handler for unresolved
    /// variables.
    pub fn helper<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&Call<'_>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.helpers.insert(name.into(), Arc::new(f) as Arc<HelperFn>);
        self
    }

    pub fn has_helper(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    pub fn preset(&mut self, name: impl Into<String>, structure: impl Into<String>) -> &mut Self {
        self.options.presets.insert(name.into(), structure.into());
        self
    }

    pub fn preset_structure(&self, name: &str) -> Option<&str> {
        self.options.presets.get(name).map(String::as_str)
    }

    pub fn presets(&self) -> &BTreeMap<String, String> {
        &self.options.presets
    }

    /// Add a context function. They run in registration order.
    pub fn context<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&File, &mut Map<String, Value>) + Send + Sync + 'static,
    {
        self.contexts.push(Arc::new(f));
        self
    }

    /// Set a global data value.
    pub fn data(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.options.data.insert(key.into(), value.into());
        self
    }

    pub fn global_data(&self) -> &Map<String, Value> {
        &self.options.data
    }

    /// Path fields of `file` overlaid with its string properties.
    pub fn parse(&self, file: &File) -> Map<String, Value> {
        file.fields(self.options.parse_file)
    }

    /// Data a pattern is rendered against.
    ///
    /// Later sources win: path fields, global data, `locals`, `file.data`,
    /// then `file.data.permalink` when it is a table. Context functions run
    /// on the result, and `file` is always the file itself.
    pub fn build_context(&self, file: &File, locals: &Map<String, Value>) -> Map<String, Value> {
        let mut data = self.parse(file);
        merge(&mut data, &self.options.data);
        merge(&mut data, locals);
        merge(&mut data, file.data());
        if let Some(Value::Object(table)) = file.data().get("permalink") {
            merge(&mut data, table);
        }

        for f in &self.contexts {
            f(file, &mut data);
        }

        data.insert("file".to_owned(), file.to_value());
        data
    }

    /// Format `structure` (a pattern or preset name) for `file`.
    ///
    /// A structure defined on the file itself takes precedence.
    pub fn format(
        &self,
        structure: &str,
        file: &File,
        locals: &Map<String, Value>,
    ) -> Result<String> {
        let structure = file.structure().unwrap_or(structure);
        let pattern = self.preset_structure(structure).unwrap_or(structure);
        self.render_pattern(pattern, file, locals, 0)
    }

    /// Format `file` using the structure it defines in `data.permalink`.
    pub fn format_file(&self, file: &File, locals: &Map<String, Value>) -> Result<String> {
        let structure = file.structure().ok_or(Error::MissingStructure)?;
        self.format(structure, file, locals)
    }

    fn render_pattern(
        &self,
        pattern: &str,
        file: &File,
        locals: &Map<String, Value>,
        depth: usize,
    ) -> Result<String> {
        let template = convert(pattern)?;
        let data = self.build_context(file, locals);
        let slot = FailureSlot::new();

        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);

        for (name, f) in &self.helpers {
            hbs.register_helper(
                name,
                Box::new(Bridge {
                    f: Arc::clone(f),
                    file,
                    locals,
                    data: &data,
                    helpers: &self.helpers,
                }),
            );
        }
        for (name, structure) in &self.options.presets {
            if !self.helpers.contains_key(name) {
                hbs.register_helper(
                    name,
                    Box::new(PresetHelper {
                        permalinks: self,
                        structure,
                        file,
                        locals,
                        depth,
                        slot: &slot,
                    }),
                );
            }
        }
        if !self.helpers.contains_key(HELPER_MISSING) {
            hbs.register_helper(HELPER_MISSING, Box::new(Missing { slot: &slot }));
        }

        hbs.render_template(&template, &data).map_err(|err| match slot.get() {
            Some(Failure::Unresolved(name)) => Error::UnresolvedVariable { name: name.clone() },
            Some(Failure::PresetCycle(name)) => Error::PresetCycle { name: name.clone() },
            None => Error::Render(err),
        })
    }
}

/// Exposes a preset as `:name`, formatting its structure for the same file.
struct PresetHelper<'a> {
    permalinks: &'a Permalinks,
    structure: &'a str,
    file: &'a File,
    locals: &'a Map<String, Value>,
    depth: usize,
    slot: &'a FailureSlot,
}

impl HelperDef for PresetHelper<'_> {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> std::result::Result<ScopedJson<'rc>, RenderError> {
        if self.depth + 1 >= MAX_PRESET_DEPTH {
            let name = h.name();
            let _ = self.slot.set(Failure::PresetCycle(name.to_owned()));
            return Err(render_error(format!("preset `{name}` nests too deeply")));
        }

        let rendered = self.permalinks.render_pattern(
            self.structure,
            self.file,
            self.locals,
            self.depth + 1,
        );
        match rendered {
            Ok(out) => Ok(ScopedJson::Derived(Value::String(out))),
            Err(err) => {
                match &err {
                    Error::UnresolvedVariable { name } => {
                        let _ = self.slot.set(Failure::Unresolved(name.clone()));
                    }
                    Error::PresetCycle { name } => {
                        let _ = self.slot.set(Failure::PresetCycle(name.clone()));
                    }
                    _ => {}
                }
                Err(render_error(err.to_string()))
            }
        }
    }
}
