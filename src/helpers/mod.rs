//! Permalink helpers and their bridge into Handlebars.
//!
//! Helpers never see an ambient receiver: every invocation gets a [`Call`]
//! carrying the arguments, the file being rendered, the assembled data and a
//! way to reach sibling helpers.

pub mod builtins;

use crate::file::File;
use handlebars::{
    Context, Handlebars, Helper, HelperDef, RenderContext, RenderError, RenderErrorReason,
    ScopedJson,
};
use serde_json::{Map, Value};
use std::{
    collections::BTreeMap,
    sync::{Arc, OnceLock},
};

/// Name of the hook Handlebars calls for unresolved variables and helpers.
pub const HELPER_MISSING: &str = "helperMissing";

/// Signature of a permalink helper.
pub type HelperFn = dyn Fn(&Call<'_>) -> anyhow::Result<Value> + Send + Sync;

pub(crate) type Registry = BTreeMap<String, Arc<HelperFn>>;

/// One helper invocation.
pub struct Call<'a> {
    name: &'a str,
    args: &'a [Value],
    hash: &'a Map<String, Value>,
    file: &'a File,
    locals: &'a Map<String, Value>,
    data: &'a Map<String, Value>,
    helpers: &'a Registry,
}

impl<'a> Call<'a> {
    /// The name the template used. For `helperMissing` this is the
    /// unresolved variable.
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn args(&self) -> &'a [Value] {
        self.args
    }

    pub fn arg(&self, index: usize) -> Option<&'a Value> {
        self.args.get(index)
    }

    pub fn str_arg(&self, index: usize) -> Option<&'a str> {
        self.arg(index).and_then(Value::as_str)
    }

    /// `key=value` arguments.
    pub fn hash(&self) -> &'a Map<String, Value> {
        self.hash
    }

    pub fn file(&self) -> &'a File {
        self.file
    }

    /// Locals passed to this render.
    pub fn locals(&self) -> &'a Map<String, Value> {
        self.locals
    }

    /// Render data: path fields, global data, locals and file data merged.
    pub fn data(&self) -> &'a Map<String, Value> {
        self.data
    }

    /// Invoke another registered helper with the same file and data.
    pub fn helper(&self, name: &str, args: &[Value]) -> anyhow::Result<Value> {
        let Some(f) = self.helpers.get(name) else {
            anyhow::bail!("no helper named `{name}`");
        };
        let empty = Map::new();
        f(&Call {
            name,
            args,
            hash: &empty,
            file: self.file,
            locals: self.locals,
            data: self.data,
            helpers: self.helpers,
        })
    }
}

/// What went wrong inside a render, for errors Handlebars flattens to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Failure {
    Unresolved(String),
    PresetCycle(String),
}

/// Per-render slot recording the first typed failure.
pub(crate) type FailureSlot = OnceLock<Failure>;

fn collect_args(h: &Helper<'_>) -> (Vec<Value>, Map<String, Value>) {
    let args = h.params().iter().map(|p| p.value().clone()).collect();
    let hash = h
        .hash()
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.value().clone()))
        .collect();
    (args, hash)
}

pub(crate) fn render_error(message: String) -> RenderError {
    RenderErrorReason::Other(message).into()
}

/// Adapter exposing a registered helper to one render.
pub(crate) struct Bridge<'a> {
    pub(crate) f: Arc<HelperFn>,
    pub(crate) file: &'a File,
    pub(crate) locals: &'a Map<String, Value>,
    pub(crate) data: &'a Map<String, Value>,
    pub(crate) helpers: &'a Registry,
}

impl HelperDef for Bridge<'_> {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let name = h.name();
        let (args, hash) = collect_args(h);
        let call = Call {
            name,
            args: &args,
            hash: &hash,
            file: self.file,
            locals: self.locals,
            data: self.data,
            helpers: self.helpers,
        };
        (self.f)(&call)
            .map(ScopedJson::Derived)
            .map_err(|e| render_error(format!("helper `{name}` failed: {e:#}")))
    }
}

/// Default context-missing handler: fail, naming the variable.
pub(crate) struct Missing<'a> {
    pub(crate) slot: &'a FailureSlot,
}

impl HelperDef for Missing<'_> {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let name = h.name().to_owned();
        log::debug!("unresolved permalink variable :{name}");
        let message = format!(r#"cannot resolve permalink variable: ":{name}""#);
        // Only the first failure is reported.
        let _ = self.slot.set(Failure::Unresolved(name));
        Err(render_error(message))
    }
}
