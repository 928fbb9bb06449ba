//! Module loading: `c(name)` and `Machine::load_module`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ember_eval::{Context, Evaluator, Module, ModuleInfo, NativeFunction, Value};
use ember_syntax::SourceFile;
use tracing::{debug, info};

use crate::MachineError;

/// File extension of module sources.
pub const EXTENSION: &str = "erl";

/// Parse `text`, failing if any diagnostic is an error.
pub fn parse_source(filename: &str, text: &str) -> Result<SourceFile, MachineError> {
    let (file, diagnostics) = ember_parser::parse(text);
    if diagnostics.iter().any(|d| d.is_error()) {
        return Err(MachineError::Parse {
            filename: filename.to_string(),
            text: text.to_string(),
            diagnostics,
        });
    }
    Ok(file)
}

/// First `<name>.erl` found on the search path.
pub fn find_module(search_paths: &[PathBuf], name: &str) -> Option<PathBuf> {
    search_paths
        .iter()
        .map(|dir| dir.join(format!("{}.{}", name, EXTENSION)))
        .find(|path| path.is_file())
}

/// Evaluate a module's forms in a fresh module scope under `root`.
/// Nothing is registered; see [`load_module`].
pub fn compile_module(
    evaluator: &Evaluator,
    root: &Context,
    filename: &str,
    file: &SourceFile,
) -> Result<Arc<Module>, MachineError> {
    let info = Arc::new(ModuleInfo::new());
    let scope = root.module_scope(info.clone());
    for form in &file.forms {
        evaluator.eval_form(form, &scope)?;
    }

    let name = info.name().ok_or_else(|| MachineError::MissingModule {
        filename: filename.to_string(),
    })?;
    let module = Module::new(name, info.exports(), scope);
    for export in module.exports() {
        if module.context().lookup(export).is_none() {
            debug!(module = name, export = %export, "exported function is not defined");
        }
    }
    Ok(Arc::new(module))
}

/// Find, compile and register module `name` in `root`.
pub fn load_module(
    evaluator: &Evaluator,
    root: &Context,
    search_paths: &[PathBuf],
    name: &str,
) -> Result<Arc<Module>, MachineError> {
    let path = find_module(search_paths, name)
        .ok_or_else(|| MachineError::ModuleNotFound(name.to_string()))?;
    let module = load_file(evaluator, root, &path)?;
    if module.name() != name {
        return Err(MachineError::ModuleName {
            filename: path.display().to_string(),
            declared: module.name().to_string(),
            expected: name.to_string(),
        });
    }
    Ok(module)
}

/// Compile the module in `path` and register it under its declared name.
pub fn load_file(
    evaluator: &Evaluator,
    root: &Context,
    path: &Path,
) -> Result<Arc<Module>, MachineError> {
    let filename = path.display().to_string();
    let text = fs::read_to_string(path)?;
    let file = parse_source(&filename, &text)?;
    let module = compile_module(evaluator, root, &filename, &file)?;
    root.define(module.name(), Value::Module(module.clone()));
    info!(
        module = module.name(),
        path = %filename,
        exports = module.exports().len(),
        "module loaded"
    );
    Ok(module)
}

/// The `c/1` built-in: load a module by atom name, returning `{ok, Name}`.
pub fn loader_builtin(search_paths: Vec<PathBuf>) -> NativeFunction {
    NativeFunction::new("c", 1, move |evaluator, ctx, args| {
        let name = args[0].as_atom().ok_or_else(|| {
            ember_eval::EvalError::TypeError(format!("bad argument to c: {}", args[0]))
        })?;
        let module = load_module(evaluator, &ctx.root(), &search_paths, name)?;
        Ok(Value::tuple(vec![Value::ok(), Value::atom(module.name())]))
    })
}
