//! The embeddable interpreter.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use ember_eval::{Context, Evaluator, Mode, Module, Node, Output, ProcessHandle, Value, builtin};
use ember_parser::Input;
use tracing::debug;

use crate::loader::{self, loader_builtin, parse_source};
use crate::{MachineConfig, MachineError};

/// One interpreter instance: a node, its root context and the process
/// that stands for the host thread.
///
/// Functions and modules live in the root. Variables bound by top-level
/// expressions live in a shell scope below it.
pub struct Machine {
    config: MachineConfig,
    root: Context,
    shell: Context,
    evaluator: Evaluator,
}

impl Machine {
    pub fn new(config: MachineConfig) -> Self {
        Self::with_output(config, Output::stdout())
    }

    /// A machine whose `io` output goes to `output`.
    pub fn with_output(config: MachineConfig, output: Output) -> Self {
        let node = Node::with_output(config.stack_size, output);
        let host = node.host_process();
        let root = Context::new();
        builtin::install(&root);
        ember_std::install(&root);

        let loader = loader_builtin(config.search_paths.clone());
        root.define(&loader.key(), loader.into_value());

        debug!(pid = host.pid(), "machine started");
        let shell = root.frame();
        Self {
            config,
            root,
            shell,
            evaluator: Evaluator::new(node, host),
        }
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn node(&self) -> &Node {
        self.evaluator.node()
    }

    pub fn root(&self) -> &Context {
        &self.root
    }

    /// Where top-level expressions bind their variables.
    pub fn shell(&self) -> &Context {
        &self.shell
    }

    /// The process standing in for the host thread.
    pub fn host(&self) -> &ProcessHandle {
        self.evaluator.process()
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Evaluate every form of `text` in the root context. Returns the value
    /// of each form.
    pub fn load_source(&self, filename: &str, text: &str) -> Result<Vec<Value>, MachineError> {
        let file = parse_source(filename, text)?;
        let mut values = Vec::with_capacity(file.forms.len());
        for form in &file.forms {
            values.push(self.evaluator.eval_form(form, &self.root)?);
        }
        Ok(values)
    }

    /// Find `<name>.erl` on the search path and load it as a module.
    pub fn load_module(&self, name: &str) -> Result<Arc<Module>, MachineError> {
        loader::load_module(&self.evaluator, &self.root, &self.config.search_paths, name)
    }

    /// Run a program file. A file declaring `-module` is loaded as a
    /// module, anything else straight into the root context. Then
    /// `main/0` is called if the file defines it.
    pub fn run_file(&self, path: &Path) -> Result<Option<Value>, MachineError> {
        let filename = path.display().to_string();
        let text = fs::read_to_string(path)?;
        let file = parse_source(&filename, &text)?;

        let scope = if file.module_name().is_some() {
            let module = loader::compile_module(&self.evaluator, &self.root, &filename, &file)?;
            self.root
                .define(module.name(), Value::Module(module.clone()));
            module.context().clone()
        } else {
            for form in &file.forms {
                self.evaluator.eval_form(form, &self.root)?;
            }
            self.root.clone()
        };

        match scope.lookup("main/0") {
            Some(main) => Ok(Some(self.evaluator.call(&main, &scope, Vec::new())?)),
            None => Ok(None),
        }
    }

    /// Evaluate one expression in the shell scope.
    pub fn eval_str(&self, text: &str) -> Result<Value, MachineError> {
        let (expr, diagnostics) = ember_parser::parse_expr(text);
        match expr {
            Some(expr) if !diagnostics.iter().any(|d| d.is_error()) => {
                Ok(self.evaluator.evaluate(&expr, &self.shell, Mode::Value)?)
            }
            _ => Err(parse_error(text, diagnostics)),
        }
    }

    /// Evaluate a line of interactive input: forms are defined in the
    /// root, an expression is evaluated in the shell scope. Returns the last value produced.
    pub fn eval_input(&self, text: &str) -> Result<Value, MachineError> {
        let (input, diagnostics) = ember_parser::parse_input(text);
        match input {
            Some(Input::Forms(file)) if !diagnostics.iter().any(|d| d.is_error()) => {
                let mut last = Value::ok();
                for form in &file.forms {
                    last = self.evaluator.eval_form(form, &self.root)?;
                }
                Ok(last)
            }
            Some(Input::Expr(expr)) if !diagnostics.iter().any(|d| d.is_error()) => {
                Ok(self.evaluator.evaluate(&expr, &self.shell, Mode::Value)?)
            }
            _ => Err(parse_error(text, diagnostics)),
        }
    }

    /// Call a function by name from the host: `name` is either a root
    /// function or `module:function`.
    pub fn call(&self, name: &str, args: Vec<Value>) -> Result<Value, MachineError> {
        let callee = match name.split_once(':') {
            Some((module, function)) => match self.root.lookup(module) {
                Some(Value::Module(module)) => module.function(function, args.len())?,
                _ => return Err(MachineError::ModuleNotFound(module.to_string())),
            },
            None => {
                let key = format!("{}/{}", name, args.len());
                self.root
                    .lookup(&key)
                    .ok_or(ember_eval::EvalError::UndefinedFunction(key))?
            }
        };
        Ok(self.evaluator.call(&callee, &self.root, args)?)
    }
}

fn parse_error(text: &str, diagnostics: Vec<ember_diagnostic::Diagnostic>) -> MachineError {
    MachineError::Parse {
        filename: "<input>".to_string(),
        text: text.to_string(),
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_str_uses_root_bindings() {
        let machine = Machine::new(MachineConfig::default());
        machine.load_source("t.erl", "double(X) -> X * 2.").unwrap();
        assert_eq!(machine.eval_str("double(21)").unwrap(), Value::Int(42));
        assert_eq!(machine.call("double", vec![Value::Int(4)]).unwrap(), Value::Int(8));
    }

    #[test]
    fn test_eval_input_forms_then_expr() {
        let machine = Machine::new(MachineConfig::default());
        machine.eval_input("sq(X) -> X * X.").unwrap();
        assert_eq!(machine.eval_input("sq(3).").unwrap(), Value::Int(9));
        assert_eq!(machine.eval_input("Y = sq(2).").unwrap(), Value::Int(4));
        assert_eq!(machine.eval_input("Y + 1").unwrap(), Value::Int(5));
    }

    #[test]
    fn test_shell_variables_stay_out_of_root() {
        let machine = Machine::new(MachineConfig::default());
        machine.eval_str("X = 1").unwrap();
        assert_eq!(machine.shell().lookup_local("X"), Some(Value::Int(1)));
        assert!(machine.root().lookup("X").is_none());
        assert_eq!(machine.eval_str("X + 1").unwrap(), Value::Int(2));
    }

    #[test]
    fn test_parse_error_carries_diagnostics() {
        let machine = Machine::new(MachineConfig::default());
        match machine.eval_str("{1, ") {
            Err(MachineError::Parse { diagnostics, .. }) => assert!(!diagnostics.is_empty()),
            other => panic!("expected parse error, got {:?}", other.map(|v| v.to_string())),
        }
    }

    #[test]
    fn test_call_std_module() {
        let machine = Machine::new(MachineConfig::default());
        let list = Value::list(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(
            machine.call("lists:reverse", vec![list]).unwrap().to_string(),
            "[2,1]"
        );
    }
}
