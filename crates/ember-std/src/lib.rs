//! Standard library for Ember.
//! Ember 标准库。
//!
//! This crate provides the `lists` and `io` modules.
//! 本 crate 提供 `lists` 和 `io` 模块。

mod io;
mod lists;

use std::sync::Arc;

use ember_eval::{Context, Module, NativeFunction, Value};

pub use io::format;

/// Build every standard module.
/// 构建所有标准模块。
pub fn modules() -> Vec<Module> {
    vec![
        module("lists", lists::builtins()),
        module("io", io::builtins()),
    ]
}

/// Register the standard modules in `root` under their names.
/// 在根上下文中按名称注册标准模块。
pub fn install(root: &Context) {
    for module in modules() {
        let name = module.name().to_string();
        root.define(&name, Value::Module(Arc::new(module)));
    }
}

fn module(name: &str, functions: Vec<NativeFunction>) -> Module {
    let scope = Context::new();
    for function in functions {
        scope.define(&function.key(), function.into_value());
    }
    Module::exporting_all(name, scope)
}
