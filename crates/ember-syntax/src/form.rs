//! Top-level AST definitions.
//! 顶层 AST 定义。

use crate::Expr;
use ember_common::Span;
use std::fmt;
use std::sync::Arc;

/// A complete source file.
/// 完整的源文件。
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub forms: Vec<Form>,
    pub span: Span,
}

impl SourceFile {
    /// Name declared by `-module(...)`, if any.
    pub fn module_name(&self) -> Option<&str> {
        self.forms.iter().find_map(|form| match &form.kind {
            FormKind::Module(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

/// A top-level form, terminated by `.`.
/// 顶层形式。
#[derive(Debug, Clone)]
pub struct Form {
    pub kind: FormKind,
    pub span: Span,
}

/// Kind of top-level form.
/// 顶层形式的类型。
#[derive(Debug, Clone)]
pub enum FormKind {
    /// `-module(name).` / 模块声明
    Module(String),
    /// `-export([f/1, g/2]).` / 导出列表
    Export(Vec<FunctionName>),
    /// A function with a single clause / 单子句函数
    Function(FunctionDef),
    /// Several clauses separated by `;`. Names and arities are not checked
    /// here. / 多子句函数
    MultiFunction(Vec<FunctionDef>),
}

/// One function clause `name(Params) -> Body`.
/// 函数子句。
#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Expr>,
    pub body: Arc<Expr>,
    pub span: Span,
}

impl FunctionDef {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn key(&self) -> String {
        FunctionName::new(self.name.clone(), self.arity()).to_string()
    }
}

/// A `name/arity` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionName {
    pub name: String,
    pub arity: usize,
}

impl FunctionName {
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
        }
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}
