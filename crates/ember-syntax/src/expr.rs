//! Expression AST nodes.
//! 表达式 AST 节点。

use ember_common::Span;
use std::fmt;
use std::sync::Arc;

/// An expression.
/// 表达式。
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Reports whether the tree contains a variable reference anywhere,
    /// including `_`.
    /// 判断表达式树中是否包含变量引用。
    pub fn has_variable(&self) -> bool {
        match &self.kind {
            ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::String(_)
            | ExprKind::Bool(_)
            | ExprKind::Atom(_)
            | ExprKind::FunRef { .. } => false,
            ExprKind::Var(_) => true,
            ExprKind::Tuple(items) | ExprKind::Block(items) => {
                items.iter().any(Expr::has_variable)
            }
            ExprKind::List { items, tail } => {
                items.iter().any(Expr::has_variable)
                    || tail.as_deref().is_some_and(Expr::has_variable)
            }
            ExprKind::Call { func, args } => {
                func.has_variable() || args.iter().any(Expr::has_variable)
            }
            ExprKind::Remote { module, func, args } => {
                module.has_variable()
                    || func.has_variable()
                    || args.iter().any(Expr::has_variable)
            }
            ExprKind::Binary { left, right, .. } => left.has_variable() || right.has_variable(),
            ExprKind::Unary { operand, .. } => operand.has_variable(),
            ExprKind::Match { pattern, value } => pattern.has_variable() || value.has_variable(),
            ExprKind::Send { target, message } => target.has_variable() || message.has_variable(),
            ExprKind::Fun(clauses) => clauses
                .iter()
                .any(|c| c.params.iter().any(Expr::has_variable) || c.body.has_variable()),
            ExprKind::Receive(clauses) => clauses.iter().any(Clause::has_variable),
            ExprKind::Case { subject, clauses } => {
                subject.has_variable() || clauses.iter().any(Clause::has_variable)
            }
        }
    }

    /// Returns the variable name if this is a bare variable.
    pub fn as_var(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Var(name) => Some(name),
            _ => None,
        }
    }
}

/// Expression kind.
/// 表达式类型。
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Integer literal / 整数字面量
    Int(i64),
    /// Float literal / 浮点数字面量
    Float(f64),
    /// String literal / 字符串字面量
    String(String),
    /// `true` / `false`
    Bool(bool),

    /// Atom `ok`, `'hello world'` / 原子
    Atom(String),
    /// Variable reference `X`, `_` / 变量引用
    Var(String),

    /// Tuple `{a, b, c}` / 元组
    Tuple(Vec<Expr>),

    /// List `[1, 2, 3]` or `[H | T]` / 列表
    List {
        items: Vec<Expr>,
        tail: Option<Box<Expr>>,
    },

    /// Local call `f(x, y)` / 函数调用
    Call { func: Box<Expr>, args: Vec<Expr> },

    /// Qualified call `m:f(x)` / 模块限定调用
    Remote {
        module: Box<Expr>,
        func: Box<Expr>,
        args: Vec<Expr>,
    },

    /// Binary operation `a + b` / 二元运算
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Unary operation `-a`, `not a` / 一元运算
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Match `Pattern = Expr` / 模式匹配绑定
    Match { pattern: Box<Expr>, value: Box<Expr> },

    /// Send `Pid ! Message` / 发送消息
    Send { target: Box<Expr>, message: Box<Expr> },

    /// `begin ... end` or a comma sequence / 表达式序列
    Block(Vec<Expr>),

    /// `fun (X) -> ... ; (Y) -> ... end` / 匿名函数
    Fun(Vec<FunClause>),

    /// `fun name/arity` or `fun m:name/arity` / 函数引用
    FunRef {
        module: Option<String>,
        name: String,
        arity: usize,
    },

    /// `receive P -> B; ... end` / 接收消息
    Receive(Vec<Clause>),

    /// `case E of P -> B; ... end` / case 表达式
    Case {
        subject: Box<Expr>,
        clauses: Vec<Clause>,
    },
}

/// A single-pattern clause, as used by `receive` and `case`.
/// `receive` 和 `case` 的分支。
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub pattern: Expr,
    pub body: Expr,
    pub span: Span,
}

impl Clause {
    fn has_variable(&self) -> bool {
        self.pattern.has_variable() || self.body.has_variable()
    }
}

/// One clause of a `fun` literal.
/// 匿名函数的一个子句。
#[derive(Debug, Clone, PartialEq)]
pub struct FunClause {
    pub params: Vec<Expr>,
    /// Shared with every function value the literal creates
    pub body: Arc<Expr>,
    pub span: Span,
}

/// Binary operators.
/// 二元运算符。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic 算术运算
    Add,    // +
    Sub,    // -
    Mul,    // *
    Div,    // /
    IntDiv, // div
    Rem,    // rem

    // Comparison 比较运算
    Eq,      // ==
    Ne,      // /=
    ExactEq, // =:=
    ExactNe, // =/=
    Lt,      // <
    Le,      // =<
    Gt,      // >
    Ge,      // >=
}

impl BinOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::IntDiv | BinOp::Rem
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::IntDiv => "div",
            BinOp::Rem => "rem",
            BinOp::Eq => "==",
            BinOp::Ne => "/=",
            BinOp::ExactEq => "=:=",
            BinOp::ExactNe => "=/=",
            BinOp::Lt => "<",
            BinOp::Le => "=<",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unary operators.
/// 一元运算符。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg, // - 取负
    Not, // not 取反
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "not",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(kind: ExprKind) -> Expr {
        Expr::new(kind, Span::DUMMY)
    }

    #[test]
    fn test_has_variable_in_nested_tuple() {
        let tree = expr(ExprKind::Tuple(vec![
            expr(ExprKind::Atom("a".into())),
            expr(ExprKind::List {
                items: vec![expr(ExprKind::Int(1))],
                tail: Some(Box::new(expr(ExprKind::Var("T".into())))),
            }),
        ]));
        assert!(tree.has_variable());
    }

    #[test]
    fn test_ground_call_has_no_variable() {
        let tree = expr(ExprKind::Call {
            func: Box::new(expr(ExprKind::Atom("f".into()))),
            args: vec![expr(ExprKind::Int(1)), expr(ExprKind::String("s".into()))],
        });
        assert!(!tree.has_variable());
    }
}
