//! The `io` module.
//!
//! Everything is written to the node's output sink, so tests can capture
//! it.

use ember_eval::{EvalError, Evaluator, NativeFunction, Value};

pub fn builtins() -> Vec<NativeFunction> {
    vec![
        NativeFunction::new("format", 1, |evaluator, _, args| {
            let text = format(&args[0], &[])?;
            write(evaluator, &text)
        }),
        NativeFunction::new("format", 2, |evaluator, _, args| {
            let values = args[1]
                .list_items()
                .ok_or_else(|| bad_argument("format", &args[1]))?;
            let text = format(&args[0], &values)?;
            write(evaluator, &text)
        }),
        NativeFunction::new("write", 1, |evaluator, _, args| {
            write(evaluator, &args[0].to_string())
        }),
        NativeFunction::new("nl", 0, |evaluator, _, _| write(evaluator, "\n")),
    ]
}

fn write(evaluator: &Evaluator, text: &str) -> Result<Value, EvalError> {
    evaluator.node().output().write_str(text)?;
    Ok(Value::ok())
}

/// Expand `~p ~w ~s ~n ~~` in a format string.
pub fn format(template: &Value, args: &[Value]) -> Result<String, EvalError> {
    let Value::String(template) = template else {
        return Err(bad_argument("format", template));
    };

    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('~') => out.push('~'),
            Some(directive @ ('p' | 'w' | 's')) => {
                let arg = args.next().ok_or_else(|| {
                    EvalError::TypeError(format!("io:format: missing argument for ~{}", directive))
                })?;
                match (directive, arg) {
                    ('s', Value::String(text)) | ('s', Value::Atom(text)) => out.push_str(text),
                    ('s', other) => return Err(bad_argument("format", other)),
                    _ => out.push_str(&arg.to_string()),
                }
            }
            Some(other) => {
                return Err(EvalError::TypeError(format!(
                    "io:format: unknown directive ~{}",
                    other
                )));
            }
            None => {
                return Err(EvalError::TypeError(
                    "io:format: format string ends with ~".to_string(),
                ));
            }
        }
    }

    if args.next().is_some() {
        return Err(EvalError::TypeError(
            "io:format: too many arguments".to_string(),
        ));
    }
    Ok(out)
}

fn bad_argument(name: &str, value: &Value) -> EvalError {
    EvalError::TypeError(format!("bad argument to io:{}: {}", name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_directives() {
        let template = Value::string("~s is ~p~n~~");
        let text = format(&template, &[Value::atom("x"), Value::tuple(vec![Value::Int(1)])]).unwrap();
        assert_eq!(text, "x is {1}\n~");
    }

    #[test]
    fn test_format_quotes_strings_with_p() {
        let text = format(&Value::string("~p ~s"), &[Value::string("a"), Value::string("a")]).unwrap();
        assert_eq!(text, "\"a\" a");
    }

    #[test]
    fn test_format_argument_count() {
        assert!(format(&Value::string("~p"), &[]).is_err());
        assert!(format(&Value::string("x"), &[Value::Int(1)]).is_err());
    }
}
