//! Argument binding for API entries.
//!
//! A call supplies either positional or keyword arguments for the entry's
//! declared parameter names, never both. Values bound into a route must be
//! string-like scalars; structured values are rejected at the call boundary
//! instead of being discovered later inside a URL.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{Error, Result};

/// A single call argument, tagged at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum CallArg {
    /// A string-like scalar, usable in a route slot.
    Scalar(String),
    /// A structured value. Never valid in a route slot; exists so misuse
    /// fails with a clear error rather than a type-system dead end for
    /// callers forwarding loosely-typed JSON.
    Structured(Value),
}

impl From<&str> for CallArg {
    fn from(value: &str) -> Self {
        CallArg::Scalar(value.to_owned())
    }
}

impl From<String> for CallArg {
    fn from(value: String) -> Self {
        CallArg::Scalar(value)
    }
}

impl From<i64> for CallArg {
    fn from(value: i64) -> Self {
        CallArg::Scalar(value.to_string())
    }
}

impl From<u64> for CallArg {
    fn from(value: u64) -> Self {
        CallArg::Scalar(value.to_string())
    }
}

impl From<Value> for CallArg {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => CallArg::Scalar(s),
            Value::Number(n) => CallArg::Scalar(n.to_string()),
            Value::Bool(b) => CallArg::Scalar(b.to_string()),
            other => CallArg::Structured(other),
        }
    }
}

/// Positional and keyword arguments for one call.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    positional: Vec<CallArg>,
    keyword: BTreeMap<String, CallArg>,
}

impl CallArgs {
    pub fn none() -> Self {
        CallArgs::default()
    }

    /// All-positional arguments, in declaration order.
    pub fn positional<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<CallArg>,
    {
        CallArgs {
            positional: args.into_iter().map(Into::into).collect(),
            keyword: BTreeMap::new(),
        }
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<CallArg>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Add a keyword argument.
    pub fn named(mut self, name: impl Into<String>, value: impl Into<CallArg>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }
}

fn scalar(entry_name: &str, param: &str, arg: &CallArg) -> Result<String> {
    match arg {
        CallArg::Scalar(s) => Ok(s.clone()),
        CallArg::Structured(_) => Err(Error::failure(format!(
            "argument '{}' of '{}' must be a string-like scalar, not a structured value",
            param, entry_name
        ))),
    }
}

/// Bind a call's arguments onto the entry's declared parameter names.
///
/// The trailing payload (for entries that accept one) is not part of this
/// binding; it is consumed separately by the caller and passed through
/// unmodified.
pub fn bind(
    entry_name: &str,
    declared: &[String],
    args: &CallArgs,
) -> Result<BTreeMap<String, String>> {
    if !args.positional.is_empty() && !args.keyword.is_empty() {
        return Err(Error::failure(format!(
            "mixing positional and keyword arguments in call to '{}'",
            entry_name
        )));
    }

    if !args.keyword.is_empty() {
        for name in args.keyword.keys() {
            if !declared.iter().any(|d| d == name) {
                return Err(Error::failure(format!(
                    "'{}' takes no argument named '{}'",
                    entry_name, name
                )));
            }
        }
        let mut bound = BTreeMap::new();
        for name in declared {
            let arg = args.keyword.get(name).ok_or_else(|| {
                Error::failure(format!(
                    "missing argument '{}' in call to '{}'",
                    name, entry_name
                ))
            })?;
            bound.insert(name.clone(), scalar(entry_name, name, arg)?);
        }
        return Ok(bound);
    }

    if args.positional.len() != declared.len() {
        return Err(Error::failure(format!(
            "'{}' takes {} argument(s), got {}",
            entry_name,
            declared.len(),
            args.positional.len()
        )));
    }

    let mut bound = BTreeMap::new();
    for (name, arg) in declared.iter().zip(&args.positional) {
        bound.insert(name.clone(), scalar(entry_name, name, arg)?);
    }
    Ok(bound)
}
