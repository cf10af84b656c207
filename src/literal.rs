// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Type-directed mapping of captured payloads into Go composite literals.
//!
//! A [`Synthesizer`] walks a [`TypeDefinition`] in declaration order and
//! emits a field only when the payload carries its wire alias. Fields the
//! payload omits are never defaulted, and field shapes without a mapping are
//! dropped. Failing to resolve a nested record aborts the whole literal.

use crate::codegen::Fragment;
use crate::types::{
    qualify, BuiltinKind, FieldDefinition, ResolveError, TypeDescriptor, TypeResolver,
};
use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

/// Deepest record nesting followed before giving up.
pub const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Bool(bool),
    /// Numeric literal text.
    Number(String),
    /// `time.Now()`
    Now,
    /// `Ptr(inner)`, or `Ptr[T](inner)` when the type argument is explicit.
    Ptr {
        type_arg: Option<String>,
        inner: Box<Literal>,
    },
    /// Inline slice of scalars, e.g. `[]string{"a", "b"}`.
    Scalars { element: String, items: Vec<Literal> },
    /// Slice of records, one element per line.
    Records {
        namespace: Option<String>,
        element: String,
        items: Vec<Literal>,
    },
    Struct {
        namespace: Option<String>,
        name: String,
        fields: Vec<(String, Literal)>,
    },
}

impl Literal {
    fn ptr(type_arg: Option<&str>, inner: Literal) -> Self {
        Literal::Ptr {
            type_arg: type_arg.map(str::to_string),
            inner: Box::new(inner),
        }
    }

    /// Single-line rendering; `None` for literals spanning several lines.
    fn inline(&self) -> Option<String> {
        match self {
            Literal::Str(s) => Some(quote(s)),
            Literal::Bool(b) => Some(b.to_string()),
            Literal::Number(n) => Some(n.clone()),
            Literal::Now => Some("time.Now()".to_string()),
            Literal::Scalars { element, items } => {
                let parts: Option<Vec<String>> = items.iter().map(Literal::inline).collect();
                Some(format!("[]{}{{{}}}", element, parts?.join(", ")))
            }
            Literal::Ptr { type_arg, inner } => {
                let inner = inner.inline()?;
                Some(match type_arg {
                    Some(t) => format!("Ptr[{}]({})", t, inner),
                    None => format!("Ptr({})", inner),
                })
            }
            Literal::Struct { fields, .. } if fields.is_empty() => {
                Some(format!("{}{{}}", self.type_name()))
            }
            Literal::Records { element, items, .. } if items.is_empty() => {
                Some(format!("[]{}{{}}", element))
            }
            Literal::Struct { .. } | Literal::Records { .. } => None,
        }
    }

    fn type_name(&self) -> String {
        match self {
            Literal::Struct {
                namespace, name, ..
            } => qualify(namespace.as_deref(), name),
            _ => String::new(),
        }
    }

    /// Write the literal as `prefix<literal>suffix`, spreading records over
    /// several lines.
    pub fn write(&self, frag: &mut Fragment, prefix: &str, suffix: &str) {
        if let Some(text) = self.inline() {
            frag.line(format!("{}{}{}", prefix, text, suffix));
            return;
        }
        match self {
            Literal::Struct { fields, .. } => {
                frag.open(format!("{}{}{{", prefix, self.type_name()));
                for (name, value) in fields {
                    value.write(frag, &format!("{}: ", name), ",");
                }
                frag.close(format!("}}{}", suffix));
            }
            Literal::Records { element, items, .. } => {
                frag.open(format!("{}[]{}{{", prefix, element));
                for item in items {
                    item.write(frag, "", ",");
                }
                frag.close(format!("}}{}", suffix));
            }
            Literal::Ptr { type_arg, inner } => {
                let open = match type_arg {
                    Some(t) => format!("{}Ptr[{}](", prefix, t),
                    None => format!("{}Ptr(", prefix),
                };
                inner.write(frag, &open, &format!("){}", suffix));
            }
            // inline() always renders the remaining variants
            _ => {}
        }
    }

    /// Whether rendering needs the `time` package.
    pub fn uses_now(&self) -> bool {
        match self {
            Literal::Now => true,
            Literal::Ptr { inner, .. } => inner.uses_now(),
            Literal::Scalars { items, .. } | Literal::Records { items, .. } => {
                items.iter().any(Literal::uses_now)
            }
            Literal::Struct { fields, .. } => fields.iter().any(|(_, v)| v.uses_now()),
            Literal::Str(_) | Literal::Bool(_) | Literal::Number(_) => false,
        }
    }

    /// Collect every record namespace the literal refers to.
    pub fn collect_namespaces(&self, out: &mut BTreeSet<String>) {
        match self {
            Literal::Struct {
                namespace, fields, ..
            } => {
                out.extend(namespace.iter().cloned());
                for (_, v) in fields {
                    v.collect_namespaces(out);
                }
            }
            Literal::Records {
                namespace, items, ..
            } => {
                out.extend(namespace.iter().cloned());
                for item in items {
                    item.collect_namespaces(out);
                }
            }
            Literal::Ptr { inner, .. } => inner.collect_namespaces(out),
            _ => {}
        }
    }
}

/// Go string literal; JSON string escaping is valid Go.
fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("payload for {0} is not a JSON object")]
    NotAnObject(String),
    #[error("record nesting exceeds the depth limit at {0}")]
    TooDeep(String),
}

pub struct Synthesizer<'r> {
    resolver: &'r dyn TypeResolver,
}

impl<'r> Synthesizer<'r> {
    pub fn new(resolver: &'r dyn TypeResolver) -> Self {
        Self { resolver }
    }

    /// Build the literal for record `namespace.name` from an object payload.
    pub fn synthesize(
        &self,
        namespace: Option<&str>,
        name: &str,
        payload: &Value,
    ) -> Result<Literal, SynthesisError> {
        let object = payload
            .as_object()
            .ok_or_else(|| SynthesisError::NotAnObject(qualify(namespace, name)))?;
        self.record(namespace, name, object, 0)
    }

    fn record(
        &self,
        namespace: Option<&str>,
        name: &str,
        payload: &BTreeMap<String, Value>,
        depth: usize,
    ) -> Result<Literal, SynthesisError> {
        if depth > MAX_DEPTH {
            return Err(SynthesisError::TooDeep(qualify(namespace, name)));
        }
        let def = self.resolver.resolve(namespace, name)?;
        let mut fields = Vec::new();
        for field in &def.fields {
            let Some(value) = payload.get(&field.alias) else {
                continue;
            };
            match self.field(def.namespace.as_deref(), field, value, depth)? {
                Some(lit) => fields.push((field.name.clone(), lit)),
                None => debug!(
                    r#type = %def.qualified_name(),
                    field = %field.name,
                    optional = field.is_optional(),
                    collection = field.is_collection(),
                    payload = value.kind(),
                    "field dropped"
                ),
            }
        }
        Ok(Literal::Struct {
            namespace: def.namespace.clone(),
            name: def.name.clone(),
            fields,
        })
    }

    fn field(
        &self,
        context: Option<&str>,
        field: &FieldDefinition,
        value: &Value,
        depth: usize,
    ) -> Result<Option<Literal>, SynthesisError> {
        match &field.descriptor {
            d if d.is_timestamp() => Ok(Some(Literal::Now)),
            TypeDescriptor::Builtin(kind) => Ok(scalar(*kind, value)),
            TypeDescriptor::Map(..) => Ok(None),
            TypeDescriptor::Collection(element) => self.collection(context, element, value, depth),
            TypeDescriptor::Optional(inner) => match inner.as_ref() {
                d if d.is_timestamp() => Ok(Some(Literal::ptr(None, Literal::Now))),
                TypeDescriptor::Builtin(kind) => Ok(scalar(*kind, value).map(|lit| {
                    let type_arg = kind.is_numeric().then(|| kind.go_name());
                    Literal::ptr(type_arg, lit)
                })),
                TypeDescriptor::Named { namespace, name } => Ok(self
                    .nested(namespace.as_deref().or(context), name, value, depth)?
                    .map(|lit| Literal::ptr(None, lit))),
                _ => Ok(None),
            },
            TypeDescriptor::Named { namespace, name } => {
                self.nested(namespace.as_deref().or(context), name, value, depth)
            }
        }
    }

    fn nested(
        &self,
        namespace: Option<&str>,
        name: &str,
        value: &Value,
        depth: usize,
    ) -> Result<Option<Literal>, SynthesisError> {
        match value.as_object() {
            Some(object) => self.record(namespace, name, object, depth + 1).map(Some),
            None => Ok(None),
        }
    }

    fn collection(
        &self,
        context: Option<&str>,
        element: &TypeDescriptor,
        value: &Value,
        depth: usize,
    ) -> Result<Option<Literal>, SynthesisError> {
        let Value::Array(items) = value else {
            return Ok(None);
        };
        match element {
            TypeDescriptor::Builtin(BuiltinKind::String) => Ok(Some(Literal::Scalars {
                element: "string".to_string(),
                items: items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => Literal::Str(s.clone()),
                        other => Literal::Str(other.to_string()),
                    })
                    .collect(),
            })),
            TypeDescriptor::Builtin(kind) => {
                let scalars: Option<Vec<Literal>> = items.iter().map(|item| scalar(*kind, item)).collect();
                Ok(scalars.map(|items| Literal::Scalars {
                    element: kind.go_name().to_string(),
                    items,
                }))
            }
            d if d.is_timestamp() => Ok(None),
            TypeDescriptor::Named { namespace, name } => {
                let ns = namespace.as_deref().or(context);
                let mut records = Vec::new();
                for object in items.iter().filter_map(Value::as_object) {
                    records.push(self.record(ns, name, object, depth + 1)?);
                }
                Ok(Some(Literal::Records {
                    namespace: ns.map(str::to_string),
                    element: qualify(ns, name),
                    items: records,
                }))
            }
            TypeDescriptor::Optional(inner) => match inner.as_ref() {
                TypeDescriptor::Named { namespace, name } if !inner.is_timestamp() => {
                    let ns = namespace.as_deref().or(context);
                    let mut records = Vec::new();
                    for object in items.iter().filter_map(Value::as_object) {
                        let record = self.record(ns, name, object, depth + 1)?;
                        records.push(Literal::ptr(None, record));
                    }
                    Ok(Some(Literal::Records {
                        namespace: ns.map(str::to_string),
                        element: format!("*{}", qualify(ns, name)),
                        items: records,
                    }))
                }
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }
}

/// Typed scalar for a builtin kind, or `None` when the payload kind differs.
fn scalar(kind: BuiltinKind, value: &Value) -> Option<Literal> {
    match (kind, value) {
        (BuiltinKind::String, Value::String(s)) => Some(Literal::Str(s.clone())),
        (BuiltinKind::Bool, Value::Bool(b)) => Some(Literal::Bool(*b)),
        (k, Value::Number(n)) if k.is_signed_integer() => {
            n.is_i64().then(|| Literal::Number(n.to_string()))
        }
        (k, Value::Number(n)) if k.is_unsigned_integer() => {
            n.is_u64().then(|| Literal::Number(n.to_string()))
        }
        (k, Value::Number(n)) if k.is_float() || k.is_complex() => Some(Literal::Number(n.to_string())),
        _ => None,
    }
}
