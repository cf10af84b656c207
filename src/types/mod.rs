// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Static description of target record types and how to look them up.
//!
//! A [`TypeResolver`] turns a `(namespace, name)` pair into a
//! [`TypeDefinition`]: the fields of a Go struct that carry a `json` tag, in
//! declaration order. [`SourceResolver`] reads them from Go source files and
//! [`StaticResolver`] serves definitions registered in memory.

mod memory;
mod scanner;

pub use memory::StaticResolver;
pub use scanner::{parse_struct, SourceResolver};

use std::path::PathBuf;
use thiserror::Error;

/// Go's predeclared scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    Bool,
    String,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Byte,
    Rune,
    Float32,
    Float64,
    Complex64,
    Complex128,
    Error,
}

impl BuiltinKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "bool" => Self::Bool,
            "string" => Self::String,
            "int" => Self::Int,
            "int8" => Self::Int8,
            "int16" => Self::Int16,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "uint" => Self::Uint,
            "uint8" => Self::Uint8,
            "uint16" => Self::Uint16,
            "uint32" => Self::Uint32,
            "uint64" => Self::Uint64,
            "uintptr" => Self::Uintptr,
            "byte" => Self::Byte,
            "rune" => Self::Rune,
            "float32" => Self::Float32,
            "float64" => Self::Float64,
            "complex64" => Self::Complex64,
            "complex128" => Self::Complex128,
            "error" => Self::Error,
            _ => return None,
        };
        Some(kind)
    }

    pub fn go_name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::String => "string",
            Self::Int => "int",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint => "uint",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Uintptr => "uintptr",
            Self::Byte => "byte",
            Self::Rune => "rune",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Complex64 => "complex64",
            Self::Complex128 => "complex128",
            Self::Error => "error",
        }
    }

    pub fn is_signed_integer(self) -> bool {
        matches!(
            self,
            Self::Int | Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64 | Self::Rune
        )
    }

    pub fn is_unsigned_integer(self) -> bool {
        matches!(
            self,
            Self::Uint
                | Self::Uint8
                | Self::Uint16
                | Self::Uint32
                | Self::Uint64
                | Self::Uintptr
                | Self::Byte
        )
    }

    pub fn is_integer(self) -> bool {
        self.is_signed_integer() || self.is_unsigned_integer()
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    pub fn is_complex(self) -> bool {
        matches!(self, Self::Complex64 | Self::Complex128)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float() || self.is_complex()
    }
}

/// Shape of a field's declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    Builtin(BuiltinKind),
    /// `*T`
    Optional(Box<TypeDescriptor>),
    /// `[]T` or `[N]T`
    Collection(Box<TypeDescriptor>),
    /// `map[K]V`, recognized but never expanded
    Map(Box<TypeDescriptor>, Box<TypeDescriptor>),
    /// `T` or `pkg.T`
    Named {
        namespace: Option<String>,
        name: String,
    },
}

impl TypeDescriptor {
    pub fn named(namespace: Option<&str>, name: &str) -> Self {
        Self::Named {
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
        }
    }

    pub fn optional(inner: TypeDescriptor) -> Self {
        Self::Optional(Box::new(inner))
    }

    pub fn collection(inner: TypeDescriptor) -> Self {
        Self::Collection(Box::new(inner))
    }

    /// `time.Time`, synthesized as the current time regardless of payload.
    pub fn is_timestamp(&self) -> bool {
        matches!(self, Self::Named { namespace: Some(ns), name } if ns == "time" && name == "Time")
    }

    /// Go spelling of the type, qualifying unqualified names with `context`.
    pub fn go_type(&self, context: Option<&str>) -> String {
        match self {
            Self::Builtin(kind) => kind.go_name().to_string(),
            Self::Optional(inner) => format!("*{}", inner.go_type(context)),
            Self::Collection(inner) => format!("[]{}", inner.go_type(context)),
            Self::Map(k, v) => format!("map[{}]{}", k.go_type(context), v.go_type(context)),
            Self::Named { namespace, name } => {
                qualify(namespace.as_deref().or(context), name)
            }
        }
    }
}

/// `ns.Name`, or bare `Name` without a namespace.
pub fn qualify(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{}.{}", ns, name),
        _ => name.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    /// Identifier used in the struct declaration.
    pub name: String,
    /// Key the field is serialized under.
    pub alias: String,
    pub descriptor: TypeDescriptor,
}

impl FieldDefinition {
    pub fn new(name: &str, alias: &str, descriptor: TypeDescriptor) -> Self {
        Self {
            name: name.to_string(),
            alias: alias.to_string(),
            descriptor,
        }
    }

    /// Declared as `*T`.
    pub fn is_optional(&self) -> bool {
        matches!(self.descriptor, TypeDescriptor::Optional(_))
    }

    /// Declared as `[]T` or `[N]T`.
    pub fn is_collection(&self) -> bool {
        matches!(self.descriptor, TypeDescriptor::Collection(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefinition {
    pub namespace: Option<String>,
    pub name: String,
    pub fields: Vec<FieldDefinition>,
}

impl TypeDefinition {
    pub fn new(namespace: Option<&str>, name: &str, fields: Vec<FieldDefinition>) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
            fields,
        }
    }

    pub fn qualified_name(&self) -> String {
        qualify(self.namespace.as_deref(), &self.name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("type '{0}' not found")]
    NotFound(String),
    #[error("go parser unavailable: {0}")]
    Parser(String),
    #[error("cannot read source under {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Lookup of record type definitions.
///
/// Implementations must be pure: the same inputs give the same definition.
pub trait TypeResolver {
    fn resolve(&self, namespace: Option<&str>, name: &str) -> Result<TypeDefinition, ResolveError>;
}
