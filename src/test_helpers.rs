// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Shared test utilities to reduce duplication across test modules.

use crate::exchange::Exchange;
use crate::types::{
    BuiltinKind, FieldDefinition, StaticResolver, TypeDefinition, TypeDescriptor,
};

/// Captured exchange with the given request body and response status
pub fn make_exchange(method: &str, raw_path: &str, body: &str, status: u16) -> Exchange {
    Exchange::new(method, raw_path)
        .with_body(body.as_bytes())
        .with_response(status, b"{}")
}

/// `models.User` with a `name` string and a `created_at` timestamp
pub fn user_type() -> TypeDefinition {
    TypeDefinition::new(
        Some("models"),
        "User",
        vec![
            FieldDefinition::new("Name", "name", TypeDescriptor::Builtin(BuiltinKind::String)),
            FieldDefinition::new(
                "CreatedAt",
                "created_at",
                TypeDescriptor::named(Some("time"), "Time"),
            ),
        ],
    )
}

pub fn user_resolver() -> StaticResolver {
    StaticResolver::new().with_type(user_type())
}
