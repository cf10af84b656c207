// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use super::{qualify, ResolveError, TypeDefinition, TypeResolver};
use std::collections::HashMap;

/// Resolver over definitions registered up front.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    types: HashMap<(Option<String>, String), TypeDefinition>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, def: TypeDefinition) -> Self {
        self.insert(def);
        self
    }

    pub fn insert(&mut self, def: TypeDefinition) {
        self.types
            .insert((def.namespace.clone(), def.name.clone()), def);
    }
}

impl TypeResolver for StaticResolver {
    fn resolve(&self, namespace: Option<&str>, name: &str) -> Result<TypeDefinition, ResolveError> {
        self.types
            .get(&(namespace.map(str::to_string), name.to_string()))
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(qualify(namespace, name)))
    }
}
