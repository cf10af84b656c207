// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Discovery of `route -> record type` bindings written as source comments:
//!
//! ```text
//! // @testgen router=/api/users struct=models.User
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, error, warn};
use walkdir::WalkDir;

const ROUTE_ATTR: &str = "router=";
const TYPE_ATTR: &str = "struct=";

/// Record type bound to a route by an annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeBinding {
    pub route: String,
    /// Type as written, `ns.Type` or `Type`.
    pub qualified: String,
    pub namespace: Option<String>,
    pub name: String,
}

impl TypeBinding {
    pub fn new(route: &str, qualified: &str) -> Self {
        let (namespace, name) = match qualified.split_once('.') {
            Some((ns, name)) if !ns.is_empty() => (Some(ns.to_string()), name.to_string()),
            _ => (None, qualified.to_string()),
        };
        Self {
            route: route.to_string(),
            qualified: qualified.to_string(),
            namespace,
            name,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("annotation is missing the '{attribute}' attribute: {line}")]
    MissingAttribute { attribute: &'static str, line: String },
}

/// Extract the binding from one marker line.
pub fn parse_line(line: &str) -> Result<TypeBinding, AnnotationError> {
    let mut route = None;
    let mut qualified = None;
    for word in line.split_whitespace() {
        let word = word.trim_start_matches("//");
        if let Some(v) = word.strip_prefix(ROUTE_ATTR) {
            route = Some(v);
        } else if let Some(v) = word.strip_prefix(TYPE_ATTR) {
            qualified = Some(v);
        }
    }
    let missing = |attribute| AnnotationError::MissingAttribute {
        attribute,
        line: line.trim().to_string(),
    };
    let route = route.filter(|r| !r.is_empty()).ok_or_else(|| missing("router"))?;
    let qualified = qualified.filter(|q| !q.is_empty()).ok_or_else(|| missing("struct"))?;
    Ok(TypeBinding::new(route, qualified))
}

/// Collect bindings from every `extension` file under `base_dir`, keyed by
/// route. Files are visited in name order and a later binding for the same
/// route replaces an earlier one.
pub fn scan(base_dir: &Path, marker: &str, extension: &str) -> BTreeMap<String, TypeBinding> {
    let extension = extension.trim_start_matches('.');
    let mut bindings = BTreeMap::new();

    for entry in WalkDir::new(base_dir).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                error!(error = %e, "failed to walk source tree");
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let src = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping unreadable source file");
                continue;
            }
        };
        for line in src.lines().filter(|l| l.contains(marker)) {
            match parse_line(line) {
                Ok(binding) => {
                    debug!(file = %path.display(), route = %binding.route, r#type = %binding.qualified, "binding found");
                    bindings.insert(binding.route.clone(), binding);
                }
                Err(e) => error!(file = %path.display(), error = %e, "discarding annotation"),
            }
        }
    }
    bindings
}
