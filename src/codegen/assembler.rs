// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Turns one route's exchanges into a Go test function.

use super::fragment::Fragment;
use super::status::status_symbol;
use crate::annotations::TypeBinding;
use crate::exchange::{Exchange, RouteGroup};
use crate::literal::{Literal, SynthesisError, Synthesizer};
use crate::route::test_name;
use crate::types::TypeResolver;
use crate::value::Value;
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Method blocks, in the order they appear inside a test function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Create,
    Update,
    Read,
    Delete,
}

impl MethodKind {
    pub const ALL: [MethodKind; 4] = [Self::Create, Self::Update, Self::Read, Self::Delete];

    pub fn http_method(self) -> &'static str {
        match self {
            Self::Create => "POST",
            Self::Update => "PUT",
            Self::Read => "GET",
            Self::Delete => "DELETE",
        }
    }

    fn go_constant(self) -> &'static str {
        match self {
            Self::Create => "http.MethodPost",
            Self::Update => "http.MethodPut",
            Self::Read => "http.MethodGet",
            Self::Delete => "http.MethodDelete",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Read => "Get",
            Self::Delete => "Delete",
        }
    }

    /// Create and Update send a typed payload.
    pub fn needs_payload(self) -> bool {
        matches!(self, Self::Create | Self::Update)
    }
}

#[derive(Debug, Error)]
pub enum BlockError {
    #[error("route {0} has no type binding")]
    MissingBinding(String),
    #[error("request body #{index} is not a JSON object: {reason}")]
    InvalidBody { index: usize, reason: String },
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
}

/// Packages a generated unit must import besides `testing`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Imports {
    pub uses_http: bool,
    pub uses_require: bool,
    pub uses_now: bool,
    pub namespaces: BTreeSet<String>,
}

impl Imports {
    fn add_literal(&mut self, lit: &Literal) {
        self.uses_now |= lit.uses_now();
        lit.collect_namespaces(&mut self.namespaces);
    }

    pub fn merge(&mut self, other: &Imports) {
        self.uses_http |= other.uses_http;
        self.uses_require |= other.uses_require;
        self.uses_now |= other.uses_now;
        self.namespaces.extend(other.namespaces.iter().cloned());
    }
}

/// A finished method block.
#[derive(Debug, Clone)]
pub struct MethodBlock {
    pub kind: MethodKind,
    pub rows: usize,
    pub fragment: Fragment,
    pub imports: Imports,
}

/// One `func test<Name>(t *testing.T)` for a route.
#[derive(Debug, Clone)]
pub struct TestFunction {
    pub route: String,
    pub name: String,
    pub blocks: Vec<MethodKind>,
    pub body: Fragment,
    pub imports: Imports,
}

pub struct TestAssembler<'r> {
    synthesizer: Synthesizer<'r>,
}

impl<'r> TestAssembler<'r> {
    pub fn new(resolver: &'r dyn TypeResolver) -> Self {
        Self {
            synthesizer: Synthesizer::new(resolver),
        }
    }

    /// Build the test function for `route`. Blocks that cannot be built are
    /// logged and left out.
    pub fn assemble_route(
        &self,
        route: &str,
        group: &RouteGroup,
        binding: Option<&TypeBinding>,
    ) -> TestFunction {
        let name = test_name(route);
        let mut body = Fragment::new();
        let mut imports = Imports::default();
        let mut blocks = Vec::new();

        for kind in MethodKind::ALL {
            let exchanges: Vec<&Exchange> = group.by_method(kind.http_method()).collect();
            match self.method_block(&name, kind, &exchanges, binding) {
                Ok(Some(block)) => {
                    debug!(%route, method = kind.http_method(), rows = block.rows, "method block built");
                    if !body.is_empty() {
                        body.blank();
                    }
                    body.append(block.fragment);
                    imports.merge(&block.imports);
                    blocks.push(kind);
                }
                Ok(None) => {}
                Err(BlockError::MissingBinding(_)) => {
                    info!(%route, method = kind.http_method(), "no type binding, skipping block");
                }
                Err(e) => {
                    warn!(%route, method = kind.http_method(), error = %e, "dropping method block");
                }
            }
        }

        TestFunction {
            route: route.to_string(),
            name,
            blocks,
            body,
            imports,
        }
    }

    /// Block for one method; `Ok(None)` when no exchange used it.
    pub fn method_block(
        &self,
        name: &str,
        kind: MethodKind,
        exchanges: &[&Exchange],
        binding: Option<&TypeBinding>,
    ) -> Result<Option<MethodBlock>, BlockError> {
        if exchanges.is_empty() {
            return Ok(None);
        }

        let mut imports = Imports::default();
        let payloads = if kind.needs_payload() {
            let binding = binding.ok_or_else(|| BlockError::MissingBinding(name.to_string()))?;
            let mut payloads = Vec::with_capacity(exchanges.len());
            for (index, ex) in exchanges.iter().enumerate() {
                let lit = self.payload(binding, index, ex)?;
                imports.add_literal(&lit);
                payloads.push(lit);
            }
            Some((binding, payloads))
        } else {
            None
        };

        let mut f = Fragment::new();
        f.open(format!(
            "t.Run(\"{} {}\", func(t *testing.T) {{",
            kind.label(),
            name
        ));
        match (exchanges, &payloads) {
            ([ex], Some((_, lits))) => {
                for lit in lits {
                    lit.write(&mut f, "payload := ", "");
                }
                f.line(format!(
                    "resp := makeReq(t, app, {}, {}, payload)",
                    kind.go_constant(),
                    go_string(&ex.path)
                ));
                f.line(assert_status(status_symbol(ex.status_code)));
            }
            ([ex], None) => {
                f.line(format!(
                    "resp := makeReq(t, app, {}, {}, nil)",
                    kind.go_constant(),
                    go_string(&ex.path)
                ));
                f.line(assert_status(status_symbol(ex.status_code)));
            }
            (_, _) => {
                f.open("testCases := []struct {");
                f.line("name           string");
                f.line("path           string");
                if let Some((binding, _)) = &payloads {
                    f.line(format!("payload        {}", binding.qualified));
                }
                f.line("expectedStatus int");
                f.reopen("}{");
                for (i, ex) in exchanges.iter().enumerate() {
                    f.open("{");
                    f.line(format!("name:           {},", go_string(&format!("{} {}", name, i))));
                    f.line(format!("path:           {},", go_string(&ex.path)));
                    if let Some((_, lits)) = &payloads {
                        lits[i].write(&mut f, "payload: ", ",");
                    }
                    f.line(format!("expectedStatus: {},", status_symbol(ex.status_code)));
                    f.close("},");
                }
                f.close("}");
                f.open("for _, tc := range testCases {");
                f.open("t.Run(tc.name, func(t *testing.T) {");
                let body = if payloads.is_some() { "tc.payload" } else { "nil" };
                f.line(format!(
                    "resp := makeReq(t, app, {}, tc.path, {})",
                    kind.go_constant(),
                    body
                ));
                f.line(assert_status("tc.expectedStatus"));
                f.close("})");
                f.close("}");
            }
        }
        f.close("})");
        // every block names an http.Method* constant and asserts with require
        imports.uses_http = true;
        imports.uses_require = true;

        Ok(Some(MethodBlock {
            kind,
            rows: exchanges.len(),
            fragment: f,
            imports,
        }))
    }

    fn payload(&self, binding: &TypeBinding, index: usize, ex: &Exchange) -> Result<Literal, BlockError> {
        let value = Value::parse(&ex.body).map_err(|e| BlockError::InvalidBody {
            index,
            reason: e.to_string(),
        })?;
        if !value.is_object() {
            return Err(BlockError::InvalidBody {
                index,
                reason: format!("found {}", value.kind()),
            });
        }
        Ok(self
            .synthesizer
            .synthesize(binding.namespace.as_deref(), &binding.name, &value)?)
    }
}

fn go_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn assert_status(expected: &str) -> String {
    format!("require.Equal(t, {}, resp.StatusCode)", expected)
}

/// Render the `_test.go` unit for a set of route functions.
///
/// `module` is the Go module path used to import record namespaces; without
/// it namespaces are not imported.
pub fn render_unit(functions: &[TestFunction], module: Option<&str>) -> String {
    let mut imports = Imports::default();
    for func in functions {
        imports.merge(&func.imports);
    }

    let mut f = Fragment::new();
    f.line("package gentests");
    f.blank();
    f.open("import (");
    if imports.uses_http {
        f.line("\"net/http\"");
    }
    f.line("\"testing\"");
    if imports.uses_now {
        f.line("\"time\"");
    }
    let mut third_party: BTreeSet<String> = BTreeSet::new();
    if imports.uses_require {
        third_party.insert("github.com/stretchr/testify/require".to_string());
    }
    if let Some(module) = module {
        for ns in &imports.namespaces {
            third_party.insert(format!("{}/{}", module.trim_end_matches('/'), ns));
        }
    }
    if !third_party.is_empty() {
        f.blank();
    }
    for path in &third_party {
        f.line(go_string(path));
    }
    f.close(")");

    let mut taken = HashSet::new();
    for func in functions {
        let mut name = func.name.clone();
        let mut n = 2;
        while !taken.insert(name.clone()) {
            name = format!("{}{}", func.name, n);
            n += 1;
        }
        f.blank();
        f.line(format!("// {}", func.route));
        f.open(format!("func test{}(t *testing.T) {{", name));
        f.line("app := setup()");
        if func.body.is_empty() {
            f.line("_ = app");
        } else {
            f.blank();
            f.append(func.body.clone());
        }
        f.close("}");
    }
    f.render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{make_exchange, user_resolver};
    use std::collections::BTreeMap;

    fn group(exchanges: Vec<Exchange>) -> RouteGroup {
        RouteGroup {
            headers: BTreeMap::new(),
            exchanges,
        }
    }

    fn binding() -> TypeBinding {
        TypeBinding::new("/api/users", "models.User")
    }

    #[test]
    fn table_rows_match_exchange_count() {
        let r = user_resolver();
        let a = TestAssembler::new(&r);
        let exchanges: Vec<Exchange> = (1..=3)
            .map(|i| make_exchange("GET", &format!("/api/users/{}", i), "", 200))
            .collect();
        let refs: Vec<&Exchange> = exchanges.iter().collect();

        let block = a
            .method_block("Users", MethodKind::Read, &refs, None)
            .expect("read block")
            .expect("non-empty");
        assert_eq!(block.rows, 3);
        let text = block.fragment.render();
        assert_eq!(text.matches("name:           \"Users ").count(), 3);
        assert!(text.contains("makeReq(t, app, http.MethodGet, tc.path, nil)"));
        assert!(text.contains("path:           \"/api/users/:id\","));
    }

    #[test]
    fn single_exchange_is_a_plain_block() {
        let r = user_resolver();
        let a = TestAssembler::new(&r);
        let ex = make_exchange("DELETE", "/api/users/7", "", 204);
        let block = a
            .method_block("Users", MethodKind::Delete, &[&ex], None)
            .expect("delete block")
            .expect("non-empty");
        let text = block.fragment.render();
        assert!(!text.contains("testCases"));
        assert!(text.contains("resp := makeReq(t, app, http.MethodDelete, \"/api/users/:id\", nil)"));
        assert!(text.contains("require.Equal(t, http.StatusNoContent, resp.StatusCode)"));
    }

    #[test]
    fn no_exchanges_means_no_block() {
        let r = user_resolver();
        let a = TestAssembler::new(&r);
        assert!(a
            .method_block("Users", MethodKind::Update, &[], Some(&binding()))
            .expect("no error")
            .is_none());
    }

    #[test]
    fn two_creates_produce_table_with_synthesized_rows() {
        let r = user_resolver();
        let a = TestAssembler::new(&r);
        let g = group(vec![
            make_exchange("POST", "/api/users", r#"{"name":"a"}"#, 201),
            make_exchange("POST", "/api/users", r#"{"name":"b"}"#, 201),
        ]);
        let func = a.assemble_route("/api/users", &g, Some(&binding()));
        assert_eq!(func.name, "users");
        assert_eq!(func.blocks, vec![MethodKind::Create]);

        let text = func.body.render();
        assert_eq!(text.matches("t.Run(\"Create users\"").count(), 1);
        assert!(text.contains("payload        models.User"));
        assert!(text.contains("Name: \"a\","));
        assert!(text.contains("Name: \"b\","));
        assert_eq!(text.matches("expectedStatus: http.StatusCreated,").count(), 2);
        assert!(text.contains("makeReq(t, app, http.MethodPost, tc.path, tc.payload)"));
        assert!(text.contains("require.Equal(t, tc.expectedStatus, resp.StatusCode)"));
        assert!(func.imports.namespaces.contains("models"));
    }

    #[test]
    fn create_without_binding_is_skipped_but_reads_remain() {
        let r = user_resolver();
        let a = TestAssembler::new(&r);
        let g = group(vec![
            make_exchange("POST", "/api/users", r#"{"name":"a"}"#, 201),
            make_exchange("GET", "/api/users", "", 200),
        ]);
        let func = a.assemble_route("/api/users", &g, None);
        assert_eq!(func.blocks, vec![MethodKind::Read]);
    }

    #[test]
    fn invalid_body_drops_the_whole_block() {
        let r = user_resolver();
        let a = TestAssembler::new(&r);
        let good = make_exchange("PUT", "/api/users/1", r#"{"name":"a"}"#, 200);
        let bad = make_exchange("PUT", "/api/users/2", "not json", 200);
        let err = a
            .method_block("Users", MethodKind::Update, &[&good, &bad], Some(&binding()))
            .expect_err("invalid body");
        assert!(matches!(err, BlockError::InvalidBody { index: 1, .. }));

        let array = make_exchange("PUT", "/api/users/3", "[1]", 200);
        let err = a
            .method_block("Users", MethodKind::Update, &[&array], Some(&binding()))
            .expect_err("array body");
        assert!(matches!(err, BlockError::InvalidBody { index: 0, .. }));
    }

    #[test]
    fn blocks_follow_fixed_method_order() {
        let r = user_resolver();
        let a = TestAssembler::new(&r);
        let g = group(vec![
            make_exchange("DELETE", "/api/users/1", "", 200),
            make_exchange("GET", "/api/users/1", "", 200),
            make_exchange("PUT", "/api/users/1", r#"{"name":"x"}"#, 200),
            make_exchange("POST", "/api/users", r#"{"name":"y"}"#, 201),
        ]);
        let func = a.assemble_route("/api/users", &g, Some(&binding()));
        assert_eq!(func.blocks, MethodKind::ALL.to_vec());
        let text = func.body.render();
        let pos = |needle: &str| text.find(needle).expect("block present");
        assert!(pos("\"Create users\"") < pos("\"Update users\""));
        assert!(pos("\"Update users\"") < pos("\"Get users\""));
        assert!(pos("\"Get users\"") < pos("\"Delete users\""));
    }

    #[test]
    fn unit_imports_time_and_namespaces() {
        let r = user_resolver();
        let a = TestAssembler::new(&r);
        let g = group(vec![make_exchange(
            "POST",
            "/api/users",
            r#"{"name":"a","created_at":"2020-01-01T00:00:00Z"}"#,
            201,
        )]);
        let func = a.assemble_route("/api/users", &g, Some(&binding()));
        let unit = render_unit(&[func], Some("example.com/app"));
        assert!(unit.starts_with("package gentests\n"));
        assert!(unit.contains("\t\"time\"\n"));
        assert!(unit.contains("\t\"example.com/app/models\"\n"));
        assert!(unit.contains("\t\"github.com/stretchr/testify/require\"\n"));
        assert!(unit.contains("func testusers(t *testing.T) {\n\tapp := setup()\n"));
        assert!(unit.contains("\t\tpayload := models.User{\n"));
        assert!(unit.contains("CreatedAt: time.Now(),"));
    }

    #[test]
    fn unit_without_module_skips_namespace_imports() {
        let r = user_resolver();
        let a = TestAssembler::new(&r);
        let g = group(vec![make_exchange("GET", "/api/users", "", 200)]);
        let func = a.assemble_route("/api/users", &g, None);
        let unit = render_unit(&[func], None);
        assert!(!unit.contains("\"time\""));
        assert!(!unit.contains("/models\""));
    }

    #[test]
    fn duplicate_test_names_get_suffixes() {
        let r = user_resolver();
        let a = TestAssembler::new(&r);
        let g = group(vec![make_exchange("GET", "/x", "", 200)]);
        let first = a.assemble_route("/api/users", &g, None);
        let second = a.assemble_route("/v1/users", &g, None);
        let unit = render_unit(&[first, second], None);
        assert!(unit.contains("func testusers(t *testing.T)"));
        assert!(unit.contains("func testusers2(t *testing.T)"));
    }

    #[test]
    fn empty_function_keeps_app_used() {
        let r = user_resolver();
        let a = TestAssembler::new(&r);
        let func = a.assemble_route("/api/users", &group(Vec::new()), None);
        let unit = render_unit(&[func], None);
        assert!(unit.contains("\t_ = app\n"));
    }

    #[test]
    fn unbound_create_route_imports_only_testing() {
        let r = user_resolver();
        let a = TestAssembler::new(&r);
        let g = group(vec![make_exchange("POST", "/api/users", r#"{"name":"a"}"#, 201)]);
        let func = a.assemble_route("/api/users", &g, None);
        assert!(func.body.is_empty());
        let unit = render_unit(&[func], Some("example.com/app"));
        assert!(unit.contains("import (\n\t\"testing\"\n)\n"));
        assert!(!unit.contains("net/http"));
        assert!(!unit.contains("testify/require"));
        assert!(!unit.contains("http."));
        assert!(!unit.contains("require."));
    }

    #[test]
    fn any_block_pulls_in_http_and_require() {
        let r = user_resolver();
        let a = TestAssembler::new(&r);
        let empty = a.assemble_route("/api/orders", &group(Vec::new()), None);
        let reads = group(vec![make_exchange("GET", "/api/users", "", 200)]);
        let read = a.assemble_route("/api/users", &reads, None);
        let unit = render_unit(&[empty, read], None);
        assert!(unit.contains("\t\"net/http\"\n"));
        assert!(unit.contains("\t\"github.com/stretchr/testify/require\"\n"));
    }
}
