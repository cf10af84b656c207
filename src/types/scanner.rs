// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Go source scanner resolving struct declarations into [`TypeDefinition`]s.
//!
//! Sources are parsed with the tree-sitter Go grammar. Only top-level
//! `type_spec` nodes are considered, so declarations local to a function
//! body never shadow package-level ones.

use super::{
    qualify, BuiltinKind, FieldDefinition, ResolveError, TypeDefinition, TypeDescriptor,
    TypeResolver,
};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use tree_sitter::{Node, Parser};

/// Resolves types by scanning the Go package directory under `base_dir`.
///
/// `ns.Type` is looked up in `base_dir/ns`, an unqualified `Type` in
/// `base_dir` itself. Only the files directly inside that directory are read,
/// test files excluded.
#[derive(Debug, Clone)]
pub struct SourceResolver {
    base_dir: PathBuf,
    extension: String,
}

impl SourceResolver {
    pub fn new<P: Into<PathBuf>>(base_dir: P, extension: &str) -> Self {
        Self {
            base_dir: base_dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    fn package_dir(&self, namespace: Option<&str>) -> PathBuf {
        match namespace {
            Some(ns) if !ns.is_empty() => self.base_dir.join(ns),
            _ => self.base_dir.clone(),
        }
    }

    fn source_files(&self, dir: &Path) -> Result<Vec<PathBuf>, ResolveError> {
        let io_err = |source: std::io::Error| ResolveError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let test_suffix = format!("_test.{}", self.extension);
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let matches_ext = path.extension().and_then(|e| e.to_str()) == Some(self.extension.as_str());
            if path.is_file() && matches_ext && !file_name.ends_with(&test_suffix) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl TypeResolver for SourceResolver {
    fn resolve(&self, namespace: Option<&str>, name: &str) -> Result<TypeDefinition, ResolveError> {
        let dir = self.package_dir(namespace);
        let mut parser = go_parser()?;
        for file in self.source_files(&dir)? {
            let src = std::fs::read_to_string(&file).map_err(|source| ResolveError::Io {
                path: file.clone(),
                source,
            })?;
            if let Some(fields) = struct_fields(&mut parser, &src, name)? {
                debug!(r#type = %qualify(namespace, name), file = %file.display(), fields = fields.len(), "type resolved");
                return Ok(TypeDefinition::new(namespace, name, fields));
            }
        }
        Err(ResolveError::NotFound(qualify(namespace, name)))
    }
}

/// Fields of struct `name` declared in `src`, or `None` when `src` does not
/// declare it. Fields without a usable `json` tag are left out.
pub fn parse_struct(src: &str, name: &str) -> Result<Option<Vec<FieldDefinition>>, ResolveError> {
    let mut parser = go_parser()?;
    struct_fields(&mut parser, src, name)
}

fn go_parser() -> Result<Parser, ResolveError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| ResolveError::Parser(e.to_string()))?;
    Ok(parser)
}

fn struct_fields(
    parser: &mut Parser,
    src: &str,
    name: &str,
) -> Result<Option<Vec<FieldDefinition>>, ResolveError> {
    let tree = parser
        .parse(src, None)
        .ok_or_else(|| ResolveError::Parser("parse cancelled".to_string()))?;
    let Some(body) = find_struct_body(tree.root_node(), src, name) else {
        return Ok(None);
    };

    let mut fields = Vec::new();
    let mut cursor = body.walk();
    for decl in body.named_children(&mut cursor) {
        if decl.kind() == "field_declaration" {
            fields.extend(field_definitions(decl, src));
        }
    }
    Ok(Some(fields))
}

fn text<'s>(node: Node, src: &'s str) -> &'s str {
    &src[node.byte_range()]
}

/// `field_declaration_list` of top-level `type name struct { ... }`, plain or
/// inside a `type ( ... )` group.
fn find_struct_body<'t>(root: Node<'t>, src: &str, name: &str) -> Option<Node<'t>> {
    let mut cursor = root.walk();
    for decl in root.named_children(&mut cursor) {
        if decl.kind() != "type_declaration" {
            continue;
        }
        let mut specs = decl.walk();
        for spec in decl.named_children(&mut specs) {
            if spec.kind() != "type_spec" {
                continue;
            }
            let declared = spec.child_by_field_name("name").map(|n| text(n, src));
            if declared != Some(name) {
                continue;
            }
            let ty = spec.child_by_field_name("type")?;
            if ty.kind() != "struct_type" {
                trace!(r#type = name, kind = ty.kind(), "declared but not a struct");
                return None;
            }
            let mut inner = ty.walk();
            let body = ty
                .named_children(&mut inner)
                .find(|n| n.kind() == "field_declaration_list");
            return body;
        }
    }
    None
}

fn field_definitions(decl: Node, src: &str) -> Vec<FieldDefinition> {
    let mut cursor = decl.walk();
    let names: Vec<&str> = decl
        .children_by_field_name("name", &mut cursor)
        .map(|n| text(n, src))
        .collect();
    // embedded: `Base`, `*Base`, `pkg.Base`
    if names.is_empty() {
        trace!(decl = text(decl, src), "skipping embedded field");
        return Vec::new();
    }

    let Some(descriptor) = decl.child_by_field_name("type").and_then(|t| describe(t, src)) else {
        debug!(?names, "skipping field with unsupported type");
        return Vec::new();
    };
    let Some(alias) = decl
        .child_by_field_name("tag")
        .and_then(|t| tag_text(t, src))
        .and_then(|tag| json_alias(&tag))
    else {
        trace!(?names, "skipping field without json tag");
        return Vec::new();
    };

    names
        .into_iter()
        .map(|n| FieldDefinition::new(n, &alias, descriptor.clone()))
        .collect()
}

/// Contents of a raw or interpreted string literal node.
fn tag_text(node: Node, src: &str) -> Option<String> {
    let raw = text(node, src);
    match node.kind() {
        "raw_string_literal" => Some(raw.trim_matches('`').to_string()),
        "interpreted_string_literal" => serde_json::from_str::<String>(raw).ok(),
        _ => None,
    }
}

fn describe(node: Node, src: &str) -> Option<TypeDescriptor> {
    match node.kind() {
        "type_identifier" => match text(node, src) {
            "any" => None,
            ident => Some(match BuiltinKind::from_name(ident) {
                Some(kind) => TypeDescriptor::Builtin(kind),
                None => TypeDescriptor::named(None, ident),
            }),
        },
        "qualified_type" => {
            let package = node.child_by_field_name("package")?;
            let name = node.child_by_field_name("name")?;
            Some(TypeDescriptor::named(Some(text(package, src)), text(name, src)))
        }
        "pointer_type" => {
            let inner = node.named_child(0)?;
            describe(inner, src).map(TypeDescriptor::optional)
        }
        "slice_type" | "array_type" => {
            let element = node.child_by_field_name("element")?;
            describe(element, src).map(TypeDescriptor::collection)
        }
        "map_type" => {
            let key = describe(node.child_by_field_name("key")?, src)?;
            let value = describe(node.child_by_field_name("value")?, src)?;
            Some(TypeDescriptor::Map(Box::new(key), Box::new(value)))
        }
        "parenthesized_type" => describe(node.named_child(0)?, src),
        // struct, interface, func, chan and generic instantiations
        _ => None,
    }
}

/// Value of `key` in a Go struct tag (`key:"value" other:"x"`).
fn tag_lookup(tag: &str, key: &str) -> Option<String> {
    let mut rest = tag;
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return None;
        }
        let colon = rest.find(':')?;
        let name = &rest[..colon];
        rest = rest[colon + 1..].strip_prefix('"')?;

        let mut value = String::new();
        let mut chars = rest.char_indices();
        let mut end = None;
        while let Some((pos, c)) = chars.next() {
            match c {
                '\\' => {
                    if let Some((_, escaped)) = chars.next() {
                        value.push(escaped);
                    }
                }
                '"' => {
                    end = Some(pos);
                    break;
                }
                other => value.push(other),
            }
        }
        let end = end?;
        if name == key {
            return Some(value);
        }
        rest = &rest[end + 1..];
    }
}

/// Wire name from the `json` tag; `None` for `-` or an empty name.
fn json_alias(tag: &str) -> Option<String> {
    let value = tag_lookup(tag, "json")?;
    if value == "-" {
        return None;
    }
    let alias = value.split(',').next().unwrap_or_default();
    if alias.is_empty() {
        None
    } else {
        Some(alias.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use uuid::Uuid;

    const MODELS: &str = r#"
package models

import "time"

// User is a { tricky } comment
type User struct {
	ID        int64             `json:"id"`
	Name      string            `json:"name,omitempty"`
	Email     *string           `json:"email"`
	Tags      []string          `json:"tags"`
	Scores    []float64         `json:"scores"`
	Meta      map[string]string `json:"meta"`
	Extra     map[string]any    `json:"extra"`
	Address   Address           `json:"address"`
	Orders    []*Order          `json:"orders"`
	CreatedAt time.Time         `json:"created_at"`
	Secret    string            `json:"-"`
	internal  string
	First, Last string          `json:"full"`
	Base
	Callback  func()            `json:"cb"`
}

type (
	Address struct {
		City string `json:"city"`
	}

	Order struct{ Total float64 `json:"total"` }
)
"#;

    #[test]
    fn parses_user_fields_in_order() -> anyhow::Result<()> {
        let fields = parse_struct(MODELS, "User")?.expect("User declared");
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "ID", "Name", "Email", "Tags", "Scores", "Meta", "Address", "Orders",
                "CreatedAt", "First", "Last"
            ]
        );
        assert_eq!(fields[1].alias, "name");
        assert_eq!(fields[9].alias, "full");
        assert_eq!(fields[10].alias, "full");
        Ok(())
    }

    #[test]
    fn classifies_descriptors() -> anyhow::Result<()> {
        let fields = parse_struct(MODELS, "User")?.expect("User declared");
        let by_name = |n: &str| {
            fields
                .iter()
                .find(|f| f.name == n)
                .map(|f| f.descriptor.clone())
                .expect("field present")
        };
        assert_eq!(by_name("ID"), TypeDescriptor::Builtin(BuiltinKind::Int64));
        assert_eq!(
            by_name("Email"),
            TypeDescriptor::optional(TypeDescriptor::Builtin(BuiltinKind::String))
        );
        assert_eq!(
            by_name("Tags"),
            TypeDescriptor::collection(TypeDescriptor::Builtin(BuiltinKind::String))
        );
        assert!(matches!(by_name("Meta"), TypeDescriptor::Map(_, _)));
        assert_eq!(by_name("Address"), TypeDescriptor::named(None, "Address"));
        assert_eq!(
            by_name("Orders"),
            TypeDescriptor::collection(TypeDescriptor::optional(TypeDescriptor::named(
                None, "Order"
            )))
        );
        assert!(by_name("CreatedAt").is_timestamp());
        Ok(())
    }

    #[test]
    fn finds_structs_in_type_groups() -> anyhow::Result<()> {
        let address = parse_struct(MODELS, "Address")?.expect("Address declared");
        assert_eq!(address.len(), 1);
        assert_eq!(address[0].alias, "city");

        let order = parse_struct(MODELS, "Order")?.expect("Order declared");
        assert_eq!(order.len(), 1);
        assert_eq!(order[0].descriptor, TypeDescriptor::Builtin(BuiltinKind::Float64));
        Ok(())
    }

    #[test]
    fn missing_type_is_none() -> anyhow::Result<()> {
        assert!(parse_struct(MODELS, "Missing")?.is_none());
        // mentioned only in a comment
        assert!(parse_struct("// type Ghost struct { X int `json:\"x\"` }", "Ghost")?.is_none());
        Ok(())
    }

    #[test]
    fn ignores_non_struct_declarations() -> anyhow::Result<()> {
        let src = "package models\n\ntype Status string\ntype Alias = Other\n";
        assert!(parse_struct(src, "Status")?.is_none());
        assert!(parse_struct(src, "Alias")?.is_none());
        Ok(())
    }

    #[test]
    fn function_local_types_are_not_resolved() -> anyhow::Result<()> {
        let src = r#"package models

func build() {
	type Local struct {
		X int `json:"x"`
	}
}
"#;
        assert!(parse_struct(src, "Local")?.is_none());
        Ok(())
    }

    #[test]
    fn reads_interpreted_string_tags() -> anyhow::Result<()> {
        let src = "package models\n\ntype Item struct {\n\tSKU string \"json:\\\"sku\\\"\"\n}\n";
        let fields = parse_struct(src, "Item")?.expect("Item declared");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].alias, "sku");
        Ok(())
    }

    #[test]
    fn unsupported_field_types_are_dropped() -> anyhow::Result<()> {
        let src = r#"package models

type Job struct {
	Done   chan bool          `json:"done"`
	Page   Page[int]          `json:"page"`
	Opts   struct{ A int }    `json:"opts"`
	Any    any                `json:"any"`
	Grid   [3][]int32         `json:"grid"`
}
"#;
        let fields = parse_struct(src, "Job")?.expect("Job declared");
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Grid"]);
        assert_eq!(
            fields[0].descriptor,
            TypeDescriptor::collection(TypeDescriptor::collection(TypeDescriptor::Builtin(
                BuiltinKind::Int32
            )))
        );
        Ok(())
    }

    #[rstest]
    #[case(r#"json:"name""#, Some("name"))]
    #[case(r#"json:"user_id,omitempty""#, Some("user_id"))]
    #[case(r#"json:"""#, None)]
    #[case(r#"json:",omitempty""#, None)]
    #[case(r#"json:"-""#, None)]
    #[case(r#"yaml:"name""#, None)]
    #[case(r#"db:"x" json:"y""#, Some("y"))]
    #[case("", None)]
    fn json_alias_cases(#[case] tag: &str, #[case] expected: Option<&str>) {
        assert_eq!(json_alias(tag).as_deref(), expected);
    }

    #[test]
    fn source_resolver_reads_package_directory() -> anyhow::Result<()> {
        let base = std::env::temp_dir().join(format!("testgen_scan_{}", Uuid::new_v4()));
        std::fs::create_dir_all(base.join("models"))?;
        std::fs::write(base.join("models").join("user.go"), MODELS)?;
        std::fs::write(
            base.join("models").join("user_test.go"),
            "package models\ntype Fixture struct { X int `json:\"x\"` }\n",
        )?;
        std::fs::write(
            base.join("root.go"),
            "package main\ntype Root struct { Ok bool `json:\"ok\"` }\n",
        )?;

        let resolver = SourceResolver::new(&base, "go");
        let user = resolver.resolve(Some("models"), "User")?;
        assert_eq!(user.qualified_name(), "models.User");
        assert!(user.field("CreatedAt").is_some());

        let root = resolver.resolve(None, "Root")?;
        assert_eq!(root.fields.len(), 1);

        assert!(matches!(
            resolver.resolve(Some("models"), "Fixture"),
            Err(ResolveError::NotFound(_))
        ));
        assert!(matches!(
            resolver.resolve(Some("nowhere"), "User"),
            Err(ResolveError::Io { .. })
        ));

        std::fs::remove_dir_all(&base)?;
        Ok(())
    }
}
