// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Fixture file to Go test file.

use crate::annotations::{self, TypeBinding};
use crate::codegen::{ensure_scaffold, render_unit, TestAssembler};
use crate::config::GenerateConfig;
use crate::fixture::{load_fixture, Fixture};
use crate::types::{SourceResolver, TypeResolver};
use anyhow::Context;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DEFAULT_STEM: &str = "no_name";

/// Name of the test file generated from `fixture`.
///
/// A leading `YYYY-MM-DD-` date is stripped from the file stem. Without one,
/// the text after the last `-` is kept, and a stem with no `-` at all falls
/// back to `no_name`.
pub fn output_filename(fixture: &Path, suffix: &str) -> String {
    let stem = fixture
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let name = match strip_date_prefix(stem) {
        Some(rest) => rest,
        None => match stem.rsplit_once('-') {
            Some((_, last)) => last,
            None => DEFAULT_STEM,
        },
    };
    let name = if name.is_empty() { DEFAULT_STEM } else { name };
    format!("{}{}", name, suffix)
}

fn strip_date_prefix(stem: &str) -> Option<&str> {
    let (date, rest) = (stem.get(..10)?, stem.get(10..)?);
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    rest.strip_prefix('-')
}

/// Module path declared by a `go.mod` file.
pub fn parse_go_module(src: &str) -> Option<String> {
    src.lines()
        .map(str::trim)
        .find_map(|l| {
            l.strip_prefix("module")
                .filter(|rest| rest.starts_with(char::is_whitespace))
        })
        .map(|rest| rest.trim().trim_matches('"').to_string())
        .filter(|m| !m.is_empty())
}

pub async fn go_module_path(base_dir: &Path) -> Option<String> {
    let src = tokio::fs::read_to_string(base_dir.join("go.mod")).await.ok()?;
    parse_go_module(&src)
}

/// Render the test unit for every route of `fixture`, in route order.
pub fn generate_unit(
    fixture: &Fixture,
    bindings: &BTreeMap<String, TypeBinding>,
    resolver: &dyn TypeResolver,
    module: Option<&str>,
) -> String {
    let assembler = TestAssembler::new(resolver);
    let functions: Vec<_> = fixture
        .iter()
        .map(|(route, group)| assembler.assemble_route(route, group, bindings.get(route)))
        .collect();
    render_unit(&functions, module)
}

pub struct Generator {
    config: GenerateConfig,
    base_dir: PathBuf,
}

impl Generator {
    pub fn new<P: Into<PathBuf>>(config: GenerateConfig, base_dir: P) -> Self {
        Self {
            config,
            base_dir: base_dir.into(),
        }
    }

    /// Generate the test file for one fixture file, returning its path.
    pub async fn run(&self, fixture_path: &Path) -> anyhow::Result<PathBuf> {
        let fixture = load_fixture(fixture_path).await?;
        let bindings = annotations::scan(
            &self.base_dir,
            &self.config.marker,
            &self.config.source_extension,
        );
        debug!(routes = fixture.len(), bindings = bindings.len(), "generation inputs loaded");

        let resolver = SourceResolver::new(&self.base_dir, &self.config.source_extension);
        let module = go_module_path(&self.base_dir).await;
        let unit = generate_unit(&fixture, &bindings, &resolver, module.as_deref());

        let out_dir = &self.config.output_dir;
        ensure_scaffold(out_dir).await?;
        let out = out_dir.join(output_filename(fixture_path, &self.config.test_suffix));
        tokio::fs::write(&out, unit)
            .await
            .with_context(|| format!("writing {}", out.display()))?;
        info!(fixture = %fixture_path.display(), output = %out.display(), routes = fixture.len(), "tests generated");
        Ok(out)
    }
}
