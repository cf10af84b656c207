// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Fixture files: route groups persisted as pretty-printed JSON.

use crate::exchange::RouteGroup;
use crate::recorder::RouteTable;
use anyhow::Context;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Contents of one fixture file, keyed by raw route key.
pub type Fixture = BTreeMap<String, RouteGroup>;

/// Name of the fixture file holding `route` for a session saved on `date`.
pub fn fixture_filename(route: &str, date: NaiveDate) -> String {
    format!(
        "{}-{}.json",
        date.format("%Y-%m-%d"),
        crate::route::clean_filename_segment(route)
    )
}

/// Group routes by their fixture filename.
///
/// Routes deriving the same filename share one fixture, each under its own
/// route key.
pub fn partition(groups: HashMap<String, RouteGroup>, date: NaiveDate) -> BTreeMap<String, Fixture> {
    let mut files: BTreeMap<String, Fixture> = BTreeMap::new();
    for (route, group) in groups {
        files
            .entry(fixture_filename(&route, date))
            .or_default()
            .insert(route, group);
    }
    files
}

#[derive(Debug, Clone)]
pub struct FixtureStore {
    dir: PathBuf,
}

impl FixtureStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist every group of `table`, returning the files written.
    ///
    /// Only failing to create the output directory is an error. A file that
    /// fails to serialize or write is logged and skipped.
    pub async fn save(&self, table: &RouteTable, date: NaiveDate) -> anyhow::Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating fixture directory {}", self.dir.display()))?;

        let mut written = Vec::new();
        for (filename, fixture) in partition(table.snapshot(), date) {
            let data = match serde_json::to_string_pretty(&fixture) {
                Ok(d) => d,
                Err(e) => {
                    error!(file = %filename, error = %e, "failed to serialize fixture");
                    continue;
                }
            };
            let path = self.dir.join(&filename);
            if let Err(e) = tokio::fs::write(&path, data).await {
                error!(file = %path.display(), error = %e, "failed to write fixture");
                continue;
            }
            info!(file = %path.display(), routes = fixture.len(), "fixture saved");
            written.push(path);
        }
        Ok(written)
    }
}

/// Read one fixture file back.
pub async fn load_fixture<P: AsRef<Path>>(path: P) -> anyhow::Result<Fixture> {
    let path = path.as_ref();
    let s = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading fixture {}", path.display()))?;
    let fixture: Fixture =
        serde_json::from_str(&s).with_context(|| format!("parsing fixture {}", path.display()))?;
    Ok(fixture)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::Exchange;
    use uuid::Uuid;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 9).expect("valid date")
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("testgen_fixture_{}", Uuid::new_v4()))
    }

    #[test]
    fn filename_from_route_and_date() {
        assert_eq!(
            fixture_filename("/api/users/profile", date()),
            "2026-03-09-users_profile.json"
        );
        assert_eq!(fixture_filename("/", date()), "2026-03-09-noname.json");
    }

    #[test]
    fn colliding_routes_merge_under_one_file() {
        let mut groups = HashMap::new();
        // both clean to "users"
        groups.insert("/api/users".to_string(), RouteGroup::default());
        groups.insert("/v1/users".to_string(), RouteGroup::default());
        groups.insert("/orders".to_string(), RouteGroup::default());

        let files = partition(groups, date());
        assert_eq!(files.len(), 2);
        let users = &files["2026-03-09-users.json"];
        assert!(users.contains_key("/api/users"));
        assert!(users.contains_key("/v1/users"));
    }

    #[tokio::test]
    async fn save_then_load_preserves_exchange_counts() -> anyhow::Result<()> {
        let dir = temp_dir();
        let table = RouteTable::new();
        let headers = BTreeMap::from([("content-type".to_string(), "application/json".to_string())]);
        for i in 0..3 {
            let path = format!("/api/users/{}", i);
            table.record(
                "/api/users",
                &headers,
                Exchange::new("GET", &path).with_response(200, b"{}"),
            );
        }
        table.record(
            "/api/orders",
            &headers,
            Exchange::new("POST", "/api/orders").with_response(201, b""),
        );

        let store = FixtureStore::new(&dir);
        let written = store.save(&table, date()).await?;
        assert_eq!(written.len(), 2);

        let users = load_fixture(dir.join("2026-03-09-users.json")).await?;
        assert_eq!(users["/api/users"].exchanges.len(), 3);
        assert_eq!(
            users["/api/users"].headers.get("content-type").map(String::as_str),
            Some("application/json")
        );
        let orders = load_fixture(dir.join("2026-03-09-orders.json")).await?;
        assert_eq!(orders["/api/orders"].exchanges.len(), 1);
        assert_eq!(orders["/api/orders"].exchanges[0].status_code, 201);

        tokio::fs::remove_dir_all(&dir).await?;
        Ok(())
    }

    #[tokio::test]
    async fn save_empty_table_writes_nothing() -> anyhow::Result<()> {
        let dir = temp_dir();
        let written = FixtureStore::new(&dir).save(&RouteTable::new(), date()).await?;
        assert!(written.is_empty());
        tokio::fs::remove_dir_all(&dir).await?;
        Ok(())
    }

    #[tokio::test]
    async fn save_skips_unwritable_file_and_keeps_others() -> anyhow::Result<()> {
        let dir = temp_dir();
        tokio::fs::create_dir_all(&dir).await?;
        // a directory squatting on one fixture name makes that write fail
        tokio::fs::create_dir(dir.join("2026-03-09-users.json")).await?;

        let table = RouteTable::new();
        table.record("/users", &BTreeMap::new(), Exchange::new("GET", "/users"));
        table.record("/orders", &BTreeMap::new(), Exchange::new("GET", "/orders"));

        let written = FixtureStore::new(&dir).save(&table, date()).await?;
        assert_eq!(written, vec![dir.join("2026-03-09-orders.json")]);

        tokio::fs::remove_dir_all(&dir).await?;
        Ok(())
    }

    #[tokio::test]
    async fn load_rejects_malformed_json() -> anyhow::Result<()> {
        let dir = temp_dir();
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join("bad.json");
        tokio::fs::write(&path, "{not json").await?;
        assert!(load_fixture(&path).await.is_err());
        tokio::fs::remove_dir_all(&dir).await?;
        Ok(())
    }
}
