// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Route-grouped capture table shared by every proxy connection.

use crate::exchange::{Exchange, RouteGroup};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// Thread-safe route → group table.
///
/// A single lock guards both the insert-if-absent path (which also takes the
/// header snapshot) and the append path, so two concurrent first requests for
/// the same route can never both populate headers.
#[derive(Default)]
pub struct RouteTable {
    groups: RwLock<HashMap<String, RouteGroup>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an exchange under `route`, creating the group from `headers`
    /// when this is the first exchange seen for it.
    pub fn record(&self, route: &str, headers: &BTreeMap<String, String>, exchange: Exchange) {
        match self.groups.write() {
            Ok(mut groups) => {
                groups
                    .entry(route.to_string())
                    .or_insert_with(|| RouteGroup::new(headers.clone()))
                    .exchanges
                    .push(exchange);
            }
            Err(_) => {
                tracing::warn!(%route, "route table lock poisoned during write");
            }
        }
    }

    /// Copy of every group, taken under the read lock.
    pub fn snapshot(&self) -> HashMap<String, RouteGroup> {
        match self.groups.read() {
            Ok(groups) => groups.clone(),
            Err(_) => {
                tracing::warn!("route table lock poisoned during read");
                HashMap::new()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.groups.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of exchanges recorded for `route`, zero when unknown.
    pub fn exchange_count(&self, route: &str) -> usize {
        self.groups
            .read()
            .ok()
            .and_then(|g| g.get(route).map(|group| group.exchanges.len()))
            .unwrap_or(0)
    }
}
