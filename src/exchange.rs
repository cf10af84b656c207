// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Captured request/response pairs and their per-route grouping.

use chrono::{DateTime, Utc};
use hyper::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One captured request/response pair. Never mutated after capture.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    /// Display path, with numeric segments replaced by `:id` placeholders.
    pub path: String,
    /// Request body as received from the caller.
    #[serde(default)]
    pub body: String,
    pub status_code: u16,
    #[serde(default)]
    pub response_body: String,
    pub timestamp: DateTime<Utc>,
    pub method: String,
}

impl Exchange {
    pub fn new(method: &str, raw_path: &str) -> Self {
        Self {
            path: crate::route::display_path(raw_path),
            body: String::new(),
            status_code: 0,
            response_body: String::new(),
            timestamp: Utc::now(),
            method: method.to_string(),
        }
    }

    pub fn with_body(mut self, body: &[u8]) -> Self {
        self.body = String::from_utf8_lossy(body).into_owned();
        self
    }

    pub fn with_response(mut self, status: u16, body: &[u8]) -> Self {
        self.status_code = status;
        self.response_body = String::from_utf8_lossy(body).into_owned();
        self
    }
}

/// All exchanges observed for one normalized route.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RouteGroup {
    /// Header snapshot of the first request seen for the route.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(rename = "bodyRecords", default)]
    pub exchanges: Vec<Exchange>,
}

impl RouteGroup {
    pub fn new(headers: BTreeMap<String, String>) -> Self {
        Self {
            headers,
            exchanges: Vec::new(),
        }
    }

    /// Exchanges recorded with the given HTTP method, in capture order.
    pub fn by_method<'a>(&'a self, method: &'a str) -> impl Iterator<Item = &'a Exchange> + 'a {
        self.exchanges
            .iter()
            .filter(move |ex| ex.method.eq_ignore_ascii_case(method))
    }
}

/// First value of every header whose value is visible ASCII.
pub fn headers_snapshot(hm: &HeaderMap) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for name in hm.keys() {
        if let Some(Ok(s)) = hm.get(name).map(|v| v.to_str()) {
            map.insert(name.as_str().to_string(), s.to_string());
        }
    }
    map
}
