// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Support files generated tests depend on. Written once, then owned by the
//! user.

use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::info;

pub const MAIN_TEST_FILE: &str = "main_test.go";
pub const HELPERS_FILE: &str = "testutils.go";

const MAIN_TEST: &str = r#"package gentests

import (
	"net/http"
	"os"
	"testing"
)

// testApp is the handler under test. Assign it in TestMain.
var testApp http.Handler

func TestMain(m *testing.M) {
	// testApp = yourapp.NewRouter()
	os.Exit(m.Run())
}

func setup() http.Handler {
	return testApp
}

// func TestSequentially(t *testing.T) {
// 	// call the generated test functions here
// }
"#;

const HELPERS: &str = r#"package gentests

import (
	"bytes"
	"encoding/json"
	"io"
	"net/http"
	"net/http/httptest"
	"testing"

	"github.com/stretchr/testify/require"
)

func makeReq(t *testing.T, app http.Handler, method, path string, body any) *http.Response {
	t.Helper()
	var reader io.Reader
	if body != nil {
		b, err := json.Marshal(body)
		require.NoError(t, err)
		reader = bytes.NewReader(b)
	}
	req := httptest.NewRequest(method, path, reader)
	req.Header.Set("content-type", "application/json")

	rec := httptest.NewRecorder()
	app.ServeHTTP(rec, req)
	return rec.Result()
}

func decodeResp[T any](t *testing.T, resp *http.Response) (T, []byte) {
	t.Helper()
	body, err := io.ReadAll(resp.Body)
	require.NoError(t, err)

	var v T
	require.NoError(t, json.Unmarshal(body, &v))
	return v, body
}

func Ptr[T any](v T) *T { return &v }
"#;

/// Write the support files missing from `dir`, returning the ones created.
pub async fn ensure_scaffold(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating output directory {}", dir.display()))?;

    let mut created = Vec::new();
    for (file, contents) in [(MAIN_TEST_FILE, MAIN_TEST), (HELPERS_FILE, HELPERS)] {
        let path = dir.join(file);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            continue;
        }
        tokio::fs::write(&path, contents)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        info!(file = %path.display(), "scaffold written");
        created.push(path);
    }
    Ok(created)
}
