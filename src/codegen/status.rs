// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

/// `net/http` constant name for a recorded status code. Codes outside the
/// table map to `StatusOK`.
pub fn status_symbol(code: u16) -> &'static str {
    match code {
        200 => "http.StatusOK",
        201 => "http.StatusCreated",
        202 => "http.StatusAccepted",
        204 => "http.StatusNoContent",
        301 => "http.StatusMovedPermanently",
        302 => "http.StatusFound",
        304 => "http.StatusNotModified",
        307 => "http.StatusTemporaryRedirect",
        308 => "http.StatusPermanentRedirect",
        400 => "http.StatusBadRequest",
        401 => "http.StatusUnauthorized",
        403 => "http.StatusForbidden",
        404 => "http.StatusNotFound",
        405 => "http.StatusMethodNotAllowed",
        409 => "http.StatusConflict",
        422 => "http.StatusUnprocessableEntity",
        429 => "http.StatusTooManyRequests",
        500 => "http.StatusInternalServerError",
        502 => "http.StatusBadGateway",
        503 => "http.StatusServiceUnavailable",
        504 => "http.StatusGatewayTimeout",
        _ => "http.StatusOK",
    }
}
