// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Record HTTP traffic through a reverse proxy and turn it into typed Go tests.
//!
//! The record side is [`proxy`] feeding a [`recorder::RouteTable`] that
//! [`fixture::FixtureStore`] persists on shutdown. The generate side loads a
//! fixture, finds route bindings with [`annotations`], resolves record types
//! with [`types`] and renders tests through [`literal`] and [`codegen`].

pub mod annotations;
pub mod codegen;
pub mod config;
pub mod exchange;
pub mod fixture;
pub mod generate;
pub mod literal;
pub mod proxy;
pub mod recorder;
pub mod route;
pub mod types;
pub mod value;

#[cfg(test)]
pub(crate) mod test_helpers;
