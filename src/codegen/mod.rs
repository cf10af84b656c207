// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Go test source generation.

mod assembler;
mod fragment;
mod scaffold;
mod status;

pub use assembler::{
    render_unit, BlockError, Imports, MethodBlock, MethodKind, TestAssembler, TestFunction,
};
pub use fragment::Fragment;
pub use scaffold::{ensure_scaffold, HELPERS_FILE, MAIN_TEST_FILE};
pub use status::status_symbol;
