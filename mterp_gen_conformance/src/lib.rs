// Copyright 2026 the Execution Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conformance tests for `mterp_gen` live in `tests/`.
//!
//! Run with:
//! `cargo test -p mterp_gen_conformance`
