// Copyright 2026 the Execution Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `mterp_gen` live in `benches/`.
//!
//! Run with:
//! `cargo bench -p mterp_gen_wind_tunnel`
