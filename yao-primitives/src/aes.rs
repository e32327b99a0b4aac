// -*- mode: rust; -*-
//
// This file is part of `yao-primitives`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! AES-128, encryption only, plus the counter-mode keystream built on it.
//!
//! Block encryption goes through the `aes` crate, which picks AES-NI at
//! runtime when the CPU has it. The key schedule is also exposed in its
//! byte form so it can be checked against FIPS-197.

pub mod aes128;
pub mod ctr;
