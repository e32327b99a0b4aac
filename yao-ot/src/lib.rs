// -*- mode: rust; -*-
//
// This file is part of yao-ot.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

#![allow(clippy::many_single_char_names)]

//! Oblivious transfer interfaces as the garbled-circuit engine consumes them:
//! transfers are posted by id and their results come back as futures, so a
//! gate can post in one phase and collect in another.

mod errors;
pub mod ot;

pub use crate::errors::Error;
