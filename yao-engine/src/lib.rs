// -*- mode: rust; -*-
//
// This file is part of `yao-engine`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! `yao-engine` evaluates Boolean circuits with Yao's garbled circuits
//! protocol between a garbler and an evaluator.
//!
//! Every gate has an input-independent setup pass and an input-dependent
//! online pass. The [`GateExecutor`] schedules these passes over a worker
//! pool, either phase-separated with a barrier between the parties, without
//! the barrier, or fused per gate. Gates exchange keys through write-once
//! wires, so evaluation order is driven by data availability alone.

mod builder;
pub mod config;
pub mod errors;
mod executor;
mod gate;
pub mod provider;
mod statistics;
pub mod wire;
pub mod yao;

pub use crate::{
    builder::{CircuitBuilder, InputHandle},
    config::{OtFlavor, YaoConfig},
    errors::{ExecutorError, Phase, YaoError},
    executor::{Callback, GateExecutor},
    gate::{Gate, GateRegister},
    provider::{local_provider_pair, LabelSource, OtEndpoint, Role, YaoProvider},
    statistics::{AccumulatedRunTimeStats, RunTimeStats, StatId},
    wire::{WireId, WireKeys},
    yao::{BitValues, OutputRecipient},
};
