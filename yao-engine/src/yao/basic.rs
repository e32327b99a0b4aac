//! The free gates.

use super::{binary_outputs, unary_width, wire_keys};
use crate::{
    errors::{Phase, YaoError},
    gate::{no_such_pass, Gate},
    provider::YaoProvider,
    wire::WireId,
};
use itertools::izip;
use std::sync::Arc;

fn xor_wires(
    provider: &YaoProvider,
    a: &[WireId],
    b: &[WireId],
    outputs: &[WireId],
) -> Result<(), YaoError> {
    for (a, b, out) in izip!(a, b, outputs) {
        let ka = provider.wires().keys(*a)?;
        let kb = provider.wires().keys(*b)?;
        let keys = ka.iter().zip(kb.iter()).map(|(x, y)| *x ^ *y).collect();
        provider.wires().set_keys(*out, keys)?;
    }
    Ok(())
}

/// NOT on the garbler's side: the new zero label is the old one label.
pub struct InvGateGarbler {
    gate_id: usize,
    provider: Arc<YaoProvider>,
    inputs: Vec<WireId>,
    outputs: Vec<WireId>,
}

impl InvGateGarbler {
    /// Negate every wire of `inputs`.
    pub fn new(
        gate_id: usize,
        provider: Arc<YaoProvider>,
        inputs: Vec<WireId>,
    ) -> Result<Self, YaoError> {
        let num_simd = unary_width(&provider, &inputs)?;
        let outputs = provider.wires().new_wires(inputs.len(), num_simd);
        Ok(InvGateGarbler {
            gate_id,
            provider,
            inputs,
            outputs,
        })
    }

    /// The negated wires.
    pub fn outputs(&self) -> &[WireId] {
        &self.outputs
    }
}

impl Gate for InvGateGarbler {
    fn gate_id(&self) -> usize {
        self.gate_id
    }

    fn name(&self) -> &'static str {
        "InvGateGarbler"
    }

    fn need_setup(&self) -> bool {
        true
    }

    fn need_online(&self) -> bool {
        false
    }

    fn evaluate_setup(&self) -> Result<(), YaoError> {
        let delta = self.provider.delta()?;
        for (keys, out) in wire_keys(&self.provider, &self.inputs)?
            .iter()
            .zip(self.outputs.iter())
        {
            self.provider
                .wires()
                .set_keys(*out, keys.iter().map(|k| *k ^ delta).collect())?;
        }
        Ok(())
    }

    fn evaluate_online(&self) -> Result<(), YaoError> {
        Err(no_such_pass(self.gate_id, self.name(), Phase::Online))
    }
}

/// NOT on the evaluator's side. The active label does not change, so the
/// outputs are the input wires themselves and the gate never runs.
pub struct InvGateEvaluator {
    gate_id: usize,
    outputs: Vec<WireId>,
}

impl InvGateEvaluator {
    /// Negate every wire of `inputs`. Rejects the bundles the garbler's gate
    /// rejects, so both registers stay in step.
    pub fn new(
        gate_id: usize,
        provider: &YaoProvider,
        inputs: Vec<WireId>,
    ) -> Result<Self, YaoError> {
        unary_width(provider, &inputs)?;
        Ok(InvGateEvaluator {
            gate_id,
            outputs: inputs,
        })
    }

    /// The negated wires.
    pub fn outputs(&self) -> &[WireId] {
        &self.outputs
    }
}

impl Gate for InvGateEvaluator {
    fn gate_id(&self) -> usize {
        self.gate_id
    }

    fn name(&self) -> &'static str {
        "InvGateEvaluator"
    }

    fn need_setup(&self) -> bool {
        false
    }

    fn need_online(&self) -> bool {
        false
    }

    fn evaluate_setup(&self) -> Result<(), YaoError> {
        Err(no_such_pass(self.gate_id, self.name(), Phase::Setup))
    }

    fn evaluate_online(&self) -> Result<(), YaoError> {
        Err(no_such_pass(self.gate_id, self.name(), Phase::Online))
    }
}

/// XOR on the garbler's side, computed during setup.
pub struct XorGateGarbler {
    gate_id: usize,
    provider: Arc<YaoProvider>,
    a: Vec<WireId>,
    b: Vec<WireId>,
    outputs: Vec<WireId>,
}

impl XorGateGarbler {
    /// XOR `a` and `b` wire-wise.
    pub fn new(
        gate_id: usize,
        provider: Arc<YaoProvider>,
        a: Vec<WireId>,
        b: Vec<WireId>,
    ) -> Result<Self, YaoError> {
        let (outputs, _) = binary_outputs(&provider, &a, &b)?;
        Ok(XorGateGarbler {
            gate_id,
            provider,
            a,
            b,
            outputs,
        })
    }

    /// The result wires.
    pub fn outputs(&self) -> &[WireId] {
        &self.outputs
    }
}

impl Gate for XorGateGarbler {
    fn gate_id(&self) -> usize {
        self.gate_id
    }

    fn name(&self) -> &'static str {
        "XorGateGarbler"
    }

    fn need_setup(&self) -> bool {
        true
    }

    fn need_online(&self) -> bool {
        false
    }

    fn evaluate_setup(&self) -> Result<(), YaoError> {
        xor_wires(&self.provider, &self.a, &self.b, &self.outputs)
    }

    fn evaluate_online(&self) -> Result<(), YaoError> {
        Err(no_such_pass(self.gate_id, self.name(), Phase::Online))
    }
}

/// XOR on the evaluator's side, computed online on the active labels.
pub struct XorGateEvaluator {
    gate_id: usize,
    provider: Arc<YaoProvider>,
    a: Vec<WireId>,
    b: Vec<WireId>,
    outputs: Vec<WireId>,
}

impl XorGateEvaluator {
    /// XOR `a` and `b` wire-wise.
    pub fn new(
        gate_id: usize,
        provider: Arc<YaoProvider>,
        a: Vec<WireId>,
        b: Vec<WireId>,
    ) -> Result<Self, YaoError> {
        let (outputs, _) = binary_outputs(&provider, &a, &b)?;
        Ok(XorGateEvaluator {
            gate_id,
            provider,
            a,
            b,
            outputs,
        })
    }

    /// The result wires.
    pub fn outputs(&self) -> &[WireId] {
        &self.outputs
    }
}

impl Gate for XorGateEvaluator {
    fn gate_id(&self) -> usize {
        self.gate_id
    }

    fn name(&self) -> &'static str {
        "XorGateEvaluator"
    }

    fn need_setup(&self) -> bool {
        false
    }

    fn need_online(&self) -> bool {
        true
    }

    fn evaluate_setup(&self) -> Result<(), YaoError> {
        Err(no_such_pass(self.gate_id, self.name(), Phase::Setup))
    }

    fn evaluate_online(&self) -> Result<(), YaoError> {
        xor_wires(&self.provider, &self.a, &self.b, &self.outputs)
    }
}
