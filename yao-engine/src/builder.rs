//! Assembling the same circuit on both parties.
//!
//! Each party runs the same sequence of builder calls against its own
//! provider. Gates get consecutive ids in call order, so every gate lines up
//! with its counterpart on the peer and the messages between them share a
//! key.

use crate::{
    errors::YaoError,
    gate::{Gate, GateRegister},
    provider::{Role, YaoProvider},
    wire::WireId,
    yao::{
        AndGateEvaluator, AndGateGarbler, BitValues, InputGateEvaluator, InputGateGarbler,
        InvGateEvaluator, InvGateGarbler, OutputGateEvaluator, OutputGateGarbler,
        OutputRecipient, XorGateEvaluator, XorGateGarbler,
    },
};
use std::sync::Arc;
use yao_primitives::{BlockingFuture, Promise};

/// The wires of an input and, for the party owning it, the promise to
/// fulfil with the input bits.
pub struct InputHandle {
    /// The input wires.
    pub wires: Vec<WireId>,
    /// Present exactly on the owning party.
    pub promise: Option<Promise<BitValues>>,
}

impl InputHandle {
    /// Supply the input bits, one `BitVec` of SIMD slots per wire.
    pub fn provide(self, values: BitValues) -> Result<(), YaoError> {
        let promise = self.promise.ok_or_else(|| {
            YaoError::ContractViolation("input is owned by the other party".into())
        })?;
        promise.set(values)?;
        Ok(())
    }
}

/// Builds the gate register of one party.
pub struct CircuitBuilder {
    provider: Arc<YaoProvider>,
    register: GateRegister,
}

impl CircuitBuilder {
    /// Start an empty circuit on `provider`.
    pub fn new(provider: Arc<YaoProvider>) -> Self {
        CircuitBuilder {
            provider,
            register: GateRegister::new(),
        }
    }

    /// The provider gates are built on.
    pub fn provider(&self) -> &Arc<YaoProvider> {
        &self.provider
    }

    fn push(&mut self, gate: impl Gate + 'static) -> Result<(), YaoError> {
        self.register.register_gate(Box::new(gate))
    }

    /// Register a gate made by `make` from the next gate id.
    #[cfg(test)]
    pub(crate) fn custom<G: Gate + 'static>(
        &mut self,
        make: impl FnOnce(usize, Arc<YaoProvider>) -> Result<G, YaoError>,
    ) -> Result<(), YaoError> {
        let gate = make(self.register.next_gate_id(), self.provider.clone())?;
        self.push(gate)
    }

    fn is_garbler(&self) -> bool {
        self.provider.role() == Role::Garbler
    }

    /// `num_wires` input wires of `num_simd` slots owned by `owner`.
    ///
    /// With `in_setup` the labels are transferred in the setup pass, so the
    /// owner has to provide its bits before setup runs. Both parties must
    /// pass the same `in_setup`.
    pub fn input(
        &mut self,
        owner: Role,
        num_wires: usize,
        num_simd: usize,
        in_setup: bool,
    ) -> Result<InputHandle, YaoError> {
        let id = self.register.next_gate_id();
        let provider = self.provider.clone();
        let (wires, promise) = if self.is_garbler() {
            let (gate, promise) =
                InputGateGarbler::new(id, provider, owner, num_wires, num_simd, in_setup)?;
            let wires = gate.outputs().to_vec();
            self.push(gate)?;
            (wires, promise)
        } else {
            let (gate, promise) =
                InputGateEvaluator::new(id, provider, owner, num_wires, num_simd, in_setup)?;
            let wires = gate.outputs().to_vec();
            self.push(gate)?;
            (wires, promise)
        };
        Ok(InputHandle { wires, promise })
    }

    /// Wire-wise NOT.
    pub fn inv(&mut self, a: &[WireId]) -> Result<Vec<WireId>, YaoError> {
        let id = self.register.next_gate_id();
        if self.is_garbler() {
            let gate = InvGateGarbler::new(id, self.provider.clone(), a.to_vec())?;
            let outputs = gate.outputs().to_vec();
            self.push(gate)?;
            Ok(outputs)
        } else {
            let gate = InvGateEvaluator::new(id, &self.provider, a.to_vec())?;
            let outputs = gate.outputs().to_vec();
            self.push(gate)?;
            Ok(outputs)
        }
    }

    /// Wire-wise XOR.
    pub fn xor(&mut self, a: &[WireId], b: &[WireId]) -> Result<Vec<WireId>, YaoError> {
        let id = self.register.next_gate_id();
        let provider = self.provider.clone();
        if self.is_garbler() {
            let gate = XorGateGarbler::new(id, provider, a.to_vec(), b.to_vec())?;
            let outputs = gate.outputs().to_vec();
            self.push(gate)?;
            Ok(outputs)
        } else {
            let gate = XorGateEvaluator::new(id, provider, a.to_vec(), b.to_vec())?;
            let outputs = gate.outputs().to_vec();
            self.push(gate)?;
            Ok(outputs)
        }
    }

    /// Wire-wise AND.
    pub fn and(&mut self, a: &[WireId], b: &[WireId]) -> Result<Vec<WireId>, YaoError> {
        let id = self.register.next_gate_id();
        let provider = self.provider.clone();
        if self.is_garbler() {
            let gate = AndGateGarbler::new(id, provider, a.to_vec(), b.to_vec())?;
            let outputs = gate.outputs().to_vec();
            self.push(gate)?;
            Ok(outputs)
        } else {
            let gate = AndGateEvaluator::new(id, provider, a.to_vec(), b.to_vec())?;
            let outputs = gate.outputs().to_vec();
            self.push(gate)?;
            Ok(outputs)
        }
    }

    /// Reveal `a` to `recipient`. Returns the future of the plaintext on
    /// parties that receive it.
    pub fn output(
        &mut self,
        a: &[WireId],
        recipient: OutputRecipient,
    ) -> Result<Option<BlockingFuture<BitValues>>, YaoError> {
        let id = self.register.next_gate_id();
        let provider = self.provider.clone();
        if self.is_garbler() {
            let (gate, future) = OutputGateGarbler::new(id, provider, a.to_vec(), recipient)?;
            self.push(gate)?;
            Ok(future)
        } else {
            let (gate, future) = OutputGateEvaluator::new(id, provider, a.to_vec(), recipient)?;
            self.push(gate)?;
            Ok(future)
        }
    }

    /// Number of gates built so far.
    pub fn num_gates(&self) -> usize {
        self.register.len()
    }

    /// The finished register.
    pub fn finish(self) -> GateRegister {
        self.register
    }
}
