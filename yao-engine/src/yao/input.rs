use super::{check_shape, check_values, receive_blocks, set_wire_keys, BitValues};
use crate::{
    config::OtFlavor,
    errors::{Phase, YaoError},
    gate::{no_such_pass, Gate},
    provider::{OtEndpoint, Role, YaoProvider},
    wire::WireId,
};
use bitvec::vec::BitVec;
use std::sync::Arc;
use yao_primitives::{promise, BlockingFuture, MessageTag, Payload, Promise};

fn owned_input(
    provider: &YaoProvider,
    owner: Role,
) -> (Option<Promise<BitValues>>, Option<BlockingFuture<BitValues>>) {
    if owner == provider.role() {
        let (p, f) = promise();
        provider.aborts().register(&f);
        (Some(p), Some(f))
    } else {
        (None, None)
    }
}

fn input_bits(
    input: &Option<BlockingFuture<BitValues>>,
    num_wires: usize,
    num_simd: usize,
) -> Result<BitValues, YaoError> {
    let values = input
        .as_ref()
        .ok_or_else(|| YaoError::ContractViolation("input is not owned by this party".into()))?
        .get()?;
    check_values(&values, num_wires, num_simd)?;
    Ok(values)
}

/// Input gate on the garbler's side.
///
/// Setup samples the zero labels of the new wires. For garbler inputs the
/// active labels are sent online, or in setup when the gate is built
/// `in_setup`; for evaluator inputs setup offers both labels of every slot
/// through OT.
pub struct InputGateGarbler {
    gate_id: usize,
    provider: Arc<YaoProvider>,
    owner: Role,
    in_setup: bool,
    outputs: Vec<WireId>,
    num_simd: usize,
    input: Option<BlockingFuture<BitValues>>,
}

impl InputGateGarbler {
    /// Returns the gate and, for garbler inputs, the promise the garbler
    /// fulfils with its bits. With `in_setup` the promise must be fulfilled
    /// before the setup pass reaches this gate.
    pub fn new(
        gate_id: usize,
        provider: Arc<YaoProvider>,
        owner: Role,
        num_wires: usize,
        num_simd: usize,
        in_setup: bool,
    ) -> Result<(Self, Option<Promise<BitValues>>), YaoError> {
        check_shape(num_wires, num_simd)?;
        let outputs = provider.wires().new_wires(num_wires, num_simd);
        let (promise, input) = owned_input(&provider, owner);
        let gate = InputGateGarbler {
            gate_id,
            provider,
            owner,
            in_setup,
            outputs,
            num_simd,
            input,
        };
        Ok((gate, promise))
    }

    /// The wires this input drives.
    pub fn outputs(&self) -> &[WireId] {
        &self.outputs
    }

    fn num_slots(&self) -> usize {
        self.outputs.len() * self.num_simd
    }

    fn send_active_labels(&self) -> Result<(), YaoError> {
        let values = input_bits(&self.input, self.outputs.len(), self.num_simd)?;
        let delta = self.provider.delta()?;
        let mut active = Vec::with_capacity(self.num_slots());
        for (wire, bits) in self.outputs.iter().zip(values.iter()) {
            let keys = self.provider.wires().keys(*wire)?;
            active.extend(
                keys.iter()
                    .zip(bits.iter().by_vals())
                    .map(|(k, b)| *k ^ delta.and_bit(b)),
            );
        }
        self.provider
            .send(self.gate_id, MessageTag::InputLabels, Payload::Blocks(active))
    }
}

impl Gate for InputGateGarbler {
    fn gate_id(&self) -> usize {
        self.gate_id
    }

    fn name(&self) -> &'static str {
        "InputGateGarbler"
    }

    fn need_setup(&self) -> bool {
        true
    }

    fn need_online(&self) -> bool {
        self.owner == Role::Garbler && !self.in_setup
    }

    fn evaluate_setup(&self) -> Result<(), YaoError> {
        let n = self.num_slots();
        let labels = match self.owner {
            Role::Garbler => self.provider.fresh_labels(n),
            Role::Evaluator => {
                let (general, correlated) = match self.provider.ot() {
                    OtEndpoint::Sender {
                        general,
                        correlated,
                    } => (general, correlated),
                    OtEndpoint::Receiver { .. } => {
                        return Err(YaoError::ContractViolation(
                            "garbler gate on an evaluator provider".into(),
                        ))
                    }
                };
                match self.provider.ot_flavor() {
                    OtFlavor::General => {
                        let delta = self.provider.delta()?;
                        let labels = self.provider.fresh_labels(n);
                        let pairs: Vec<_> = labels.iter().map(|z| (*z, *z ^ delta)).collect();
                        general.send(self.gate_id as u64, &pairs)?;
                        labels
                    }
                    OtFlavor::FixedCorrelated => correlated
                        .send_correlated(self.gate_id as u64, n)?
                        .wait()?,
                }
            }
        };
        set_wire_keys(&self.provider, &self.outputs, self.num_simd, &labels)?;
        if self.owner == Role::Garbler && self.in_setup {
            self.send_active_labels()?;
        }
        Ok(())
    }

    fn evaluate_online(&self) -> Result<(), YaoError> {
        if !self.need_online() {
            return Err(no_such_pass(self.gate_id, self.name(), Phase::Online));
        }
        self.send_active_labels()
    }
}

/// Input gate on the evaluator's side. The labels arrive either directly
/// from the garbler or through OT, in the online pass or, when built
/// `in_setup`, in the setup pass.
pub struct InputGateEvaluator {
    gate_id: usize,
    provider: Arc<YaoProvider>,
    owner: Role,
    in_setup: bool,
    outputs: Vec<WireId>,
    num_simd: usize,
    input: Option<BlockingFuture<BitValues>>,
}

impl InputGateEvaluator {
    /// Returns the gate and, for evaluator inputs, the promise the evaluator
    /// fulfils with its bits. `in_setup` must match the garbler's gate.
    pub fn new(
        gate_id: usize,
        provider: Arc<YaoProvider>,
        owner: Role,
        num_wires: usize,
        num_simd: usize,
        in_setup: bool,
    ) -> Result<(Self, Option<Promise<BitValues>>), YaoError> {
        check_shape(num_wires, num_simd)?;
        let outputs = provider.wires().new_wires(num_wires, num_simd);
        let (promise, input) = owned_input(&provider, owner);
        let gate = InputGateEvaluator {
            gate_id,
            provider,
            owner,
            in_setup,
            outputs,
            num_simd,
            input,
        };
        Ok((gate, promise))
    }

    /// The wires this input drives.
    pub fn outputs(&self) -> &[WireId] {
        &self.outputs
    }

    fn receive_labels(&self) -> Result<(), YaoError> {
        let n = self.outputs.len() * self.num_simd;
        let labels = match self.owner {
            Role::Garbler => {
                let future = self.provider.expect(self.gate_id, MessageTag::InputLabels);
                receive_blocks(&future, n, "input label")?
            }
            Role::Evaluator => {
                let values = input_bits(&self.input, self.outputs.len(), self.num_simd)?;
                let choices: BitVec = values.iter().flat_map(|v| v.iter().by_vals()).collect();
                let (general, correlated) = match self.provider.ot() {
                    OtEndpoint::Receiver {
                        general,
                        correlated,
                    } => (general, correlated),
                    OtEndpoint::Sender { .. } => {
                        return Err(YaoError::ContractViolation(
                            "evaluator gate on a garbler provider".into(),
                        ))
                    }
                };
                let future = match self.provider.ot_flavor() {
                    OtFlavor::General => general.receive(self.gate_id as u64, &choices)?,
                    OtFlavor::FixedCorrelated => {
                        correlated.receive_correlated(self.gate_id as u64, &choices)?
                    }
                };
                future.wait()?
            }
        };
        set_wire_keys(&self.provider, &self.outputs, self.num_simd, &labels)
    }
}

impl Gate for InputGateEvaluator {
    fn gate_id(&self) -> usize {
        self.gate_id
    }

    fn name(&self) -> &'static str {
        "InputGateEvaluator"
    }

    fn need_setup(&self) -> bool {
        self.in_setup
    }

    fn need_online(&self) -> bool {
        !self.in_setup
    }

    fn evaluate_setup(&self) -> Result<(), YaoError> {
        if !self.in_setup {
            return Err(no_such_pass(self.gate_id, self.name(), Phase::Setup));
        }
        self.receive_labels()
    }

    fn evaluate_online(&self) -> Result<(), YaoError> {
        if self.in_setup {
            return Err(no_such_pass(self.gate_id, self.name(), Phase::Online));
        }
        self.receive_labels()
    }
}
