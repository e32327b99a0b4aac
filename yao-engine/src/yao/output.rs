use super::{permute_bits, receive_bits, split_values, unary_width, wire_keys, BitValues};
use crate::{
    errors::{Phase, YaoError},
    gate::{no_such_pass, Gate},
    provider::{Role, YaoProvider},
    wire::WireId,
};
use bitvec::{slice::BitSlice, vec::BitVec};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use yao_primitives::{promise, BlockingFuture, MessageTag, Payload, Promise};

/// Who learns the plaintext of an output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputRecipient {
    /// Only the garbler.
    Garbler,
    /// Only the evaluator.
    Evaluator,
    /// Both parties.
    Both,
}

impl OutputRecipient {
    /// Whether `role` learns the output.
    pub fn includes(&self, role: Role) -> bool {
        matches!(
            (self, role),
            (OutputRecipient::Both, _)
                | (OutputRecipient::Garbler, Role::Garbler)
                | (OutputRecipient::Evaluator, Role::Evaluator)
        )
    }
}

fn decode(masked: &BitSlice, decoding: &BitSlice) -> BitVec {
    (0..masked.len()).map(|i| masked[i] ^ decoding[i]).collect()
}

fn output_promise(
    provider: &YaoProvider,
    recipient: OutputRecipient,
) -> (Mutex<Option<Promise<BitValues>>>, Option<BlockingFuture<BitValues>>) {
    if recipient.includes(provider.role()) {
        let (p, f) = promise();
        provider.aborts().register(&f);
        (Mutex::new(Some(p)), Some(f))
    } else {
        (Mutex::new(None), None)
    }
}

fn fulfil(output: &Mutex<Option<Promise<BitValues>>>, values: BitValues) -> Result<(), YaoError> {
    let promise = output
        .lock()
        .take()
        .ok_or_else(|| YaoError::ContractViolation("output was already produced".into()))?;
    promise.set(values)?;
    Ok(())
}

/// Output gate on the garbler's side.
///
/// Sends the permute bits of the zero labels, which let the evaluator decode,
/// and decodes the evaluator's masked bits when the garbler is a recipient.
pub struct OutputGateGarbler {
    gate_id: usize,
    provider: Arc<YaoProvider>,
    inputs: Vec<WireId>,
    num_simd: usize,
    recipient: OutputRecipient,
    decoding_sent: AtomicBool,
    output: Mutex<Option<Promise<BitValues>>>,
}

impl OutputGateGarbler {
    /// Returns the gate and, if the garbler is a recipient, the future of
    /// its plaintext output.
    pub fn new(
        gate_id: usize,
        provider: Arc<YaoProvider>,
        inputs: Vec<WireId>,
        recipient: OutputRecipient,
    ) -> Result<(Self, Option<BlockingFuture<BitValues>>), YaoError> {
        let num_simd = unary_width(&provider, &inputs)?;
        let (output, future) = output_promise(&provider, recipient);
        let gate = OutputGateGarbler {
            gate_id,
            provider,
            inputs,
            num_simd,
            recipient,
            decoding_sent: AtomicBool::new(false),
            output,
        };
        Ok((gate, future))
    }

    fn send_decoding_info(&self) -> Result<(), YaoError> {
        let keys = wire_keys(&self.provider, &self.inputs)?;
        self.provider.send(
            self.gate_id,
            MessageTag::DecodingInfo,
            Payload::Bits(permute_bits(&keys)),
        )?;
        self.decoding_sent.store(true, Ordering::Release);
        Ok(())
    }
}

impl Gate for OutputGateGarbler {
    fn gate_id(&self) -> usize {
        self.gate_id
    }

    fn name(&self) -> &'static str {
        "OutputGateGarbler"
    }

    fn need_setup(&self) -> bool {
        true
    }

    fn need_online(&self) -> bool {
        true
    }

    fn evaluate_setup(&self) -> Result<(), YaoError> {
        if self.recipient.includes(Role::Evaluator) {
            self.send_decoding_info()?;
        }
        Ok(())
    }

    fn evaluate_setup_wo_broadcast(&self) -> Result<(), YaoError> {
        // Decoding information goes out with the online pass.
        Ok(())
    }

    fn evaluate_online(&self) -> Result<(), YaoError> {
        if self.recipient.includes(Role::Evaluator) && !self.decoding_sent.load(Ordering::Acquire)
        {
            self.send_decoding_info()?;
        }
        if self.recipient.includes(Role::Garbler) {
            let n = self.inputs.len() * self.num_simd;
            let keys = wire_keys(&self.provider, &self.inputs)?;
            let future = self.provider.expect(self.gate_id, MessageTag::OutputBits);
            let masked = receive_bits(&future, n, "output")?;
            let plain = decode(&masked, &permute_bits(&keys));
            fulfil(&self.output, split_values(&plain, self.num_simd))?;
        }
        Ok(())
    }
}

/// Output gate on the evaluator's side.
///
/// The permute bits of the active labels are the plaintext masked by the
/// garbler's decoding bits.
pub struct OutputGateEvaluator {
    gate_id: usize,
    provider: Arc<YaoProvider>,
    inputs: Vec<WireId>,
    num_simd: usize,
    recipient: OutputRecipient,
    decoding: Mutex<Option<BlockingFuture<Payload>>>,
    output: Mutex<Option<Promise<BitValues>>>,
}

impl OutputGateEvaluator {
    /// Returns the gate and, if the evaluator is a recipient, the future of
    /// its plaintext output.
    pub fn new(
        gate_id: usize,
        provider: Arc<YaoProvider>,
        inputs: Vec<WireId>,
        recipient: OutputRecipient,
    ) -> Result<(Self, Option<BlockingFuture<BitValues>>), YaoError> {
        let num_simd = unary_width(&provider, &inputs)?;
        let (output, future) = output_promise(&provider, recipient);
        let gate = OutputGateEvaluator {
            gate_id,
            provider,
            inputs,
            num_simd,
            recipient,
            decoding: Mutex::new(None),
            output,
        };
        Ok((gate, future))
    }
}

impl Gate for OutputGateEvaluator {
    fn gate_id(&self) -> usize {
        self.gate_id
    }

    fn name(&self) -> &'static str {
        "OutputGateEvaluator"
    }

    fn need_setup(&self) -> bool {
        self.recipient.includes(Role::Evaluator)
    }

    fn need_online(&self) -> bool {
        true
    }

    fn evaluate_setup(&self) -> Result<(), YaoError> {
        if !self.need_setup() {
            return Err(no_such_pass(self.gate_id, self.name(), Phase::Setup));
        }
        *self.decoding.lock() = Some(
            self.provider
                .expect(self.gate_id, MessageTag::DecodingInfo),
        );
        Ok(())
    }

    fn evaluate_online(&self) -> Result<(), YaoError> {
        let keys = wire_keys(&self.provider, &self.inputs)?;
        let masked = permute_bits(&keys);
        if self.recipient.includes(Role::Garbler) {
            self.provider.send(
                self.gate_id,
                MessageTag::OutputBits,
                Payload::Bits(masked.clone()),
            )?;
        }
        if self.recipient.includes(Role::Evaluator) {
            let future = self.decoding.lock().take().ok_or_else(|| {
                YaoError::ContractViolation("online pass ran before setup".into())
            })?;
            let decoding = receive_bits(&future, masked.len(), "decoding")?;
            let plain = decode(&masked, &decoding);
            fulfil(&self.output, split_values(&plain, self.num_simd))?;
        }
        Ok(())
    }
}
