use super::{
    binary_outputs,
    half_gate::{evaluate_and, garble_and, tweak},
    receive_blocks,
};
use crate::{
    errors::{Phase, YaoError},
    gate::{no_such_pass, Gate},
    provider::YaoProvider,
    wire::WireId,
};
use itertools::izip;
use parking_lot::Mutex;
use std::sync::Arc;
use yao_primitives::{BlockingFuture, MessageTag, Payload};

/// AND on the garbler's side: garbles every slot during setup and sends the
/// tables, two blocks per slot in wire-major order.
pub struct AndGateGarbler {
    gate_id: usize,
    provider: Arc<YaoProvider>,
    a: Vec<WireId>,
    b: Vec<WireId>,
    outputs: Vec<WireId>,
    num_simd: usize,
}

impl AndGateGarbler {
    /// AND `a` and `b` wire-wise.
    pub fn new(
        gate_id: usize,
        provider: Arc<YaoProvider>,
        a: Vec<WireId>,
        b: Vec<WireId>,
    ) -> Result<Self, YaoError> {
        let (outputs, num_simd) = binary_outputs(&provider, &a, &b)?;
        Ok(AndGateGarbler {
            gate_id,
            provider,
            a,
            b,
            outputs,
            num_simd,
        })
    }

    /// The result wires.
    pub fn outputs(&self) -> &[WireId] {
        &self.outputs
    }
}

impl Gate for AndGateGarbler {
    fn gate_id(&self) -> usize {
        self.gate_id
    }

    fn name(&self) -> &'static str {
        "AndGateGarbler"
    }

    fn need_setup(&self) -> bool {
        true
    }

    fn need_online(&self) -> bool {
        false
    }

    fn evaluate_setup(&self) -> Result<(), YaoError> {
        let delta = self.provider.delta()?;
        let hash = self.provider.hash();
        let wires = self.provider.wires();
        let mut tables = Vec::with_capacity(2 * self.outputs.len() * self.num_simd);
        for (i, (a, b, out)) in izip!(&self.a, &self.b, &self.outputs).enumerate() {
            let ka = wires.keys(*a)?;
            let kb = wires.keys(*b)?;
            let mut keys = Vec::with_capacity(self.num_simd);
            for (j, (a0, b0)) in ka.iter().zip(kb.iter()).enumerate() {
                let t = tweak(self.gate_id, i * self.num_simd + j);
                let (w0, table) = garble_and(hash, delta, *a0, *b0, t);
                keys.push(w0);
                tables.extend(table);
            }
            wires.set_keys(*out, keys)?;
        }
        self.provider
            .send(self.gate_id, MessageTag::GarbledTables, Payload::Blocks(tables))
    }

    fn evaluate_online(&self) -> Result<(), YaoError> {
        Err(no_such_pass(self.gate_id, self.name(), Phase::Online))
    }
}

/// AND on the evaluator's side: registers for the tables during setup and
/// decrypts one ciphertext pair per slot online.
pub struct AndGateEvaluator {
    gate_id: usize,
    provider: Arc<YaoProvider>,
    a: Vec<WireId>,
    b: Vec<WireId>,
    outputs: Vec<WireId>,
    num_simd: usize,
    tables: Mutex<Option<BlockingFuture<Payload>>>,
}

impl AndGateEvaluator {
    /// AND `a` and `b` wire-wise.
    pub fn new(
        gate_id: usize,
        provider: Arc<YaoProvider>,
        a: Vec<WireId>,
        b: Vec<WireId>,
    ) -> Result<Self, YaoError> {
        let (outputs, num_simd) = binary_outputs(&provider, &a, &b)?;
        Ok(AndGateEvaluator {
            gate_id,
            provider,
            a,
            b,
            outputs,
            num_simd,
            tables: Mutex::new(None),
        })
    }

    /// The result wires.
    pub fn outputs(&self) -> &[WireId] {
        &self.outputs
    }
}

impl Gate for AndGateEvaluator {
    fn gate_id(&self) -> usize {
        self.gate_id
    }

    fn name(&self) -> &'static str {
        "AndGateEvaluator"
    }

    fn need_setup(&self) -> bool {
        true
    }

    fn need_online(&self) -> bool {
        true
    }

    fn evaluate_setup(&self) -> Result<(), YaoError> {
        *self.tables.lock() = Some(
            self.provider
                .expect(self.gate_id, MessageTag::GarbledTables),
        );
        Ok(())
    }

    fn evaluate_online(&self) -> Result<(), YaoError> {
        let future = self.tables.lock().take().ok_or_else(|| {
            YaoError::ContractViolation("online pass ran before setup".into())
        })?;
        let tables = receive_blocks(
            &future,
            2 * self.outputs.len() * self.num_simd,
            "garbled table",
        )?;
        let hash = self.provider.hash();
        let wires = self.provider.wires();
        let mut rows = tables.chunks_exact(2);
        for (i, (a, b, out)) in izip!(&self.a, &self.b, &self.outputs).enumerate() {
            let ka = wires.keys(*a)?;
            let kb = wires.keys(*b)?;
            let mut keys = Vec::with_capacity(self.num_simd);
            for (j, (la, lb)) in ka.iter().zip(kb.iter()).enumerate() {
                let row = rows.next().ok_or_else(|| {
                    YaoError::ProtocolViolation("garbled tables ran short".into())
                })?;
                let t = tweak(self.gate_id, i * self.num_simd + j);
                keys.push(evaluate_and(hash, *la, *lb, [row[0], row[1]], t));
            }
            wires.set_keys(*out, keys)?;
        }
        Ok(())
    }
}
