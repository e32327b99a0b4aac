//! The contract between gates and the executor, and the register holding
//! the gates of one circuit.

use crate::errors::{Phase, YaoError};

/// A node of the circuit.
///
/// The executor asks each gate once whether it needs a setup and an online
/// pass, and only calls the passes it needs. Passes may run on any worker
/// thread; a pass blocks on the futures of its inputs, never on another
/// gate directly.
pub trait Gate: Send + Sync {
    /// Position of the gate in its register.
    fn gate_id(&self) -> usize;

    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Whether the gate has input-independent work.
    fn need_setup(&self) -> bool;

    /// Whether the gate has input-dependent work.
    fn need_online(&self) -> bool;

    /// Input-independent work: label generation, garbling, posting OTs.
    fn evaluate_setup(&self) -> Result<(), YaoError>;

    /// Setup pass for executor modes without a synchronization barrier.
    /// Gates whose setup broadcasts to the peer may defer that to the online
    /// pass here.
    fn evaluate_setup_wo_broadcast(&self) -> Result<(), YaoError> {
        self.evaluate_setup()
    }

    /// Input-dependent work: consuming futures and producing downstream keys
    /// or outputs.
    fn evaluate_online(&self) -> Result<(), YaoError>;
}

/// The error returned by a pass the gate does not have.
pub(crate) fn no_such_pass(gate_id: usize, name: &str, phase: Phase) -> YaoError {
    YaoError::ContractViolation(format!(
        "{} gate {} has no {} pass",
        name, gate_id, phase
    ))
}

/// All gates of one circuit, in id order. Because gates are registered as
/// they are built, every gate's inputs come from gates with smaller ids.
#[derive(Default)]
pub struct GateRegister {
    gates: Vec<Box<dyn Gate>>,
}

impl GateRegister {
    /// An empty register.
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next registered gate must carry.
    pub fn next_gate_id(&self) -> usize {
        self.gates.len()
    }

    /// Append `gate`. Its id must be [`GateRegister::next_gate_id`].
    pub fn register_gate(&mut self, gate: Box<dyn Gate>) -> Result<(), YaoError> {
        if gate.gate_id() != self.gates.len() {
            return Err(YaoError::ContractViolation(format!(
                "gate registered with id {}, expected {}",
                gate.gate_id(),
                self.gates.len()
            )));
        }
        self.gates.push(gate);
        Ok(())
    }

    /// Look up a gate.
    pub fn get(&self, gate_id: usize) -> Option<&dyn Gate> {
        self.gates.get(gate_id).map(|g| g.as_ref())
    }

    /// Iterate over the gates in id order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Gate> {
        self.gates.iter().map(|g| g.as_ref())
    }

    /// Number of gates.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Whether the register is empty.
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Number of gates with a setup pass.
    pub fn num_setup_gates(&self) -> usize {
        self.iter().filter(|g| g.need_setup()).count()
    }

    /// Number of gates with an online pass.
    pub fn num_online_gates(&self) -> usize {
        self.iter().filter(|g| g.need_online()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nop(usize);

    impl Gate for Nop {
        fn gate_id(&self) -> usize {
            self.0
        }
        fn name(&self) -> &'static str {
            "nop"
        }
        fn need_setup(&self) -> bool {
            true
        }
        fn need_online(&self) -> bool {
            false
        }
        fn evaluate_setup(&self) -> Result<(), YaoError> {
            Ok(())
        }
        fn evaluate_online(&self) -> Result<(), YaoError> {
            Err(no_such_pass(self.0, self.name(), Phase::Online))
        }
    }

    #[test]
    fn test_register_in_order() {
        let mut register = GateRegister::new();
        register.register_gate(Box::new(Nop(0))).unwrap();
        register.register_gate(Box::new(Nop(1))).unwrap();
        assert!(register.register_gate(Box::new(Nop(5))).is_err());
        assert_eq!(register.len(), 2);
        assert_eq!(register.next_gate_id(), 2);
        assert_eq!(register.num_setup_gates(), 2);
        assert_eq!(register.num_online_gates(), 0);
        assert_eq!(register.get(1).map(|g| g.gate_id()), Some(1));
        assert!(register.get(0).unwrap().evaluate_online().is_err());
    }
}
