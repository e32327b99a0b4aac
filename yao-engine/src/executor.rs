//! Runs the passes of every gate of a register.
//!
//! Workers claim tasks in increasing order from a shared counter. A pass only
//! ever blocks on futures produced by passes with smaller task indices, and
//! those have all been claimed by a running worker, so the sweep always makes
//! progress. The first failure aborts the computation, which wakes every
//! blocked worker.

use crate::{
    errors::{ExecutorError, Phase, YaoError},
    gate::{Gate, GateRegister},
    provider::YaoProvider,
    statistics::{RunTimeStats, StatId},
};
use parking_lot::Mutex;
use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Instant,
};
use yao_primitives::{promise, AbortRegistry, BlockingFuture, Promise};

/// A step run outside the gate sweeps.
pub type Callback<'a> = Box<dyn Fn() -> Result<(), YaoError> + Send + Sync + 'a>;

struct Sweep<'s> {
    next: AtomicUsize,
    interrupted: AtomicBool,
    first_error: Mutex<Option<ExecutorError>>,
    aborts: &'s AbortRegistry,
}

impl<'s> Sweep<'s> {
    fn new(aborts: &'s AbortRegistry) -> Self {
        Sweep {
            next: AtomicUsize::new(0),
            interrupted: AtomicBool::new(false),
            first_error: Mutex::new(None),
            aborts,
        }
    }

    fn fail(&self, error: ExecutorError) {
        self.interrupted.store(true, Ordering::SeqCst);
        // Failures caused by an abort that already happened are not the
        // cause of it.
        if self.aborts.abort(&error.to_string()) {
            *self.first_error.lock() = Some(error);
        } else {
            log::debug!("after abort: {}", error);
        }
    }

    fn finish(self) -> Result<(), ExecutorError> {
        if let Some(error) = self.first_error.into_inner() {
            return Err(error);
        }
        if self.interrupted.into_inner() {
            return Err(ExecutorError::Aborted(
                self.aborts.reason().unwrap_or_default(),
            ));
        }
        Ok(())
    }
}

fn gate_error(gate: &dyn Gate, phase: Phase) -> impl FnOnce(YaoError) -> ExecutorError {
    let gate_id = gate.gate_id();
    move |source| ExecutorError::Gate {
        gate_id,
        phase,
        source,
    }
}

/// Schedules the setup and online passes of a [`GateRegister`] over a pool
/// of worker threads.
pub struct GateExecutor<'a> {
    register: &'a GateRegister,
    preprocessing: Callback<'a>,
    synchronization: Option<Callback<'a>>,
    num_threads: usize,
    aborts: Arc<AbortRegistry>,
}

impl<'a> GateExecutor<'a> {
    /// An executor over `register`. `preprocessing` runs once before the
    /// first sweep. `num_threads <= 1` runs every sweep on the calling thread
    /// in gate order. Failures abort through `aborts`.
    pub fn new(
        register: &'a GateRegister,
        preprocessing: Callback<'a>,
        num_threads: usize,
        aborts: Arc<AbortRegistry>,
    ) -> Self {
        GateExecutor {
            register,
            preprocessing,
            synchronization: None,
            num_threads,
            aborts,
        }
    }

    /// Run `synchronization` between the setup and the online sweep of
    /// [`GateExecutor::evaluate_setup_online`].
    pub fn with_synchronization(mut self, synchronization: Callback<'a>) -> Self {
        self.synchronization = Some(synchronization);
        self
    }

    /// An executor configured from `provider`: OT initialization as
    /// preprocessing, the provider's barrier as synchronization when the
    /// configuration asks for it.
    pub fn for_provider(register: &'a GateRegister, provider: &'a YaoProvider) -> Self {
        let config = provider.config();
        let executor = GateExecutor::new(
            register,
            Box::new(move || provider.preprocess()),
            config.num_threads,
            provider.aborts().clone(),
        );
        if config.sync_between_setup_and_online {
            executor.with_synchronization(Box::new(move || provider.synchronize()))
        } else {
            executor
        }
    }

    /// Number of worker threads.
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    fn fail_outside(&self, error: ExecutorError) -> ExecutorError {
        self.aborts.abort(&error.to_string());
        error
    }

    fn preprocess(&self, stats: &mut RunTimeStats) -> Result<(), ExecutorError> {
        let start = Instant::now();
        (self.preprocessing)()
            .map_err(|e| self.fail_outside(ExecutorError::Preprocessing(e)))?;
        stats.record(StatId::Preprocessing, start.elapsed());
        Ok(())
    }

    fn run_tasks<F>(&self, num_tasks: usize, task: F) -> Result<(), ExecutorError>
    where
        F: Fn(usize) -> Result<(), ExecutorError> + Sync,
    {
        let sweep = Sweep::new(&self.aborts);
        let worker = || loop {
            if self.aborts.is_aborted() {
                sweep.interrupted.store(true, Ordering::SeqCst);
                break;
            }
            let i = sweep.next.fetch_add(1, Ordering::SeqCst);
            if i >= num_tasks {
                break;
            }
            match catch_unwind(AssertUnwindSafe(|| task(i))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    sweep.fail(e);
                    break;
                }
                Err(_) => {
                    sweep.fail(ExecutorError::WorkerPanicked);
                    break;
                }
            }
        };
        if self.num_threads <= 1 {
            worker();
        } else {
            crossbeam::scope(|scope| {
                for _ in 0..self.num_threads {
                    scope.spawn(|_| worker());
                }
            })
            .map_err(|_| self.fail_outside(ExecutorError::WorkerPanicked))?;
        }
        sweep.finish()
    }

    fn setup_pass(&self, gate: &dyn Gate, broadcast: bool) -> Result<(), ExecutorError> {
        if !gate.need_setup() {
            return Ok(());
        }
        log::trace!("setup {} {}", gate.name(), gate.gate_id());
        let result = if broadcast {
            gate.evaluate_setup()
        } else {
            gate.evaluate_setup_wo_broadcast()
        };
        result.map_err(gate_error(gate, Phase::Setup))
    }

    fn online_pass(&self, gate: &dyn Gate) -> Result<(), ExecutorError> {
        if !gate.need_online() {
            return Ok(());
        }
        log::trace!("online {} {}", gate.name(), gate.gate_id());
        gate.evaluate_online()
            .map_err(gate_error(gate, Phase::Online))
    }

    fn gate(&self, i: usize, phase: Phase) -> Result<&'a dyn Gate, ExecutorError> {
        self.register.get(i).ok_or_else(|| ExecutorError::Gate {
            gate_id: i,
            phase,
            source: YaoError::ContractViolation(format!("no gate {} in the register", i)),
        })
    }

    /// Preprocessing, then every setup pass, then the synchronization
    /// callback if one is set, then every online pass. Each sweep completes
    /// before the next starts.
    pub fn evaluate_setup_online(&self, stats: &mut RunTimeStats) -> Result<(), ExecutorError> {
        let n = self.register.len();
        self.preprocess(stats)?;

        log::info!("setup sweep: {} of {} gates", self.register.num_setup_gates(), n);
        let start = Instant::now();
        self.run_tasks(n, |i| self.setup_pass(self.gate(i, Phase::Setup)?, true))?;
        stats.record(StatId::GatesSetup, start.elapsed());

        if let Some(synchronization) = &self.synchronization {
            let start = Instant::now();
            synchronization()
                .map_err(|e| self.fail_outside(ExecutorError::Synchronization(e)))?;
            stats.record(StatId::SynchronizationWait, start.elapsed());
        }

        log::info!("online sweep: {} of {} gates", self.register.num_online_gates(), n);
        let start = Instant::now();
        self.run_tasks(n, |i| self.online_pass(self.gate(i, Phase::Online)?))?;
        stats.record(StatId::GatesOnline, start.elapsed());
        Ok(())
    }

    /// Preprocessing, then all setup passes without broadcasts followed by
    /// all online passes in a single sweep. A gate's online pass waits for
    /// its own setup pass only; there is no barrier.
    pub fn evaluate_setup_online_wo_broadcast(
        &self,
        stats: &mut RunTimeStats,
    ) -> Result<(), ExecutorError> {
        let n = self.register.len();
        self.preprocess(stats)?;

        let (promises, futures): (Vec<Mutex<Option<Promise<()>>>>, Vec<BlockingFuture<()>>) = (0
            ..n)
            .map(|_| {
                let (p, f) = promise();
                self.aborts.register(&f);
                (Mutex::new(Some(p)), f)
            })
            .unzip();

        log::info!("setup and online sweep over {} gates", n);
        let start = Instant::now();
        self.run_tasks(2 * n, |i| {
            if i < n {
                let gate = self.gate(i, Phase::Setup)?;
                self.setup_pass(gate, false)?;
                if let Some(p) = promises[i].lock().take() {
                    p.set(())
                        .map_err(|e| gate_error(gate, Phase::Setup)(e.into()))?;
                }
                Ok(())
            } else {
                let gate = self.gate(i - n, Phase::Online)?;
                if gate.need_setup() {
                    futures[i - n]
                        .wait()
                        .map_err(|e| gate_error(gate, Phase::Online)(e.into()))?;
                }
                self.online_pass(gate)
            }
        })?;
        stats.record(StatId::Evaluate, start.elapsed());
        Ok(())
    }

    /// Preprocessing, then one sweep running each gate's setup pass directly
    /// followed by its online pass.
    pub fn evaluate(&self, stats: &mut RunTimeStats) -> Result<(), ExecutorError> {
        let n = self.register.len();
        self.preprocess(stats)?;

        log::info!("fused sweep over {} gates", n);
        let start = Instant::now();
        self.run_tasks(n, |i| {
            let gate = self.gate(i, Phase::Setup)?;
            self.setup_pass(gate, true)?;
            self.online_pass(gate)
        })?;
        stats.record(StatId::Evaluate, start.elapsed());
        Ok(())
    }
}
