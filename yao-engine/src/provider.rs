//! The per-party context every gate of one computation shares.

use crate::{
    config::{OtFlavor, YaoConfig},
    errors::YaoError,
    wire::WireArena,
};
use parking_lot::Mutex;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
    thread::JoinHandle,
};
use yao_ot::ot::{
    CorrelatedReceiver, CorrelatedSender, DummyCorrelatedSender, DummyReceiver, DummySender,
    Receiver, Sender,
};
use yao_primitives::{
    channel::{local_channel_pair, spawn_dispatcher, LocalChannel, Mailbox, TrafficStats},
    sync::Abortable,
    AbortRegistry, AesHash, AesRng, Block, BlockingFuture, Message, MessageKey, MessageTag,
    Payload, SemiHonest, Transport, AES_HASH,
};

/// The two roles of Yao's protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Garbles the circuit and knows both labels of every wire.
    Garbler,
    /// Evaluates the garbled circuit on one label per wire.
    Evaluator,
}

impl Role {
    /// The other role.
    pub fn peer(&self) -> Role {
        match self {
            Role::Garbler => Role::Evaluator,
            Role::Evaluator => Role::Garbler,
        }
    }
}

/// Source of the correlated randomness labels are built from.
pub trait LabelSource: Send + Sync {
    /// `n` fresh, uniformly random labels.
    fn fresh_labels(&self, n: usize) -> Vec<Block>;

    /// A fresh global offset. Its least significant bit is set, so that the
    /// two labels of a wire always carry opposite permute bits.
    fn fresh_delta(&self) -> Block {
        let mut delta = self.fresh_labels(1);
        delta.pop().unwrap_or_default().set_lsb()
    }
}

/// [`LabelSource`] drawing from an [`AesRng`].
pub struct AesRngLabelSource {
    rng: Mutex<AesRng>,
}

impl AesRngLabelSource {
    /// Wrap `rng`.
    pub fn new(rng: AesRng) -> Self {
        AesRngLabelSource {
            rng: Mutex::new(rng),
        }
    }
}

impl LabelSource for AesRngLabelSource {
    fn fresh_labels(&self, n: usize) -> Vec<Block> {
        let mut labels = vec![Block::ZERO; n];
        self.rng.lock().fill_blocks(&mut labels);
        labels
    }
}

/// The oblivious transfer objects of one party.
#[derive(Clone)]
pub enum OtEndpoint {
    /// Garbler side.
    Sender {
        /// General 1-out-of-2 OT.
        general: Arc<dyn Sender>,
        /// Fixed-XOR-correlated OT, whose offset must be the global delta.
        correlated: Arc<dyn CorrelatedSender>,
    },
    /// Evaluator side.
    Receiver {
        /// General 1-out-of-2 OT.
        general: Arc<dyn Receiver>,
        /// Fixed-XOR-correlated OT.
        correlated: Arc<dyn CorrelatedReceiver>,
    },
}

/// Everything a gate needs beyond its own wires: role, global delta,
/// hashing, randomness, the connection to the peer and the OT objects.
pub struct YaoProvider {
    role: Role,
    config: YaoConfig,
    delta: Option<Block>,
    hash: AesHash,
    labels: Box<dyn LabelSource>,
    transport: Arc<dyn Transport>,
    mailbox: Arc<Mailbox>,
    aborts: Arc<AbortRegistry>,
    wires: WireArena,
    ot: OtEndpoint,
    traffic: Option<Arc<TrafficStats>>,
    barriers: AtomicU64,
    _dispatcher: Option<JoinHandle<()>>,
}

impl YaoProvider {
    /// Assemble a provider from its collaborators.
    ///
    /// `delta` is the global offset and must be present exactly when `role`
    /// is [`Role::Garbler`]. Local aborts are forwarded to the peer through
    /// `transport`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        role: Role,
        config: YaoConfig,
        delta: Option<Block>,
        labels: Box<dyn LabelSource>,
        transport: Arc<dyn Transport>,
        mailbox: Arc<Mailbox>,
        aborts: Arc<AbortRegistry>,
        ot: OtEndpoint,
    ) -> Result<Self, YaoError> {
        match (role, delta, &ot) {
            (Role::Garbler, Some(delta), OtEndpoint::Sender { correlated, .. }) => {
                if !delta.lsb() {
                    return Err(YaoError::ContractViolation(
                        "global delta must have its least significant bit set".to_string(),
                    ));
                }
                if correlated.delta() != delta {
                    return Err(YaoError::ContractViolation(
                        "correlated OT offset differs from the global delta".to_string(),
                    ));
                }
            }
            (Role::Evaluator, None, OtEndpoint::Receiver { .. }) => {}
            _ => {
                return Err(YaoError::ContractViolation(format!(
                    "inconsistent provider setup for the {:?}",
                    role
                )))
            }
        }
        let weak_transport: Weak<dyn Transport> = Arc::downgrade(&transport);
        aborts.on_abort(move |reason| {
            if let Some(transport) = weak_transport.upgrade() {
                if transport.send(Message::Abort(reason.to_string())).is_err() {
                    log::debug!("could not forward abort to the peer");
                }
            }
        });
        let weak_mailbox: Weak<dyn Abortable> = Arc::downgrade(&mailbox) as Weak<dyn Abortable>;
        aborts.register_abortable(weak_mailbox);
        Ok(YaoProvider {
            role,
            config,
            delta,
            hash: AES_HASH.clone(),
            labels,
            transport,
            mailbox,
            wires: WireArena::new(aborts.clone()),
            aborts,
            ot,
            traffic: None,
            barriers: AtomicU64::new(0),
            _dispatcher: None,
        })
    }

    /// A provider connected through `channel`, using the dummy OT and
    /// label randomness from an [`AesRng`] seeded by `config.seed`.
    pub fn with_dummy_ot(
        role: Role,
        config: YaoConfig,
        channel: LocalChannel,
    ) -> Result<Self, YaoError> {
        let mut rng = match config.seed {
            Some(seed) => AesRng::from_seed(Block::from(seed as u128)),
            None => AesRng::new(),
        };
        let ot_rng = rng.fork();
        let labels: Box<dyn LabelSource> = Box::new(AesRngLabelSource::new(rng));
        let aborts = AbortRegistry::new();
        let mailbox = Mailbox::new();
        let dispatcher = spawn_dispatcher(channel.receiver(), mailbox.clone(), aborts.clone())
            .map_err(|e| YaoError::ChannelFailure(e.to_string()))?;
        let traffic = channel.stats();
        let transport: Arc<dyn Transport> = Arc::new(channel);
        let (delta, ot) = match role {
            Role::Garbler => {
                let delta = labels.fresh_delta();
                let ot = OtEndpoint::Sender {
                    general: Arc::new(DummySender::new(transport.clone())),
                    correlated: Arc::new(DummyCorrelatedSender::new(
                        transport.clone(),
                        delta,
                        ot_rng,
                    )),
                };
                (Some(delta), ot)
            }
            Role::Evaluator => {
                let receiver = Arc::new(DummyReceiver::new(mailbox.clone()));
                let ot = OtEndpoint::Receiver {
                    general: receiver.clone(),
                    correlated: receiver,
                };
                (None, ot)
            }
        };
        let mut provider =
            YaoProvider::new(role, config, delta, labels, transport, mailbox, aborts, ot)?;
        provider.traffic = Some(traffic);
        provider._dispatcher = Some(dispatcher);
        Ok(provider)
    }

    /// The role of this party.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The configuration of this run.
    pub fn config(&self) -> &YaoConfig {
        &self.config
    }

    /// The global free-XOR offset. Only the garbler has one.
    pub fn delta(&self) -> Result<Block, YaoError> {
        self.delta.ok_or_else(|| {
            YaoError::ContractViolation("only the garbler holds the global delta".to_string())
        })
    }

    /// The fixed-key hash used for garbling.
    pub fn hash(&self) -> &AesHash {
        &self.hash
    }

    /// `n` fresh labels.
    pub fn fresh_labels(&self, n: usize) -> Vec<Block> {
        self.labels.fresh_labels(n)
    }

    /// The wires of this party.
    pub fn wires(&self) -> &WireArena {
        &self.wires
    }

    /// The registry aborting this computation.
    pub fn aborts(&self) -> &Arc<AbortRegistry> {
        &self.aborts
    }

    /// The OT objects.
    pub fn ot(&self) -> &OtEndpoint {
        &self.ot
    }

    /// The OT flavor for evaluator-owned inputs.
    pub fn ot_flavor(&self) -> OtFlavor {
        self.config.ot_flavor
    }

    /// Counters of the traffic this party wrote, when known.
    pub fn traffic(&self) -> Option<&Arc<TrafficStats>> {
        self.traffic.as_ref()
    }

    /// Send `payload` to the peer under `(id, tag)`.
    pub fn send(&self, id: usize, tag: MessageTag, payload: Payload) -> Result<(), YaoError> {
        self.transport.send(Message::Data {
            key: MessageKey::new(id as u64, tag),
            payload,
        })?;
        Ok(())
    }

    /// The future of the peer's message under `(id, tag)`.
    pub fn expect(&self, id: usize, tag: MessageTag) -> BlockingFuture<Payload> {
        self.mailbox.expect(MessageKey::new(id as u64, tag))
    }

    /// Run one-time OT initialization. The default preprocessing step of
    /// the executor.
    pub fn preprocess(&self) -> Result<(), YaoError> {
        match &self.ot {
            OtEndpoint::Sender {
                general,
                correlated,
            } => {
                general.init()?;
                correlated.init()?;
            }
            OtEndpoint::Receiver {
                general,
                correlated,
            } => {
                general.init()?;
                correlated.init()?;
            }
        }
        Ok(())
    }

    /// Cross-party barrier: returns once the peer has reached its barrier of
    /// the same sequence number. The default synchronization step of the
    /// executor.
    pub fn synchronize(&self) -> Result<(), YaoError> {
        let seq = self.barriers.fetch_add(1, Ordering::SeqCst);
        let key = MessageKey::new(seq, MessageTag::Barrier);
        let peer = self.mailbox.expect(key);
        self.transport.send(Message::Data {
            key,
            payload: Payload::Empty,
        })?;
        peer.wait()?;
        log::debug!("passed barrier {}", seq);
        Ok(())
    }

    /// Abort this computation and tell the peer.
    pub fn abort(&self, reason: &str) {
        self.aborts.abort(reason);
    }
}

impl SemiHonest for YaoProvider {}

/// A garbler and an evaluator connected in-process, both using the dummy OT.
pub fn local_provider_pair(
    config: &YaoConfig,
) -> Result<(Arc<YaoProvider>, Arc<YaoProvider>), YaoError> {
    let (a, b) = local_channel_pair();
    let evaluator_config = YaoConfig {
        seed: config.seed.map(|s| s.wrapping_add(1)),
        ..config.clone()
    };
    let garbler = YaoProvider::with_dummy_ot(Role::Garbler, config.clone(), a)?;
    let evaluator = YaoProvider::with_dummy_ot(Role::Evaluator, evaluator_config, b)?;
    Ok((Arc::new(garbler), Arc::new(evaluator)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_has_lsb_and_only_garbler_has_it() {
        let (garbler, evaluator) = local_provider_pair(&YaoConfig::default()).unwrap();
        assert!(garbler.delta().unwrap().lsb());
        assert!(matches!(
            evaluator.delta(),
            Err(YaoError::ContractViolation(_))
        ));
        assert_eq!(garbler.role().peer(), evaluator.role());
    }

    #[test]
    fn test_seeded_labels_are_reproducible() {
        let config = YaoConfig {
            seed: Some(7),
            ..Default::default()
        };
        let (g1, _e1) = local_provider_pair(&config).unwrap();
        let (g2, _e2) = local_provider_pair(&config).unwrap();
        assert_eq!(g1.delta().unwrap(), g2.delta().unwrap());
        assert_eq!(g1.fresh_labels(3), g2.fresh_labels(3));
    }

    #[test]
    fn test_messages_and_barrier() {
        let (garbler, evaluator) = local_provider_pair(&YaoConfig::default()).unwrap();
        garbler
            .send(3, MessageTag::GarbledTables, Payload::Empty)
            .unwrap();
        assert_eq!(
            evaluator.expect(3, MessageTag::GarbledTables).get(),
            Ok(Payload::Empty)
        );
        let g = garbler.clone();
        let handle = std::thread::spawn(move || g.synchronize());
        evaluator.synchronize().unwrap();
        handle.join().unwrap().unwrap();
        assert_eq!(
            garbler
                .traffic()
                .unwrap()
                .messages_written(MessageTag::Barrier),
            1
        );
    }

    #[test]
    fn test_abort_reaches_peer() {
        let (garbler, evaluator) = local_provider_pair(&YaoConfig::default()).unwrap();
        let pending = evaluator.expect(0, MessageTag::InputLabels);
        garbler.abort("garbler gave up");
        assert!(pending.get().is_err());
        // The evaluator learns about the abort asynchronously.
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while !evaluator.aborts().is_aborted() && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert!(evaluator.aborts().is_aborted());
    }

    #[test]
    fn test_rejects_even_delta() {
        let (a, _b) = local_channel_pair();
        let transport: Arc<dyn Transport> = Arc::new(a);
        let delta = Block::from(2);
        let ot = OtEndpoint::Sender {
            general: Arc::new(DummySender::new(transport.clone())),
            correlated: Arc::new(DummyCorrelatedSender::new(
                transport.clone(),
                delta,
                AesRng::new(),
            )),
        };
        let result = YaoProvider::new(
            Role::Garbler,
            YaoConfig::default(),
            Some(delta),
            Box::new(AesRngLabelSource::new(AesRng::new())),
            transport,
            Mailbox::new(),
            AbortRegistry::new(),
            ot,
        );
        assert!(matches!(result, Err(YaoError::ContractViolation(_))));
    }
}
