//! Single-assignment futures with an aborted terminal state.
//!
//! A [`Promise`] is written at most once; any number of [`BlockingFuture`]
//! clones can wait for the value. Dropping an unfulfilled promise, or
//! aborting through an [`AbortRegistry`], wakes every waiter with an error,
//! so no consumer blocks forever on material that will never arrive.

use crate::errors::HandoffError;
use parking_lot::{Condvar, Mutex};
use std::sync::{Arc, Weak};

enum State<T> {
    Pending,
    Ready(T),
    Failed(HandoffError),
}

struct Inner<T> {
    state: Mutex<State<T>>,
    changed: Condvar,
}

impl<T> Inner<T> {
    fn fail(&self, error: HandoffError) {
        let mut state = self.state.lock();
        if let State::Pending = *state {
            *state = State::Failed(error);
            self.changed.notify_all();
        }
    }
}

/// Something that can be woken with an abort reason.
pub trait Abortable: Send + Sync {
    /// Fail every pending waiter with `reason`. Already settled values are
    /// left untouched.
    fn abort(&self, reason: &str);
}

impl<T: Send> Abortable for Inner<T> {
    fn abort(&self, reason: &str) {
        self.fail(HandoffError::Aborted(reason.to_string()));
    }
}

/// The write side of a single-assignment channel.
pub struct Promise<T> {
    inner: Option<Arc<Inner<T>>>,
}

/// The read side of a single-assignment channel.
pub struct BlockingFuture<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for BlockingFuture<T> {
    fn clone(&self) -> Self {
        BlockingFuture {
            inner: self.inner.clone(),
        }
    }
}

/// Create a connected promise/future pair.
pub fn promise<T>() -> (Promise<T>, BlockingFuture<T>) {
    let inner = Arc::new(Inner {
        state: Mutex::new(State::Pending),
        changed: Condvar::new(),
    });
    (
        Promise {
            inner: Some(inner.clone()),
        },
        BlockingFuture { inner },
    )
}

impl<T> Promise<T> {
    /// Fulfil the promise, waking all waiters.
    pub fn set(mut self, value: T) -> Result<(), HandoffError> {
        let inner = self.inner.take().ok_or(HandoffError::AlreadyFulfilled)?;
        let mut state = inner.state.lock();
        match &*state {
            State::Pending => {
                *state = State::Ready(value);
                inner.changed.notify_all();
                Ok(())
            }
            State::Ready(_) => Err(HandoffError::AlreadyFulfilled),
            State::Failed(e) => Err(e.clone()),
        }
    }
}

impl<T> Drop for Promise<T> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            inner.fail(HandoffError::PromiseDropped);
        }
    }
}

impl<T> BlockingFuture<T> {
    /// Block until the value is available, then apply `f` to it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R, HandoffError> {
        let mut state = self.inner.state.lock();
        loop {
            match &*state {
                State::Pending => self.inner.changed.wait(&mut state),
                State::Ready(value) => return Ok(f(value)),
                State::Failed(e) => return Err(e.clone()),
            }
        }
    }

    /// Block until the future settles, discarding the value.
    pub fn wait(&self) -> Result<(), HandoffError> {
        self.with(|_| ())
    }

    /// Whether a value has been written.
    pub fn is_ready(&self) -> bool {
        matches!(*self.inner.state.lock(), State::Ready(_))
    }

    /// Whether the future will never produce a value.
    pub fn is_failed(&self) -> bool {
        matches!(*self.inner.state.lock(), State::Failed(_))
    }
}

impl<T: Clone> BlockingFuture<T> {
    /// Block until the value is available and return a copy of it.
    pub fn get(&self) -> Result<T, HandoffError> {
        self.with(T::clone)
    }
}

impl<T: Send> BlockingFuture<T> {
    /// Fail the future with `reason` unless it already settled.
    pub fn abort(&self, reason: &str) {
        self.inner.fail(HandoffError::Aborted(reason.to_string()));
    }
}

impl<T: Send + 'static> BlockingFuture<T> {
    /// A weak handle through which this future can be aborted.
    pub fn abort_handle(&self) -> Weak<dyn Abortable> {
        let weak: Weak<dyn Abortable> = Arc::downgrade(&self.inner) as Weak<dyn Abortable>;
        weak
    }
}

type AbortHook = Box<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
struct RegistryState {
    reason: Option<String>,
    entries: Vec<Weak<dyn Abortable>>,
    hooks: Vec<AbortHook>,
}

/// Tracks everything that must be woken when a computation is aborted.
///
/// Entries are held weakly; settled futures that nobody references any more
/// are pruned as the registry grows. Anything registered after the abort is
/// aborted immediately.
#[derive(Default)]
pub struct AbortRegistry {
    state: Mutex<RegistryState>,
}

impl AbortRegistry {
    /// Create an empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a future.
    pub fn register<T: Send + 'static>(&self, future: &BlockingFuture<T>) {
        self.register_abortable(future.abort_handle())
    }

    /// Register an arbitrary abortable item.
    pub fn register_abortable(&self, item: Weak<dyn Abortable>) {
        let mut state = self.state.lock();
        if let Some(reason) = state.reason.clone() {
            drop(state);
            if let Some(item) = item.upgrade() {
                item.abort(&reason);
            }
            return;
        }
        if state.entries.len() == state.entries.capacity() {
            state.entries.retain(|w| w.strong_count() > 0);
        }
        state.entries.push(item);
    }

    /// Run `hook` once with the abort reason when the registry is aborted.
    pub fn on_abort(&self, hook: impl Fn(&str) + Send + Sync + 'static) {
        let mut state = self.state.lock();
        match state.reason.clone() {
            Some(reason) => {
                drop(state);
                hook(&reason);
            }
            None => state.hooks.push(Box::new(hook)),
        }
    }

    /// Abort every registered item and run the hooks. Returns `false` if the
    /// registry had already been aborted, in which case nothing happens.
    pub fn abort(&self, reason: &str) -> bool {
        let (entries, hooks) = {
            let mut state = self.state.lock();
            if state.reason.is_some() {
                return false;
            }
            state.reason = Some(reason.to_string());
            (
                std::mem::take(&mut state.entries),
                std::mem::take(&mut state.hooks),
            )
        };
        log::error!("aborting: {}", reason);
        for entry in entries.iter().filter_map(Weak::upgrade) {
            entry.abort(reason);
        }
        for hook in hooks.iter() {
            hook(reason);
        }
        true
    }

    /// Whether [`AbortRegistry::abort`] has been called.
    pub fn is_aborted(&self) -> bool {
        self.state.lock().reason.is_some()
    }

    /// The reason given to the first abort, if any.
    pub fn reason(&self) -> Option<String> {
        self.state.lock().reason.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_set_then_get() {
        let (p, f) = promise::<u32>();
        assert!(!f.is_ready());
        p.set(7).unwrap();
        assert!(f.is_ready());
        assert_eq!(f.get(), Ok(7));
        assert_eq!(f.clone().get(), Ok(7));
    }

    #[test]
    fn test_get_blocks_until_set() {
        let (p, f) = promise::<Vec<u8>>();
        let waiter = std::thread::spawn(move || f.get());
        std::thread::sleep(std::time::Duration::from_millis(20));
        p.set(vec![1, 2, 3]).unwrap();
        assert_eq!(waiter.join().unwrap(), Ok(vec![1, 2, 3]));
    }

    #[test]
    fn test_dropped_promise_wakes_waiters() {
        let (p, f) = promise::<u32>();
        let waiter = std::thread::spawn(move || f.get());
        std::thread::sleep(std::time::Duration::from_millis(20));
        drop(p);
        assert_eq!(waiter.join().unwrap(), Err(HandoffError::PromiseDropped));
    }

    #[test]
    fn test_abort_wakes_waiters_and_rejects_set() {
        let registry = AbortRegistry::new();
        let (p, f) = promise::<u32>();
        registry.register(&f);
        let waiter = std::thread::spawn(move || f.get());
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert!(registry.abort("test"));
        assert!(!registry.abort("again"));
        assert_eq!(
            waiter.join().unwrap(),
            Err(HandoffError::Aborted("test".to_string()))
        );
        assert_eq!(p.set(1), Err(HandoffError::Aborted("test".to_string())));
        assert_eq!(registry.reason().as_deref(), Some("test"));
    }

    #[test]
    fn test_abort_leaves_ready_values() {
        let registry = AbortRegistry::new();
        let (p, f) = promise::<u32>();
        registry.register(&f);
        p.set(3).unwrap();
        registry.abort("late");
        assert_eq!(f.get(), Ok(3));
    }

    #[test]
    fn test_register_after_abort() {
        let registry = AbortRegistry::new();
        registry.abort("early");
        let (_p, f) = promise::<u32>();
        registry.register(&f);
        assert!(f.is_failed());
    }

    #[test]
    fn test_hooks_run_once() {
        let registry = AbortRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        registry.on_abort(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        registry.abort("x");
        registry.abort("y");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
