//! Process-wide strategy and field caches.
//!
//! Strategies are built at most once per type. The first caller for a type
//! installs a forwarding placeholder before computing the real strategy, so
//! a recursive type that asks for itself while being built receives the
//! placeholder instead of recursing forever. Other threads arriving during
//! the build also receive the placeholder; invoking it blocks until the real
//! strategy is published and then delegates to it. A build that panics
//! publishes an error, so waiters are always released.

use std::any::{type_name, Any, TypeId};
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

use crate::decode::{Decoder, DecoderConfig};
use crate::encode::Encoder;
use crate::error::BencodeError;
use crate::fields::{self, FieldDescriptor, Record};
use crate::pool::BufferPool;
use crate::strategy::{Bencode, Kind, Resolve, Strategy};

type Erased = Arc<dyn Any + Send + Sync>;
type Outcome<T> = Result<Arc<Strategy<T>>, BencodeError>;

/// Publication point for the outcome of one strategy build.
struct Gate<T> {
    outcome: OnceLock<Outcome<T>>,
    lock: Mutex<()>,
    published: Condvar,
    builder: ThreadId,
}

impl<T> Gate<T> {
    fn new() -> Self {
        Self {
            outcome: OnceLock::new(),
            lock: Mutex::new(()),
            published: Condvar::new(),
            builder: thread::current().id(),
        }
    }

    /// Like [`wait`](Self::wait), but returns `None` instead of waiting on
    /// the thread that is running the build.
    fn wait_unless_building(&self) -> Option<&Outcome<T>> {
        if let Some(outcome) = self.outcome.get() {
            return Some(outcome);
        }
        if thread::current().id() == self.builder {
            return None;
        }
        Some(self.wait())
    }

    fn wait(&self) -> &Outcome<T> {
        if let Some(outcome) = self.outcome.get() {
            return outcome;
        }
        let mut guard = self.lock.lock();
        loop {
            if let Some(outcome) = self.outcome.get() {
                return outcome;
            }
            self.published.wait(&mut guard);
        }
    }

    fn publish(&self, outcome: Outcome<T>) {
        let _ = self.outcome.set(outcome);
        let _guard = self.lock.lock();
        self.published.notify_all();
    }
}

/// Cache entry for one type: the forwarding placeholder and its gate.
struct Slot<T> {
    forward: Arc<Strategy<T>>,
    gate: Arc<Gate<T>>,
}

impl<T: Bencode> Slot<T> {
    fn new() -> Self {
        let gate = Arc::new(Gate::new());
        let encode_gate = Arc::clone(&gate);
        let decode_gate = Arc::clone(&gate);
        let kind_gate = Arc::clone(&gate);
        let key_gate = Arc::clone(&gate);
        let forward = Strategy::new(
            Kind::Pending,
            move |value: &T, out: &mut Encoder| match encode_gate.wait() {
                Ok(strategy) => strategy.encode(value, out),
                Err(err) => Err(err.clone()),
            },
            move |scan, token, target: &mut T| match decode_gate.wait() {
                Ok(strategy) => strategy.decode(scan, token, target),
                Err(err) => Err(err.clone()),
            },
        )
        .with_resolved_kind(move |mode| {
            let outcome = match mode {
                Resolve::Peek => kind_gate.outcome.get(),
                Resolve::Block => kind_gate.wait_unless_building(),
            };
            match outcome {
                Some(Ok(strategy)) => strategy.kind_with(mode),
                _ => Kind::Pending,
            }
        })
        .with_resolved_key(move || match key_gate.wait_unless_building() {
            Some(Ok(strategy)) => strategy.key_codec(),
            _ => None,
        });
        Self {
            forward: Arc::new(forward),
            gate,
        }
    }

    /// The real strategy once published, the placeholder until then.
    fn current(&self) -> Outcome<T> {
        match self.gate.outcome.get() {
            Some(outcome) => outcome.clone(),
            None => Ok(Arc::clone(&self.forward)),
        }
    }
}

/// Publishes a failure if a strategy build unwinds before publishing.
struct BuildGuard<T> {
    gate: Arc<Gate<T>>,
    armed: bool,
}

impl<T> Drop for BuildGuard<T> {
    fn drop(&mut self) {
        if self.armed {
            self.gate.publish(Err(BencodeError::unsupported::<T>(
                "strategy construction panicked",
            )));
        }
    }
}

fn downcast<V: Any + Send + Sync>(erased: Erased) -> Result<Arc<V>, BencodeError> {
    erased
        .downcast::<V>()
        .map_err(|_| BencodeError::unsupported::<V>("registry entry holds a different type"))
}

/// Strategy and field-descriptor cache.
///
/// [`Registry::global`] is the instance used by the free [`encode`] and
/// [`decode`] functions. It is created on first use and lives for the rest
/// of the process. Separate instances can be created with [`Registry::new`]
/// and passed around explicitly.
///
/// [`encode`]: crate::encode()
/// [`decode`]: crate::decode()
pub struct Registry {
    strategies: DashMap<TypeId, Erased>,
    fields: DashMap<TypeId, Erased>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            strategies: DashMap::new(),
            fields: DashMap::new(),
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new)
    }

    /// Returns the strategy for `T`, building it on first use.
    ///
    /// While the strategy for `T` is being built, this returns a forwarding
    /// placeholder. Build failures are cached: every later request for the
    /// same type returns the same error.
    pub fn strategy_for<T: Bencode>(&self) -> Result<Arc<Strategy<T>>, BencodeError> {
        let id = TypeId::of::<T>();
        if let Some(entry) = self.strategies.get(&id) {
            let erased = Arc::clone(entry.value());
            drop(entry);
            return downcast::<Slot<T>>(erased)?.current();
        }

        let slot = match self.strategies.entry(id) {
            dashmap::mapref::entry::Entry::Occupied(entry) => {
                let erased = Arc::clone(entry.get());
                drop(entry);
                return downcast::<Slot<T>>(erased)?.current();
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                let slot = Arc::new(Slot::<T>::new());
                entry.insert(Arc::clone(&slot) as Erased);
                slot
            }
        };

        let mut guard = BuildGuard {
            gate: Arc::clone(&slot.gate),
            armed: true,
        };
        let outcome = T::strategy(self).map(Arc::new);
        guard.armed = false;
        match &outcome {
            Ok(strategy) => trace!(
                type_name = type_name::<T>(),
                kind = ?strategy.kind(),
                "built bencode strategy"
            ),
            Err(err) => debug!(
                type_name = type_name::<T>(),
                error = %err,
                "bencode strategy build failed"
            ),
        }
        slot.gate.publish(outcome.clone());
        outcome
    }

    /// Returns the serializable fields of `T`, sorted by wire name.
    ///
    /// Computed once per type and shared afterwards.
    pub fn fields<T: Record>(&self) -> Result<Arc<Vec<FieldDescriptor<T>>>, BencodeError> {
        let id = TypeId::of::<T>();
        if let Some(entry) = self.fields.get(&id) {
            let erased = Arc::clone(entry.value());
            drop(entry);
            return downcast(erased);
        }

        let entry = self.fields.entry(id).or_try_insert_with(|| {
            let descriptors = fields::introspect::<T>()?;
            trace!(
                type_name = type_name::<T>(),
                count = descriptors.len(),
                "introspected record fields"
            );
            Ok::<_, BencodeError>(Arc::new(descriptors) as Erased)
        })?;
        let erased = Arc::clone(entry.value());
        drop(entry);
        downcast(erased)
    }

    /// Number of types with a cached strategy.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Encodes `value` using strategies from this registry.
    pub fn encode<T: Bencode>(&self, value: &T) -> Result<Vec<u8>, BencodeError> {
        self.encode_with(value, |bytes| Ok(bytes.to_vec()))
    }

    /// Encodes `value` into a pooled buffer and hands the finished bytes to `finish`.
    ///
    /// `finish` only runs on success; the buffer goes back to the pool afterwards.
    pub(crate) fn encode_with<T: Bencode, O>(
        &self,
        value: &T,
        finish: impl FnOnce(&[u8]) -> Result<O, BencodeError>,
    ) -> Result<O, BencodeError> {
        let strategy = self.strategy_for::<T>()?;
        let mut out = Encoder::new(BufferPool::global().lease());
        strategy.encode(value, &mut out)?;
        finish(out.as_bytes())
    }

    /// Decodes exactly one value from `data` into `target`.
    pub fn decode_into<T: Bencode>(&self, data: &[u8], target: &mut T) -> Result<(), BencodeError> {
        Decoder::with_registry(data, DecoderConfig::default(), self).decode_exact(target)
    }

    /// Decodes exactly one value of type `T` from `data`.
    pub fn decode<T: Bencode + Default>(&self, data: &[u8]) -> Result<T, BencodeError> {
        let mut value = T::default();
        self.decode_into(data, &mut value)?;
        Ok(value)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
