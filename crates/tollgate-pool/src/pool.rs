use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::events::PoolEvent;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tollgate_core::ConfigError;

#[cfg(feature = "metrics")]
use metrics::{counter, gauge, histogram};

const MIN_REAP_INTERVAL: Duration = Duration::from_millis(100);

/// Creates and closes the items held by a [`Pool`].
///
/// `create` may be slow (a network dial, a handshake); the pool never calls
/// it while holding its lock.
pub trait Factory: Send + Sync + 'static {
    /// The pooled resource.
    type Item: Send + 'static;
    /// Error returned when creating or closing an item fails.
    type Error: Send + 'static;

    /// Creates a new item.
    fn create(&self) -> BoxFuture<'_, Result<Self::Item, Self::Error>>;

    /// Closes an item the pool is done with.
    fn close(&self, item: Self::Item) -> Result<(), Self::Error>;
}

/// A [`Factory`] built from two closures. See [`factory_fn`].
#[derive(Clone)]
pub struct FnFactory<C, D> {
    create: C,
    close: D,
}

/// Builds a [`Factory`] from a `create` closure returning a future and a
/// synchronous `close` closure.
///
/// ```rust
/// use tollgate_pool::factory_fn;
///
/// let factory = factory_fn(
///     || async { Ok::<_, std::io::Error>(Vec::<u8>::with_capacity(4096)) },
///     |buf: Vec<u8>| {
///         drop(buf);
///         Ok(())
///     },
/// );
/// # let _ = factory;
/// ```
pub fn factory_fn<C, D, Fut, T, E>(create: C, close: D) -> FnFactory<C, D>
where
    C: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    D: Fn(T) -> Result<(), E> + Send + Sync + 'static,
{
    FnFactory { create, close }
}

impl<C, D, Fut, T, E> Factory for FnFactory<C, D>
where
    C: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    D: Fn(T) -> Result<(), E> + Send + Sync + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Item = T;
    type Error = E;

    fn create(&self) -> BoxFuture<'_, Result<T, E>> {
        Box::pin((self.create)())
    }

    fn close(&self, item: T) -> Result<(), E> {
        (self.close)(item)
    }
}

/// Point-in-time view of a pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Items open right now, idle or checked out, including those being created.
    pub active: usize,
    /// Items sitting in the free list.
    pub idle: usize,
    /// Checkouts blocked waiting for an item.
    pub waiters: usize,
    /// Whether [`Pool::close`] has been called.
    pub closed: bool,
}

struct Idle<T> {
    item: T,
    since: Instant,
}

type Delivery<T, E> = Result<Idle<T>, E>;

struct PoolState<T, E> {
    free: VecDeque<Idle<T>>,
    requests: BTreeMap<u64, oneshot::Sender<Delivery<T, E>>>,
    next_request: u64,
    active: usize,
    // Slots reserved for the opener and not delivered yet.
    opening: usize,
    closed: bool,
}

struct PoolInner<F: Factory> {
    factory: F,
    config: PoolConfig,
    state: Mutex<PoolState<F::Item, F::Error>>,
    opener: mpsc::UnboundedSender<()>,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

enum Step<T, E> {
    Closed,
    Reuse(Idle<T>),
    Exhausted,
    Create,
    Wait(u64, oneshot::Receiver<Delivery<T, E>>),
}

#[derive(Clone, Copy)]
enum Origin {
    Free,
    Created,
    Handoff,
}

#[cfg(feature = "metrics")]
impl Origin {
    fn as_str(self) -> &'static str {
        match self {
            Origin::Free => "reused",
            Origin::Created => "created",
            Origin::Handoff => "handoff",
        }
    }
}

/// A concurrent pool of reusable items.
///
/// Items are created on demand by a [`Factory`], handed out by
/// [`get`](Self::get) and given back with [`put`](Self::put). At most
/// `active` items exist at once (when `active > 0`); up to
/// [`max_idle`](PoolConfig::max_idle) returned items are kept for reuse.
///
/// When the pool is at its limit, a checkout either fails with
/// [`PoolError::Exhausted`] or, if waiting is configured, blocks until an
/// item is returned or a slot frees up. Slots freed while checkouts are
/// waiting are refilled by a background task that calls the factory outside
/// the pool lock and hands the new item to a waiter.
///
/// The pool is a cheap handle: clones share the same items. Closing it, or
/// dropping the last handle, stops the background tasks and closes the free
/// items.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use tollgate_pool::{factory_fn, Pool, PoolConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let config = PoolConfig::builder()
///     .name("sessions")
///     .active(8)
///     .idle(2)
///     .wait_timeout(Some(Duration::from_millis(50)))
///     .build()
///     .unwrap();
///
/// let pool = Pool::new(
///     config,
///     factory_fn(|| async { Ok::<_, String>(String::from("session")) }, |_| Ok(())),
/// )
/// .unwrap();
///
/// let session = pool.get().await.unwrap();
/// pool.put(session, false).unwrap();
/// assert_eq!(pool.stats().idle, 1);
///
/// pool.close().await.unwrap();
/// # }
/// ```
pub struct Pool<F: Factory> {
    inner: Arc<PoolInner<F>>,
}

impl<F: Factory> Clone for Pool<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: Factory> fmt::Debug for Pool<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("config", &self.inner.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl<F: Factory> Pool<F> {
    /// Creates a pool and starts its background tasks on the current Tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::IdleExceedsActive`] if `config` does not validate.
    /// - [`ConfigError::NoRuntime`] if called outside a Tokio runtime.
    pub fn new(config: PoolConfig, factory: F) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;

        #[cfg(feature = "metrics")]
        crate::describe_metrics();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            pool = %config.name,
            active = config.active,
            max_idle = config.max_idle(),
            idle_timeout = ?config.idle_timeout,
            wait_timeout = ?config.wait_timeout,
            wait = config.wait,
            "created pool"
        );

        let reap_every = config.idle_timeout.map(|t| t.max(MIN_REAP_INTERVAL));
        let (opener, signals) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let inner = Arc::new(PoolInner {
            factory,
            config,
            state: Mutex::new(PoolState {
                free: VecDeque::new(),
                requests: BTreeMap::new(),
                next_request: 0,
                active: 0,
                opening: 0,
                closed: false,
            }),
            opener,
            cancel: cancel.clone(),
            tasks: Mutex::new(Vec::new()),
        });

        let mut tasks = vec![runtime.spawn(run_opener(
            Arc::downgrade(&inner),
            signals,
            cancel.clone(),
        ))];
        if let Some(period) = reap_every {
            tasks.push(runtime.spawn(run_reaper(Arc::downgrade(&inner), period, cancel)));
        }
        *inner.tasks.lock() = tasks;

        Ok(Self { inner })
    }

    /// Checks out an item.
    ///
    /// A free item is preferred; expired free items are closed on the way.
    /// Otherwise a new item is created, or, at the active limit, the call
    /// fails with [`PoolError::Exhausted`] or waits as configured.
    ///
    /// Dropping the returned future cancels the checkout without leaking an
    /// item or a slot.
    ///
    /// # Errors
    ///
    /// [`PoolError::Closed`], [`PoolError::Exhausted`],
    /// [`PoolError::Timeout`] when the wait timeout elapses, or
    /// [`PoolError::Create`] with the factory's error.
    pub async fn get(&self) -> Result<F::Item, PoolError<F::Error>> {
        self.checkout(None).await
    }

    /// Like [`get`](Self::get), but gives up after `timeout`.
    ///
    /// When the pool also has a wait timeout, the earlier deadline wins.
    /// The deadline also bounds the factory call.
    pub async fn get_timeout(&self, timeout: Duration) -> Result<F::Item, PoolError<F::Error>> {
        self.checkout(Some(Instant::now() + timeout)).await
    }

    async fn checkout(&self, deadline: Option<Instant>) -> Result<F::Item, PoolError<F::Error>> {
        let result = self.inner.checkout(deadline).await;

        #[cfg(feature = "metrics")]
        {
            let outcome = match &result {
                Ok((_, origin)) => origin.as_str(),
                Err(PoolError::Exhausted) => "exhausted",
                Err(PoolError::Timeout) => "timeout",
                Err(PoolError::Closed) => "closed",
                Err(_) => "error",
            };
            counter!("pool_get_total", "pool" => self.inner.config.name.clone(), "outcome" => outcome)
                .increment(1);
            self.inner.publish();
        }

        result.map(|(item, _)| item)
    }

    /// Returns an item to the pool.
    ///
    /// With `force_close` the item is closed and its slot freed. Otherwise
    /// it goes to a waiting checkout if there is one, then to the free list
    /// if there is room; failing both it is closed.
    ///
    /// # Errors
    ///
    /// [`PoolError::Close`] if the item had to be closed and closing failed.
    pub fn put(&self, item: F::Item, force_close: bool) -> Result<(), PoolError<F::Error>> {
        let rejected = {
            let mut state = self.inner.state.lock();
            if force_close {
                self.inner.release_locked(&mut state);
                Some(item)
            } else {
                self.inner.put_locked(&mut state, item)
            }
        };

        #[cfg(feature = "metrics")]
        self.inner.publish();

        match rejected {
            Some(item) => self.inner.factory.close(item).map_err(PoolError::Close),
            None => Ok(()),
        }
    }

    /// Closes the pool.
    ///
    /// Free items are closed, waiting checkouts fail with
    /// [`PoolError::Closed`] and the background tasks are stopped and
    /// joined. Items still checked out are closed when they are put back.
    /// Closing an already closed pool does nothing.
    ///
    /// # Errors
    ///
    /// [`PoolError::Close`] with the first error returned while closing
    /// free items; the remaining items are closed regardless.
    pub async fn close(&self) -> Result<(), PoolError<F::Error>> {
        let free = {
            let mut state = self.inner.state.lock();
            if state.closed {
                return Ok(());
            }
            state.closed = true;
            state.requests.clear();
            let free: Vec<_> = state.free.drain(..).collect();
            state.active = state.active.saturating_sub(free.len());
            free
        };

        self.inner.cancel.cancel();

        let mut first_error = None;
        for idle in free {
            if let Err(err) = self.inner.factory.close(idle.item) {
                #[cfg(feature = "tracing")]
                tracing::warn!(pool = %self.inner.config.name, "failed to close pooled item");
                first_error.get_or_insert(err);
            }
        }

        let tasks = std::mem::take(&mut *self.inner.tasks.lock());
        for task in tasks {
            let _ = task.await;
        }

        // Slots reserved for signals the opener never picked up.
        {
            let mut state = self.inner.state.lock();
            state.active = state.active.saturating_sub(state.opening);
            state.opening = 0;
        }

        #[cfg(feature = "tracing")]
        tracing::info!(pool = %self.inner.config.name, "pool closed");

        #[cfg(feature = "metrics")]
        self.inner.publish();

        self.inner.emit(|pattern_name, timestamp| PoolEvent::Closed {
            pattern_name,
            timestamp,
        });

        match first_error {
            Some(err) => Err(PoolError::Close(err)),
            None => Ok(()),
        }
    }

    /// Current counts.
    pub fn stats(&self) -> PoolStats {
        let state = self.inner.state.lock();
        PoolStats {
            active: state.active,
            idle: state.free.len(),
            waiters: state.requests.len(),
            closed: state.closed,
        }
    }

    /// The pool's configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// The pool's factory.
    pub fn factory(&self) -> &F {
        &self.inner.factory
    }
}

impl<F: Factory> PoolInner<F> {
    async fn checkout(
        &self,
        deadline: Option<Instant>,
    ) -> Result<(F::Item, Origin), PoolError<F::Error>> {
        loop {
            let mut expired = Vec::new();
            let step = {
                let mut state = self.state.lock();
                self.next_step(&mut state, &mut expired)
            };
            self.evict(expired);

            match step {
                Step::Closed => return Err(PoolError::Closed),
                Step::Reuse(idle) => {
                    let idle_for = idle.since.elapsed();

                    #[cfg(feature = "tracing")]
                    tracing::debug!(pool = %self.config.name, ?idle_for, "reusing pooled item");

                    self.emit(|pattern_name, timestamp| PoolEvent::ItemReused {
                        pattern_name,
                        timestamp,
                        idle_for,
                    });
                    return Ok((idle.item, Origin::Free));
                }
                Step::Exhausted => {
                    self.emit(|pattern_name, timestamp| PoolEvent::Exhausted {
                        pattern_name,
                        timestamp,
                        max_active: self.config.active,
                    });
                    return Err(PoolError::Exhausted);
                }
                Step::Create => {
                    return self.create(deadline).await.map(|item| (item, Origin::Created));
                }
                Step::Wait(key, rx) => {
                    let waiter = Waiter {
                        pool: self,
                        key,
                        rx,
                        settled: false,
                    };
                    if let Some(item) = self.wait(waiter, deadline).await? {
                        return Ok((item, Origin::Handoff));
                    }
                }
            }
        }
    }

    fn next_step(
        &self,
        state: &mut PoolState<F::Item, F::Error>,
        expired: &mut Vec<Idle<F::Item>>,
    ) -> Step<F::Item, F::Error> {
        if state.closed {
            return Step::Closed;
        }

        while let Some(idle) = state.free.pop_front() {
            if !self.is_expired(&idle) {
                return Step::Reuse(idle);
            }
            state.active = state.active.saturating_sub(1);
            expired.push(idle);
        }

        if self.config.is_limited() && state.active >= self.config.active {
            if !self.config.can_wait() {
                return Step::Exhausted;
            }
            let key = state.next_request;
            state.next_request += 1;
            let (tx, rx) = oneshot::channel();
            state.requests.insert(key, tx);
            return Step::Wait(key, rx);
        }

        state.active += 1;
        Step::Create
    }

    async fn create(&self, deadline: Option<Instant>) -> Result<F::Item, PoolError<F::Error>> {
        let mut slot = Slot {
            pool: self,
            armed: true,
        };

        let result = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, self.factory.create())
                .await
                .map_err(|_| PoolError::Timeout)?,
            None => self.factory.create().await,
        };
        let item = result.map_err(PoolError::Create)?;
        slot.armed = false;

        self.item_created();
        Ok(item)
    }

    async fn wait(
        &self,
        mut waiter: Waiter<'_, F>,
        deadline: Option<Instant>,
    ) -> Result<Option<F::Item>, PoolError<F::Error>> {
        let started = Instant::now();
        let deadline = match (deadline, self.config.wait_timeout) {
            (Some(caller), Some(wait)) => Some(caller.min(started + wait)),
            (Some(caller), None) => Some(caller),
            (None, Some(wait)) => Some(started + wait),
            (None, None) => None,
        };

        let received = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, &mut waiter.rx).await {
                Ok(received) => received,
                // An item delivered right at the deadline is still ours.
                Err(_) => match waiter.cancel() {
                    Ok(Some(delivery)) => Ok(delivery),
                    // The pool closed between the deadline and the cancel.
                    Err(_) => return Err(PoolError::Closed),
                    Ok(None) => {
                        let waited = started.elapsed();

                        #[cfg(feature = "tracing")]
                        tracing::debug!(pool = %self.config.name, ?waited, "gave up waiting for an item");

                        #[cfg(feature = "metrics")]
                        histogram!("pool_wait_duration_seconds", "pool" => self.config.name.clone())
                            .record(waited.as_secs_f64());

                        self.emit(|pattern_name, timestamp| PoolEvent::WaitTimedOut {
                            pattern_name,
                            timestamp,
                            waited,
                        });
                        return Err(PoolError::Timeout);
                    }
                },
            },
            None => (&mut waiter.rx).await,
        };
        waiter.settled = true;

        #[cfg(feature = "metrics")]
        histogram!("pool_wait_duration_seconds", "pool" => self.config.name.clone())
            .record(started.elapsed().as_secs_f64());

        match received {
            // The sender is dropped only when the pool closes.
            Err(_) => Err(PoolError::Closed),
            Ok(Err(err)) => Err(PoolError::Create(err)),
            Ok(Ok(idle)) if self.is_expired(&idle) => {
                {
                    let mut state = self.state.lock();
                    self.release_locked(&mut state);
                }
                self.close_item(idle.item);
                Ok(None)
            }
            Ok(Ok(idle)) => Ok(Some(idle.item)),
        }
    }

    /// Hands `item` to a waiter or keeps it for reuse. An item that can be
    /// neither is returned to be closed, its slot already released.
    fn put_locked(
        &self,
        state: &mut PoolState<F::Item, F::Error>,
        item: F::Item,
    ) -> Option<F::Item> {
        if state.closed || (self.config.is_limited() && state.active > self.config.active) {
            state.active = state.active.saturating_sub(1);
            return Some(item);
        }

        let mut idle = Idle {
            item,
            since: Instant::now(),
        };
        while let Some((_, waiter)) = state.requests.pop_first() {
            match waiter.send(Ok(idle)) {
                Ok(()) => return None,
                Err(Ok(back)) => idle = back,
                Err(Err(_)) => return None,
            }
        }

        if state.free.len() < self.config.max_idle() {
            state.free.push_back(idle);
            return None;
        }

        state.active = state.active.saturating_sub(1);
        Some(idle.item)
    }

    fn release_locked(&self, state: &mut PoolState<F::Item, F::Error>) {
        state.active = state.active.saturating_sub(1);
        self.maybe_open_locked(state);
    }

    /// Reserves a slot and signals the opener once for every waiter that
    /// can be served under the active limit.
    fn maybe_open_locked(&self, state: &mut PoolState<F::Item, F::Error>) {
        if state.closed {
            return;
        }
        let mut wanted = state.requests.len().saturating_sub(state.opening);
        if self.config.is_limited() {
            wanted = wanted.min(self.config.active.saturating_sub(state.active));
        }
        for _ in 0..wanted {
            if self.opener.send(()).is_err() {
                break;
            }
            state.active += 1;
            state.opening += 1;
        }
    }

    async fn open(&self) {
        let result = self.factory.create().await;
        match result {
            Ok(item) => {
                let rejected = {
                    let mut state = self.state.lock();
                    state.opening = state.opening.saturating_sub(1);
                    self.put_locked(&mut state, item)
                };
                self.item_created();
                if let Some(item) = rejected {
                    self.close_item(item);
                }
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(pool = %self.config.name, "background item creation failed");

                let mut state = self.state.lock();
                state.opening = state.opening.saturating_sub(1);
                state.active = state.active.saturating_sub(1);
                if let Some((_, waiter)) = state.requests.pop_first() {
                    let _ = waiter.send(Err(err));
                }
                self.maybe_open_locked(&mut state);
            }
        }

        #[cfg(feature = "metrics")]
        self.publish();
    }

    fn abandon_open(&self) {
        let mut state = self.state.lock();
        state.opening = state.opening.saturating_sub(1);
        state.active = state.active.saturating_sub(1);
    }

    fn reap(&self) {
        let mut expired = Vec::new();
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            let mut kept = VecDeque::with_capacity(state.free.len());
            for idle in state.free.drain(..) {
                if self.is_expired(&idle) {
                    expired.push(idle);
                } else {
                    kept.push_back(idle);
                }
            }
            state.free = kept;
            state.active = state.active.saturating_sub(expired.len());
        }

        if !expired.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::debug!(pool = %self.config.name, evicted = expired.len(), "evicted idle items");

            self.evict(expired);

            #[cfg(feature = "metrics")]
            self.publish();
        }
    }

    /// Closes items that outlived the idle timeout. Their slots must
    /// already be released.
    fn evict(&self, expired: Vec<Idle<F::Item>>) {
        for idle in expired {
            let idle_for = idle.since.elapsed();

            #[cfg(feature = "metrics")]
            counter!("pool_items_evicted_total", "pool" => self.config.name.clone()).increment(1);

            self.emit(|pattern_name, timestamp| PoolEvent::ItemEvicted {
                pattern_name,
                timestamp,
                idle_for,
            });
            self.close_item(idle.item);
        }
    }

    fn is_expired(&self, idle: &Idle<F::Item>) -> bool {
        self.config
            .idle_timeout
            .is_some_and(|timeout| idle.since.elapsed() > timeout)
    }

    fn close_item(&self, item: F::Item) {
        if self.factory.close(item).is_err() {
            #[cfg(feature = "tracing")]
            tracing::warn!(pool = %self.config.name, "failed to close pooled item");
        }
    }

    fn item_created(&self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(pool = %self.config.name, "created pooled item");

        self.emit(|pattern_name, timestamp| PoolEvent::ItemCreated {
            pattern_name,
            timestamp,
            active: self.state.lock().active,
        });
    }

    fn emit<M>(&self, make: M)
    where
        M: FnOnce(String, std::time::Instant) -> PoolEvent,
    {
        self.config
            .event_listeners
            .emit_with(|| make(self.config.name.clone(), std::time::Instant::now()));
    }

    #[cfg(feature = "metrics")]
    fn publish(&self) {
        let (active, idle) = {
            let state = self.state.lock();
            (state.active, state.free.len())
        };
        gauge!("pool_items_active", "pool" => self.config.name.clone()).set(active as f64);
        gauge!("pool_items_idle", "pool" => self.config.name.clone()).set(idle as f64);
    }
}

impl<F: Factory> Drop for PoolInner<F> {
    fn drop(&mut self) {
        self.cancel.cancel();
        let state = self.state.get_mut();
        state.closed = true;
        state.requests.clear();
        for idle in state.free.drain(..) {
            let _ = self.factory.close(idle.item);
        }
    }
}

/// A registered checkout waiting for an item.
///
/// Dropping it unsettled deregisters the request. If an item was delivered
/// in the meantime, the item goes back to the pool.
struct Waiter<'a, F: Factory> {
    pool: &'a PoolInner<F>,
    key: u64,
    rx: oneshot::Receiver<Delivery<F::Item, F::Error>>,
    settled: bool,
}

impl<F: Factory> Waiter<'_, F> {
    /// Deregisters the request, returning whatever was delivered before
    /// the request could be removed.
    ///
    /// Fails with [`TryRecvError::Closed`] when the pool dropped the request
    /// without delivering anything.
    fn cancel(&mut self) -> Result<Option<Delivery<F::Item, F::Error>>, TryRecvError> {
        self.settled = true;
        let mut state = self.pool.state.lock();
        if state.requests.remove(&self.key).is_some() {
            return Ok(None);
        }
        drop(state);
        match self.rx.try_recv() {
            Ok(delivery) => Ok(Some(delivery)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

impl<F: Factory> Drop for Waiter<'_, F> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let rejected = {
            let mut state = self.pool.state.lock();
            if state.requests.remove(&self.key).is_some() {
                return;
            }
            match self.rx.try_recv() {
                Ok(Ok(idle)) => self.pool.put_locked(&mut state, idle.item),
                _ => None,
            }
        };
        if let Some(item) = rejected {
            self.pool.close_item(item);
        }
    }
}

/// An active slot taken for an item being created. Released unless
/// disarmed.
struct Slot<'a, F: Factory> {
    pool: &'a PoolInner<F>,
    armed: bool,
}

impl<F: Factory> Drop for Slot<'_, F> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.pool.state.lock();
            self.pool.release_locked(&mut state);
        }
    }
}

async fn run_opener<F: Factory>(
    pool: Weak<PoolInner<F>>,
    mut signals: mpsc::UnboundedReceiver<()>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            signal = signals.recv() => {
                let (Some(()), Some(inner)) = (signal, pool.upgrade()) else {
                    break;
                };
                tokio::select! {
                    _ = cancel.cancelled() => {
                        inner.abandon_open();
                        break;
                    }
                    _ = inner.open() => {}
                }
            }
        }
    }
}

async fn run_reaper<F: Factory>(
    pool: Weak<PoolInner<F>>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let Some(inner) = pool.upgrade() else {
            break;
        };
        inner.reap();
    }
}
