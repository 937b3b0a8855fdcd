//! Connection pool manager
//!
//! [`ConnectionPool`] owns the single long-lived sqlx pool a process uses to
//! reach its datastore and keeps the counters behind [`PoolStats`].
//!
//! # Limits
//!
//! - max open connections: [`DEFAULT_MAX_CONNECTIONS`]
//! - max idle connections: [`DEFAULT_MAX_CONNECTIONS`]
//! - connection lifetime: unlimited unless configured
//! - acquire timeout: [`DEFAULT_ACQUIRE_TIMEOUT`] unless configured
//!
//! Lifetime and idle limits are enforced from the pool's `before_acquire` and
//! `after_release` hooks rather than by sqlx's background reaper, so every
//! connection the pool closes for either reason is counted.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};
use sqlx::pool::{PoolConnection, PoolOptions};
use sqlx::{Connection, Database, Pool};
use tracing::{debug, info};

use crate::error::StorageError;

/// Upper bound for both open and idle connections
pub const DEFAULT_MAX_CONNECTIONS: u32 = 20;

/// How long a caller may wait for a connection when the pool is saturated
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Pool sizing, fixed when the pool is created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    /// Maximum number of open connections
    pub max_open: u32,
    /// Maximum number of idle connections kept for reuse
    pub max_idle: u32,
    /// Connections kept open even when idle
    pub min_connections: u32,
    /// Close connections older than this
    pub max_lifetime: Option<Duration>,
    /// Give up waiting for a connection after this long
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_open: DEFAULT_MAX_CONNECTIONS,
            max_idle: DEFAULT_MAX_CONNECTIONS,
            min_connections: 0,
            max_lifetime: None,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }
}

impl PoolSettings {
    #[must_use]
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    fn is_expired(&self, age: Duration) -> bool {
        self.max_lifetime.is_some_and(|limit| age >= limit)
    }
}

/// Point-in-time pool telemetry
///
/// Serializes with the field names existing `/dbstats` consumers expect;
/// `WaitDuration` is reported in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PoolStats {
    pub max_open_connections: u32,
    pub open_connections: u32,
    pub in_use: u32,
    pub idle: u32,
    pub wait_count: u64,
    #[serde(serialize_with = "serialize_nanos")]
    pub wait_duration: Duration,
    pub max_idle_closed: u64,
    pub max_lifetime_closed: u64,
}

fn serialize_nanos<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
}

/// Counters shared between the pool hooks and [`ConnectionPool`]
#[derive(Debug, Default)]
struct PoolCounters {
    wait_count: AtomicU64,
    wait_nanos: AtomicU64,
    max_idle_closed: AtomicU64,
    max_lifetime_closed: AtomicU64,
    // Tracked from the hooks only to decide when the idle limit is hit.
    // Connections sqlx closes on its own are not seen here, so these drift
    // low; reported open/idle figures come from the pool itself.
    open: AtomicU32,
    checked_out: AtomicU32,
}

impl PoolCounters {
    fn record_wait(&self, waited: Duration) {
        self.wait_count.fetch_add(1, Ordering::Relaxed);
        let nanos = u64::try_from(waited.as_nanos()).unwrap_or(u64::MAX);
        self.wait_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    fn on_connect(&self) {
        self.open.fetch_add(1, Ordering::Relaxed);
        self.checked_out.fetch_add(1, Ordering::Relaxed);
    }

    /// Decide whether an idle connection may be handed out
    fn on_acquire(&self, settings: &PoolSettings, age: Duration) -> bool {
        if settings.is_expired(age) {
            self.close_for_lifetime();
            return false;
        }
        self.checked_out.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Decide whether a released connection goes back to the idle set
    fn on_release(&self, settings: &PoolSettings, age: Duration) -> bool {
        saturating_decrement(&self.checked_out);

        if settings.is_expired(age) {
            self.close_for_lifetime();
            return false;
        }

        let open = self.open.load(Ordering::Relaxed);
        let idle = open.saturating_sub(self.checked_out.load(Ordering::Relaxed));
        // The released connection itself is counted in `idle` already.
        if idle > settings.max_idle {
            self.max_idle_closed.fetch_add(1, Ordering::Relaxed);
            saturating_decrement(&self.open);
            return false;
        }
        true
    }

    fn close_for_lifetime(&self) {
        self.max_lifetime_closed.fetch_add(1, Ordering::Relaxed);
        saturating_decrement(&self.open);
    }
}

fn saturating_decrement(counter: &AtomicU32) {
    let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
        Some(n.saturating_sub(1))
    });
}

/// The process-lifetime connection pool for one datastore
#[derive(Debug)]
pub struct ConnectionPool<DB: Database> {
    pool: Pool<DB>,
    settings: Arc<PoolSettings>,
    counters: Arc<PoolCounters>,
}

impl<DB: Database> ConnectionPool<DB> {
    /// Open the pool
    ///
    /// sqlx opens the first connection eagerly, so an unreachable datastore
    /// fails here.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if no connection can be established.
    pub async fn connect_with(
        options: <DB::Connection as Connection>::Options,
        settings: PoolSettings,
    ) -> Result<Self, StorageError> {
        let settings = Arc::new(settings);
        let counters = Arc::new(PoolCounters::default());

        let connect_counters = Arc::clone(&counters);
        let acquire_counters = Arc::clone(&counters);
        let acquire_settings = Arc::clone(&settings);
        let release_counters = Arc::clone(&counters);
        let release_settings = Arc::clone(&settings);

        let pool = PoolOptions::<DB>::new()
            .max_connections(settings.max_open)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.acquire_timeout)
            .max_lifetime(None)
            .idle_timeout(None)
            .test_before_acquire(false)
            .after_connect(move |_conn, _meta| {
                connect_counters.on_connect();
                Box::pin(std::future::ready(Ok(())))
            })
            .before_acquire(move |_conn, meta| {
                let keep = acquire_counters.on_acquire(&acquire_settings, meta.age);
                Box::pin(std::future::ready(Ok(keep)))
            })
            .after_release(move |_conn, meta| {
                let keep = release_counters.on_release(&release_settings, meta.age);
                Box::pin(std::future::ready(Ok(keep)))
            })
            .connect_with(options)
            .await
            .map_err(|e| StorageError::connection("failed to create connection pool", e))?;

        debug!(
            max_open = settings.max_open,
            max_idle = settings.max_idle,
            acquire_timeout_ms = settings.acquire_timeout.as_millis() as u64,
            "Connection pool created"
        );

        Ok(Self {
            pool,
            settings,
            counters,
        })
    }

    /// Check out a connection, suspending while the pool is saturated
    ///
    /// The connection returns to the pool when dropped. Time spent waiting on
    /// a saturated pool is added to the wait counters.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` on acquire timeout or a closed pool.
    pub async fn acquire(&self) -> Result<PoolConnection<DB>, StorageError> {
        let saturated =
            self.pool.num_idle() == 0 && self.pool.size() >= self.settings.max_open;
        let started = Instant::now();

        let conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| StorageError::connection("failed to acquire connection", e))?;

        if saturated {
            let waited = started.elapsed();
            self.counters.record_wait(waited);
            debug!(waited_us = waited.as_micros() as u64, "Waited for pooled connection");
        }

        Ok(conn)
    }

    /// Liveness probe
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the datastore does not answer.
    pub async fn ping(&self) -> Result<(), StorageError> {
        let mut conn = self.acquire().await?;
        conn.ping()
            .await
            .map_err(|e| StorageError::connection("ping: datastore unreachable", e))
    }

    pub fn stats(&self) -> PoolStats {
        let open = self.pool.size();
        let idle = u32::try_from(self.pool.num_idle()).unwrap_or(u32::MAX);
        PoolStats {
            max_open_connections: self.settings.max_open,
            open_connections: open,
            in_use: open.saturating_sub(idle),
            idle,
            wait_count: self.counters.wait_count.load(Ordering::Relaxed),
            wait_duration: Duration::from_nanos(self.counters.wait_nanos.load(Ordering::Relaxed)),
            max_idle_closed: self.counters.max_idle_closed.load(Ordering::Relaxed),
            max_lifetime_closed: self.counters.max_lifetime_closed.load(Ordering::Relaxed),
        }
    }

    /// Emit the current telemetry at info level
    pub fn log_stats(&self, context: &str) {
        let stats = self.stats();
        info!(
            context,
            max_open_connections = stats.max_open_connections,
            open_connections = stats.open_connections,
            in_use = stats.in_use,
            idle = stats.idle,
            wait_count = stats.wait_count,
            wait_duration_ns = stats.wait_duration.as_nanos() as u64,
            max_idle_closed = stats.max_idle_closed,
            max_lifetime_closed = stats.max_lifetime_closed,
            "Connection pool stats"
        );
    }

    /// Close every connection; later acquires fail
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}
