//! Connection manager - r2d2 pool behind a refreshing credential
//!
//! The manager owns the pool, the credential the pool was built with, and
//! the credential's age. Every acquisition first checks the credential: a
//! missing or stale one drops the pool, fetches a fresh credential and
//! builds a replacement pool before a connection is handed out.
//!
//! A dropped pool lives on only until its last checked-out connection comes
//! back; those connections are closed with it and never reach the new pool.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use crate::{Error, Result};
use super::credential::{Credential, CredentialSource, DEFAULT_MAX_AGE};
use super::schema::Namespace;

type SqlitePool = r2d2::Pool<SqliteConnectionManager>;

/// How long one wait on the pool lasts before the credential is checked again
const WAIT_SLICE: Duration = Duration::from_millis(50);

/// Where the store lives and how many connections may be open at once.
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    /// Directory holding the main database and the namespace files
    pub data_dir: PathBuf,
    /// Main database name (file `<data_dir>/<database>.db`)
    pub database: String,
    /// Application identifier, first half of the namespace
    pub app_name: String,
    /// User identifier, second half of the namespace
    pub user: String,
    /// Connections opened eagerly when a pool is built
    pub pool_min: usize,
    /// Upper bound on open connections
    pub pool_max: usize,
    /// Age at which the credential (and its pool) is replaced
    pub max_credential_age: Duration,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".graph-editor"),
            database: "graph".to_string(),
            app_name: "graph_editor".to_string(),
            user: String::new(),
            pool_min: 2,
            pool_max: 10,
            max_credential_age: DEFAULT_MAX_AGE,
        }
    }
}

impl ConnectionParams {
    /// Local parameters rooted at `data_dir`
    pub fn local(data_dir: impl Into<PathBuf>, user: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            user: user.into(),
            ..Self::default()
        }
    }

    pub fn namespace(&self) -> Result<Namespace> {
        Namespace::derive(&self.app_name, &self.user)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.db", self.database))
    }

    fn validate(&self) -> Result<()> {
        if self.pool_max == 0 || self.pool_max > u32::MAX as usize {
            return Err(Error::Pool(format!("pool_max must be between 1 and {}", u32::MAX)));
        }
        if self.pool_min > self.pool_max {
            return Err(Error::Pool(format!(
                "pool_min ({}) exceeds pool_max ({})",
                self.pool_min, self.pool_max
            )));
        }
        Ok(())
    }
}

/// Knows where the main database and the namespace file live.
///
/// Every connection it produces has the namespace attached.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    main_path: PathBuf,
    namespace_path: PathBuf,
    namespace: Namespace,
}

impl SqliteConnector {
    /// Creates the data directory if needed; fails if that is not permitted
    pub fn new(params: &ConnectionParams) -> Result<Self> {
        let namespace = params.namespace()?;
        ensure_dir(&params.data_dir)?;
        Ok(Self {
            main_path: params.database_path(),
            namespace_path: params.data_dir.join(namespace.file_name()),
            namespace,
        })
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// r2d2 manager opening the main file and attaching the namespace
    fn manager(&self) -> SqliteConnectionManager {
        let attach = format!("ATTACH DATABASE ?1 AS {}", self.namespace.quoted());
        let namespace_path = self.namespace_path.to_string_lossy().into_owned();
        SqliteConnectionManager::file(&self.main_path).with_init(move |conn| {
            conn.execute(&attach, [namespace_path.as_str()])?;
            Ok(())
        })
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.as_os_str().is_empty() && !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// A connection checked out of the current pool; goes back on drop.
pub struct PooledConnection {
    conn: r2d2::PooledConnection<SqliteConnectionManager>,
    generation: u64,
}

impl PooledConnection {
    /// Generation of the pool this connection came from
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

/// Snapshot of the manager for logs and the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PoolStatus {
    pub generation: u64,
    pub open: usize,
    pub idle: usize,
    pub max: usize,
}

/// Last connection failure seen by one pool.
///
/// r2d2 opens connections on its own threads and only reports a timeout to
/// the caller, so failures are captured here for the waiting `acquire`.
#[derive(Debug, Default, Clone)]
struct FailureSlot(Arc<Mutex<Option<String>>>);

impl FailureSlot {
    fn take(&self) -> Option<String> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl r2d2::HandleError<rusqlite::Error> for FailureSlot {
    fn handle_error(&self, error: rusqlite::Error) {
        tracing::error!(error = %error, "failed to open store connection");
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(error.to_string());
        }
    }
}

/// The pool built for one credential
struct Generation {
    number: u64,
    credential: Credential,
    pool: SqlitePool,
    failures: FailureSlot,
}

#[derive(Default)]
struct ManagerState {
    current: Option<Generation>,
    generation: u64,
    shut_down: bool,
}

/// Owns the pool and its credential; constructed once, shut down once.
pub struct ConnectionManager {
    connector: SqliteConnector,
    credentials: Box<dyn CredentialSource>,
    pool_min: usize,
    pool_max: usize,
    max_credential_age: Duration,
    state: Mutex<ManagerState>,
}

impl ConnectionManager {
    pub fn new(
        connector: SqliteConnector,
        credentials: Box<dyn CredentialSource>,
        params: &ConnectionParams,
    ) -> Result<Self> {
        params.validate()?;
        tracing::debug!(source = %credentials.describe(), min = params.pool_min, max = params.pool_max, "connection manager created");
        Ok(Self {
            connector,
            credentials,
            pool_min: params.pool_min,
            pool_max: params.pool_max,
            max_credential_age: params.max_credential_age,
            state: Mutex::new(ManagerState::default()),
        })
    }

    /// Get a working connection, rebuilding the pool first if the credential is stale.
    ///
    /// Blocks while every connection is checked out. A caller waiting on a
    /// pool that gets replaced moves over to the replacement. Fails once the
    /// pool reports that it could not open a connection.
    pub fn acquire(&self) -> Result<PooledConnection> {
        loop {
            let (generation, pool, failures) = self.current_pool()?;
            match pool.get_timeout(WAIT_SLICE) {
                Ok(conn) => {
                    if self.is_current(generation)? {
                        failures.take();
                        return Ok(PooledConnection { conn, generation });
                    }
                    tracing::debug!(generation, "pool replaced while waiting, moving to its replacement");
                }
                Err(e) => {
                    if let Some(cause) = failures.take() {
                        if self.is_current(generation)? {
                            let message = e.to_string();
                            if message.contains(&cause) {
                                return Err(Error::Pool(message));
                            }
                            return Err(Error::Pool(format!("{}: {}", message, cause)));
                        }
                    }
                }
            }
        }
    }

    fn current_pool(&self) -> Result<(u64, SqlitePool, FailureSlot)> {
        let mut state = self.lock_state()?;
        if state.shut_down {
            return Err(Error::Pool("connection manager has been shut down".to_string()));
        }

        if let Some(current) = &state.current {
            if !current.credential.is_stale(self.max_credential_age) {
                return Ok((current.number, current.pool.clone(), current.failures.clone()));
            }
        }

        if let Some(old) = state.current.take() {
            tracing::info!(generation = old.number, "credential expired, tearing down connection pool");
        }

        tracing::info!(source = %self.credentials.describe(), "refreshing store credential");
        let credential = self.credentials.fetch()?;

        let number = state.generation + 1;
        let failures = FailureSlot::default();
        let pool = r2d2::Pool::builder()
            .max_size(self.pool_max as u32)
            .min_idle(Some(self.pool_min as u32))
            .error_handler(Box::new(failures.clone()))
            .build(self.connector.manager())
            .map_err(|e| Error::Pool(e.to_string()))?;
        tracing::info!(generation = number, min = self.pool_min, max = self.pool_max, "connection pool built");

        state.generation = number;
        state.current = Some(Generation {
            number,
            credential,
            pool: pool.clone(),
            failures: failures.clone(),
        });
        Ok((number, pool, failures))
    }

    fn is_current(&self, generation: u64) -> Result<bool> {
        let state = self.lock_state()?;
        Ok(state.current.as_ref().is_some_and(|g| g.number == generation))
    }

    /// Drop the pool; later acquisitions fail
    pub fn shutdown(&self) {
        if let Ok(mut state) = self.lock_state() {
            state.current = None;
            state.shut_down = true;
            tracing::info!("connection manager shut down");
        }
    }

    pub fn status(&self) -> Result<PoolStatus> {
        let state = self.lock_state()?;
        Ok(match &state.current {
            Some(current) => {
                let pool_state = current.pool.state();
                PoolStatus {
                    generation: current.number,
                    open: pool_state.connections as usize,
                    idle: pool_state.idle_connections as usize,
                    max: current.pool.max_size() as usize,
                }
            }
            None => PoolStatus {
                generation: state.generation,
                open: 0,
                idle: 0,
                max: self.pool_max,
            },
        })
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, ManagerState>> {
        self.state
            .lock()
            .map_err(|_| Error::Pool("connection manager lock poisoned".to_string()))
    }
}
