//! The sync engine: one stable API over the on-device store and the remote
//! document store.
//!
//! Reads prefer the remote copy when a session is authenticated and fall back
//! to the local cache on any remote failure. Writes always land in the local
//! store first; the remote merge-write is best effort and its failures are
//! only reported to the [`SyncObserver`].
//!
//! Two devices editing the same profile or the same day while both online
//! overwrite each other at document level: the last write to reach the
//! remote store wins, and no per-field reconciliation is attempted.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{Local, NaiveDate};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{RemoteError, SyncError, SyncResult};
use crate::models::{
    DailyProgress, MealLogEntry, Profile, profile_from_slice, profile_from_value,
    progress_from_slice, progress_from_value, validate_profile, validate_progress,
};
use crate::remote::{Document, RemoteStore, USERS_COLLECTION, progress_collection, to_document};
use crate::session::{IdentityRef, SessionContext};
use crate::store::{DEVICE_SCOPE, LocalStore, profile_key, progress_key, progress_prefix};

const DATE_FIELD: &str = "date";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOp {
    LoadProfile,
    SaveProfile,
    LoadProgress,
    SaveProgress,
    ProgressHistory,
}

impl fmt::Display for SyncOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LoadProfile => "load_profile",
            Self::SaveProfile => "save_profile",
            Self::LoadProgress => "load_progress",
            Self::SaveProgress => "save_progress",
            Self::ProgressHistory => "progress_history",
        };
        f.write_str(name)
    }
}

/// Hook for recording remote failures that the engine swallows.
pub trait SyncObserver: Send + Sync {
    fn remote_failure(&self, op: SyncOp, error: &RemoteError);
}

/// Default observer: a `warn!` line per failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SyncObserver for TracingObserver {
    fn remote_failure(&self, op: SyncOp, error: &RemoteError) {
        warn!(%op, %error, "remote sync failed, continuing with local data");
    }
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Upper bound for every remote call.
    pub remote_timeout: Duration,
    /// Run remote writes in the background instead of awaiting them. They
    /// still reach the remote one at a time, in save order. Writes still
    /// queued when the runtime shuts down are lost; call [`SyncEngine::flush`] first.
    pub detach_remote_writes: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            remote_timeout: Duration::from_secs(10),
            detach_remote_writes: false,
        }
    }
}

fn invalid(err: &anyhow::Error) -> SyncError {
    SyncError::Validation(format!("{err:#}"))
}

fn encode<T: serde::Serialize>(value: &T) -> SyncResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| SyncError::Validation(e.to_string()))
}

fn malformed(err: &anyhow::Error) -> RemoteError {
    RemoteError::Malformed(format!("{err:#}"))
}

/// Identities become one key and path segment, and must not collide with
/// the signed-out slot.
fn validate_identity(identity: &str) -> SyncResult<()> {
    if identity.trim().is_empty() || identity == DEVICE_SCOPE || identity.contains('/') {
        return Err(SyncError::validation(format!(
            "Invalid session identity '{identity}'"
        )));
    }
    Ok(())
}

/// Who the current operation runs as.
struct Scope {
    /// Local key scope: the identity, or the shared device slot.
    local: IdentityRef,
    /// Set only when remote calls are allowed.
    remote: Option<IdentityRef>,
}

pub struct SyncEngine {
    local: Box<dyn LocalStore>,
    remote: Arc<dyn RemoteStore>,
    session: Arc<dyn SessionContext>,
    observer: Arc<dyn SyncObserver>,
    options: SyncOptions,
    /// Tail of the detached write chain.
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl SyncEngine {
    pub fn new(
        local: Box<dyn LocalStore>,
        remote: Arc<dyn RemoteStore>,
        session: Arc<dyn SessionContext>,
    ) -> Self {
        Self {
            local,
            remote,
            session,
            observer: Arc::new(TracingObserver),
            options: SyncOptions::default(),
            pending: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn local(&self) -> &dyn LocalStore {
        self.local.as_ref()
    }

    /// Read the session once per operation; it may change between calls.
    fn scope(&self) -> SyncResult<Scope> {
        let identity = self.session.current_identity();
        if let Some(id) = identity.as_deref() {
            validate_identity(id)?;
        }
        let remote = if self.session.is_authenticated() {
            identity.clone()
        } else {
            None
        };
        Ok(Scope {
            local: identity.unwrap_or_else(|| DEVICE_SCOPE.to_string()),
            remote,
        })
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, RemoteError>>,
    ) -> Result<T, RemoteError> {
        tokio::time::timeout(self.options.remote_timeout, call)
            .await
            .unwrap_or(Err(RemoteError::Timeout))
    }

    fn write_local(&self, key: &str, bytes: &[u8]) -> SyncResult<()> {
        self.local.set(key, bytes).map_err(|e| SyncError::local(&e))
    }

    fn read_local(&self, key: &str) -> SyncResult<Option<Vec<u8>>> {
        self.local.get(key).map_err(|e| SyncError::local(&e))
    }

    async fn push_remote(
        &self,
        op: SyncOp,
        collection: String,
        doc_id: String,
        doc: Result<Document, RemoteError>,
    ) {
        let doc = match doc {
            Ok(doc) => doc,
            Err(e) => {
                self.observer.remote_failure(op, &e);
                return;
            }
        };

        let remote = Arc::clone(&self.remote);
        let observer = Arc::clone(&self.observer);
        let timeout = self.options.remote_timeout;
        let write = async move {
            let result = tokio::time::timeout(timeout, remote.merge_write(&collection, &doc_id, doc))
                .await
                .unwrap_or(Err(RemoteError::Timeout));
            match result {
                Ok(()) => debug!(%op, %collection, %doc_id, "remote write acknowledged"),
                Err(e) => observer.remote_failure(op, &e),
            }
        };

        if !self.options.detach_remote_writes {
            write.await;
            return;
        }

        // Each write waits for the one before it, so saves land in order.
        let mut tail = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = tail.take();
        *tail = Some(tokio::spawn(async move {
            if let Some(previous) = previous {
                if let Err(e) = previous.await {
                    warn!("detached remote write did not complete: {e}");
                }
            }
            write.await;
        }));
        drop(tail);
    }

    /// Wait for detached remote writes to finish.
    pub async fn flush(&self) {
        let tail = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tail) = tail {
            if let Err(e) = tail.await {
                warn!("detached remote write did not complete: {e}");
            }
        }
    }

    // --- Profile ---

    async fn fetch_remote_profile(&self, uid: &str) -> Result<Option<Profile>, RemoteError> {
        let Some(doc) = self
            .bounded(self.remote.get_document(USERS_COLLECTION, uid))
            .await?
        else {
            return Ok(None);
        };
        profile_from_value(Value::Object(doc))
            .map(Some)
            .map_err(|e| malformed(&e))
    }

    /// Remote copy when reachable, else the local cache, else the
    /// "needs onboarding" sentinel.
    pub async fn load_profile(&self) -> SyncResult<Profile> {
        let scope = self.scope()?;
        let key = profile_key(&scope.local);

        if let Some(uid) = scope.remote.as_deref() {
            match self.fetch_remote_profile(uid).await {
                Ok(Some(profile)) => {
                    let bytes = encode(&profile)?;
                    self.write_local(&key, &bytes)?;
                    return Ok(profile);
                }
                Ok(None) => debug!(%uid, "no remote profile, using local cache"),
                Err(e) => self.observer.remote_failure(SyncOp::LoadProfile, &e),
            }
        }

        match self.read_local(&key)? {
            Some(bytes) => profile_from_slice(&bytes).map_err(|e| invalid(&e)),
            None => Ok(Profile::needs_onboarding()),
        }
    }

    /// Durable once the local write returns; the remote copy is best effort.
    pub async fn save_profile(&self, profile: &Profile) -> SyncResult<()> {
        validate_profile(profile).map_err(|e| invalid(&e))?;
        let scope = self.scope()?;
        if scope.local != DEVICE_SCOPE && profile.id != scope.local {
            return Err(SyncError::validation(format!(
                "Profile '{}' does not belong to signed-in identity '{}'",
                profile.id, scope.local
            )));
        }

        let bytes = encode(profile)?;
        self.write_local(&profile_key(&scope.local), &bytes)?;

        if let Some(uid) = scope.remote {
            self.push_remote(
                SyncOp::SaveProfile,
                USERS_COLLECTION.to_string(),
                uid,
                to_document(profile),
            )
            .await;
        }
        Ok(())
    }

    /// Load, edit and save the profile in one step.
    pub async fn update_profile(
        &self,
        edit: impl FnOnce(&mut Profile) -> anyhow::Result<()>,
    ) -> SyncResult<Profile> {
        let mut profile = self.load_profile().await?;
        if profile.is_onboarding_placeholder() {
            return Err(SyncError::validation(
                "No profile yet; complete onboarding first",
            ));
        }
        edit(&mut profile).map_err(|e| invalid(&e))?;
        self.save_profile(&profile).await?;
        Ok(profile)
    }

    // --- Daily progress ---

    async fn fetch_remote_progress(
        &self,
        uid: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyProgress>, RemoteError> {
        let key = date.format("%Y-%m-%d").to_string();
        let docs = self
            .bounded(self.remote.query_by_field(
                &progress_collection(uid),
                DATE_FIELD,
                json!(key),
                1,
            ))
            .await?;
        let Some(doc) = docs.into_iter().next() else {
            return Ok(None);
        };
        let progress = progress_from_value(Value::Object(doc)).map_err(|e| malformed(&e))?;
        if progress.date != date {
            return Err(RemoteError::Malformed(format!(
                "queried {date} but received {}",
                progress.date
            )));
        }
        Ok(Some(progress))
    }

    /// Remote record for `date` when reachable, else the local cache, else
    /// an empty record for that day.
    pub async fn load_progress(&self, date: NaiveDate) -> SyncResult<DailyProgress> {
        let scope = self.scope()?;
        let key = progress_key(&scope.local, date);

        if let Some(uid) = scope.remote.as_deref() {
            match self.fetch_remote_progress(uid, date).await {
                Ok(Some(progress)) => {
                    let bytes = encode(&progress)?;
                    self.write_local(&key, &bytes)?;
                    return Ok(progress);
                }
                Ok(None) => debug!(%uid, %date, "no remote progress, using local cache"),
                Err(e) => self.observer.remote_failure(SyncOp::LoadProgress, &e),
            }
        }

        let Some(bytes) = self.read_local(&key)? else {
            return Ok(DailyProgress::empty(date));
        };
        let progress = progress_from_slice(&bytes).map_err(|e| invalid(&e))?;
        if progress.date != date {
            return Err(SyncError::validation(format!(
                "Stored progress under {date} is dated {}",
                progress.date
            )));
        }
        Ok(progress)
    }

    pub async fn load_today(&self) -> SyncResult<DailyProgress> {
        self.load_progress(Local::now().date_naive()).await
    }

    pub async fn save_progress(&self, date: NaiveDate, progress: &DailyProgress) -> SyncResult<()> {
        if progress.date != date {
            return Err(SyncError::validation(format!(
                "Progress is dated {} but was saved under {date}",
                progress.date
            )));
        }
        validate_progress(progress).map_err(|e| invalid(&e))?;
        let scope = self.scope()?;

        let bytes = encode(progress)?;
        self.write_local(&progress_key(&scope.local, date), &bytes)?;

        if let Some(uid) = scope.remote {
            self.push_remote(
                SyncOp::SaveProgress,
                progress_collection(&uid),
                date.format("%Y-%m-%d").to_string(),
                to_document(progress),
            )
            .await;
        }
        Ok(())
    }

    /// Load, mutate and save one day's record.
    pub async fn update_progress(
        &self,
        date: NaiveDate,
        mutate: impl FnOnce(&mut DailyProgress) -> anyhow::Result<()>,
    ) -> SyncResult<DailyProgress> {
        let mut progress = self.load_progress(date).await?;
        mutate(&mut progress).map_err(|e| invalid(&e))?;
        self.save_progress(date, &progress).await?;
        Ok(progress)
    }

    pub async fn log_meal(&self, date: NaiveDate, entry: MealLogEntry) -> SyncResult<DailyProgress> {
        self.update_progress(date, |p| p.log_meal(entry)).await
    }

    pub async fn add_water(&self, date: NaiveDate, ml: f64) -> SyncResult<DailyProgress> {
        self.update_progress(date, |p| p.add_water(ml)).await
    }

    pub async fn record_activity(
        &self,
        date: NaiveDate,
        steps: u64,
        calories_burned: f64,
    ) -> SyncResult<DailyProgress> {
        self.update_progress(date, |p| p.record_activity(steps, calories_burned))
            .await
    }

    /// The most recent `days` records, newest first.
    pub async fn progress_history(&self, days: usize) -> SyncResult<Vec<DailyProgress>> {
        if days == 0 {
            return Ok(Vec::new());
        }
        let scope = self.scope()?;

        if let Some(uid) = scope.remote.as_deref() {
            let fetched = self
                .bounded(
                    self.remote
                        .query_recent(&progress_collection(uid), DATE_FIELD, days),
                )
                .await
                .and_then(|docs| {
                    docs.into_iter()
                        .map(|doc| progress_from_value(Value::Object(doc)).map_err(|e| malformed(&e)))
                        .collect::<Result<Vec<_>, _>>()
                });
            match fetched {
                Ok(history) => return Ok(history),
                Err(e) => self.observer.remote_failure(SyncOp::ProgressHistory, &e),
            }
        }

        let mut rows = self
            .local
            .scan_prefix(&progress_prefix(&scope.local))
            .map_err(|e| SyncError::local(&e))?;
        // Keys end in ISO dates, so key order is date order.
        rows.reverse();
        rows.into_iter()
            .take(days)
            .map(|(_, bytes)| progress_from_slice(&bytes).map_err(|e| invalid(&e)))
            .collect()
    }
}
