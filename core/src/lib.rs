pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod remote;
pub mod session;
pub mod store;

pub use engine::{SyncEngine, SyncObserver, SyncOp, SyncOptions, TracingObserver};
pub use error::{RemoteError, SyncError, SyncResult};
pub use remote::{Document, EmbeddedRemote, RemoteStore};
pub use session::{IdentityRef, SessionContext, SignedOut, StaticSession};
pub use store::LocalStore;
