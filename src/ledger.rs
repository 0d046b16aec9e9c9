//! Ledger client interface.
//!
//! The resolver does not talk to ledger nodes itself. Pool networking, request
//! signing and wallet storage are provided by an external ledger client (an Indy
//! SDK binding, for instance) behind the [`LedgerClient`] trait.

use crate::error::LedgerError;
use async_trait::async_trait;
use std::path::Path;

/// Opaque handle to an opened pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolHandle(pub i32);

/// Opaque handle to an opened wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreHandle(pub i32);

/// A local identity created inside a wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub did: String,
    pub verkey: String,
}

/// Read requests issued during resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadRequest {
    /// GET_NYM for the target DID
    Nym { target_did: String },
    /// GET_ATTRIB for a raw attribute of the target DID
    Attrib { target_did: String, raw: String },
}

/// Trait defining the ledger client operations used by the resolver.
///
/// Implementations must be safe to share between concurrent resolutions once the
/// pool and wallet are open.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Whether the native runtime is already loaded
    fn runtime_initialized(&self) -> bool;

    /// Load the native runtime from `library_path`
    fn init_runtime(&self, library_path: &Path) -> Result<(), LedgerError>;

    /// Register a pool config named `pool_name` from a genesis transaction file.
    ///
    /// # Returns
    /// * `Err(LedgerError::AlreadyExists)` - A config with that name is registered.
    async fn create_pool_config(&self, pool_name: &str, genesis_txn: &Path) -> Result<(), LedgerError>;

    /// Open a registered pool
    async fn open_pool(&self, pool_name: &str) -> Result<PoolHandle, LedgerError>;

    /// Create a wallet bound to a pool.
    ///
    /// # Returns
    /// * `Err(LedgerError::AlreadyExists)` - A wallet with that name exists.
    async fn create_store(&self, pool_name: &str, store_name: &str) -> Result<(), LedgerError>;

    /// Open an existing wallet
    async fn open_store(&self, store_name: &str) -> Result<StoreHandle, LedgerError>;

    /// Create and store a local DID, derived from `seed` when one is given
    async fn create_identity(&self, store: StoreHandle, seed: Option<String>) -> Result<Identity, LedgerError>;

    /// Build the JSON text of a read request
    async fn build_request(&self, submitter_did: &str, request: &ReadRequest) -> Result<String, LedgerError>;

    /// Sign a request with the submitter's key and submit it to the pool.
    ///
    /// # Returns
    /// * `Ok(String)` - The raw JSON reply.
    async fn sign_and_submit(
        &self,
        pool: PoolHandle,
        store: StoreHandle,
        submitter_did: &str,
        request: &str,
    ) -> Result<String, LedgerError>;
}
