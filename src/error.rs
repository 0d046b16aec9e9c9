//! Error types for DID:SOV resolution operations.
//!
//! Errors are split by the layer that raises them: the ledger client collaborator,
//! configuration loading, connection setup and the resolution pipeline itself. A DID
//! that is not found is never an error; the pipeline reports it as `Ok(None)`.

use std::fmt;
use thiserror::Error;

/// Errors reported by a [`LedgerClient`](crate::LedgerClient) implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The resource (pool config, wallet) already exists
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Any other failure of the ledger client
    #[error("{0}")]
    Failed(String),
}

/// Errors raised while loading the driver configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is unset or empty
    #[error("Missing configuration variable: {0}")]
    MissingVariable(String),
}

/// Errors raised while opening the ledger connection
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// The native ledger runtime could not be loaded
    #[error("Cannot initialize ledger runtime from {path}: {source}")]
    RuntimeInitFailed {
        path: String,
        #[source]
        source: LedgerError,
    },

    /// The pool config could not be created
    #[error("Cannot create pool config {pool}: {source}")]
    PoolConfigFailed {
        pool: String,
        #[source]
        source: LedgerError,
    },

    /// The wallet could not be created
    #[error("Cannot create wallet {wallet}: {source}")]
    StoreCreateFailed {
        wallet: String,
        #[source]
        source: LedgerError,
    },

    /// The pool could not be opened
    #[error("Cannot open pool {pool}: {source}")]
    PoolOpenFailed {
        pool: String,
        #[source]
        source: LedgerError,
    },

    /// The wallet could not be opened
    #[error("Cannot open wallet {wallet}: {source}")]
    StoreOpenFailed {
        wallet: String,
        #[source]
        source: LedgerError,
    },

    /// The submitter DID could not be created
    #[error("Cannot create submitter DID: {0}")]
    SubmitterCreateFailed(#[source] LedgerError),
}

/// The ledger read a resolution was performing when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStage {
    /// GET_NYM
    Nym,
    /// GET_ATTRIB
    Attrib,
}

impl fmt::Display for RequestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestStage::Nym => f.write_str("NYM"),
            RequestStage::Attrib => f.write_str("ATTRIB"),
        }
    }
}

/// Errors that can occur during DID:SOV resolution operations
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// The ledger connection could not be established
    #[error("Connection failed: {0}")]
    ConnectionFailed(#[from] ConnectionError),

    /// Building or submitting a ledger read failed
    #[error("Cannot send GET_{stage} request: {source}")]
    LedgerRequestFailed {
        stage: RequestStage,
        #[source]
        source: LedgerError,
    },

    /// The ledger reply was not valid JSON in the expected shape
    #[error("Invalid GET_{stage} reply: {message}")]
    InvalidLedgerReply {
        stage: RequestStage,
        message: String,
    },
}
