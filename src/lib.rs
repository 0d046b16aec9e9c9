//! A resolver implementation for the DID:SOV method.
//!
//! DID:SOV identifiers are resolved by reading the identity record (NYM) and the
//! `endpoint` attribute record (ATTRIB) of the DID from an Indy ledger and turning
//! them into a DID Document. Talking to the ledger is delegated to a
//! [`LedgerClient`] implementation; this crate owns the connection setup, the
//! resolution steps and the document mapping.

mod config;
mod connection;
mod did;
mod error;
mod ledger;
mod reply;
mod resolver;
mod types;

pub use config::DriverConfig;
pub use connection::ConnectionManager;
pub use did::SovDid;
pub use error::{ConfigError, ConnectionError, LedgerError, RequestStage, ResolutionError};
pub use ledger::{Identity, LedgerClient, PoolHandle, ReadRequest, StoreHandle};
pub use resolver::{DidSovDriver, Driver};
pub use types::{
    DIDDocument,
    PublicKey,
    ResolutionMetadata,
    ResolutionResult,
    Service,
};

/// Resolves a DID:SOV identifier through `driver`
///
/// # Example
/// ```no_run
/// use sov_resolver::{resolve, DidSovDriver, DriverConfig, LedgerClient};
///
/// async fn run<L: LedgerClient>(ledger: L) -> Result<(), Box<dyn std::error::Error>> {
///     let driver = DidSovDriver::new(DriverConfig::from_env()?, ledger);
///     let result = resolve(&driver, "did:sov:WRfXPg8dantKVubE3HX8pw").await?;
///
///     println!("Resolved DID Document: {:?}", result.map(|r| r.did_document));
///     Ok(())
/// }
/// ```
pub async fn resolve<L: LedgerClient>(
    driver: &DidSovDriver<L>,
    did: &str,
) -> Result<Option<ResolutionResult>, ResolutionError> {
    driver.resolve_with_metadata(did).await
}
