//! Core DID resolution functionality.
//!
//! This module provides the main resolution logic for DID:SOV identifiers: the
//! GET_NYM and GET_ATTRIB reads against the ledger and the assembly of the DID
//! Document from their replies.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::config::DriverConfig;
use crate::connection::{ConnectionManager, ConnectionState};
use crate::did::SovDid;
use crate::error::{RequestStage, ResolutionError};
use crate::ledger::{LedgerClient, ReadRequest};
use crate::reply::{build_document, reply_data, ENDPOINT_ATTRIBUTE};
use crate::types::{DIDDocument, ResolutionMetadata, ResolutionResult};

/// A method-specific resolver driver, as called by a generic DID resolver.
///
/// `Ok(None)` means the driver has nothing to say about the identifier: either
/// the method is not handled or the DID does not exist.
#[async_trait]
pub trait Driver: Send + Sync {
    async fn resolve(&self, identifier: &str) -> Result<Option<DIDDocument>, ResolutionError>;
}

/// Resolver for DID:SOV identifiers
pub struct DidSovDriver<L: LedgerClient> {
    ledger: Arc<L>,
    connection: ConnectionManager<L>,
}

impl<L: LedgerClient> DidSovDriver<L> {
    /// Creates a new driver. Nothing is opened until the first resolution.
    pub fn new(config: DriverConfig, ledger: L) -> Self {
        let ledger = Arc::new(ledger);
        Self {
            connection: ConnectionManager::new(config, Arc::clone(&ledger)),
            ledger,
        }
    }

    pub fn config(&self) -> &DriverConfig {
        self.connection.config()
    }

    /// The lazily opened ledger connection
    pub fn connection(&self) -> &ConnectionManager<L> {
        &self.connection
    }

    /// Resolves a DID:SOV identifier
    ///
    /// # Example
    /// ```no_run
    /// use sov_resolver::{DidSovDriver, DriverConfig, LedgerClient};
    ///
    /// async fn print_document<L: LedgerClient>(ledger: L) -> Result<(), Box<dyn std::error::Error>> {
    ///     let driver = DidSovDriver::new(DriverConfig::new("live", "live.txn"), ledger);
    ///     if let Some(document) = driver.resolve("did:sov:WRfXPg8dantKVubE3HX8pw").await? {
    ///         println!("{}", document.to_json()?);
    ///     }
    ///     Ok(())
    /// }
    /// ```
    pub async fn resolve(&self, identifier: &str) -> Result<Option<DIDDocument>, ResolutionError> {
        // Parse the DID
        let did = match SovDid::parse(identifier) {
            Some(did) => did,
            None => return Ok(None),
        };

        // Open pool and wallet
        let state = self.connection.ready_state().await?;

        // GET_NYM
        let nym_request = ReadRequest::Nym {
            target_did: did.target_id.clone(),
        };
        let nym_reply = self.submit(&state, RequestStage::Nym, &nym_request).await?;
        debug!("GET_NYM for {}: {}", did.target_id, nym_reply);

        let nym = match reply_data(RequestStage::Nym, &nym_reply)? {
            Some(nym) => nym,
            None => return Ok(None),
        };

        // GET_ATTRIB
        let attrib_request = ReadRequest::Attrib {
            target_did: did.target_id.clone(),
            raw: ENDPOINT_ATTRIBUTE.to_string(),
        };
        let attrib_reply = self.submit(&state, RequestStage::Attrib, &attrib_request).await?;
        debug!("GET_ATTRIB for {}: {}", did.target_id, attrib_reply);

        let attrib = reply_data(RequestStage::Attrib, &attrib_reply)?;

        Ok(Some(build_document(identifier, &nym, attrib.as_ref())?))
    }

    /// Resolves a DID:SOV identifier and reports how the resolution went
    pub async fn resolve_with_metadata(
        &self,
        identifier: &str,
    ) -> Result<Option<ResolutionResult>, ResolutionError> {
        let start_time = Instant::now();

        let document = self.resolve(identifier).await?;

        Ok(document.map(|did_document| ResolutionResult {
            did_document,
            metadata: ResolutionMetadata {
                content_type: "application/did+json".to_string(),
                retrieved: Utc::now(),
                duration: start_time.elapsed(),
            },
        }))
    }

    async fn submit(
        &self,
        state: &ConnectionState,
        stage: RequestStage,
        request: &ReadRequest,
    ) -> Result<String, ResolutionError> {
        let failed = |source| ResolutionError::LedgerRequestFailed { stage, source };

        let request = self
            .ledger
            .build_request(&state.submitter_did, request)
            .await
            .map_err(failed)?;

        self.ledger
            .sign_and_submit(state.pool, state.store, &state.submitter_did, &request)
            .await
            .map_err(failed)
    }
}

#[async_trait]
impl<L: LedgerClient> Driver for DidSovDriver<L> {
    async fn resolve(&self, identifier: &str) -> Result<Option<DIDDocument>, ResolutionError> {
        DidSovDriver::resolve(self, identifier).await
    }
}
