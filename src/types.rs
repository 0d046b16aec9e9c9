//! Core types for DID:SOV resolution.
//!
//! This module provides the DID Document produced by the resolver together with
//! resolution-specific types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JSON-LD context of the documents produced by this resolver
pub const DID_CONTEXT: &str = "https://w3id.org/did/v0.11";

/// Key type of the ledger verkey
pub const ED25519_SIGNING_KEY: &str = "Ed25519SigningKey";

/// A DID Document assembled from ledger records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DIDDocument {
    /// The context of the DID Document
    #[serde(rename = "@context")]
    pub context: String,

    /// The DID exactly as it was passed to the resolver
    pub id: String,

    /// Public keys associated with this DID
    #[serde(rename = "publicKey")]
    pub public_keys: Vec<PublicKey>,

    /// Services associated with this DID
    #[serde(rename = "service", default)]
    pub services: Vec<Service>,
}

impl DIDDocument {
    pub fn new(id: String, public_keys: Vec<PublicKey>, services: Vec<Service>) -> Self {
        Self {
            context: DID_CONTEXT.to_string(),
            id,
            public_keys,
            services,
        }
    }

    /// Serializes the document as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A public key in a DID Document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicKey {
    /// The identifier of this key
    pub id: String,

    /// The key types
    #[serde(rename = "type")]
    pub types: Vec<String>,

    /// The key material as reported by the ledger
    #[serde(rename = "publicKeyBase58", skip_serializing_if = "Option::is_none", default)]
    pub public_key_base58: Option<String>,
}

impl PublicKey {
    /// An Ed25519 signing key
    pub fn ed25519(id: String, public_key_base58: Option<String>) -> Self {
        Self {
            id,
            types: vec![ED25519_SIGNING_KEY.to_string()],
            public_key_base58,
        }
    }
}

/// A service endpoint in a DID Document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// The name of the endpoint attribute entry
    #[serde(rename = "type")]
    pub service_type: String,

    /// The endpoint URL or host:port
    #[serde(rename = "serviceEndpoint")]
    pub service_endpoint: String,
}

impl Service {
    pub fn new(service_type: String, service_endpoint: String) -> Self {
        Self {
            service_type,
            service_endpoint,
        }
    }
}

/// Resolution result containing the DID Document and metadata
#[derive(Debug, Clone)]
pub struct ResolutionResult {
    /// The resolved DID Document
    pub did_document: DIDDocument,

    /// Metadata about the resolution process
    pub metadata: ResolutionMetadata,
}

/// Metadata about the resolution process
#[derive(Debug, Clone)]
pub struct ResolutionMetadata {
    /// Content type of the resolved document
    pub content_type: String,

    /// When the document was retrieved
    pub retrieved: DateTime<Utc>,

    /// How long the resolution took
    pub duration: std::time::Duration,
}
