//! Ledger connection management.
//!
//! The pool, the wallet and the submitter DID are opened lazily on first use and
//! then shared by every resolution made through the same driver.

use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::config::DriverConfig;
use crate::error::{ConnectionError, LedgerError};
use crate::ledger::{LedgerClient, PoolHandle, StoreHandle};

/// An opened pool and wallet plus the DID that signs read requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConnectionState {
    pub(crate) pool: PoolHandle,
    pub(crate) store: StoreHandle,
    pub(crate) submitter_did: String,
}

/// Opens the ledger connection once and hands it out to resolutions
pub struct ConnectionManager<L: LedgerClient> {
    config: DriverConfig,
    ledger: Arc<L>,
    /// Empty until all setup steps succeeded
    state: OnceCell<Arc<ConnectionState>>,
}

impl<L: LedgerClient> ConnectionManager<L> {
    pub fn new(config: DriverConfig, ledger: Arc<L>) -> Self {
        Self {
            config,
            ledger,
            state: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Whether the pool, wallet and submitter DID are all open
    pub fn is_ready(&self) -> bool {
        self.state.initialized()
    }

    /// Opens the connection unless it is already open
    pub async fn ensure_ready(&self) -> Result<(), ConnectionError> {
        self.ready_state().await.map(|_| ())
    }

    /// Returns the open connection, running the setup steps first if needed.
    ///
    /// Only one caller runs the setup at a time; the others wait for its outcome and
    /// retry the setup themselves if it failed. Once open, no lock is taken.
    pub(crate) async fn ready_state(&self) -> Result<Arc<ConnectionState>, ConnectionError> {
        let state = self
            .state
            .get_or_try_init(|| async {
                let state = self.open().await.map_err(|e| {
                    warn!("Cannot open ledger connection: {}", e);
                    e
                })?;
                info!(
                    "Ledger connection ready (pool {}, wallet {}, submitter {})",
                    self.config.pool_config_name, self.config.wallet_name, state.submitter_did
                );
                Ok::<_, ConnectionError>(Arc::new(state))
            })
            .await?;

        Ok(Arc::clone(state))
    }

    async fn open(&self) -> Result<ConnectionState, ConnectionError> {
        let pool_name = &self.config.pool_config_name;
        let wallet_name = &self.config.wallet_name;

        // Initialize the native runtime
        if let Some(library_path) = &self.config.library_path {
            if !self.ledger.runtime_initialized() {
                info!("Initializing ledger runtime: {}", library_path.display());
                self.ledger
                    .init_runtime(library_path)
                    .map_err(|source| ConnectionError::RuntimeInitFailed {
                        path: library_path.display().to_string(),
                        source,
                    })?;
            }
        }

        // Create pool config
        match self
            .ledger
            .create_pool_config(pool_name, &self.config.pool_genesis_txn)
            .await
        {
            Ok(()) => info!("Pool config {} successfully created.", pool_name),
            Err(LedgerError::AlreadyExists(_)) => {
                info!("Pool config {} has already been created.", pool_name)
            }
            Err(source) => {
                return Err(ConnectionError::PoolConfigFailed {
                    pool: pool_name.clone(),
                    source,
                })
            }
        }

        // Create wallet
        match self.ledger.create_store(pool_name, wallet_name).await {
            Ok(()) => info!("Wallet {} successfully created.", wallet_name),
            Err(LedgerError::AlreadyExists(_)) => {
                info!("Wallet {} has already been created.", wallet_name)
            }
            Err(source) => {
                return Err(ConnectionError::StoreCreateFailed {
                    wallet: wallet_name.clone(),
                    source,
                })
            }
        }

        let pool = self
            .ledger
            .open_pool(pool_name)
            .await
            .map_err(|source| ConnectionError::PoolOpenFailed {
                pool: pool_name.clone(),
                source,
            })?;

        let store = self
            .ledger
            .open_store(wallet_name)
            .await
            .map_err(|source| ConnectionError::StoreOpenFailed {
                wallet: wallet_name.clone(),
                source,
            })?;

        let identity = self
            .ledger
            .create_identity(store, self.config.submitter_seed.clone())
            .await
            .map_err(ConnectionError::SubmitterCreateFailed)?;
        info!("Created submitter DID {}", identity.did);

        Ok(ConnectionState {
            pool,
            store,
            submitter_did: identity.did,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ledger::tests::MockLedger;
    use crate::ledger::Identity;
    use mockall::predicate::*;
    use mockall::Sequence;
    use std::path::{Path, PathBuf};

    pub(crate) const SUBMITTER_DID: &str = "Th7MpTaRZVRYnPiabds81Y";

    pub(crate) fn test_config() -> DriverConfig {
        DriverConfig::new("live", "live.txn").with_wallet_name("resolver")
    }

    /// Expect one successful run of the setup steps
    pub(crate) fn expect_setup(ledger: &mut MockLedger) {
        ledger
            .expect_create_pool_config()
            .times(1)
            .returning(|_, _| Ok(()));
        ledger.expect_create_store().times(1).returning(|_, _| Ok(()));
        ledger.expect_open_pool().times(1).returning(|_| Ok(PoolHandle(1)));
        ledger.expect_open_store().times(1).returning(|_| Ok(StoreHandle(2)));
        ledger.expect_create_identity().times(1).returning(|_, _| {
            Ok(Identity {
                did: SUBMITTER_DID.to_string(),
                verkey: "~CoRER63DVYnWZtK8uAzNbx".to_string(),
            })
        });
    }

    #[tokio::test]
    async fn test_setup_steps_in_order() {
        let mut ledger = MockLedger::new();
        let mut seq = Sequence::new();

        ledger
            .expect_runtime_initialized()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(false);
        ledger
            .expect_init_runtime()
            .withf(|path: &Path| path == Path::new("./sovrin/lib/"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        ledger
            .expect_create_pool_config()
            .withf(|name: &str, genesis: &Path| name == "live" && genesis == Path::new("live.txn"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        ledger
            .expect_create_store()
            .withf(|pool: &str, wallet: &str| pool == "live" && wallet == "resolver")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        ledger
            .expect_open_pool()
            .with(eq("live"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(PoolHandle(7)));
        ledger
            .expect_open_store()
            .with(eq("resolver"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(StoreHandle(9)));
        ledger
            .expect_create_identity()
            .with(eq(StoreHandle(9)), eq(None::<String>))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(Identity {
                    did: SUBMITTER_DID.to_string(),
                    verkey: "~CoRER63DVYnWZtK8uAzNbx".to_string(),
                })
            });

        let config = test_config().with_library_path("./sovrin/lib/");
        let manager = ConnectionManager::new(config, Arc::new(ledger));

        assert!(!manager.is_ready());
        manager.ensure_ready().await.unwrap();
        assert!(manager.is_ready());

        let state = manager.ready_state().await.unwrap();
        assert_eq!(
            *state,
            ConnectionState {
                pool: PoolHandle(7),
                store: StoreHandle(9),
                submitter_did: SUBMITTER_DID.to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_runtime_not_reloaded() {
        let mut ledger = MockLedger::new();
        ledger.expect_runtime_initialized().times(1).return_const(true);
        ledger.expect_init_runtime().never();
        expect_setup(&mut ledger);

        let config = test_config().with_library_path(PathBuf::from("./sovrin/lib/"));
        let manager = ConnectionManager::new(config, Arc::new(ledger));
        manager.ensure_ready().await.unwrap();
    }

    #[tokio::test]
    async fn test_no_library_path_skips_runtime() {
        let mut ledger = MockLedger::new();
        ledger.expect_runtime_initialized().never();
        ledger.expect_init_runtime().never();
        expect_setup(&mut ledger);

        let manager = ConnectionManager::new(test_config(), Arc::new(ledger));
        manager.ensure_ready().await.unwrap();
    }

    #[tokio::test]
    async fn test_already_exists_is_tolerated() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_create_pool_config()
            .times(1)
            .returning(|name, _| Err(LedgerError::AlreadyExists(name.to_string())));
        ledger
            .expect_create_store()
            .times(1)
            .returning(|_, wallet| Err(LedgerError::AlreadyExists(wallet.to_string())));
        ledger.expect_open_pool().times(1).returning(|_| Ok(PoolHandle(1)));
        ledger.expect_open_store().times(1).returning(|_| Ok(StoreHandle(2)));
        ledger.expect_create_identity().times(1).returning(|_, _| {
            Ok(Identity {
                did: SUBMITTER_DID.to_string(),
                verkey: "~CoRER63DVYnWZtK8uAzNbx".to_string(),
            })
        });

        let manager = ConnectionManager::new(test_config(), Arc::new(ledger));
        manager.ensure_ready().await.unwrap();
        assert!(manager.is_ready());
    }

    #[tokio::test]
    async fn test_submitter_seed_is_passed() {
        let mut ledger = MockLedger::new();
        ledger.expect_create_pool_config().returning(|_, _| Ok(()));
        ledger.expect_create_store().returning(|_, _| Ok(()));
        ledger.expect_open_pool().returning(|_| Ok(PoolHandle(1)));
        ledger.expect_open_store().returning(|_| Ok(StoreHandle(2)));
        ledger
            .expect_create_identity()
            .with(always(), eq(Some("000000000000000000000000Steward1".to_string())))
            .times(1)
            .returning(|_, _| {
                Ok(Identity {
                    did: "Th7MpTaRZVRYnPiabds81Y".to_string(),
                    verkey: "FYmoFw55GeQH7SRFa37dkx1d2dZ3zUF8ckg7wmL7ofN4".to_string(),
                })
            });

        let config = test_config().with_submitter_seed("000000000000000000000000Steward1");
        let manager = ConnectionManager::new(config, Arc::new(ledger));
        manager.ensure_ready().await.unwrap();
    }

    #[tokio::test]
    async fn test_pool_config_failure() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_create_pool_config()
            .times(1)
            .returning(|_, _| Err(LedgerError::Failed("genesis file not found".to_string())));
        ledger.expect_create_store().never();
        ledger.expect_open_pool().never();

        let manager = ConnectionManager::new(test_config(), Arc::new(ledger));
        let err = manager.ensure_ready().await.unwrap_err();

        assert_eq!(
            err,
            ConnectionError::PoolConfigFailed {
                pool: "live".to_string(),
                source: LedgerError::Failed("genesis file not found".to_string()),
            }
        );
        assert!(!manager.is_ready());
    }

    async fn assert_step_failure(setup: fn(&mut MockLedger), check: fn(&ConnectionError) -> bool) {
        let mut ledger = MockLedger::new();
        ledger.expect_create_pool_config().returning(|_, _| Ok(()));
        setup(&mut ledger);

        let manager = ConnectionManager::new(test_config(), Arc::new(ledger));
        let err = manager.ensure_ready().await.unwrap_err();
        assert!(check(&err), "unexpected error: {:?}", err);
        assert!(!manager.is_ready());
    }

    #[tokio::test]
    async fn test_step_failures_map_to_variants() {
        assert_step_failure(
            |l| {
                l.expect_create_store()
                    .returning(|_, _| Err(LedgerError::Failed("io".to_string())));
            },
            |e| matches!(e, ConnectionError::StoreCreateFailed { wallet, .. } if wallet == "resolver"),
        )
        .await;

        assert_step_failure(
            |l| {
                l.expect_create_store().returning(|_, _| Ok(()));
                l.expect_open_pool()
                    .returning(|_| Err(LedgerError::Failed("timeout".to_string())));
            },
            |e| matches!(e, ConnectionError::PoolOpenFailed { pool, .. } if pool == "live"),
        )
        .await;

        assert_step_failure(
            |l| {
                l.expect_create_store().returning(|_, _| Ok(()));
                l.expect_open_pool().returning(|_| Ok(PoolHandle(1)));
                l.expect_open_store()
                    .returning(|_| Err(LedgerError::Failed("locked".to_string())));
            },
            |e| matches!(e, ConnectionError::StoreOpenFailed { wallet, .. } if wallet == "resolver"),
        )
        .await;

        assert_step_failure(
            |l| {
                l.expect_create_store().returning(|_, _| Ok(()));
                l.expect_open_pool().returning(|_| Ok(PoolHandle(1)));
                l.expect_open_store().returning(|_| Ok(StoreHandle(2)));
                l.expect_create_identity()
                    .returning(|_, _| Err(LedgerError::Failed("bad seed".to_string())));
            },
            |e| matches!(e, ConnectionError::SubmitterCreateFailed(_)),
        )
        .await;
    }

    #[tokio::test]
    async fn test_failure_retries_from_first_step() {
        let mut ledger = MockLedger::new();
        let mut seq = Sequence::new();

        // First attempt fails when opening the pool
        ledger
            .expect_create_pool_config()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        ledger
            .expect_create_store()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        ledger
            .expect_open_pool()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(LedgerError::Failed("no consensus".to_string())));

        // Second attempt starts over and succeeds
        ledger
            .expect_create_pool_config()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|name, _| Err(LedgerError::AlreadyExists(name.to_string())));
        ledger
            .expect_create_store()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, wallet| Err(LedgerError::AlreadyExists(wallet.to_string())));
        ledger
            .expect_open_pool()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(PoolHandle(1)));
        ledger
            .expect_open_store()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(StoreHandle(2)));
        ledger
            .expect_create_identity()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(Identity {
                    did: SUBMITTER_DID.to_string(),
                    verkey: "~CoRER63DVYnWZtK8uAzNbx".to_string(),
                })
            });

        let manager = ConnectionManager::new(test_config(), Arc::new(ledger));

        assert!(matches!(
            manager.ensure_ready().await,
            Err(ConnectionError::PoolOpenFailed { .. })
        ));
        assert!(!manager.is_ready());

        manager.ensure_ready().await.unwrap();
        assert!(manager.is_ready());
    }

    #[tokio::test]
    async fn test_ready_is_idempotent() {
        let mut ledger = MockLedger::new();
        expect_setup(&mut ledger);

        let manager = ConnectionManager::new(test_config(), Arc::new(ledger));
        for _ in 0..5 {
            manager.ensure_ready().await.unwrap();
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_is_ready_does_not_wait_for_setup() {
        let mut ledger = MockLedger::new();
        ledger.expect_create_pool_config().times(1).returning(|_, _| {
            std::thread::sleep(std::time::Duration::from_millis(300));
            Ok(())
        });
        ledger.expect_create_store().times(1).returning(|_, _| Ok(()));
        ledger.expect_open_pool().times(1).returning(|_| Ok(PoolHandle(1)));
        ledger.expect_open_store().times(1).returning(|_| Ok(StoreHandle(2)));
        ledger.expect_create_identity().times(1).returning(|_, _| {
            Ok(Identity {
                did: SUBMITTER_DID.to_string(),
                verkey: "~CoRER63DVYnWZtK8uAzNbx".to_string(),
            })
        });

        let manager = Arc::new(ConnectionManager::new(test_config(), Arc::new(ledger)));
        let setup = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.ensure_ready().await })
        };

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let started = std::time::Instant::now();
        assert!(!manager.is_ready());
        assert!(started.elapsed() < std::time::Duration::from_millis(100));

        setup.await.unwrap().unwrap();
        assert!(manager.is_ready());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_ensure_ready_initializes_once() {
        let mut ledger = MockLedger::new();
        expect_setup(&mut ledger);

        let manager = Arc::new(ConnectionManager::new(test_config(), Arc::new(ledger)));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move { manager.ready_state().await })
            })
            .collect();

        let mut states = Vec::new();
        for handle in handles {
            states.push(handle.await.unwrap().unwrap());
        }

        assert!(states.iter().all(|state| Arc::ptr_eq(state, &states[0])));
        assert_eq!(states[0].submitter_did, SUBMITTER_DID);
    }
}
