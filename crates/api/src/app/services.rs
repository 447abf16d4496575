use std::sync::Arc;

use millerp_core::DomainResult;
use millerp_infra::{
    BalanceAggregator, ChartOfAccounts, InMemoryLedgerStore, LedgerStore, PaymentRecorder,
    PendingEntryQueue, PostgresLedgerStore, PostingEngine, TransactionLedger,
};

use crate::config::StoreBackend;

/// Store handle shared by every service.
pub type SharedStore = Arc<dyn LedgerStore>;

/// The ledger services, all over one store.
pub struct AppServices {
    pub store: SharedStore,
    pub chart: ChartOfAccounts<SharedStore>,
    pub pending: PendingEntryQueue<SharedStore>,
    pub posting: PostingEngine<SharedStore>,
    pub ledger: TransactionLedger<SharedStore>,
    pub balances: BalanceAggregator<SharedStore>,
    pub vouchers: PaymentRecorder<SharedStore>,
}

impl AppServices {
    pub fn new(store: SharedStore) -> Self {
        Self {
            chart: ChartOfAccounts::new(store.clone()),
            pending: PendingEntryQueue::new(store.clone()),
            posting: PostingEngine::new(store.clone()),
            ledger: TransactionLedger::new(store.clone()),
            balances: BalanceAggregator::new(store.clone()),
            vouchers: PaymentRecorder::new(store.clone()),
            store,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryLedgerStore::new()))
    }

    /// Connect to Postgres and create the ledger tables if needed.
    pub async fn postgres(database_url: &str, max_connections: u32) -> DomainResult<Self> {
        let store = PostgresLedgerStore::connect(database_url, max_connections).await?;
        store.migrate().await?;
        Ok(Self::new(Arc::new(store)))
    }

    pub async fn for_backend(backend: &StoreBackend) -> DomainResult<Self> {
        match backend {
            StoreBackend::InMemory => {
                tracing::warn!("using in-memory ledger store; data is lost on restart");
                Ok(Self::in_memory())
            }
            StoreBackend::Postgres {
                database_url,
                max_connections,
            } => {
                let services = Self::postgres(database_url, *max_connections).await?;
                tracing::info!("postgres ledger store ready");
                Ok(services)
            }
        }
    }
}
