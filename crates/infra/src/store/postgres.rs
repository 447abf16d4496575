//! Postgres-backed ledger store.
//!
//! Every `PostingUnit` runs in one SQL transaction. Rows that a unit mutates
//! are taken with `SELECT ... FOR UPDATE` in a fixed order (voucher sequence,
//! then pending entry, then account), so concurrent postings against the same
//! entry or account serialize on the row lock and never lose an update.
//!
//! Records are stored as JSONB next to the columns the constraints and
//! queries need; the JSON document is what gets decoded on read.
//!
//! ## Error mapping
//!
//! | SQLx error | Code | `DomainError` |
//! |---|---|---|
//! | unique violation | `23505` | `Conflict` |
//! | foreign key violation | `23503` | `NotFound` |
//! | anything else | | `Internal` |
//!
//! An error anywhere inside a unit drops the SQL transaction, which rolls
//! back every write of the unit.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{Postgres, Row, Transaction as SqlTransaction};
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::instrument;
use uuid::Uuid;

use millerp_accounting::{
    Account, AccountUpdate, Expense, ExpenseTarget, Payment, PendingEntry, Transaction,
    VoucherClaim,
};
use millerp_core::{AccountId, DomainError, DomainResult, Entity, PricingId, TransactionId};

use super::r#trait::{Committed, LedgerStore, PostingUnit};

type Tx = SqlTransaction<'static, Postgres>;

/// Schema, applied in order by [`PostgresLedgerStore::migrate`].
pub const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS ledger_accounts (
        id              UUID PRIMARY KEY,
        parent_id       UUID NULL REFERENCES ledger_accounts (id),
        level           SMALLINT NOT NULL CHECK (level BETWEEN 1 AND 4),
        current_balance NUMERIC(32, 2) NOT NULL,
        created_at      TIMESTAMPTZ NOT NULL,
        data            JSONB NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ledger_pending_entries (
        pricing_id   UUID PRIMARY KEY,
        entry_type   TEXT NOT NULL,
        reference_no TEXT NOT NULL,
        processed    BOOLEAN NOT NULL DEFAULT FALSE,
        recorded_at  TIMESTAMPTZ NOT NULL,
        data         JSONB NOT NULL,
        UNIQUE (entry_type, reference_no)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ledger_transactions (
        seq              BIGSERIAL PRIMARY KEY,
        id               UUID NOT NULL UNIQUE,
        account_id       UUID NOT NULL REFERENCES ledger_accounts (id),
        reference_no     TEXT NOT NULL,
        transaction_date DATE NOT NULL,
        imported         BOOLEAN NOT NULL DEFAULT FALSE,
        data             JSONB NOT NULL
    )
    "#,
    // Imported history may carry duplicates until the cleanup removes them.
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS ledger_transactions_account_reference
        ON ledger_transactions (account_id, reference_no)
        WHERE NOT imported
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS ledger_transactions_account_date
        ON ledger_transactions (account_id, transaction_date)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ledger_voucher_sequences (
        namespace TEXT PRIMARY KEY,
        next_seq  BIGINT NOT NULL CHECK (next_seq >= 1)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ledger_vouchers (
        namespace  TEXT NOT NULL,
        voucher_no TEXT NOT NULL,
        PRIMARY KEY (namespace, voucher_no)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ledger_payments (
        seq            BIGSERIAL PRIMARY KEY,
        voucher_no     TEXT NOT NULL UNIQUE,
        account_id     UUID NOT NULL REFERENCES ledger_accounts (id),
        transaction_id UUID NOT NULL REFERENCES ledger_transactions (id),
        data           JSONB NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ledger_expenses (
        seq            BIGSERIAL PRIMARY KEY,
        voucher_no     TEXT NOT NULL UNIQUE,
        transaction_id UUID NULL REFERENCES ledger_transactions (id),
        data           JSONB NOT NULL
    )
    "#,
];

/// Ledger store over a Postgres connection pool.
///
/// The `LedgerStore` trait is synchronous; calls are bridged onto the current
/// tokio runtime with `block_in_place`, which needs the multi-threaded
/// runtime. Outside of one every call fails with `Internal` instead of
/// blocking.
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: Arc<PgPool>,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> DomainResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the ledger tables when they do not exist yet.
    pub async fn migrate(&self) -> DomainResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        Ok(())
    }

    async fn begin(&self) -> DomainResult<Tx> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }

    async fn fetch_docs<T: DeserializeOwned>(&self, sql: &str) -> DomainResult<Vec<T>> {
        let rows = sqlx::query(sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch", e))?;
        rows.iter().map(decode).collect()
    }

    async fn fetch_doc_by_id<T: DeserializeOwned>(
        &self,
        sql: &str,
        id: &Uuid,
    ) -> DomainResult<Option<T>> {
        let row = sqlx::query(sql)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch", e))?;
        row.as_ref().map(decode).transpose()
    }

    pub async fn load_account(&self, id: AccountId) -> DomainResult<Option<Account>> {
        self.fetch_doc_by_id("SELECT data FROM ledger_accounts WHERE id = $1", id.as_uuid())
            .await
    }

    pub async fn load_accounts(&self) -> DomainResult<Vec<Account>> {
        self.fetch_docs("SELECT data FROM ledger_accounts ORDER BY created_at, id")
            .await
    }

    #[instrument(skip(self, account), fields(account_id = %account.id()), err)]
    pub async fn store_account(&self, account: Account) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO ledger_accounts (id, parent_id, level, current_balance, created_at, data)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(account.id().as_uuid())
        .bind(account.parent_id().map(Uuid::from))
        .bind(i16::from(account.level().get()))
        .bind(account.current_balance())
        .bind(account.created_at())
        .bind(Json(&account))
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_account", e))?;
        Ok(())
    }

    pub async fn modify_account(&self, id: AccountId, update: AccountUpdate) -> DomainResult<Account> {
        let mut tx = self.begin().await?;
        let mut account = lock_account(&mut tx, id).await?;
        account.apply_update(update)?;
        save_account(&mut tx, &account).await?;
        commit(tx).await?;
        Ok(account)
    }

    pub async fn load_pending(&self, id: PricingId) -> DomainResult<Option<PendingEntry>> {
        self.fetch_doc_by_id(
            "SELECT data FROM ledger_pending_entries WHERE pricing_id = $1",
            id.as_uuid(),
        )
        .await
    }

    pub async fn load_pending_entries(&self) -> DomainResult<Vec<PendingEntry>> {
        self.fetch_docs("SELECT data FROM ledger_pending_entries ORDER BY recorded_at, pricing_id")
            .await
    }

    pub async fn store_pending(&self, entry: PendingEntry) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO ledger_pending_entries
                (pricing_id, entry_type, reference_no, processed, recorded_at, data)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id().as_uuid())
        .bind(entry.entry_type().label())
        .bind(entry.reference_no())
        .bind(!entry.is_pending())
        .bind(entry.recorded_at())
        .bind(Json(&entry))
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_pending", e))?;
        Ok(())
    }

    pub async fn load_transactions(&self, account_id: AccountId) -> DomainResult<Vec<Transaction>> {
        let rows = sqlx::query("SELECT data FROM ledger_transactions WHERE account_id = $1 ORDER BY seq")
            .bind(account_id.as_uuid())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_transactions", e))?;
        rows.iter().map(decode).collect()
    }

    pub async fn load_all_transactions(&self) -> DomainResult<Vec<Transaction>> {
        self.fetch_docs("SELECT data FROM ledger_transactions ORDER BY seq")
            .await
    }

    pub async fn load_payments(&self) -> DomainResult<Vec<Payment>> {
        self.fetch_docs("SELECT data FROM ledger_payments ORDER BY seq").await
    }

    pub async fn load_expenses(&self) -> DomainResult<Vec<Expense>> {
        self.fetch_docs("SELECT data FROM ledger_expenses ORDER BY seq").await
    }

    /// Apply one posting unit inside a single SQL transaction.
    #[instrument(skip(self, unit), err)]
    pub async fn commit_unit(&self, unit: PostingUnit) -> DomainResult<Committed> {
        let mut tx = self.begin().await?;
        let committed = match unit {
            PostingUnit::PricedEntry {
                pricing_id,
                transaction,
            } => {
                let mut entry = lock_pending(&mut tx, pricing_id).await?;
                entry.mark_processed()?;
                if entry.account_id() != Some(transaction.account_id()) {
                    return Err(DomainError::internal(
                        "transaction account differs from pending entry account",
                    ));
                }
                post_transaction(&mut tx, &transaction, false).await?;
                save_pending(&mut tx, &entry).await?;
                Committed::PricedEntry(transaction)
            }
            PostingUnit::Payment {
                claim,
                request,
                transaction,
            } => {
                let voucher_no = claim_voucher(&mut tx, &claim).await?;
                let transaction = transaction.with_reference(voucher_no.clone());
                if let Some(bank) = request.bank_account_id {
                    ensure_account_exists(&mut tx, bank).await?;
                }
                post_transaction(&mut tx, &transaction, false).await?;
                let payment = Payment::from_request(request, voucher_no, transaction.id());
                sqlx::query(
                    r#"
                    INSERT INTO ledger_payments (voucher_no, account_id, transaction_id, data)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(&payment.voucher_no)
                .bind(payment.account_id.as_uuid())
                .bind(payment.transaction_id.as_uuid())
                .bind(Json(&payment))
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("insert_payment", e))?;
                Committed::Payment {
                    payment,
                    transaction,
                }
            }
            PostingUnit::Expense {
                claim,
                request,
                transaction,
            } => {
                let voucher_no = claim_voucher(&mut tx, &claim).await?;
                let transaction = match transaction {
                    Some(t) => {
                        let t = t.with_reference(voucher_no.clone());
                        if let ExpenseTarget::Account(id) = &request.target {
                            if *id != t.account_id() {
                                return Err(DomainError::internal(
                                    "expense transaction account differs from target",
                                ));
                            }
                        }
                        post_transaction(&mut tx, &t, false).await?;
                        Some(t)
                    }
                    None => None,
                };
                let expense =
                    Expense::from_request(request, voucher_no, transaction.as_ref().map(|t| t.id()));
                sqlx::query(
                    r#"
                    INSERT INTO ledger_expenses (voucher_no, transaction_id, data)
                    VALUES ($1, $2, $3)
                    "#,
                )
                .bind(&expense.voucher_no)
                .bind(expense.transaction_id.map(Uuid::from))
                .bind(Json(&expense))
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("insert_expense", e))?;
                Committed::Expense {
                    expense,
                    transaction,
                }
            }
        };
        commit(tx).await?;
        Ok(committed)
    }

    /// Delete transactions and re-derive the balances of their accounts.
    #[instrument(skip(self, ids), fields(requested = ids.len()), err)]
    pub async fn delete_transactions(&self, ids: &[TransactionId]) -> DomainResult<Vec<Transaction>> {
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let mut tx = self.begin().await?;

        // Account rows first, in id order, like every posting unit.
        let touched: Vec<Uuid> = sqlx::query(
            r#"
            SELECT a.id
            FROM ledger_accounts a
            WHERE a.id IN (SELECT account_id FROM ledger_transactions WHERE id = ANY($1))
            ORDER BY a.id
            FOR UPDATE
            "#,
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("lock_accounts", e))?
        .iter()
        .map(|row| row.try_get::<Uuid, _>("id"))
        .collect::<Result<_, _>>()
        .map_err(|e| map_sqlx_error("lock_accounts", e))?;

        let removed: Vec<Transaction> = sqlx::query(
            "DELETE FROM ledger_transactions WHERE id = ANY($1) RETURNING seq, data",
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("delete_transactions", e))?
        .iter()
        .map(decode)
        .collect::<DomainResult<_>>()?;

        for account_id in touched {
            let account_id = AccountId::from_uuid(account_id);
            let mut account = lock_account(&mut tx, account_id).await?;
            let rows = sqlx::query(
                "SELECT data FROM ledger_transactions WHERE account_id = $1 ORDER BY seq",
            )
            .bind(account_id.as_uuid())
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("load_history", e))?;
            let history: Vec<Transaction> = rows.iter().map(decode).collect::<DomainResult<_>>()?;
            account.rebuild_balance(history.iter())?;
            save_account(&mut tx, &account).await?;
        }

        commit(tx).await?;
        Ok(removed)
    }

    /// Load a transaction carried over from an earlier system. Skips the
    /// reference uniqueness check; the account balance is still moved.
    pub async fn import_legacy_transaction(&self, transaction: Transaction) -> DomainResult<()> {
        let mut tx = self.begin().await?;
        post_transaction(&mut tx, &transaction, true).await?;
        commit(tx).await
    }
}

async fn commit(tx: Tx) -> DomainResult<()> {
    tx.commit()
        .await
        .map_err(|e| map_sqlx_error("commit_transaction", e))
}

async fn lock_account(tx: &mut Tx, id: AccountId) -> DomainResult<Account> {
    let row = sqlx::query("SELECT data FROM ledger_accounts WHERE id = $1 FOR UPDATE")
        .bind(id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("lock_account", e))?
        .ok_or_else(|| DomainError::not_found(format!("account {id}")))?;
    decode(&row)
}

async fn ensure_account_exists(tx: &mut Tx, id: AccountId) -> DomainResult<()> {
    let found = sqlx::query("SELECT 1 FROM ledger_accounts WHERE id = $1")
        .bind(id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("find_account", e))?;
    match found {
        Some(_) => Ok(()),
        None => Err(DomainError::not_found(format!("account {id}"))),
    }
}

async fn save_account(tx: &mut Tx, account: &Account) -> DomainResult<()> {
    sqlx::query("UPDATE ledger_accounts SET current_balance = $2, data = $3 WHERE id = $1")
        .bind(account.id().as_uuid())
        .bind(account.current_balance())
        .bind(Json(account))
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("save_account", e))?;
    Ok(())
}

async fn lock_pending(tx: &mut Tx, id: PricingId) -> DomainResult<PendingEntry> {
    let row = sqlx::query("SELECT data FROM ledger_pending_entries WHERE pricing_id = $1 FOR UPDATE")
        .bind(id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("lock_pending", e))?
        .ok_or_else(|| DomainError::not_found(format!("pending entry {id}")))?;
    decode(&row)
}

async fn save_pending(tx: &mut Tx, entry: &PendingEntry) -> DomainResult<()> {
    sqlx::query("UPDATE ledger_pending_entries SET processed = $2, data = $3 WHERE pricing_id = $1")
        .bind(entry.id().as_uuid())
        .bind(!entry.is_pending())
        .bind(Json(entry))
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("save_pending", e))?;
    Ok(())
}

/// Insert `transaction` and move its account balance. The account row lock
/// is held until the surrounding SQL transaction ends.
async fn post_transaction(tx: &mut Tx, transaction: &Transaction, imported: bool) -> DomainResult<()> {
    let mut account = lock_account(tx, transaction.account_id()).await?;

    if !imported {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM ledger_transactions WHERE account_id = $1 AND reference_no = $2
            )
            "#,
        )
        .bind(transaction.account_id().as_uuid())
        .bind(transaction.reference_no())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("check_reference", e))?;
        if taken {
            return Err(duplicate_reference(transaction));
        }
    }

    account.apply_transaction(transaction)?;

    sqlx::query(
        r#"
        INSERT INTO ledger_transactions
            (id, account_id, reference_no, transaction_date, imported, data)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(transaction.id().as_uuid())
    .bind(transaction.account_id().as_uuid())
    .bind(transaction.reference_no())
    .bind(transaction.transaction_date())
    .bind(imported)
    .bind(Json(transaction))
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            duplicate_reference(transaction)
        } else {
            map_sqlx_error("insert_transaction", e)
        }
    })?;

    save_account(tx, &account).await
}

fn duplicate_reference(transaction: &Transaction) -> DomainError {
    DomainError::conflict(format!(
        "reference {} already posted to account {}",
        transaction.reference_no(),
        transaction.account_id()
    ))
}

/// Resolve a voucher number and record it as issued. The namespace sequence
/// row stays locked until the surrounding SQL transaction ends, so two
/// concurrent units never draw the same number.
async fn claim_voucher(tx: &mut Tx, claim: &VoucherClaim) -> DomainResult<String> {
    let namespace = claim.namespace.prefix();
    sqlx::query(
        r#"
        INSERT INTO ledger_voucher_sequences (namespace, next_seq) VALUES ($1, 1)
        ON CONFLICT (namespace) DO NOTHING
        "#,
    )
    .bind(namespace)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("init_voucher_sequence", e))?;

    let next: i64 = sqlx::query_scalar(
        "SELECT next_seq FROM ledger_voucher_sequences WHERE namespace = $1 FOR UPDATE",
    )
    .bind(namespace)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("lock_voucher_sequence", e))?;

    let (voucher_no, next) = match &claim.requested {
        Some(no) => {
            if voucher_issued(tx, namespace, no).await? {
                return Err(DomainError::conflict(format!("voucher {no} already exists")));
            }
            (no.clone(), next)
        }
        None => {
            let mut seq = next.max(1);
            loop {
                let candidate = claim.namespace.format(sequence_position(seq)?);
                if !voucher_issued(tx, namespace, &candidate).await? {
                    break (candidate, seq + 1);
                }
                seq += 1;
            }
        }
    };

    sqlx::query("INSERT INTO ledger_vouchers (namespace, voucher_no) VALUES ($1, $2)")
        .bind(namespace)
        .bind(&voucher_no)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict(format!("voucher {voucher_no} already exists"))
            } else {
                map_sqlx_error("insert_voucher", e)
            }
        })?;
    sqlx::query("UPDATE ledger_voucher_sequences SET next_seq = $2 WHERE namespace = $1")
        .bind(namespace)
        .bind(next)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("advance_voucher_sequence", e))?;

    Ok(voucher_no)
}

async fn voucher_issued(tx: &mut Tx, namespace: &str, voucher_no: &str) -> DomainResult<bool> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM ledger_vouchers WHERE namespace = $1 AND voucher_no = $2)",
    )
    .bind(namespace)
    .bind(voucher_no)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("check_voucher", e))
}

fn sequence_position(seq: i64) -> DomainResult<u64> {
    u64::try_from(seq)
        .map_err(|_| DomainError::internal(format!("voucher sequence out of range: {seq}")))
}

fn decode<T: DeserializeOwned>(row: &PgRow) -> DomainResult<T> {
    row.try_get::<Json<T>, _>("data")
        .map(|Json(value)| value)
        .map_err(|e| DomainError::internal(format!("unreadable ledger row: {e}")))
}

/// Map SQLx errors onto the domain taxonomy.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> DomainError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {operation}: {}", db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => DomainError::conflict(msg),
                Some("23503") => DomainError::not_found(msg),
                _ => DomainError::internal(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            DomainError::internal(format!("connection pool closed in {operation}"))
        }
        other => DomainError::internal(format!("sqlx error in {operation}: {other}")),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

/// Run `fut` to completion from synchronous code inside a tokio runtime.
fn block_on<T>(fut: impl Future<Output = DomainResult<T>>) -> DomainResult<T> {
    let handle = Handle::try_current().map_err(|_| {
        DomainError::internal("postgres ledger store called outside of a tokio runtime")
    })?;
    match handle.runtime_flavor() {
        RuntimeFlavor::MultiThread => tokio::task::block_in_place(|| handle.block_on(fut)),
        _ => Err(DomainError::internal(
            "postgres ledger store requires the multi-threaded tokio runtime",
        )),
    }
}

impl LedgerStore for PostgresLedgerStore {
    fn account(&self, id: AccountId) -> DomainResult<Option<Account>> {
        block_on(self.load_account(id))
    }

    fn accounts(&self) -> DomainResult<Vec<Account>> {
        block_on(self.load_accounts())
    }

    fn insert_account(&self, account: Account) -> DomainResult<()> {
        block_on(self.store_account(account))
    }

    fn update_account(&self, id: AccountId, update: AccountUpdate) -> DomainResult<Account> {
        block_on(self.modify_account(id, update))
    }

    fn pending_entry(&self, id: PricingId) -> DomainResult<Option<PendingEntry>> {
        block_on(self.load_pending(id))
    }

    fn pending_entries(&self) -> DomainResult<Vec<PendingEntry>> {
        block_on(self.load_pending_entries())
    }

    fn insert_pending(&self, entry: PendingEntry) -> DomainResult<()> {
        block_on(self.store_pending(entry))
    }

    fn transactions(&self, account_id: AccountId) -> DomainResult<Vec<Transaction>> {
        block_on(self.load_transactions(account_id))
    }

    fn all_transactions(&self) -> DomainResult<Vec<Transaction>> {
        block_on(self.load_all_transactions())
    }

    fn payments(&self) -> DomainResult<Vec<Payment>> {
        block_on(self.load_payments())
    }

    fn expenses(&self) -> DomainResult<Vec<Expense>> {
        block_on(self.load_expenses())
    }

    fn commit(&self, unit: PostingUnit) -> DomainResult<Committed> {
        block_on(self.commit_unit(unit))
    }

    fn remove_transactions(&self, ids: &[TransactionId]) -> DomainResult<Vec<Transaction>> {
        block_on(self.delete_transactions(ids))
    }
}
