//! End-to-end tests across the ledger services.
//!
//! Pending entry → PostingEngine → LedgerStore → BalanceAggregator, plus the
//! concurrency and rollback guarantees of the posting unit.

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use chrono::NaiveDate;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    use millerp_accounting::{
        signed_amount, Account, AccountLevel, AccountType, AccountUpdate, BalanceType,
        ContactInfo, EntryType, Expense, NewAccount, NewPayment, NewPendingEntry, Payment,
        PaymentDirection, PaymentMode, PendingEntry, PendingEntryType, PendingStatus, PriceInput,
        Transaction,
    };
    use millerp_core::{AccountId, DomainError, DomainResult, Entity, PricingId, TransactionId};

    use crate::balances::BalanceAggregator;
    use crate::chart::ChartOfAccounts;
    use crate::payments::PaymentRecorder;
    use crate::pending_queue::PendingEntryQueue;
    use crate::posting::{PostPendingEntry, PostingEngine};
    use crate::store::{Committed, InMemoryLedgerStore, LedgerStore, PostingUnit};

    type Store = Arc<InMemoryLedgerStore>;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 15).unwrap()
    }

    struct Mill<S> {
        store: S,
        chart: ChartOfAccounts<S>,
        queue: PendingEntryQueue<S>,
        engine: PostingEngine<S>,
        balances: BalanceAggregator<S>,
        recorder: PaymentRecorder<S>,
    }

    impl<S: LedgerStore + Clone> Mill<S> {
        fn over(store: S) -> Self {
            Self {
                chart: ChartOfAccounts::new(store.clone()),
                queue: PendingEntryQueue::new(store.clone()),
                engine: PostingEngine::new(store.clone()),
                balances: BalanceAggregator::new(store.clone()),
                recorder: PaymentRecorder::new(store.clone()),
                store,
            }
        }

        fn account(
            &self,
            name: &str,
            level: u8,
            parent_id: Option<AccountId>,
            balance_type: BalanceType,
            opening: &str,
        ) -> AccountId {
            self.chart
                .create_account(NewAccount {
                    name: name.into(),
                    account_type: AccountType::Supplier,
                    balance_type,
                    opening_balance: dec(opening),
                    level: AccountLevel::new(level).unwrap(),
                    parent_id,
                    contact: ContactInfo::default(),
                })
                .unwrap()
                .id()
        }

        fn enqueue(
            &self,
            entry_type: PendingEntryType,
            account_id: AccountId,
            quantity: Decimal,
            reference: &str,
        ) -> PricingId {
            self.queue
                .enqueue(NewPendingEntry {
                    entry_type,
                    account_id: Some(account_id),
                    counterparty_name: None,
                    item_name: "Waste paper".into(),
                    quantity: Some(quantity),
                    unit: "kg".into(),
                    reference_no: reference.into(),
                    original_reference_no: entry_type.is_return().then(|| "GRN-0".to_string()),
                    event_date: day(),
                })
                .unwrap()
                .id()
        }

        fn current(&self, id: AccountId) -> Decimal {
            self.chart.get_account(id).unwrap().current_balance()
        }
    }

    fn mill() -> Mill<Store> {
        Mill::over(Arc::new(InMemoryLedgerStore::new()))
    }

    fn post(pricing_id: PricingId, price: Decimal, cut: Option<Decimal>) -> PostPendingEntry {
        PostPendingEntry {
            pricing_id,
            price: PriceInput {
                price_per_unit: price,
                cut_weight: cut,
            },
            transaction_date: Some(day()),
        }
    }

    #[test]
    fn purchase_on_debit_normal_account_goes_db() {
        let m = mill();
        let acc = m.account("Kraft Traders", 1, None, BalanceType::Debit, "1000");
        let id = m.enqueue(PendingEntryType::Purchase, acc, dec("100"), "GRN-1");

        let tx = m
            .engine
            .post_pending_entry(post(id, dec("50"), Some(dec("5"))))
            .unwrap();

        assert_eq!(tx.entry_type(), EntryType::Credit);
        assert_eq!(tx.amount(), dec("4750.00"));
        assert_eq!(tx.reference_no(), "PUR-GRN-1");
        assert_eq!(tx.item().map(|i| i.quantity), Some(dec("95")));
        assert_eq!(m.current(acc), dec("-3750.00"));

        let statement = m
            .balances
            .statement(acc, day(), day().succ_opt().unwrap())
            .unwrap();
        assert_eq!(statement.closing_display.to_string(), "3750.00 DB");
        assert_eq!(m.queue.get(id).unwrap().status(), PendingStatus::Processed);
        assert!(m.queue.list_pending(Default::default()).unwrap().is_empty());
    }

    #[test]
    fn concurrent_posts_of_one_entry_commit_once() {
        let m = Arc::new(mill());
        let acc = m.account("Kraft Traders", 1, None, BalanceType::Credit, "0");
        let id = m.enqueue(PendingEntryType::Purchase, acc, dec("10"), "GRN-2");

        let racers = 8;
        let barrier = Arc::new(Barrier::new(racers));
        let handles: Vec<_> = (0..racers)
            .map(|_| {
                let m = m.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    m.engine.post_pending_entry(post(id, dec("3"), None))
                })
            })
            .collect();
        let results: Vec<DomainResult<Transaction>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| matches!(e, DomainError::AlreadyProcessed(_)))
        );
        assert_eq!(m.store.transactions(acc).unwrap().len(), 1);
        assert_eq!(m.current(acc), dec("30.00"));
    }

    #[test]
    fn rollup_of_level_two_node_sums_level_three_children() {
        let m = mill();
        let top = m.account("Suppliers", 1, None, BalanceType::Credit, "0");
        let node = m.account("Local", 2, Some(top), BalanceType::Credit, "0");
        m.account("Kraft Traders", 3, Some(node), BalanceType::Credit, "200");
        m.account("Pulp House", 3, Some(node), BalanceType::Credit, "-50");

        assert_eq!(m.balances.rollup_balance(node).unwrap(), dec("150"));
    }

    fn payment(account_id: AccountId, amount: &str, mode: PaymentMode) -> NewPayment {
        NewPayment {
            account_id,
            amount: dec(amount),
            direction: PaymentDirection::Issued,
            voucher_no: None,
            mode,
            bank_account_id: None,
            cheque_no: None,
            remarks: None,
            payment_date: day(),
        }
    }

    #[test]
    fn online_payment_without_bank_is_rejected_cleanly() {
        let m = mill();
        let acc = m.account("Board Co", 1, None, BalanceType::Debit, "500");
        let err = m
            .recorder
            .record_payment(payment(acc, "500", PaymentMode::Online))
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert!(m.store.all_transactions().unwrap().is_empty());
        assert!(m.store.payments().unwrap().is_empty());
        assert_eq!(m.current(acc), dec("500"));
    }

    #[test]
    fn concurrent_posts_to_one_account_lose_no_update() {
        let m = Arc::new(mill());
        let acc = m.account("Kraft Traders", 1, None, BalanceType::Credit, "100");
        let writers = 32;
        let ids: Vec<PricingId> = (0..writers)
            .map(|i| m.enqueue(PendingEntryType::Purchase, acc, dec("1"), &format!("GRN-P{i}")))
            .collect();

        let barrier = Arc::new(Barrier::new(writers));
        let handles: Vec<_> = ids
            .into_iter()
            .map(|id| {
                let m = m.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    m.engine.post_pending_entry(post(id, dec("2.50"), None))
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap().unwrap();
        }

        assert_eq!(m.store.transactions(acc).unwrap().len(), writers);
        // 100 + 32 x 2.50
        assert_eq!(m.current(acc), dec("180.00"));
        assert!(m.queue.list_pending(Default::default()).unwrap().is_empty());
    }

    #[test]
    fn oversized_payments_are_rejected_and_the_store_keeps_working() {
        let m = mill();
        let acc = m.account("Board Co", 1, None, BalanceType::Credit, "0");
        let huge = "50000000000000000000000000000";

        for _ in 0..2 {
            let err = m
                .recorder
                .record_payment(payment(acc, huge, PaymentMode::Cash))
                .unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)));
        }

        let receipt = m
            .recorder
            .record_payment(payment(acc, "1.00", PaymentMode::Cash))
            .unwrap();
        assert_eq!(receipt.payment.voucher_no, "PAY-ISS-000001");
        assert_eq!(m.current(acc), dec("-1.00"));
        assert_eq!(m.store.payments().unwrap().len(), 1);
    }

    #[test]
    fn payments_at_the_limit_accumulate_without_overflow() {
        let m = mill();
        let acc = m.account("Board Co", 1, None, BalanceType::Debit, "0");
        let limit = millerp_core::MAX_AMOUNT.to_string();
        for _ in 0..3 {
            m.recorder
                .record_payment(payment(acc, &limit, PaymentMode::Cash))
                .unwrap();
        }
        assert_eq!(m.current(acc), millerp_core::MAX_AMOUNT * Decimal::from(3));
        assert_eq!(
            m.balances.running_balance(acc, Some(day())).unwrap(),
            m.current(acc)
        );
    }

    #[test]
    fn reposting_a_processed_entry_is_a_no_op() {
        let m = mill();
        let acc = m.account("Board Co", 1, None, BalanceType::Debit, "0");
        let id = m.enqueue(PendingEntryType::Sale, acc, dec("4"), "INV-1");
        m.engine.post_pending_entry(post(id, dec("25"), None)).unwrap();
        let after_first = m.current(acc);

        for _ in 0..3 {
            let err = m
                .engine
                .post_pending_entry(post(id, dec("99"), None))
                .unwrap_err();
            assert!(matches!(err, DomainError::AlreadyProcessed(_)));
        }
        assert_eq!(m.current(acc), after_first);
        assert_eq!(m.store.all_transactions().unwrap().len(), 1);
    }

    #[test]
    fn fractional_price_rounds_half_away_from_zero() {
        let m = mill();
        let acc = m.account("Board Co", 1, None, BalanceType::Debit, "0");
        let id = m.enqueue(PendingEntryType::Sale, acc, dec("10"), "INV-2");
        let tx = m
            .engine
            .post_pending_entry(post(id, dec("7.333"), None))
            .unwrap();
        assert_eq!(tx.amount(), dec("73.33"));
    }

    #[test]
    fn returns_and_store_movements_use_their_own_polarity() {
        let m = mill();
        let acc = m.account("Kraft Traders", 1, None, BalanceType::Credit, "0");
        let cases = [
            (PendingEntryType::StorePurchase, "S-1", EntryType::Credit, "STP-S-1"),
            (PendingEntryType::StoreReturn, "S-2", EntryType::Debit, "STR-S-2"),
            (PendingEntryType::SaleReturn, "R-1", EntryType::Credit, "SRT-R-1"),
            (PendingEntryType::PurchaseReturn, "R-2", EntryType::Debit, "PRT-R-2"),
        ];
        for (entry_type, reference, side, shown) in cases {
            let id = m.enqueue(entry_type, acc, dec("1"), reference);
            let tx = m.engine.post_pending_entry(post(id, dec("10"), None)).unwrap();
            assert_eq!(tx.entry_type(), side, "{entry_type:?}");
            assert_eq!(tx.reference_no(), shown);
        }
        assert_eq!(m.current(acc), Decimal::ZERO);
    }

    /// Delegates everything, but fails every commit as a backend would on a
    /// lost connection.
    #[derive(Clone)]
    struct FailingCommits(Store);

    impl LedgerStore for FailingCommits {
        fn account(&self, id: AccountId) -> DomainResult<Option<Account>> {
            self.0.account(id)
        }
        fn accounts(&self) -> DomainResult<Vec<Account>> {
            self.0.accounts()
        }
        fn insert_account(&self, account: Account) -> DomainResult<()> {
            self.0.insert_account(account)
        }
        fn update_account(&self, id: AccountId, update: AccountUpdate) -> DomainResult<Account> {
            self.0.update_account(id, update)
        }
        fn pending_entry(&self, id: PricingId) -> DomainResult<Option<PendingEntry>> {
            self.0.pending_entry(id)
        }
        fn pending_entries(&self) -> DomainResult<Vec<PendingEntry>> {
            self.0.pending_entries()
        }
        fn insert_pending(&self, entry: PendingEntry) -> DomainResult<()> {
            self.0.insert_pending(entry)
        }
        fn transactions(&self, account_id: AccountId) -> DomainResult<Vec<Transaction>> {
            self.0.transactions(account_id)
        }
        fn all_transactions(&self) -> DomainResult<Vec<Transaction>> {
            self.0.all_transactions()
        }
        fn payments(&self) -> DomainResult<Vec<Payment>> {
            self.0.payments()
        }
        fn expenses(&self) -> DomainResult<Vec<Expense>> {
            self.0.expenses()
        }
        fn commit(&self, _unit: PostingUnit) -> DomainResult<Committed> {
            Err(DomainError::internal("storage unavailable"))
        }
        fn remove_transactions(&self, ids: &[TransactionId]) -> DomainResult<Vec<Transaction>> {
            self.0.remove_transactions(ids)
        }
    }

    #[test]
    fn internal_failure_keeps_entry_pending() {
        let inner: Store = Arc::new(InMemoryLedgerStore::new());
        let m = Mill::over(FailingCommits(inner.clone()));
        let acc = m.account("Kraft Traders", 1, None, BalanceType::Credit, "10");
        let id = m.enqueue(PendingEntryType::Purchase, acc, dec("5"), "GRN-3");

        let err = m.engine.post_pending_entry(post(id, dec("2"), None)).unwrap_err();
        assert!(matches!(err, DomainError::Internal(_)));
        assert_eq!(m.queue.get(id).unwrap().status(), PendingStatus::Pending);
        assert_eq!(m.current(acc), dec("10"));

        // The same entry posts fine once the backend recovers.
        let healthy = Mill::over(inner);
        healthy
            .engine
            .post_pending_entry(post(id, dec("2"), None))
            .unwrap();
        assert_eq!(healthy.current(acc), dec("20.00"));
    }

    fn entry_type_strategy() -> impl Strategy<Value = PendingEntryType> {
        prop::sample::select(PendingEntryType::ALL.to_vec())
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: after any sequence of postings and payments the stored
        /// balance equals opening + Σ signed amounts of the history.
        #[test]
        fn stored_balance_replays_from_history(
            opening_cents in -1_000_000i64..1_000_000i64,
            debit_normal in any::<bool>(),
            postings in prop::collection::vec(
                (entry_type_strategy(), 1i64..5_000i64, 1i64..100_000i64),
                0..12
            ),
            payments in prop::collection::vec((any::<bool>(), 1i64..1_000_000i64), 0..4),
        ) {
            let m = mill();
            let balance_type = if debit_normal { BalanceType::Debit } else { BalanceType::Credit };
            let acc = m.account("Prop Co", 1, None, balance_type, &Decimal::new(opening_cents, 2).to_string());

            for (n, (entry_type, qty, price_mills)) in postings.into_iter().enumerate() {
                let id = m.enqueue(entry_type, acc, Decimal::from(qty), &format!("P-{n}"));
                m.engine
                    .post_pending_entry(post(id, Decimal::new(price_mills, 3), None))
                    .unwrap();
            }
            for (issued, cents) in payments {
                let direction = if issued { PaymentDirection::Issued } else { PaymentDirection::Received };
                m.recorder.record_payment(NewPayment {
                    account_id: acc,
                    amount: Decimal::new(cents, 2),
                    direction,
                    voucher_no: None,
                    mode: PaymentMode::Cash,
                    bank_account_id: None,
                    cheque_no: None,
                    remarks: None,
                    payment_date: day(),
                }).unwrap();
            }

            let replayed: Decimal = m.store.transactions(acc).unwrap()
                .iter()
                .map(|t| signed_amount(balance_type, t.entry_type(), t.amount()))
                .sum::<Decimal>() + Decimal::new(opening_cents, 2);
            prop_assert_eq!(m.current(acc), replayed);
            prop_assert_eq!(m.balances.running_balance(acc, Some(day())).unwrap(), replayed);
        }

        /// Property: on any 4-level tree an inner node's roll-up is the sum of
        /// its children's roll-ups.
        #[test]
        fn rollup_is_sum_of_children(
            shape in prop::collection::vec(
                prop::collection::vec(
                    prop::collection::vec(
                        prop::collection::vec(-100_000i64..100_000i64, 0..3),
                        0..3
                    ),
                    1..3
                ),
                1..3
            ),
        ) {
            let m = mill();
            let mut inner: Vec<AccountId> = Vec::new();
            for (a, l2s) in shape.iter().enumerate() {
                let l1 = m.account(&format!("H{a}"), 1, None, BalanceType::Debit, "0");
                inner.push(l1);
                for (b, l3s) in l2s.iter().enumerate() {
                    let l2 = m.account(&format!("H{a}.{b}"), 2, Some(l1), BalanceType::Debit, "7");
                    inner.push(l2);
                    for (c, l4s) in l3s.iter().enumerate() {
                        let l3 = m.account(&format!("H{a}.{b}.{c}"), 3, Some(l2), BalanceType::Debit, "-3");
                        inner.push(l3);
                        for (d, cents) in l4s.iter().enumerate() {
                            m.account(
                                &format!("H{a}.{b}.{c}.{d}"),
                                4,
                                Some(l3),
                                BalanceType::Debit,
                                &Decimal::new(*cents, 2).to_string(),
                            );
                        }
                    }
                }
            }

            for id in inner {
                let kids = m.chart.children(id).unwrap();
                let rollup = m.balances.rollup_balance(id).unwrap();
                if kids.is_empty() {
                    prop_assert_eq!(rollup, m.balances.running_balance(id, None).unwrap());
                } else {
                    let sum: Decimal = kids
                        .iter()
                        .map(|k| m.balances.rollup_balance(k.id()).unwrap())
                        .sum();
                    prop_assert_eq!(rollup, sum);
                }
            }
        }
    }

    /// Live Postgres checks, run with
    /// `MILLERP_TEST_DATABASE_URL=postgres://... cargo test -- --ignored`.
    mod postgres {
        use super::*;
        use crate::store::PostgresLedgerStore;

        fn live_store() -> Option<(tokio::runtime::Runtime, PostgresLedgerStore)> {
            let url = std::env::var("MILLERP_TEST_DATABASE_URL").ok()?;
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .unwrap();
            let store = rt
                .block_on(async {
                    let store = PostgresLedgerStore::connect(&url, 16).await?;
                    store.migrate().await?;
                    Ok::<_, DomainError>(store)
                })
                .unwrap();
            Some((rt, store))
        }

        fn unique(prefix: &str) -> String {
            format!("{prefix}-{}", uuid::Uuid::now_v7().simple())
        }

        #[test]
        #[ignore = "needs MILLERP_TEST_DATABASE_URL"]
        fn purchase_posts_atomically_and_only_once() {
            let Some((rt, store)) = live_store() else { return };
            let _ctx = rt.enter();
            let m = Mill::over(store);
            let acc = m.account("Kraft Traders", 1, None, BalanceType::Debit, "1000");
            let id = m.enqueue(PendingEntryType::Purchase, acc, dec("100"), &unique("GRN"));

            let tx = m
                .engine
                .post_pending_entry(post(id, dec("50"), Some(dec("5"))))
                .unwrap();
            assert_eq!(tx.amount(), dec("4750.00"));
            assert_eq!(m.current(acc), dec("-3750.00"));

            let err = m.engine.post_pending_entry(post(id, dec("50"), None)).unwrap_err();
            assert!(matches!(err, DomainError::AlreadyProcessed(_)));
            assert_eq!(m.store.transactions(acc).unwrap().len(), 1);
        }

        #[test]
        #[ignore = "needs MILLERP_TEST_DATABASE_URL"]
        fn row_locks_serialize_postings_to_one_account() {
            let Some((rt, store)) = live_store() else { return };
            let handle = rt.handle().clone();
            let _ctx = rt.enter();
            let m = Arc::new(Mill::over(store));
            let acc = m.account("Kraft Traders", 1, None, BalanceType::Credit, "0");
            let writers = 16;
            let ids: Vec<PricingId> = (0..writers)
                .map(|_| m.enqueue(PendingEntryType::Purchase, acc, dec("1"), &unique("GRN")))
                .collect();

            let barrier = Arc::new(Barrier::new(writers));
            let handles: Vec<_> = ids
                .into_iter()
                .map(|id| {
                    let m = m.clone();
                    let barrier = barrier.clone();
                    let handle = handle.clone();
                    thread::spawn(move || {
                        let _ctx = handle.enter();
                        barrier.wait();
                        m.engine.post_pending_entry(post(id, dec("3"), None))
                    })
                })
                .collect();
            for h in handles {
                h.join().unwrap().unwrap();
            }

            assert_eq!(m.current(acc), dec("48.00"));
            assert_eq!(m.balances.running_balance(acc, Some(day())).unwrap(), dec("48.00"));
        }

        #[test]
        #[ignore = "needs MILLERP_TEST_DATABASE_URL"]
        fn voucher_numbers_and_duplicate_vouchers() {
            let Some((rt, store)) = live_store() else { return };
            let _ctx = rt.enter();
            let m = Mill::over(store);
            let acc = m.account("Board Co", 1, None, BalanceType::Credit, "0");

            let first = m
                .recorder
                .record_payment(payment(acc, "10", PaymentMode::Cash))
                .unwrap();
            let manual = NewPayment {
                voucher_no: Some(first.payment.voucher_no.clone()),
                ..payment(acc, "10", PaymentMode::Cash)
            };
            let err = m.recorder.record_payment(manual).unwrap_err();
            assert!(matches!(err, DomainError::Conflict(_)));
            assert_eq!(m.current(acc), dec("-10.00"));
        }
    }
}
