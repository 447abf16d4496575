//! Payment and expense vouchers.

use serde::Serialize;

use millerp_accounting::{
    AccountType, EntryType, Expense, ExpenseTarget, NewExpense, NewPayment, Payment, Transaction,
    VoucherClaim, VoucherNamespace,
};
use millerp_core::{DomainError, DomainResult};

use crate::chart::ChartOfAccounts;
use crate::ledger::TransactionLedger;
use crate::store::{Committed, LedgerStore, PostingUnit};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub transaction: Transaction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseReceipt {
    pub expense: Expense,
    /// Present when the expense was booked against a chart account.
    pub transaction: Option<Transaction>,
}

#[derive(Debug, Clone)]
pub struct PaymentRecorder<S> {
    chart: ChartOfAccounts<S>,
    ledger: TransactionLedger<S>,
}

impl<S> PaymentRecorder<S>
where
    S: LedgerStore + Clone,
{
    pub fn new(store: S) -> Self {
        Self {
            chart: ChartOfAccounts::new(store.clone()),
            ledger: TransactionLedger::new(store),
        }
    }

    /// ISSUED posts DEBIT, RECEIVED posts CREDIT. The voucher number becomes
    /// the transaction reference.
    pub fn record_payment(&self, new: NewPayment) -> DomainResult<PaymentReceipt> {
        new.validate()?;
        self.chart.get_account(new.account_id)?;
        if let Some(bank) = new.bank_account_id {
            self.chart.get_account(bank)?;
        }

        let claim = VoucherClaim::new(new.direction.namespace(), new.voucher_no.clone());
        let transaction = Transaction::draft(
            new.account_id,
            new.direction.side(),
            new.amount,
            new.payment_date,
            "",
            new.description(),
        )?;

        match self.ledger.record(PostingUnit::Payment {
            claim,
            request: new,
            transaction,
        })? {
            Committed::Payment {
                payment,
                transaction,
            } => {
                tracing::info!(
                    voucher_no = %payment.voucher_no,
                    account_id = %payment.account_id,
                    side = transaction.entry_type().as_str(),
                    amount = %payment.amount,
                    "payment recorded"
                );
                Ok(PaymentReceipt {
                    payment,
                    transaction,
                })
            }
            other => Err(DomainError::internal(format!(
                "unexpected commit result for payment: {other:?}"
            ))),
        }
    }

    /// Bucket expenses only enter the expense register. Account expenses
    /// post a DEBIT and must target an OTHER-type account.
    pub fn record_expense(&self, new: NewExpense) -> DomainResult<ExpenseReceipt> {
        new.validate()?;

        let transaction = match &new.target {
            ExpenseTarget::Bucket(_) => None,
            ExpenseTarget::Account(id) => {
                let account = self.chart.get_account(*id)?;
                if account.account_type() != AccountType::Other {
                    return Err(DomainError::validation(format!(
                        "expenses can only be booked to OTHER accounts; {} is {}",
                        account.name(),
                        account.account_type().as_str()
                    )));
                }
                Some(Transaction::draft(
                    *id,
                    EntryType::Debit,
                    new.amount,
                    new.expense_date,
                    "",
                    new.description(),
                )?)
            }
        };

        let claim = VoucherClaim::new(VoucherNamespace::Expense, new.voucher_no.clone());
        match self.ledger.record(PostingUnit::Expense {
            claim,
            request: new,
            transaction,
        })? {
            Committed::Expense {
                expense,
                transaction,
            } => {
                tracing::info!(
                    voucher_no = %expense.voucher_no,
                    amount = %expense.amount,
                    posted = transaction.is_some(),
                    "expense recorded"
                );
                Ok(ExpenseReceipt {
                    expense,
                    transaction,
                })
            }
            other => Err(DomainError::internal(format!(
                "unexpected commit result for expense: {other:?}"
            ))),
        }
    }
}
