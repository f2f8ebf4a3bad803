//! Ledger service: chart of accounts, manual postings, balances, incomes.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use simba_shared::LedgerConfig;
use simba_shared::types::{
    AccountId, Currency, IncomeId, Money, PageRequest, PageResponse, SaleId,
};
use tracing::info;

use super::balance::AccountBalance;
use super::posting::{self, NewTransaction};
use super::types::{Account, AccountType, Income, Transaction, TransactionType};
use crate::access::{Actor, Module};
use crate::audit::{AuditAction, AuditBatch, AuditEvent, AuditSink};
use crate::error::CoreError;
use crate::store::{LedgerRepository, Store, StoreTx};

/// Input for [`LedgerService::create_account`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    /// Unique code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Classification.
    pub account_type: AccountType,
    /// Currency of the account.
    pub currency: Currency,
}

/// Input for [`LedgerService::post_transaction`], addressed by account code.
#[derive(Debug, Clone, Deserialize)]
pub struct PostTransactionInput {
    /// Code of the account debited.
    pub debit_code: String,
    /// Code of the account credited.
    pub credit_code: String,
    /// Amount on both legs.
    pub amount: Money,
    /// Business reason.
    pub transaction_type: TransactionType,
    /// Narrative.
    pub description: String,
}

/// Balances of every account in one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialBalance {
    /// Reporting currency.
    pub currency: Currency,
    /// One line per account, ordered by code.
    pub lines: Vec<AccountBalance>,
    /// Sum of every debit leg.
    pub total_debit: Money,
    /// Sum of every credit leg.
    pub total_credit: Money,
}

impl TrialBalance {
    /// True when debits equal credits.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.total_debit == self.total_credit
    }
}

/// Ledger operations. Mutations require the [`Module::Finance`] capability.
pub struct LedgerService<S: Store> {
    store: S,
    config: LedgerConfig,
    audit: Arc<dyn AuditSink>,
}

impl<S: Store> LedgerService<S> {
    /// Creates a ledger service.
    pub fn new(store: S, config: LedgerConfig, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, config, audit }
    }

    /// Provisions the configured cash and sales revenue accounts.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConsistencyViolation`] if a configured code is
    /// already taken by an account of another type.
    pub async fn bootstrap_chart(&self, actor: &Actor) -> Result<(Account, Account), CoreError> {
        actor.require(Module::Finance)?;
        let mut tx = self.store.begin().await?;
        let accounts = posting::sale_accounts(&mut tx, &self.config).await?;
        tx.commit().await?;
        Ok(accounts)
    }

    /// Creates an account.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Duplicate`] if the code is taken.
    pub async fn create_account(&self, input: NewAccount, actor: &Actor) -> Result<Account, CoreError> {
        actor.require(Module::Finance)?;
        let code = input.code.trim().to_string();
        let name = input.name.trim().to_string();
        if code.is_empty() || name.is_empty() {
            return Err(CoreError::Validation("account code and name are required".into()));
        }

        let mut tx = self.store.begin().await?;
        if tx.find_account_by_code(&code).await?.is_some() {
            return Err(CoreError::Duplicate { entity: "account", key: code });
        }
        let account = Account {
            id: AccountId::new(),
            code,
            name,
            account_type: input.account_type,
            currency: input.currency,
            is_active: true,
            created_at: Utc::now(),
        };
        tx.insert_account(&account).await?;

        let mut audit = AuditBatch::new();
        audit.push(
            AuditEvent::new(
                actor,
                AuditAction::Create,
                Module::Finance,
                "account",
                account.id,
                format!("Created account {} {}", account.code, account.name),
            )
            .with_after(&account),
        );
        tx.commit().await?;
        audit.flush(self.audit.as_ref());

        info!(code = %account.code, account_type = %account.account_type, "account created");
        Ok(account)
    }

    /// Posts a manual transaction between two accounts.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown code, plus every
    /// validation error of [`posting::post_transaction`].
    pub async fn post_transaction(
        &self,
        input: PostTransactionInput,
        actor: &Actor,
    ) -> Result<Transaction, CoreError> {
        actor.require(Module::Finance)?;
        let mut tx = self.store.begin().await?;
        let debit = find_account_by_code(&mut tx, &input.debit_code).await?;
        let credit = find_account_by_code(&mut tx, &input.credit_code).await?;

        let transaction = posting::post_transaction(
            &mut tx,
            NewTransaction {
                debit: &debit,
                credit: &credit,
                amount: input.amount,
                transaction_type: input.transaction_type,
                description: input.description,
                income_id: None,
                created_by: actor.id,
            },
        )
        .await?;

        let mut audit = AuditBatch::new();
        audit.push(
            AuditEvent::new(
                actor,
                AuditAction::Create,
                Module::Finance,
                "transaction",
                transaction.id,
                format!(
                    "Posted {} from {} to {}",
                    transaction.amount, credit.code, debit.code
                ),
            )
            .with_after(&transaction),
        );
        tx.commit().await?;
        audit.flush(self.audit.as_ref());
        Ok(transaction)
    }

    /// Cancels an income and posts its reversal (debit revenue, credit cash).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] without a reason and
    /// [`CoreError::AlreadyProcessed`] if the income is already cancelled.
    pub async fn cancel_income(
        &self,
        id: IncomeId,
        reason: &str,
        actor: &Actor,
    ) -> Result<(Income, Transaction), CoreError> {
        actor.require(Module::Finance)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(CoreError::Validation("a cancellation reason is required".into()));
        }

        let mut tx = self.store.begin().await?;
        let mut income = tx
            .find_income_for_update(id)
            .await?
            .ok_or_else(|| CoreError::not_found("income", id))?;
        if income.is_cancelled {
            return Err(CoreError::AlreadyProcessed {
                entity: "income",
                id: id.into_inner(),
                status: "cancelled".into(),
            });
        }
        let before = income.clone();

        let (cash, revenue) = posting::sale_accounts(&mut tx, &self.config).await?;
        let reversal = posting::post_transaction(
            &mut tx,
            NewTransaction {
                debit: &revenue,
                credit: &cash,
                amount: income.amount,
                transaction_type: TransactionType::Adjustment,
                description: format!("Reversal of {}: {reason}", income.source),
                income_id: Some(income.id),
                created_by: actor.id,
            },
        )
        .await?;

        income.is_cancelled = true;
        income.cancelled_by = Some(actor.id);
        income.cancelled_at = Some(Utc::now());
        income.cancellation_reason = Some(reason.to_string());
        tx.update_income(&income).await?;

        let mut audit = AuditBatch::new();
        audit.push(
            AuditEvent::new(
                actor,
                AuditAction::Cancel,
                Module::Finance,
                "income",
                income.id,
                format!("Cancelled income {}: {reason}", income.source),
            )
            .with_before(&before)
            .with_after(&income),
        );
        tx.commit().await?;
        audit.flush(self.audit.as_ref());

        info!(income_id = %income.id, reversal_id = %reversal.id, "income cancelled");
        Ok((income, reversal))
    }

    /// Balance of one account, derived from its legs.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown code.
    pub async fn account_balance(&self, code: &str) -> Result<AccountBalance, CoreError> {
        let mut tx = self.store.begin().await?;
        let account = find_account_by_code(&mut tx, code).await?;
        let totals = tx.account_leg_totals(account.id).await?;
        Ok(AccountBalance::from_totals(&account, totals))
    }

    /// Balances of every account in `currency`.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn trial_balance(&self, currency: Currency) -> Result<TrialBalance, CoreError> {
        let mut tx = self.store.begin().await?;
        let mut lines = Vec::new();
        for account in tx.list_accounts().await? {
            if account.currency != currency {
                continue;
            }
            let totals = tx.account_leg_totals(account.id).await?;
            lines.push(AccountBalance::from_totals(&account, totals));
        }
        let total_debit = Money::sum(currency, lines.iter().map(|line| &line.debit_total))?;
        let total_credit = Money::sum(currency, lines.iter().map(|line| &line.credit_total))?;
        Ok(TrialBalance {
            currency,
            lines,
            total_debit,
            total_credit,
        })
    }

    /// Income recognized for a sale, if any.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn income_for_sale(&self, sale: SaleId) -> Result<Option<Income>, CoreError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.find_income_by_sale(sale).await?)
    }

    /// Transactions recognizing or reversing an income.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn transactions_for_income(&self, income: IncomeId) -> Result<Vec<Transaction>, CoreError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_transactions_for_income(income).await?)
    }

    /// Income ledger page, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list_incomes(&self, page: PageRequest) -> Result<PageResponse<Income>, CoreError> {
        let mut tx = self.store.begin().await?;
        let (incomes, total) = tx.list_incomes(page).await?;
        Ok(PageResponse::new(incomes, page, total))
    }

    /// Transaction ledger page, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list_transactions(&self, page: PageRequest) -> Result<PageResponse<Transaction>, CoreError> {
        let mut tx = self.store.begin().await?;
        let (transactions, total) = tx.list_transactions(page).await?;
        Ok(PageResponse::new(transactions, page, total))
    }

    /// Looks up one account by ID.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] when missing.
    pub async fn get_account(&self, id: AccountId) -> Result<Account, CoreError> {
        let mut tx = self.store.begin().await?;
        tx.find_account(id)
            .await?
            .ok_or_else(|| CoreError::not_found("account", id))
    }
}

async fn find_account_by_code<T: LedgerRepository>(tx: &mut T, code: &str) -> Result<Account, CoreError> {
    tx.find_account_by_code(code)
        .await?
        .ok_or_else(|| CoreError::not_found("account", code))
}
