//! Posting functions that run inside a caller's unit of work.
//!
//! Nothing here commits. Callers (the ledger service, the reconciler, the
//! sales service) own the unit of work and decide when it ends.

use chrono::Utc;
use simba_shared::types::{
    AccountId, Currency, IncomeId, Money, MoneyError, TransactionId, UserId,
};
use simba_shared::{AccountRef, LedgerConfig};
use tracing::{error, info};

use super::types::{Account, AccountType, Income, IncomeType, Transaction, TransactionType};
use crate::error::CoreError;
use crate::sales::Sale;
use crate::store::LedgerRepository;

/// Input for [`post_transaction`].
#[derive(Debug, Clone)]
pub struct NewTransaction<'a> {
    /// Account debited.
    pub debit: &'a Account,
    /// Account credited.
    pub credit: &'a Account,
    /// Amount on both legs.
    pub amount: Money,
    /// Business reason.
    pub transaction_type: TransactionType,
    /// Narrative.
    pub description: String,
    /// Income recognized or reversed.
    pub income_id: Option<IncomeId>,
    /// Poster.
    pub created_by: UserId,
}

/// Resolves a well-known account by code, provisioning it when missing.
///
/// # Errors
///
/// Returns [`CoreError::ConsistencyViolation`] if the code exists with a
/// different account type, or a storage error.
pub async fn get_or_create_account<T: LedgerRepository>(
    tx: &mut T,
    reference: &AccountRef,
    account_type: AccountType,
    currency: Currency,
) -> Result<Account, CoreError> {
    if let Some(account) = tx.find_account_by_code(&reference.code).await? {
        if account.account_type != account_type {
            error!(
                code = %account.code,
                expected = %account_type,
                actual = %account.account_type,
                "account code resolves to the wrong account type"
            );
            return Err(CoreError::ConsistencyViolation(format!(
                "account {} is {} but {} is required",
                account.code, account.account_type, account_type
            )));
        }
        return Ok(account);
    }

    let account = Account {
        id: AccountId::new(),
        code: reference.code.clone(),
        name: reference.name.clone(),
        account_type,
        currency,
        is_active: true,
        created_at: Utc::now(),
    };
    tx.insert_account(&account).await?;
    info!(code = %account.code, name = %account.name, "account provisioned");
    Ok(account)
}

/// Validates and records one balanced transaction.
///
/// This is the only path that moves value between accounts.
///
/// # Errors
///
/// Returns [`CoreError::Validation`] for a non-positive amount, identical
/// legs, or an inactive account, and [`CoreError::Money`] on a currency
/// mismatch.
pub async fn post_transaction<T: LedgerRepository>(
    tx: &mut T,
    input: NewTransaction<'_>,
) -> Result<Transaction, CoreError> {
    // 1. Validate amount
    if !input.amount.is_positive() {
        return Err(CoreError::Validation(format!(
            "transaction amount must be positive, got {}",
            input.amount
        )));
    }

    // 2. Validate legs
    if input.debit.id == input.credit.id {
        return Err(CoreError::Validation(format!(
            "debit and credit account are both {}",
            input.debit.code
        )));
    }
    for account in [input.debit, input.credit] {
        if !account.is_active {
            return Err(CoreError::Validation(format!("account {} is inactive", account.code)));
        }
        if account.currency != input.amount.currency() {
            return Err(MoneyError::CurrencyMismatch {
                left: account.currency,
                right: input.amount.currency(),
            }
            .into());
        }
    }

    // 3. Record
    let transaction = Transaction {
        id: TransactionId::new(),
        debit_account_id: input.debit.id,
        credit_account_id: input.credit.id,
        amount: input.amount,
        transaction_type: input.transaction_type,
        description: input.description,
        income_id: input.income_id,
        created_by: input.created_by,
        created_at: Utc::now(),
    };
    tx.insert_transaction(&transaction).await?;

    info!(
        transaction_id = %transaction.id,
        debit = %input.debit.code,
        credit = %input.credit.code,
        amount = %transaction.amount,
        kind = %transaction.transaction_type,
        "transaction posted"
    );
    Ok(transaction)
}

/// Cash and sales revenue accounts from configuration.
pub(crate) async fn sale_accounts<T: LedgerRepository>(
    tx: &mut T,
    config: &LedgerConfig,
) -> Result<(Account, Account), CoreError> {
    let cash = get_or_create_account(tx, &config.cash_account, AccountType::Asset, config.currency).await?;
    let revenue = get_or_create_account(
        tx,
        &config.sales_revenue_account,
        AccountType::Revenue,
        config.currency,
    )
    .await?;
    Ok((cash, revenue))
}

/// Recognizes a completed sale: one income and one cash/revenue transaction.
///
/// The caller must already have checked that the sale has no income.
///
/// # Errors
///
/// Any failure aborts the caller's unit of work.
pub async fn record_sale_income<T: LedgerRepository>(
    tx: &mut T,
    sale: &Sale,
    config: &LedgerConfig,
    created_by: UserId,
) -> Result<(Income, Transaction), CoreError> {
    let (cash, revenue) = sale_accounts(tx, config).await?;
    let last_payment = sale.payments.last();

    let income = Income {
        id: IncomeId::new(),
        source: format!("Sale: {}", sale.sale_number),
        amount: sale.totals.net_amount,
        income_type: IncomeType::Sales,
        sale_id: Some(sale.id),
        reference: Some(sale.sale_number.clone()),
        is_paid: sale.totals.is_paid,
        payment_date: last_payment
            .filter(|_| sale.totals.is_paid)
            .map(|payment| payment.payment_date),
        payment_method: last_payment.map(|payment| payment.method),
        is_cancelled: false,
        cancelled_by: None,
        cancelled_at: None,
        cancellation_reason: None,
        created_by,
        created_at: Utc::now(),
    };
    tx.insert_income(&income).await?;

    let transaction = post_transaction(
        tx,
        NewTransaction {
            debit: &cash,
            credit: &revenue,
            amount: income.amount,
            transaction_type: TransactionType::Income,
            description: format!("Income from sale {}", sale.sale_number),
            income_id: Some(income.id),
            created_by,
        },
    )
    .await?;

    info!(
        sale_id = %sale.id,
        income_id = %income.id,
        amount = %income.amount,
        "sale income recognized"
    );
    Ok((income, transaction))
}

/// Flags the sale's income paid once the sale is settled. No-op without an income.
///
/// # Errors
///
/// Returns a storage error.
pub async fn mark_income_paid<T: LedgerRepository>(
    tx: &mut T,
    sale: &Sale,
) -> Result<Option<Income>, CoreError> {
    let Some(mut income) = tx.find_income_by_sale(sale.id).await? else {
        return Ok(None);
    };
    if income.is_paid || income.is_cancelled {
        return Ok(Some(income));
    }

    let last_payment = sale.payments.last();
    income.is_paid = true;
    income.payment_date = last_payment.map(|payment| payment.payment_date);
    income.payment_method = last_payment.map(|payment| payment.method);
    tx.update_income(&income).await?;

    info!(sale_id = %sale.id, income_id = %income.id, "income marked paid");
    Ok(Some(income))
}
