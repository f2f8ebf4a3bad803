//! Initial database migration.
//!
//! Creates the inventory, sales, ledger, and audit tables with their
//! constraints and indexes.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: INVENTORY
        // ============================================================
        db.execute_unprepared(ITEMS_SQL).await?;
        db.execute_unprepared(STOCK_HISTORY_SQL).await?;
        db.execute_unprepared(STOCK_INS_SQL).await?;
        db.execute_unprepared(STOCK_ADJUSTMENTS_SQL).await?;
        db.execute_unprepared(STOCK_OUTS_SQL).await?;

        // ============================================================
        // PART 2: SALES
        // ============================================================
        db.execute_unprepared(CUSTOMERS_SQL).await?;
        db.execute_unprepared(SALES_SQL).await?;
        db.execute_unprepared(SALE_ITEMS_SQL).await?;
        db.execute_unprepared(PAYMENTS_SQL).await?;

        // ============================================================
        // PART 3: LEDGER
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(INCOMES_SQL).await?;
        db.execute_unprepared(TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 4: AUDIT
        // ============================================================
        db.execute_unprepared(AUDIT_LOGS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ITEMS_SQL: &str = r"
CREATE TABLE items (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    sku VARCHAR(100) UNIQUE,
    category VARCHAR(50) NOT NULL,
    unit_of_measure VARCHAR(50) NOT NULL,
    quantity NUMERIC(18, 3) NOT NULL DEFAULT 0,
    reorder_level NUMERIC(18, 3) NOT NULL DEFAULT 0,
    minimum_stock NUMERIC(18, 3) NOT NULL DEFAULT 0,
    selling_price NUMERIC(18, 2),
    price_currency CHAR(3),
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_item_quantity CHECK (quantity >= 0),
    CONSTRAINT chk_item_thresholds CHECK (minimum_stock >= 0 AND reorder_level >= minimum_stock)
);

CREATE UNIQUE INDEX idx_items_active_name ON items(lower(name)) WHERE is_active = true;
CREATE INDEX idx_items_category ON items(category);
";

const STOCK_HISTORY_SQL: &str = r"
CREATE TABLE stock_history (
    id UUID PRIMARY KEY,
    item_id UUID NOT NULL REFERENCES items(id),
    movement VARCHAR(20) NOT NULL,
    quantity NUMERIC(18, 3) NOT NULL,
    previous_quantity NUMERIC(18, 3) NOT NULL,
    new_quantity NUMERIC(18, 3) NOT NULL,
    reference_id UUID NOT NULL,
    notes TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_history_movement CHECK (movement IN ('STOCK_IN', 'STOCK_OUT', 'ADJUSTMENT')),
    CONSTRAINT chk_history_delta CHECK (new_quantity = previous_quantity + quantity),
    CONSTRAINT chk_history_non_negative CHECK (new_quantity >= 0)
);

CREATE INDEX idx_stock_history_item ON stock_history(item_id, created_at);
CREATE INDEX idx_stock_history_reference ON stock_history(reference_id);
";

const STOCK_INS_SQL: &str = r"
CREATE TABLE stock_ins (
    id UUID PRIMARY KEY,
    item_id UUID NOT NULL REFERENCES items(id),
    quantity NUMERIC(18, 3) NOT NULL,
    source VARCHAR(50) NOT NULL,
    supplier VARCHAR(255),
    reference VARCHAR(255),
    notes TEXT,
    status VARCHAR(20) NOT NULL DEFAULT 'pending',
    reviewed_by UUID,
    reviewed_at TIMESTAMPTZ,
    rejection_reason TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_stock_in_quantity CHECK (quantity > 0),
    CONSTRAINT chk_stock_in_status CHECK (status IN ('pending', 'approved', 'rejected'))
);

CREATE INDEX idx_stock_ins_item ON stock_ins(item_id);
CREATE INDEX idx_stock_ins_pending ON stock_ins(created_at) WHERE status = 'pending';
";

const STOCK_ADJUSTMENTS_SQL: &str = r"
CREATE TABLE stock_adjustments (
    id UUID PRIMARY KEY,
    item_id UUID NOT NULL REFERENCES items(id),
    adjustment_quantity NUMERIC(18, 3) NOT NULL,
    adjustment_type VARCHAR(50) NOT NULL,
    reason TEXT NOT NULL,
    status VARCHAR(20) NOT NULL DEFAULT 'pending',
    reviewed_by UUID,
    reviewed_at TIMESTAMPTZ,
    rejection_reason TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_adjustment_non_zero CHECK (adjustment_quantity <> 0),
    CONSTRAINT chk_adjustment_status CHECK (status IN ('pending', 'approved', 'rejected'))
);

CREATE INDEX idx_stock_adjustments_item ON stock_adjustments(item_id);
";

const STOCK_OUTS_SQL: &str = r"
CREATE TABLE stock_outs (
    id UUID PRIMARY KEY,
    purpose VARCHAR(50) NOT NULL,
    linked_sale_id UUID,
    issued_to VARCHAR(255),
    reference VARCHAR(255),
    notes TEXT,
    status VARCHAR(20) NOT NULL DEFAULT 'pending',
    reviewed_by UUID,
    reviewed_at TIMESTAMPTZ,
    rejection_reason TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_stock_out_status CHECK (status IN ('pending', 'approved', 'rejected'))
);

CREATE INDEX idx_stock_outs_sale ON stock_outs(linked_sale_id) WHERE linked_sale_id IS NOT NULL;
CREATE INDEX idx_stock_outs_pending ON stock_outs(created_at) WHERE status = 'pending';

CREATE TABLE stock_out_lines (
    id UUID PRIMARY KEY,
    stock_out_id UUID NOT NULL REFERENCES stock_outs(id) ON DELETE CASCADE,
    item_id UUID NOT NULL REFERENCES items(id),
    quantity NUMERIC(18, 3) NOT NULL,
    CONSTRAINT chk_stock_out_line_quantity CHECK (quantity > 0)
);

CREATE INDEX idx_stock_out_lines_stock_out ON stock_out_lines(stock_out_id);
";

const CUSTOMERS_SQL: &str = r"
CREATE TABLE customers (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    customer_type VARCHAR(50) NOT NULL,
    phone VARCHAR(50),
    email VARCHAR(255),
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE UNIQUE INDEX idx_customers_name ON customers(lower(name));
";

const SALES_SQL: &str = r"
CREATE TABLE sales (
    id UUID PRIMARY KEY,
    sale_number VARCHAR(100) NOT NULL UNIQUE,
    sale_type VARCHAR(20) NOT NULL,
    customer_id UUID NOT NULL REFERENCES customers(id),
    status VARCHAR(20) NOT NULL DEFAULT 'DRAFT',
    currency CHAR(3) NOT NULL,
    total_amount NUMERIC(18, 2) NOT NULL DEFAULT 0,
    tax_amount NUMERIC(18, 2) NOT NULL DEFAULT 0,
    discount_amount NUMERIC(18, 2) NOT NULL DEFAULT 0,
    net_amount NUMERIC(18, 2) NOT NULL DEFAULT 0,
    amount_paid NUMERIC(18, 2) NOT NULL DEFAULT 0,
    balance_due NUMERIC(18, 2) NOT NULL DEFAULT 0,
    is_paid BOOLEAN NOT NULL DEFAULT false,
    inventory_stock_out_id UUID REFERENCES stock_outs(id) ON DELETE SET NULL,
    is_stock_out_requested BOOLEAN NOT NULL DEFAULT false,
    stock_out_request_date TIMESTAMPTZ,
    stock_out_processed_date TIMESTAMPTZ,
    approved_by UUID,
    approved_at TIMESTAMPTZ,
    notes TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_sale_status CHECK (
        status IN ('DRAFT', 'PENDING', 'APPROVED', 'STOCK_OUT_PENDING', 'COMPLETED', 'CANCELLED')
    ),
    CONSTRAINT chk_sale_balance CHECK (balance_due >= 0),
    CONSTRAINT chk_sale_discount CHECK (discount_amount >= 0)
);

CREATE INDEX idx_sales_customer ON sales(customer_id);
CREATE INDEX idx_sales_status ON sales(status, created_at DESC);
";

const SALE_ITEMS_SQL: &str = r"
CREATE TABLE sale_items (
    id UUID PRIMARY KEY,
    sale_id UUID NOT NULL REFERENCES sales(id) ON DELETE CASCADE,
    item_id UUID NOT NULL REFERENCES items(id),
    quantity NUMERIC(18, 3) NOT NULL,
    unit_price NUMERIC(18, 2) NOT NULL,
    tax_rate NUMERIC(6, 3) NOT NULL DEFAULT 0,
    total_price NUMERIC(18, 2) NOT NULL,
    tax_amount NUMERIC(18, 2) NOT NULL,
    is_stocked_out BOOLEAN NOT NULL DEFAULT false,
    stock_out_date TIMESTAMPTZ,
    UNIQUE (sale_id, item_id),
    CONSTRAINT chk_sale_item_quantity CHECK (quantity > 0),
    CONSTRAINT chk_sale_item_price CHECK (unit_price > 0),
    CONSTRAINT chk_sale_item_tax CHECK (tax_rate >= 0 AND tax_rate <= 100)
);
";

const PAYMENTS_SQL: &str = r"
CREATE TABLE payments (
    id UUID PRIMARY KEY,
    sale_id UUID NOT NULL REFERENCES sales(id) ON DELETE CASCADE,
    amount NUMERIC(18, 2) NOT NULL,
    currency CHAR(3) NOT NULL,
    method VARCHAR(50) NOT NULL,
    reference_number VARCHAR(255),
    notes TEXT,
    payment_date TIMESTAMPTZ NOT NULL DEFAULT now(),
    received_by UUID NOT NULL,
    CONSTRAINT chk_payment_amount CHECK (amount > 0)
);

CREATE INDEX idx_payments_sale ON payments(sale_id);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    code VARCHAR(50) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    account_type VARCHAR(20) NOT NULL,
    currency CHAR(3) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_account_type CHECK (
        account_type IN ('asset', 'liability', 'equity', 'revenue', 'expense')
    )
);
";

const INCOMES_SQL: &str = r"
CREATE TABLE incomes (
    id UUID PRIMARY KEY,
    source VARCHAR(255) NOT NULL,
    amount NUMERIC(18, 2) NOT NULL,
    currency CHAR(3) NOT NULL,
    income_type VARCHAR(20) NOT NULL,
    sale_id UUID UNIQUE REFERENCES sales(id),
    reference VARCHAR(255),
    is_paid BOOLEAN NOT NULL DEFAULT false,
    payment_date TIMESTAMPTZ,
    payment_method VARCHAR(50),
    is_cancelled BOOLEAN NOT NULL DEFAULT false,
    cancelled_by UUID,
    cancelled_at TIMESTAMPTZ,
    cancellation_reason TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_income_amount CHECK (amount > 0)
);
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY,
    debit_account_id UUID NOT NULL REFERENCES accounts(id),
    credit_account_id UUID NOT NULL REFERENCES accounts(id),
    amount NUMERIC(18, 2) NOT NULL,
    currency CHAR(3) NOT NULL,
    transaction_type VARCHAR(20) NOT NULL,
    description TEXT NOT NULL,
    income_id UUID REFERENCES incomes(id),
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_transaction_amount CHECK (amount > 0),
    CONSTRAINT chk_transaction_legs CHECK (debit_account_id <> credit_account_id)
);

CREATE INDEX idx_transactions_debit ON transactions(debit_account_id);
CREATE INDEX idx_transactions_credit ON transactions(credit_account_id);
CREATE INDEX idx_transactions_income ON transactions(income_id) WHERE income_id IS NOT NULL;
";

const AUDIT_LOGS_SQL: &str = r"
CREATE TABLE audit_logs (
    id UUID PRIMARY KEY,
    actor_id UUID NOT NULL,
    actor_name VARCHAR(255) NOT NULL,
    action VARCHAR(20) NOT NULL,
    module VARCHAR(20) NOT NULL,
    object_type VARCHAR(50) NOT NULL,
    object_id VARCHAR(100) NOT NULL,
    description TEXT NOT NULL,
    before_data JSONB,
    after_data JSONB,
    occurred_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_audit_logs_object ON audit_logs(object_type, object_id);
CREATE INDEX idx_audit_logs_occurred ON audit_logs(occurred_at DESC);
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

DROP TABLE IF EXISTS audit_logs CASCADE;
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS incomes CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP TABLE IF EXISTS payments CASCADE;
DROP TABLE IF EXISTS sale_items CASCADE;
DROP TABLE IF EXISTS sales CASCADE;
DROP TABLE IF EXISTS customers CASCADE;
DROP TABLE IF EXISTS stock_out_lines CASCADE;
DROP TABLE IF EXISTS stock_outs CASCADE;
DROP TABLE IF EXISTS stock_adjustments CASCADE;
DROP TABLE IF EXISTS stock_ins CASCADE;
DROP TABLE IF EXISTS stock_history CASCADE;
DROP TABLE IF EXISTS items CASCADE;
";
