use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tallyflow_core::{AppError, AppResult, NonEmptyString};

use crate::ledger::{CostCenter, GlAccount};
use crate::security::Resource;

/// Kind of approvable financial item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Operational expense request.
    Expense,
    /// Income entry awaiting verification.
    IncomeEntry,
    /// Purchase order; requires delivery confirmation before posting.
    PurchaseOrder,
    /// Transfer of funds between accounts or branches.
    FundTransfer,
}

impl RecordKind {
    /// Returns a stable storage value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::IncomeEntry => "income_entry",
            Self::PurchaseOrder => "purchase_order",
            Self::FundTransfer => "fund_transfer",
        }
    }

    /// Returns all known record kinds.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[RecordKind] = &[
            RecordKind::Expense,
            RecordKind::IncomeEntry,
            RecordKind::PurchaseOrder,
            RecordKind::FundTransfer,
        ];

        ALL
    }

    /// Returns the permission resource guarding review actions on this kind.
    #[must_use]
    pub fn resource(&self) -> Resource {
        match self {
            Self::Expense => Resource::Expense,
            Self::IncomeEntry => Resource::IncomeEntry,
            Self::PurchaseOrder => Resource::PurchaseOrder,
            Self::FundTransfer => Resource::FundTransfer,
        }
    }
}

impl FromStr for RecordKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "expense" => Ok(Self::Expense),
            "income_entry" => Ok(Self::IncomeEntry),
            "purchase_order" => Ok(Self::PurchaseOrder),
            "fund_transfer" => Ok(Self::FundTransfer),
            _ => Err(AppError::Validation(format!(
                "unknown record kind '{value}'"
            ))),
        }
    }
}

/// Request priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Must be handled immediately.
    Urgent,
    /// Handle ahead of normal work.
    High,
    /// Normal handling.
    Medium,
    /// Handle when convenient.
    Low,
}

impl Priority {
    /// Returns a stable storage value for this priority.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "urgent" => Ok(Self::Urgent),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(AppError::Validation(format!("unknown priority '{value}'"))),
        }
    }
}

/// Workflow state of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    /// Submitted and waiting for a reviewer.
    PendingReview,
    /// Approved and waiting for ledger posting.
    Approved,
    /// Rejected by a reviewer. Terminal.
    Rejected,
    /// Suspended until the requester answers a query.
    Queried,
    /// Referred to the escalation role.
    ReferredToEscalation,
    /// Delivery confirmed, waiting for ledger posting.
    PendingPosting,
    /// Posted to accounts payable.
    PostedToAp,
    /// Released for payment.
    ReadyForPayment,
    /// Payment run in progress.
    PaymentProcessing,
    /// Settled. Terminal.
    Paid,
}

impl RecordState {
    /// Returns a stable storage value for this state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingReview => "pending_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Queried => "queried",
            Self::ReferredToEscalation => "referred_to_escalation",
            Self::PendingPosting => "pending_posting",
            Self::PostedToAp => "posted_to_ap",
            Self::ReadyForPayment => "ready_for_payment",
            Self::PaymentProcessing => "payment_processing",
            Self::Paid => "paid",
        }
    }

    /// Returns whether no further transition may leave this state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Paid)
    }

    /// Returns all known states.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[RecordState] = &[
            RecordState::PendingReview,
            RecordState::Approved,
            RecordState::Rejected,
            RecordState::Queried,
            RecordState::ReferredToEscalation,
            RecordState::PendingPosting,
            RecordState::PostedToAp,
            RecordState::ReadyForPayment,
            RecordState::PaymentProcessing,
            RecordState::Paid,
        ];

        ALL
    }
}

impl Display for RecordState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for RecordState {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|state| state.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown record state '{value}'")))
    }
}

/// Fulfillment sub-status maintained by the fulfillment collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    /// Goods or services not yet confirmed as received.
    Pending,
    /// Goods or services received.
    Executed,
}

impl FulfillmentStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Executed => "executed",
        }
    }
}

impl FromStr for FulfillmentStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "executed" => Ok(Self::Executed),
            _ => Err(AppError::Validation(format!(
                "unknown fulfillment status '{value}'"
            ))),
        }
    }
}

/// Settlement channel recorded when payment is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash disbursement.
    Cash,
    /// Card payment.
    Card,
    /// Bank transfer.
    Transfer,
    /// Insurance settlement.
    Insurance,
    /// Cheque.
    Cheque,
}

impl PaymentMethod {
    /// Returns a stable storage value for this method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::Transfer => "transfer",
            Self::Insurance => "insurance",
            Self::Cheque => "cheque",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            "transfer" => Ok(Self::Transfer),
            "insurance" => Ok(Self::Insurance),
            "cheque" => Ok(Self::Cheque),
            _ => Err(AppError::Validation(format!(
                "unknown payment method '{value}'"
            ))),
        }
    }
}

/// ISO-4217 style currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Currency used when a submission does not name one.
    pub const DEFAULT: &'static str = "NGN";

    /// Parses a three-letter currency code, normalizing to upper case.
    pub fn parse(value: &str) -> AppResult<Self> {
        let normalized = value.trim().to_ascii_uppercase();
        if normalized.len() != 3 || !normalized.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return Err(AppError::Validation(format!(
                "currency '{value}' must be a three-letter code"
            )));
        }

        Ok(Self(normalized))
    }

    /// Returns the code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

/// Fields supplied when a record is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionInput {
    /// Record kind.
    pub kind: RecordKind,
    /// Requested amount; must be non-negative.
    pub amount: Decimal,
    /// Optional currency code, defaults to NGN.
    pub currency: Option<String>,
    /// Requesting principal.
    pub requested_by: String,
    /// Owning department.
    pub department: String,
    /// Request priority.
    pub priority: Priority,
    /// Optional branch code.
    pub branch: Option<String>,
    /// Optional free-text description.
    pub description: Option<String>,
}

/// Field edits a requester may apply when resubmitting a queried record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEdits {
    /// Replacement amount.
    pub amount: Option<Decimal>,
    /// Replacement department.
    pub department: Option<String>,
    /// Replacement priority.
    pub priority: Option<Priority>,
    /// Replacement branch code.
    pub branch: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
}

impl RecordEdits {
    /// Returns whether no field is edited.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.department.is_none()
            && self.priority.is_none()
            && self.branch.is_none()
            && self.description.is_none()
    }
}

/// Stored field set used to rehydrate a record from persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRecordParts {
    /// Record identifier.
    pub record_id: String,
    /// Record kind.
    pub kind: RecordKind,
    /// Amount.
    pub amount: Decimal,
    /// Currency code.
    pub currency: String,
    /// Requesting principal.
    pub requested_by: String,
    /// Owning department.
    pub department: String,
    /// Priority.
    pub priority: Priority,
    /// Optional branch code.
    pub branch: Option<String>,
    /// Optional description.
    pub description: Option<String>,
    /// Cached workflow state.
    pub state: RecordState,
    /// Ledger account, once posted.
    pub gl_account: Option<String>,
    /// Cost center, once posted.
    pub cost_center: Option<String>,
    /// Purchase order fulfillment sub-status.
    pub fulfillment: Option<FulfillmentStatus>,
    /// Payment method, once processed.
    pub payment_method: Option<PaymentMethod>,
    /// Optimistic concurrency version.
    pub version: u64,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the latest committed transition.
    pub last_transition_at: DateTime<Utc>,
}

/// One approvable financial item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    record_id: NonEmptyString,
    kind: RecordKind,
    amount: Decimal,
    currency: CurrencyCode,
    requested_by: NonEmptyString,
    department: NonEmptyString,
    priority: Priority,
    branch: Option<String>,
    description: Option<String>,
    state: RecordState,
    gl_account: Option<GlAccount>,
    cost_center: Option<CostCenter>,
    fulfillment: Option<FulfillmentStatus>,
    payment_method: Option<PaymentMethod>,
    version: u64,
    created_at: DateTime<Utc>,
    last_transition_at: DateTime<Utc>,
}

impl WorkflowRecord {
    /// Version assigned at submission.
    pub const INITIAL_VERSION: u64 = 1;

    /// Creates a freshly submitted record in `pending_review`.
    pub fn submit(
        record_id: impl Into<String>,
        input: SubmissionInput,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        let SubmissionInput {
            kind,
            amount,
            currency,
            requested_by,
            department,
            priority,
            branch,
            description,
        } = input;

        validate_amount(amount)?;

        let currency = match currency {
            Some(value) => CurrencyCode::parse(value.as_str())?,
            None => CurrencyCode::default(),
        };

        let fulfillment = (kind == RecordKind::PurchaseOrder).then_some(FulfillmentStatus::Pending);
        // Page cursors and storage both carry microseconds.
        let now = now.trunc_subsecs(6);

        Ok(Self {
            record_id: NonEmptyString::new(record_id)?,
            kind,
            amount,
            currency,
            requested_by: NonEmptyString::new(requested_by).map_err(|_| {
                AppError::Validation("requested_by must not be empty".to_owned())
            })?,
            department: NonEmptyString::new(department)
                .map_err(|_| AppError::Validation("department must not be empty".to_owned()))?,
            priority,
            branch: normalize_optional(branch),
            description: normalize_optional(description),
            state: RecordState::PendingReview,
            gl_account: None,
            cost_center: None,
            fulfillment,
            payment_method: None,
            version: Self::INITIAL_VERSION,
            created_at: now,
            last_transition_at: now,
        })
    }

    /// Rehydrates a stored record, re-checking invariants.
    pub fn from_parts(parts: WorkflowRecordParts) -> AppResult<Self> {
        if parts.last_transition_at < parts.created_at {
            return Err(AppError::Internal(format!(
                "record '{}' has last_transition_at before created_at",
                parts.record_id
            )));
        }

        if parts.version < Self::INITIAL_VERSION {
            return Err(AppError::Internal(format!(
                "record '{}' has invalid version {}",
                parts.record_id, parts.version
            )));
        }

        Ok(Self {
            record_id: NonEmptyString::new(parts.record_id)?,
            kind: parts.kind,
            amount: parts.amount,
            currency: CurrencyCode::parse(parts.currency.as_str())?,
            requested_by: NonEmptyString::new(parts.requested_by)?,
            department: NonEmptyString::new(parts.department)?,
            priority: parts.priority,
            branch: parts.branch,
            description: parts.description,
            state: parts.state,
            gl_account: parts
                .gl_account
                .as_deref()
                .map(GlAccount::parse)
                .transpose()?,
            cost_center: parts
                .cost_center
                .as_deref()
                .map(CostCenter::parse)
                .transpose()?,
            fulfillment: parts.fulfillment,
            payment_method: parts.payment_method,
            version: parts.version,
            created_at: parts.created_at,
            last_transition_at: parts.last_transition_at,
        })
    }

    /// Returns the record identifier.
    #[must_use]
    pub fn record_id(&self) -> &NonEmptyString {
        &self.record_id
    }

    /// Returns the record kind.
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Returns the amount.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency code.
    #[must_use]
    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    /// Returns the requesting principal.
    #[must_use]
    pub fn requested_by(&self) -> &str {
        self.requested_by.as_str()
    }

    /// Returns the owning department.
    #[must_use]
    pub fn department(&self) -> &str {
        self.department.as_str()
    }

    /// Returns the priority.
    #[must_use]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the branch code.
    #[must_use]
    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the cached workflow state.
    #[must_use]
    pub fn state(&self) -> RecordState {
        self.state
    }

    /// Returns the ledger account stamped at posting.
    #[must_use]
    pub fn gl_account(&self) -> Option<&GlAccount> {
        self.gl_account.as_ref()
    }

    /// Returns the cost center stamped at posting.
    #[must_use]
    pub fn cost_center(&self) -> Option<&CostCenter> {
        self.cost_center.as_ref()
    }

    /// Returns the purchase order fulfillment sub-status.
    #[must_use]
    pub fn fulfillment(&self) -> Option<FulfillmentStatus> {
        self.fulfillment
    }

    /// Returns the payment method recorded at processing.
    #[must_use]
    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    /// Returns the optimistic concurrency version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the submission timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest transition timestamp.
    #[must_use]
    pub fn last_transition_at(&self) -> DateTime<Utc> {
        self.last_transition_at
    }

    /// Marks a purchase order's goods or services as received.
    ///
    /// Bumps the version so in-flight transitions observe the change.
    pub fn mark_fulfillment_executed(&self, now: DateTime<Utc>) -> AppResult<Self> {
        if self.kind != RecordKind::PurchaseOrder {
            return Err(AppError::Validation(format!(
                "record '{}' is not a purchase order",
                self.record_id
            )));
        }

        if self.state.is_terminal() {
            return Err(AppError::InvalidTransition(format!(
                "record '{}' is in terminal state '{}'",
                self.record_id, self.state
            )));
        }

        let mut updated = self.clone();
        updated.fulfillment = Some(FulfillmentStatus::Executed);
        updated.version += 1;
        updated.last_transition_at = now.max(self.last_transition_at);
        Ok(updated)
    }

    pub(crate) fn set_state(&mut self, state: RecordState) {
        self.state = state;
    }

    pub(crate) fn advance_version(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.last_transition_at = now.max(self.last_transition_at);
    }

    pub(crate) fn stamp_ledger_coding(&mut self, gl_account: GlAccount, cost_center: CostCenter) {
        self.gl_account = Some(gl_account);
        self.cost_center = Some(cost_center);
    }

    pub(crate) fn set_payment_method(&mut self, payment_method: PaymentMethod) {
        self.payment_method = Some(payment_method);
    }

    pub(crate) fn apply_edits(&mut self, edits: &RecordEdits) -> AppResult<()> {
        if let Some(amount) = edits.amount {
            validate_amount(amount)?;
            self.amount = amount;
        }

        if let Some(department) = &edits.department {
            self.department = NonEmptyString::new(department.clone())
                .map_err(|_| AppError::Validation("department must not be empty".to_owned()))?;
        }

        if let Some(priority) = edits.priority {
            self.priority = priority;
        }

        if edits.branch.is_some() {
            self.branch = normalize_optional(edits.branch.clone());
        }

        if edits.description.is_some() {
            self.description = normalize_optional(edits.description.clone());
        }

        Ok(())
    }
}

fn validate_amount(amount: Decimal) -> AppResult<()> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AppError::Validation(format!(
            "amount must be non-negative, got {amount}"
        )));
    }

    Ok(())
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim().to_owned();
        (!trimmed.is_empty()).then_some(trimmed)
    })
}
