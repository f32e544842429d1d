//! Payment reconciliation — the two-phase handshake with the card processor.
//!
//! The processor is an injected capability ([`PaymentProcessor`]), not a
//! process-global client, so the protocol can run against a test double.
//! Remote calls happen while no transaction or lock is held; the local state
//! transition is applied only after the processor's verdict is known, through
//! the ledger's compare-and-swap. The processor is the single source of
//! truth for success: local state never implies a payment succeeded.

use async_trait::async_trait;
use funding::{money, FundingError, Investment, PaymentStatus, Principal};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::config::Config;
use crate::db;
use crate::errors::Result;
use crate::ledger;

/// Exact status token the processor reports for a successful intent.
/// Case-sensitive by contract.
pub const INTENT_SUCCEEDED: &str = "succeeded";

/// Metadata attached to every payment intent.
#[derive(Debug, Clone)]
pub struct IntentMetadata {
    pub investment_id: i64,
    pub project_title: String,
    pub investor_email: String,
}

/// Processor-side handle for an authorised-but-unconfirmed payment.
#[derive(Debug, Clone)]
pub struct CreatedIntent {
    pub intent_id: String,
    pub client_secret: String,
}

/// External card-processing collaborator.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create a payment intent for `amount_minor` minor units of `currency`.
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: &IntentMetadata,
    ) -> std::result::Result<CreatedIntent, FundingError>;

    /// Retrieve the current status token of an intent.
    async fn retrieve_payment_intent(
        &self,
        intent_id: &str,
    ) -> std::result::Result<String, FundingError>;
}

// ─────────────────────────────────────────────────────────
// Stripe gateway
// ─────────────────────────────────────────────────────────

/// Production [`PaymentProcessor`] speaking the Stripe payment-intents API
/// over plain HTTPS.
pub struct StripeGateway {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct StripeIntent {
    id: String,
    client_secret: Option<String>,
    status: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: String,
}

impl StripeGateway {
    pub fn new(client: reqwest::Client, api_base: String, secret_key: String) -> Self {
        Self {
            client,
            api_base,
            secret_key,
        }
    }

    async fn parse_intent(response: reqwest::Response) -> std::result::Result<StripeIntent, FundingError> {
        if response.status().is_success() {
            response
                .json::<StripeIntent>()
                .await
                .map_err(|e| FundingError::PaymentProvider(format!("bad intent payload: {e}")))
        } else {
            let status = response.status();
            let message = match response.json::<StripeErrorBody>().await {
                Ok(body) => body.error.message,
                Err(_) => format!("HTTP {status}"),
            };
            Err(FundingError::PaymentProvider(message))
        }
    }
}

#[async_trait]
impl PaymentProcessor for StripeGateway {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: &IntentMetadata,
    ) -> std::result::Result<CreatedIntent, FundingError> {
        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&[
                ("amount", amount_minor.to_string()),
                ("currency", currency.to_string()),
                (
                    "metadata[investment_id]",
                    metadata.investment_id.to_string(),
                ),
                ("metadata[project_title]", metadata.project_title.clone()),
                ("metadata[investor_email]", metadata.investor_email.clone()),
            ])
            .send()
            .await
            .map_err(|e| FundingError::PaymentProvider(e.to_string()))?;

        let intent = Self::parse_intent(response).await?;
        let client_secret = intent.client_secret.ok_or_else(|| {
            FundingError::PaymentProvider("intent created without a client secret".into())
        })?;
        Ok(CreatedIntent {
            intent_id: intent.id,
            client_secret,
        })
    }

    async fn retrieve_payment_intent(
        &self,
        intent_id: &str,
    ) -> std::result::Result<String, FundingError> {
        let response = self
            .client
            .get(format!("{}/v1/payment_intents/{intent_id}", self.api_base))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| FundingError::PaymentProvider(e.to_string()))?;

        Ok(Self::parse_intent(response).await?.status)
    }
}

// ─────────────────────────────────────────────────────────
// Phase 1 — intent creation
// ─────────────────────────────────────────────────────────

/// Create a processor intent for a pending investment and store its handle.
///
/// On processor failure nothing is written: the investment stays `Pending`
/// with no intent id and the call is safe to retry.
pub async fn create_intent(
    pool: &SqlitePool,
    processor: &dyn PaymentProcessor,
    config: &Config,
    principal: &Principal,
    investment_id: i64,
) -> Result<CreatedIntent> {
    let (investment, project_title) = load_for(pool, principal, investment_id).await?;

    if investment.status != PaymentStatus::Pending {
        return Err(FundingError::InvalidState(format!(
            "investment {investment_id} has already been processed"
        ))
        .into());
    }

    let metadata = IntentMetadata {
        investment_id,
        project_title,
        investor_email: investment.investor_email.clone(),
    };
    let amount_minor = money::to_minor_units(investment.amount)?;

    // Remote call first, no locks held; the handle is only persisted once the
    // processor has committed to it.
    let intent = processor
        .create_payment_intent(amount_minor, &config.currency, &metadata)
        .await?;

    let mut conn = pool.acquire().await?;
    let rows = db::store_intent(&mut conn, investment_id, &intent.intent_id, &intent.client_secret)
        .await?;
    if rows == 0 {
        // Confirmed (or failed) while we were talking to the processor.
        warn!(investment = investment_id, "intent created for a non-pending investment");
        return Err(FundingError::InvalidState(format!(
            "investment {investment_id} is no longer PENDING"
        ))
        .into());
    }

    info!(investment = investment_id, intent = %intent.intent_id, "payment intent created");
    Ok(intent)
}

// ─────────────────────────────────────────────────────────
// Phase 2 — confirmation
// ─────────────────────────────────────────────────────────

/// Reconcile an investment with the processor's verdict on its intent.
///
/// Read-then-decide: the intent status is fetched fresh from the processor
/// and mapped onto `settle`/`fail`. A duplicate confirmation is rejected by
/// the ledger CAS, so aggregation can never run twice for one investment.
pub async fn confirm_payment(
    pool: &SqlitePool,
    processor: &dyn PaymentProcessor,
    principal: &Principal,
    investment_id: i64,
    intent_id: &str,
) -> Result<Investment> {
    let (investment, _) = load_for(pool, principal, investment_id).await?;

    let stored = investment.intent_id.as_deref().ok_or_else(|| {
        FundingError::InvalidState(format!("investment {investment_id} has no payment intent"))
    })?;
    if stored != intent_id {
        return Err(FundingError::IntentMismatch.into());
    }
    if investment.status != PaymentStatus::Pending {
        return Err(FundingError::InvalidState(format!(
            "investment {investment_id} has already been processed"
        ))
        .into());
    }

    // The processor is the sole authority on the outcome.
    let status = processor.retrieve_payment_intent(stored).await?;

    if status == INTENT_SUCCEEDED {
        ledger::settle(pool, investment_id).await
    } else {
        warn!(
            investment = investment_id,
            status = %status,
            "processor reported non-success, failing investment"
        );
        ledger::fail(pool, investment_id).await?;
        Err(FundingError::PaymentFailed.into())
    }
}

/// Load an investment plus its project title, enforcing that the caller is
/// the investor of record.
async fn load_for(
    pool: &SqlitePool,
    principal: &Principal,
    investment_id: i64,
) -> Result<(Investment, String)> {
    let mut conn = pool.acquire().await?;
    let investment: Investment = db::get_investment(&mut conn, investment_id)
        .await?
        .ok_or(FundingError::not_found("investment", investment_id))?
        .try_into()?;

    if investment.investor_id != principal.id {
        return Err(FundingError::Forbidden.into());
    }

    let project = db::get_project(&mut conn, investment.project_id)
        .await?
        .ok_or(FundingError::not_found("project", investment.project_id))?;
    Ok((investment, project.title))
}

// ─────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────
