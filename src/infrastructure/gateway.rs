use crate::domain::ports::{PaymentProvider, ProviderCharge, ProviderIntent, ProviderOutcome};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The local payment fallback.
///
/// Stands in for the real gateway whenever one is not configured or not
/// reachable. It issues a navigable confirmation target and records the
/// outcome the user picks there via `settle`. For references issued here the
/// client-claimed outcome is authoritative by design; this is the documented
/// weaker-security mode, not a property of the real provider path.
#[derive(Clone)]
pub struct SimulatedGateway {
    base_url: String,
    settled: Arc<RwLock<HashMap<String, ProviderOutcome>>>,
}

impl SimulatedGateway {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            settled: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Records the outcome chosen on the confirmation page.
    pub async fn settle(&self, reference: &str, outcome: ProviderOutcome) {
        let mut settled = self.settled.write().await;
        settled.insert(reference.to_string(), outcome);
    }
}

#[async_trait]
impl PaymentProvider for SimulatedGateway {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn initialize(&self, charge: ProviderCharge) -> Result<ProviderIntent> {
        tracing::info!(reference = %charge.reference, amount = %charge.amount, "simulated payment initialized");
        Ok(ProviderIntent {
            authorization_url: format!(
                "{}/payment/simulated?reference={}",
                self.base_url, charge.reference
            ),
            reference: charge.reference,
        })
    }

    async fn verify(&self, reference: &str) -> Result<ProviderOutcome> {
        let settled = self.settled.read().await;
        Ok(settled
            .get(reference)
            .copied()
            .unwrap_or(ProviderOutcome::Pending))
    }
}
