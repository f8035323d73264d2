use std::sync::Arc;

use crate::{
    domain::{MessagingId, NormalizedPhone},
    messaging::port::MessagingClient,
};

/// Resolves a normalized phone number to a personal messaging id.
pub struct IdentityResolver {
    client: Arc<dyn MessagingClient>,
}

impl IdentityResolver {
    pub fn new(client: Arc<dyn MessagingClient>) -> Self {
        Self { client }
    }

    /// `None` when the number cannot be messaged.
    ///
    /// A failed lookup (including transport errors) is reported the same way as
    /// a number with no account. This conflates transient faults with genuine
    /// negatives; the failure is logged so the two can still be told apart.
    pub async fn resolve(&self, phone: &NormalizedPhone) -> Option<MessagingId> {
        match self.client.lookup_number(phone).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(phone = %phone, error = %e, "number lookup failed; treating as unregistered");
                None
            }
        }
    }
}
