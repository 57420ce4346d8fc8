//! Single-email analysis with local validation in front of the network.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::types::{AnalysisResult, ClientError};

#[derive(Debug, Clone)]
pub struct SingleAnalysisClient {
    api: Arc<ApiClient>,
}

impl SingleAnalysisClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Normalizes the address, rejects obvious non-emails without a
    /// request, then asks the service for an analysis.
    pub async fn analyze(
        &self,
        email: &str,
        force_refresh: bool,
    ) -> Result<AnalysisResult, ClientError> {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(ClientError::Validation(format!(
                "'{email}' is not a valid email address"
            )));
        }
        self.api.analyze(&email, force_refresh).await
    }
}

/// Syntactic check: plausible local part, dotted domain, alphabetic TLD.
pub fn is_valid_email(input: &str) -> bool {
    let Some((local, domain)) = input.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    if !local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-'))
    {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    labels.last().is_some_and(|tld| {
        tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
    }) && labels.iter().all(|label| {
        !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}
