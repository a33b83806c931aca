//! Request DTOs for the audit service API
//!
//! Defines the structure of incoming HTTP request bodies. Snapshots,
//! observations, policies and benchmark bundles are accepted in their
//! domain form directly.

use serde::Deserialize;

use crate::monitor::ReputationAnswer;

/// Maximum accepted length of a domain name.
const MAX_DOMAIN_LEN: usize = 253;

/// Request body for registering a page or committing a navigation
/// (`PUT /tabs/:tab`, `POST /tabs/:tab/navigation`)
#[derive(Debug, Clone, Deserialize)]
pub struct PageRequest {
    pub url: String,
}

/// Request body for `PUT /tabs/:tab/reputations` and `PUT /trackers`
#[derive(Debug, Clone, Deserialize)]
pub struct ReputationsRequest {
    pub reputations: Vec<ReputationAnswer>,
}

impl ReputationsRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        self.reputations
            .iter()
            .find_map(|answer| validate_domain(&answer.domain))
    }
}

/// Request body for `PUT /categories`
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRequest {
    pub domain: String,
    pub category: String,
}

impl CategoryRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if let Some(error) = validate_domain(&self.domain) {
            return Some(error);
        }
        if self.category.is_empty() {
            return Some("Category cannot be empty".to_string());
        }
        None
    }
}

fn validate_domain(domain: &str) -> Option<String> {
    if domain.is_empty() {
        return Some("Domain cannot be empty".to_string());
    }
    if domain.len() > MAX_DOMAIN_LEN {
        return Some(format!(
            "Domain exceeds maximum length of {} characters",
            MAX_DOMAIN_LEN
        ));
    }
    None
}
