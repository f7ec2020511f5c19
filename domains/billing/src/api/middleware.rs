//! Billing domain application state

use crate::BillingRepositories;

/// Application state for the Billing domain
#[derive(Clone)]
pub struct BillingState {
    pub repos: BillingRepositories,
    /// Base URL used to build invoice document locators
    pub app_base_url: String,
}
