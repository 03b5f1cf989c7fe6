//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_eligibility_client;
mod in_memory_eligibility_client;

pub use http_eligibility_client::HttpEligibilityClient;
pub use in_memory_eligibility_client::{EligibilityCallCounts, InMemoryEligibilityClient};
