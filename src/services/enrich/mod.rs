pub mod graph_claims;

pub use graph_claims::{ClaimsEnricher, GraphClaimsEnricher};
