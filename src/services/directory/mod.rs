pub mod client;
pub mod graph;
pub mod token;

pub use client::{DirectoryClient, DirectoryError, DirectoryResult, MailboxSettings, UserProfile};
pub use graph::GraphClient;
pub use token::{ClientCredentialsProvider, TokenError, TokenProvider};
