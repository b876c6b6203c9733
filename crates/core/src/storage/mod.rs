//! Storage capability, container read tokens and URL resolution.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   ┌────────────────────┐   ┌─────────────────────┐
//! │ StorageSettings  │──▶│ StorageConfig      │──▶│ ReadTokenProvider   │
//! │ (tenant config)  │   │ (enabled/private,  │   │ join(user_files,    │
//! └──────────────────┘   │  host, containers) │   │      content)       │
//!                        └────────────────────┘   └──────────┬──────────┘
//!                                                            ▼
//!                                                 ┌─────────────────────┐
//!                                                 │ StorageUrlResolver  │
//!                                                 │ url -> url?token    │
//!                                                 └─────────────────────┘
//! ```

mod config;
mod error;
mod provider;
mod resolver;
mod token;

pub use config::{
    ContainerKind, ContainerNames, StorageConfig, is_protected, resolve_storage_config,
};
pub use error::TokenIssueError;
pub use provider::ReadTokenProvider;
pub use resolver::{ACCESS_NOT_ALLOWED_IMAGE, StorageUrlResolver};
pub use token::{
    CachingTokenIssuer, ContainerReadToken, ReadTokenSet, ScopedTokenIssuer, TokenIssuer,
};
