pub mod auth;
pub mod cascade;
pub mod catalog;
pub mod config;
pub mod crossref;
pub mod metrics;
pub mod provider;
pub mod scheduler;
pub mod sync;
pub mod testing;

pub use auth::{
    create_authenticator, ApiKeyAuthenticator, AuthError, AuthRequest, Authenticator, Identity,
    NoneAuthenticator,
};
pub use cascade::{CascadeDeleter, CascadeError, CascadeReport, CascadeStep};
pub use catalog::{
    ActorFields, ActorRecord, ActorUpsert, CastEntry, CatalogError, CatalogStats, CatalogStore,
    FilmographyEntry, MovieFields, MovieRecord, MovieRef, SqliteCatalogStore,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthMethod, Config, ConfigError,
    SanitizedConfig,
};
pub use crossref::{CrossRefReport, CrossReferenceMaintainer, DIRECTOR_CHARACTER};
pub use provider::{
    ListingPage, MetadataProvider, MovieDetail, MovieSummary, ProviderError, TmdbConfig,
    TmdbProvider,
};
pub use scheduler::{IntervalTicker, SchedulerConfig, SchedulerStatus, SyncScheduler, Ticker};
pub use sync::{SyncConfig, SyncError, SyncJob, SyncKind, SyncPhase, SyncStatus, SyncSummary};
