pub mod config;
pub mod controller;
pub mod credentials;
pub mod error;
pub mod feed;
pub mod ingest;
pub mod scope;
pub mod view;

pub use config::ClientSettings;
pub use controller::{SessionController, SessionStatus};
pub use credentials::HttpCredentialProvider;
pub use error::{ConnectionError, SessionError};
pub use feed::{CueFeed, CueFeedStore, CueFeedUpdate};
pub use ingest::IngestStats;
pub use scope::SessionScope;
pub use view::{render_view, SessionView};
