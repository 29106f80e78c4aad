pub mod auth;
pub mod check;
pub mod derive;
pub mod domain;
pub mod guard;
pub mod memory;
pub mod pipeline;
pub mod ports;
pub mod session;

pub use auth::AuthService;
pub use check::submit_check;
pub use domain::{AuthToken, CheckRequest, Explanation, FilterState, Highlight, LoginRequest, ModelInfo,
    PageWindow, Record, RegisterRequest, SessionState, SocialPost, SortOrder, StatusFilter, Verdict,
    ViewSnapshot};
pub use guard::{GuardDecision, Route, RouteGuard};
pub use memory::MemoryCredentialStore;
pub use pipeline::HistoryView;
pub use ports::{AuthGateway, CredentialStore, Navigator, PortError, PortResult, RecordSource};
pub use session::{ExpiryPolicy, SessionValidator};
