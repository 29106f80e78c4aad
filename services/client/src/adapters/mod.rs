pub mod dto;
pub mod http;
pub mod storage;

pub use http::{build_http_client, HttpAuthGateway, HttpRecordSource};
pub use storage::FileCredentialStore;
