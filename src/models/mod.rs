pub mod client_requests;
pub mod http_response;
pub mod identity;
pub mod settings;
pub mod views;
