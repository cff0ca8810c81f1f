pub mod advisory_watcher;
pub mod api_client;
