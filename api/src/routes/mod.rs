pub mod chart_route;
pub mod chat_route;
pub mod ingest_route;
