pub mod aggregate_service;
pub mod chart_service;
pub mod fetch_service;
pub mod intent_service;
pub mod pipeline_service;
