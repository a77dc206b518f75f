pub mod excel;
pub mod ingestor;
pub mod project_store;
pub mod storage_client;
