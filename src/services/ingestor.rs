use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use serde::Serialize;

use crate::error::AppError;
use crate::models::{ParsedBusinessPlan, ProjectStatus};
use crate::services::excel::{read_workbook, WorkbookExtractor};
use crate::services::project_store::ProjectStore;
use crate::services::storage_client::StorageClient;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    pub project_id: String,
    pub sections: Vec<&'static str>,
}

/// Download, decode, extract and store pipeline for one project upload.
#[derive(Clone)]
pub struct PlanIngestor {
    store: Arc<ProjectStore>,
    storage: StorageClient,
    extractor: WorkbookExtractor,
}

impl PlanIngestor {
    pub fn new(store: Arc<ProjectStore>, storage: StorageClient, extractor: WorkbookExtractor) -> Self {
        Self {
            store,
            storage,
            extractor,
        }
    }

    pub async fn ingest(&self, project_id: &str, file_path: &str) -> Result<IngestSummary, AppError> {
        let start = Instant::now();
        tracing::info!("Starting ingestion for project {} from {}", project_id, file_path);
        self.store.set_status(project_id, ProjectStatus::Processing)?;

        let result = match self.storage.download(file_path).await {
            Ok(file_data) => self.store_plan(project_id, file_data),
            Err(e) => Err(e),
        };

        let result = self.finish(project_id, result);
        tracing::info!("Ingestion for project {} finished in {:?}", project_id, start.elapsed());
        result
    }

    /// Same pipeline for a body that is already in memory.
    pub fn ingest_bytes(&self, project_id: &str, file_data: Bytes) -> Result<IngestSummary, AppError> {
        self.store.set_status(project_id, ProjectStatus::Processing)?;
        let result = self.store_plan(project_id, file_data);
        self.finish(project_id, result)
    }

    pub fn extract_bytes(&self, file_data: Bytes) -> Result<ParsedBusinessPlan, AppError> {
        let workbook = read_workbook(file_data)?;
        Ok(self.extractor.extract(&workbook))
    }

    fn store_plan(&self, project_id: &str, file_data: Bytes) -> Result<IngestSummary, AppError> {
        let plan = self.extract_bytes(file_data)?;
        self.store.replace_plan(project_id, &plan)?;

        Ok(IngestSummary {
            project_id: project_id.to_string(),
            sections: plan.section_names(),
        })
    }

    fn finish(
        &self,
        project_id: &str,
        result: Result<IngestSummary, AppError>,
    ) -> Result<IngestSummary, AppError> {
        let status = match &result {
            Ok(summary) => {
                tracing::info!("Project {} ready with sections {:?}", project_id, summary.sections);
                ProjectStatus::Ready
            }
            Err(e) => {
                tracing::error!("Ingestion failed for project {}: {}", project_id, e);
                ProjectStatus::Error
            }
        };

        if let Err(e) = self.store.set_status(project_id, status) {
            tracing::error!("Failed to record status for project {}: {}", project_id, e);
            if result.is_ok() {
                return Err(e);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::services::excel::layout::{KPI_SHEET, YEAR1_SHEET};

    fn ingestor(base_url: &str) -> (PlanIngestor, Arc<ProjectStore>) {
        let store = Arc::new(ProjectStore::in_memory().unwrap());
        let storage = StorageClient::new(
            StorageConfig {
                base_url: base_url.to_string(),
                bucket: "excel-files".to_string(),
                service_key: "key".to_string(),
            },
            1024 * 1024,
        );
        (
            PlanIngestor::new(store.clone(), storage, WorkbookExtractor::default()),
            store,
        )
    }

    fn plan_xlsx() -> Bytes {
        let mut book = rust_xlsxwriter::Workbook::new();

        let kpi = book.add_worksheet();
        kpi.set_name(KPI_SHEET).unwrap();
        kpi.write_number(1, 2, 450000.0).unwrap();
        kpi.write_number(8, 2, 120000.0).unwrap();

        let year1 = book.add_worksheet();
        year1.set_name(YEAR1_SHEET).unwrap();
        year1.write_number(5, 4, 18.0).unwrap();

        book.add_worksheet().set_name("Notes").unwrap();

        Bytes::from(book.save_to_buffer().unwrap())
    }

    #[test]
    fn test_ingest_bytes_stores_present_sections() {
        let (ingestor, store) = ingestor("http://localhost");
        let summary = ingestor.ingest_bytes("p1", plan_xlsx()).unwrap();

        assert_eq!(summary.sections, vec!["year1", "monthlyData", "kpis", "significantParameters"]);
        assert_eq!(store.status("p1").unwrap(), Some(ProjectStatus::Ready));

        let sections = store.load_sections("p1").unwrap();
        assert_eq!(sections.len(), 4);
        assert_eq!(sections["kpis"]["totalInvestment"], 450000.0);
        assert_eq!(sections["significantParameters"][6]["value"], 10000.0);
        assert_eq!(sections["monthlyData"].as_array().unwrap().len(), 12);
        assert_eq!(sections["monthlyData"][0]["customers"], 18.0);
    }

    #[test]
    fn test_ingest_bytes_marks_error_on_malformed_file() {
        let (ingestor, store) = ingestor("http://localhost");
        let result = ingestor.ingest_bytes("p1", Bytes::from_static(b"not a workbook"));

        assert!(matches!(result, Err(AppError::MalformedWorkbook(_))));
        assert_eq!(store.status("p1").unwrap(), Some(ProjectStatus::Error));
        assert!(store.load_sections("p1").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ingest_marks_error_when_download_fails() {
        // Nothing listens on the discard port.
        let (ingestor, store) = ingestor("http://127.0.0.1:9");
        let result = ingestor.ingest("p1", "user/plan.xlsx").await;

        assert!(matches!(result, Err(AppError::Download(_))));
        assert_eq!(store.status("p1").unwrap(), Some(ProjectStatus::Error));
    }
}
