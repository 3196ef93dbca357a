//! Report writer trait.

use async_trait::async_trait;

use crate::error::ReportError;
use crate::report::ReportTable;
use crate::types::summary::ReportRef;

/// Persists an assembled report table and says where it went.
#[async_trait]
pub trait ReportWriter: Send + Sync {
    async fn write_report(&self, table: &ReportTable) -> Result<ReportRef, ReportError>;
}
