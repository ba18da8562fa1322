//! Seams between the renderer and its collaborators.

use async_trait::async_trait;

use super::{EngineError, RenderError, RenderedDocument};
use crate::records::EmployeeRecord;

/// Turns a complete Typst source into PDF bytes.
#[async_trait]
pub trait DocumentEngine: Send + Sync {
    async fn compile(&self, source: &str) -> Result<Vec<u8>, EngineError>;
}

/// Produces one wage-slip document per record.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render the wage slip for `record`, filed under `employee_id`.
    async fn render(
        &self,
        employee_id: &str,
        record: &EmployeeRecord,
        month: &str,
    ) -> Result<RenderedDocument, RenderError>;
}
