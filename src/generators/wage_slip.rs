//! Generator for FORM XIX wage slips.
//!
//! Binds one employee record to the wage-slip template: the layout is
//! serialised into a Typst prelude, the template body is appended, and the
//! result is compiled by the configured [`DocumentEngine`]. The PDF is then
//! written to the output directory under a deterministic filename.

use async_trait::async_trait;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::common::{clean_month_label, get_static_dir, payslip_filename};
use super::layout::WageSlipLayout;
use super::traits::{DocumentEngine, Renderer};
use super::{RenderError, RenderErrorKind, RenderedDocument, TemplateError};
use crate::config::{BatchConfiguration, CompanyConfig, InvalidAmountPolicy};
use crate::records::EmployeeRecord;

pub const TEMPLATE_FILE: &str = "wage_slip.typ";

/// Generator for wage-slip PDFs.
pub struct WageSlipGenerator {
    template: String,
    engine: Arc<dyn DocumentEngine>,
    output_dir: PathBuf,
    company: CompanyConfig,
    words_policy: InvalidAmountPolicy,
}

impl WageSlipGenerator {
    /// Load the template named by the configuration, or the bundled one.
    pub fn new(
        config: &BatchConfiguration,
        engine: Arc<dyn DocumentEngine>,
    ) -> Result<Self, TemplateError> {
        let template_path = config
            .template_path
            .clone()
            .unwrap_or_else(|| get_static_dir().join(TEMPLATE_FILE));
        let template = load_template(&template_path)?;

        Ok(Self::with_template(template, config, engine))
    }

    pub fn with_template(
        template: String,
        config: &BatchConfiguration,
        engine: Arc<dyn DocumentEngine>,
    ) -> Self {
        Self {
            template,
            engine,
            output_dir: config.output_directory.clone(),
            company: config.company.clone(),
            words_policy: config.policy.invalid_amount,
        }
    }

    /// Full Typst source for one layout.
    pub fn compose_source(&self, layout: &WageSlipLayout) -> String {
        let mut source = layout.typst_prelude();
        source.push('\n');
        source.push_str(&self.template);
        source
    }
}

fn load_template(path: &Path) -> Result<String, TemplateError> {
    fs::read_to_string(path).map_err(|source| TemplateError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[async_trait]
impl Renderer for WageSlipGenerator {
    async fn render(
        &self,
        employee_id: &str,
        record: &EmployeeRecord,
        month: &str,
    ) -> Result<RenderedDocument, RenderError> {
        let month = clean_month_label(month);
        let fail = |kind: RenderErrorKind| RenderError::new(employee_id, kind);

        let layout = WageSlipLayout::build(employee_id, record, &self.company, self.words_policy)
            .map_err(|e| fail(e.into()))?;

        let source = self.compose_source(&layout);
        let pdf = self
            .engine
            .compile(&source)
            .await
            .map_err(|e| fail(e.into()))?;

        let filename = payslip_filename(employee_id, &month);
        let local_path = self.output_dir.join(&filename);
        tokio::fs::write(&local_path, &pdf)
            .await
            .map_err(|e| fail(RenderErrorKind::WriteOutput(e)))?;

        info!("Generated payslip PDF: {}", local_path.display());

        Ok(RenderedDocument {
            employee_id: employee_id.to_string(),
            filename,
            local_path,
            pdf,
            month,
            net_pay_words: layout.net_pay_words,
        })
    }
}
