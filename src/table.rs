use anyhow::Context;
use serde::Serialize;
use std::path::Path;

/// Plain rectangular output handed to export collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn to_csv(&self) -> anyhow::Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());
        writer
            .write_record(&self.columns)
            .context("failed to write CSV header")?;
        for row in &self.rows {
            writer.write_record(row).context("failed to write CSV row")?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("failed to flush CSV: {}", e))?;
        String::from_utf8(bytes).context("CSV output is not UTF-8")
    }

    pub fn write_csv(&self, out_path: &Path) -> anyhow::Result<usize> {
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create directory {}", parent.to_string_lossy())
            })?;
        }
        let text = self.to_csv()?;
        std::fs::write(out_path, text)
            .with_context(|| format!("failed to write {}", out_path.to_string_lossy()))?;
        Ok(self.rows.len())
    }
}
