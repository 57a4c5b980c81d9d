//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use std::io;
use tbl_ops::{BootstrapSummary, OperationResult, PathEntry, RefreshSummary};

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    colors: bool,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool) -> Self {
        Self {
            json_output,
            colors: Term::stdout().features().colors_supported(),
        }
    }

    /// Render operation result
    pub fn render_result(&self, result: &OperationResult) -> io::Result<()> {
        if self.json_output {
            self.render_json(result)
        } else {
            self.render_table(result)
        }
    }

    /// Render as JSON
    fn render_json(&self, result: &OperationResult) -> io::Result<()> {
        let json = result.to_json().map_err(io::Error::other)?;
        println!("{json}");
        Ok(())
    }

    /// Render as formatted table
    fn render_table(&self, result: &OperationResult) -> io::Result<()> {
        match result {
            OperationResult::Bootstrap(summary) => self.render_bootstrap(summary),
            OperationResult::KeyRefresh(summary) => self.render_refresh(summary),
            OperationResult::Verified(file) => {
                println!("{} {file}", self.ok_marker());
                Ok(())
            }
            OperationResult::Settings(settings) => {
                let pretty = serde_json::to_string_pretty(settings).map_err(io::Error::other)?;
                println!("{pretty}");
                Ok(())
            }
            OperationResult::Mirrors(mirrors) => {
                for mirror in mirrors {
                    println!("{mirror}");
                }
                Ok(())
            }
            OperationResult::Paths(entries) => self.render_paths(entries),
        }
    }

    fn ok_marker(&self) -> String {
        self.style(Style::new().green(), "[OK]")
    }

    fn fail_marker(&self) -> String {
        self.style(Style::new().red(), "[FAIL]")
    }

    fn style(&self, style: Style, text: &str) -> String {
        if self.colors {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn render_bootstrap(&self, summary: &BootstrapSummary) -> io::Result<()> {
        for path in &summary.renamed {
            println!("Moved legacy install {}", path.display());
        }
        for path in &summary.deleted {
            println!("Removed legacy install {}", path.display());
        }
        for issue in summary
            .migration_failures
            .iter()
            .chain(&summary.directory_issues)
        {
            println!("{} {}: {}", self.fail_marker(), issue.path.display(), issue.message);
        }
        if let Some(error) = &summary.keyring_error {
            println!("{} keyring: {error}", self.fail_marker());
        }

        if !summary.key_imports.is_empty() {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec![
                Cell::new("Key").add_attribute(Attribute::Bold),
                Cell::new("Status").add_attribute(Attribute::Bold),
                Cell::new("Detail").add_attribute(Attribute::Bold),
            ]);
            for import in &summary.key_imports {
                let status = if import.success {
                    Cell::new("imported").fg(Color::Green)
                } else {
                    Cell::new("failed").fg(Color::Red)
                };
                table.add_row(vec![Cell::new(import.key), status, Cell::new(&import.detail)]);
            }
            println!("{table}");
        }

        println!("{} mirrors available", summary.mirror_count);
        if summary.degraded {
            println!("{} startup completed in degraded mode", self.fail_marker());
        } else {
            println!("{} ready", self.ok_marker());
        }
        Ok(())
    }

    fn render_refresh(&self, summary: &RefreshSummary) -> io::Result<()> {
        let marker = if summary.import.success {
            self.ok_marker()
        } else {
            self.fail_marker()
        };
        println!("{marker} {} ({})", summary.import.detail, summary.url);
        Ok(())
    }

    fn render_paths(&self, entries: &[PathEntry]) -> io::Result<()> {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Path").add_attribute(Attribute::Bold),
        ]);
        for entry in entries {
            table.add_row(vec![Cell::new(&entry.name), Cell::new(&entry.value)]);
        }
        println!("{table}");
        Ok(())
    }
}
