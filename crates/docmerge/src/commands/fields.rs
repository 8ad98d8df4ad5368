//! `docmerge fields` command implementation.

use std::path::PathBuf;

use clap::Args;
use docmerge_fields::{Tree, scan};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the fields command.
#[derive(Args)]
pub(crate) struct FieldsArgs {
    /// WordprocessingML part to inspect (e.g. an extracted `word/document.xml`).
    input: PathBuf,
}

impl FieldsArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let xml = std::fs::read_to_string(&self.input)?;
        let tree = Tree::parse(&xml)?;
        let fields = scan(&tree);

        for field in &fields {
            output.field(field.kind(), field.expression().unwrap_or_default());
        }

        if fields.is_empty() {
            output.warning(&format!(
                "No merge fields found in {}",
                self.input.display()
            ));
        } else {
            output.success(&format!("{} merge field(s)", fields.len()));
        }

        Ok(())
    }
}
