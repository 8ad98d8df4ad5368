//! `docmerge merge` command implementation.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use docmerge_config::{CliSettings, Config, MissingPolicy};
use docmerge_fields::{MergeField, NodeId, Removal, Selector, TextContent, Tree, scan};
use serde_json::{Map, Value};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the merge command.
#[derive(Args)]
pub(crate) struct MergeArgs {
    /// WordprocessingML part to merge (e.g. an extracted `word/document.xml`).
    input: PathBuf,

    /// JSON object mapping field names to values.
    #[arg(short, long)]
    data: PathBuf,

    /// Output file (default: stdout).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover docmerge.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Policy for fields without a value: keep, remove or remove-block (overrides config).
    #[arg(long)]
    on_missing: Option<MissingPolicy>,

    /// Block removed by the remove-block policy, e.g. `w:tr` (overrides config).
    #[arg(long)]
    block: Option<String>,
}

impl MergeArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            on_missing: self.on_missing,
            block: self.block,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            output.info(&format!("Config: {}", path.display()));
        }
        let block = config.merge.block_selector()?;

        let values = load_values(&self.data)?;
        let xml = std::fs::read_to_string(&self.input)?;
        let mut tree = Tree::parse(&xml)?;

        let summary = merge_fields(&mut tree, &values, config.merge.on_missing, &block)?;
        let merged = tree.to_xml();

        if let Some(path) = &self.output {
            std::fs::write(path, merged)?;
            output.info(&format!("Output: {}", path.display()));
        } else {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(merged.as_bytes())?;
            stdout.flush()?;
        }

        output.success(&format!(
            "Merged {} field(s): {} replaced, {} removed, {} kept",
            summary.replaced + summary.removed + summary.kept,
            summary.replaced,
            summary.removed,
            summary.kept
        ));
        if summary.blocks_removed > 0 {
            output.info(&format!(
                "Removed {} block(s) matching {block}",
                summary.blocks_removed
            ));
        }

        Ok(())
    }
}

/// Counters reported after a merge.
#[derive(Debug, Default, PartialEq, Eq)]
struct MergeSummary {
    replaced: usize,
    removed: usize,
    kept: usize,
    blocks_removed: usize,
}

/// Read the data file, which must hold a single JSON object.
fn load_values(path: &Path) -> Result<Map<String, Value>, CliError> {
    let content = std::fs::read_to_string(path)?;
    match serde_json::from_str(&content)? {
        Value::Object(values) => Ok(values),
        _ => Err(CliError::Validation(format!(
            "{} must contain a JSON object",
            path.display()
        ))),
    }
}

/// Text for a JSON value. `null` counts as missing.
fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Replace every field that has a value and apply `policy` to the rest.
///
/// Under [`MissingPolicy::RemoveBlock`] each missing field votes for its
/// nearest `block` ancestor. A block is removed only when every field inside
/// it voted; otherwise the voters are removed one by one.
fn merge_fields(
    tree: &mut Tree,
    values: &Map<String, Value>,
    policy: MissingPolicy,
    block: &Selector,
) -> Result<MergeSummary, CliError> {
    let fields = scan(tree);
    let mut summary = MergeSummary::default();

    // Block membership is taken before anything is mutated
    let mut block_sizes: HashMap<NodeId, usize> = HashMap::new();
    let mut located = Vec::with_capacity(fields.len());
    for field in fields {
        let owner = field.ancestors(tree, block).first().copied();
        if let Some(owner) = owner {
            *block_sizes.entry(owner).or_default() += 1;
        }
        located.push((field, owner));
    }

    let mut missing = Vec::new();
    for (field, owner) in located {
        let Some(name) = field.expression() else {
            continue;
        };
        if let Some(text) = values.get(name).and_then(render_value) {
            field.replace(tree, &TextContent::new(text), &())?;
            summary.replaced += 1;
        } else {
            tracing::debug!(field = name, %policy, "No value for merge field");
            missing.push((field, owner));
        }
    }

    match policy {
        MissingPolicy::Keep => summary.kept = missing.len(),
        MissingPolicy::Remove => {
            for (mut field, _) in missing {
                field.remove(tree)?;
                summary.removed += 1;
            }
        }
        MissingPolicy::RemoveBlock => {
            let mut order: Vec<NodeId> = Vec::new();
            let mut votes: HashMap<NodeId, Vec<MergeField>> = HashMap::new();
            for (mut field, owner) in missing {
                let Some(owner) = owner else {
                    field.remove(tree)?;
                    summary.removed += 1;
                    continue;
                };
                votes
                    .entry(owner)
                    .or_insert_with(|| {
                        order.push(owner);
                        Vec::new()
                    })
                    .push(field);
            }

            // Inner blocks first, so an outer block never detaches pending voters
            order.sort_by_key(|&owner| Reverse(depth(tree, owner)));
            for owner in order {
                let Some(voters) = votes.remove(&owner) else {
                    continue;
                };
                summary.removed += voters.len();
                if block_sizes.get(&owner) == Some(&voters.len()) {
                    remove_block(tree, voters, block)?;
                    summary.blocks_removed += 1;
                } else {
                    for mut field in voters {
                        field.remove(tree)?;
                    }
                }
            }
        }
    }

    Ok(summary)
}

/// Number of ancestors above `id`.
fn depth(tree: &Tree, id: NodeId) -> usize {
    std::iter::successors(tree.parent(id), |&node| tree.parent(node)).count()
}

/// Deliver one vote per field to the block's removal counter.
///
/// The first field carries the counter; the block goes away on the last vote.
fn remove_block(tree: &mut Tree, voters: Vec<MergeField>, block: &Selector) -> Result<(), CliError> {
    let votes = voters.len();
    let Some(mut carrier) = voters.into_iter().next() else {
        return Ok(());
    };
    carrier.set_block_reference_count(u32::try_from(votes).unwrap_or(u32::MAX));

    let mut outcome = Removal::Deferred {
        remaining: carrier.block_reference_count(),
    };
    for _ in 0..votes {
        outcome = carrier.remove_parent(tree, block)?;
    }
    debug_assert_eq!(outcome, Removal::Removed);
    Ok(())
}
