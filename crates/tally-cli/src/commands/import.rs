//! Import command implementation

use std::path::Path;

use anyhow::{bail, Result};
use tally_core::ImportRequest;

use super::{find_mapping, Session};

pub fn cmd_import(
    session: &Session,
    file: &Path,
    mapping: &str,
    account: Option<String>,
    includes_header: Option<bool>,
) -> Result<()> {
    if !file.exists() {
        bail!("File not found: {}", file.display());
    }
    let mapping = find_mapping(session, mapping)?;

    if !session.json {
        println!("📥 Importing {} with mapping '{}'...", file.display(), mapping.name);
    }

    let mut request = ImportRequest::saved(mapping.id);
    request.includes_header = includes_header;
    request.account_name = account;

    let Some(summary) = session.emit(session.service.import_file(session.user(), file, &request))?
    else {
        return Ok(());
    };

    println!("   Imported:    {}", summary.imported);
    println!("   Classified:  {}", summary.classified);
    if summary.skipped_empty > 0 {
        println!("   Empty rows:  {}", summary.skipped_empty);
    }
    if !summary.row_errors.is_empty() {
        println!("   ⚠️  Rejected rows: {}", summary.row_errors.len());
        for err in summary.row_errors.iter().take(10) {
            println!("      line {}: {}", err.line, err.message);
        }
        if summary.row_errors.len() > 10 {
            println!("      ... and {} more", summary.row_errors.len() - 10);
        }
    }

    let unclassified = summary.imported - summary.classified;
    if unclassified > 0 {
        println!();
        println!("💡 {} transactions have no merchant. Review them with:", unclassified);
        println!("   tally unassigned");
    }
    Ok(())
}
