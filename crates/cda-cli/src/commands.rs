use anyhow::{Context, Result};
use comfy_table::Table;

use cda_cli::pipeline::{ImportOutcome, ImportRequest, run_import};
use cda_core::default_registry;

use crate::cli::ImportArgs;
use crate::summary::{apply_table_style, header_cell};

pub fn run_templates() -> Result<()> {
    let registry = default_registry().context("build template registry")?;
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Template"),
        header_cell("Kind"),
        header_cell("Precedence"),
        header_cell("Identifiers"),
    ]);
    apply_table_style(&mut table);
    let mut registrations: Vec<_> = registry.registrations().collect();
    registrations.sort_by_key(|registration| (registration.name(), registration.precedence()));
    for registration in registrations {
        table.add_row(vec![
            registration.name().to_string(),
            registration.kind().to_string(),
            registration.precedence().to_string(),
            registration.templates().join("\n"),
        ]);
    }
    println!("{table}");
    println!("Nodes no template claims fall back to the generic Section, Act and Observation processors.");
    Ok(())
}

pub fn run_import_command(args: &ImportArgs) -> Result<ImportOutcome> {
    let request = ImportRequest {
        document: args.document.clone(),
        patient: args.patient.clone(),
        author: args.author.clone(),
        config: args.config.clone(),
        store: args.store.clone(),
        dry_run: args.dry_run,
        encounter_date: None,
    };
    run_import(&request)
}
