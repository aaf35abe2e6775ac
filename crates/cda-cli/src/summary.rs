use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use cda_core::ReportedIssue;
use cda_model::{ConceptRef, DomainRecord, IssueSeverity, Timestamp, ValidationIssueCollection};

use cda_cli::pipeline::ImportOutcome;

pub fn print_summary(outcome: &ImportOutcome) {
    match &outcome.persisted {
        Some(path) => println!("Store: {}", path.display()),
        None => println!("Store: not written"),
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Kind"),
        header_cell("Key"),
        header_cell("Concept"),
        header_cell("Start"),
        header_cell("End"),
        header_cell("Status"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for record in &outcome.report.records {
        table.add_row(record_row(record));
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(outcome.report.records.len()).add_attribute(Attribute::Bold),
        Cell::new(format!(
            "{} observations saved",
            outcome.report.observations_saved
        ))
        .fg(Color::Cyan),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell(format!(
            "{} allergies, {} conditions on file",
            outcome.allergy_count(),
            outcome.condition_count()
        )),
    ]);
    println!("{table}");
    print_issue_table(&outcome.report.issues);
}

/// Issues of a failed validation, printed before the error line.
pub fn print_validation_failure(template: &str, issues: &ValidationIssueCollection) {
    let reported: Vec<(&str, IssueSeverity, &str)> = issues
        .iter()
        .map(|issue| (template, issue.severity, issue.message.as_str()))
        .collect();
    render_issue_table(&reported);
}

fn print_issue_table(issues: &[ReportedIssue]) {
    let reported: Vec<(&str, IssueSeverity, &str)> = issues
        .iter()
        .map(|reported| {
            (
                reported.template,
                reported.issue.severity,
                reported.issue.message.as_str(),
            )
        })
        .collect();
    render_issue_table(&reported);
}

fn render_issue_table(issues: &[(&str, IssueSeverity, &str)]) {
    if issues.is_empty() {
        return;
    }
    let mut sorted = issues.to_vec();
    sorted.sort_by_key(|(template, severity, _)| (severity_rank(*severity), *template));

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Template"),
        header_cell("Severity"),
        header_cell("Message"),
    ]);
    apply_issue_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    for (template, severity, message) in sorted {
        table.add_row(vec![
            Cell::new(template),
            severity_cell(severity),
            Cell::new(message),
        ]);
    }
    println!();
    println!("Issues:");
    println!("{table}");
}

fn record_row(record: &DomainRecord) -> Vec<Cell> {
    let key = record
        .header()
        .and_then(|header| header.key)
        .map_or_else(|| dim_cell("-"), Cell::new);
    let (concept, start, end) = match record {
        DomainRecord::Allergy(allergy) => (
            allergy.allergen.as_ref(),
            allergy.start_date(),
            allergy.end_date(),
        ),
        DomainRecord::Condition(condition) => (
            condition.concept.as_ref(),
            condition.onset_date(),
            condition.end_date(),
        ),
        DomainRecord::Observation(observation) => (
            observation.concept.as_ref(),
            observation.start,
            observation.end,
        ),
    };
    let status = match record {
        _ if record.is_voided() => Cell::new(void_label(record)).fg(Color::DarkGrey),
        DomainRecord::Condition(condition) => Cell::new(condition.status.to_string()),
        _ => Cell::new("active"),
    };
    vec![
        Cell::new(record.kind())
            .fg(Color::Blue)
            .add_attribute(Attribute::Bold),
        key,
        concept_cell(concept),
        date_cell(start),
        date_cell(end),
        status,
    ]
}

fn void_label(record: &DomainRecord) -> String {
    match record.audit().void_reason.as_deref() {
        Some(reason) => format!("voided ({reason})"),
        None => "voided".to_string(),
    }
}

fn concept_cell(concept: Option<&ConceptRef>) -> Cell {
    match concept {
        Some(concept) => Cell::new(concept),
        None => dim_cell("-"),
    }
}

fn date_cell(value: Option<Timestamp>) -> Cell {
    match value {
        Some(value) => Cell::new(value),
        None => dim_cell("unknown"),
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
    if table.column_count() >= 6 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Fixed(12)),
            ColumnConstraint::LowerBoundary(Width::Fixed(5)),
            ColumnConstraint::UpperBoundary(Width::Percentage(40)),
            ColumnConstraint::LowerBoundary(Width::Fixed(10)),
            ColumnConstraint::LowerBoundary(Width::Fixed(10)),
            ColumnConstraint::UpperBoundary(Width::Percentage(30)),
        ]);
    }
}

fn apply_issue_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
    if table.column_count() >= 3 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Percentage(30)),
            ColumnConstraint::UpperBoundary(Width::Fixed(9)),
            ColumnConstraint::UpperBoundary(Width::Percentage(65)),
        ]);
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn severity_cell(severity: IssueSeverity) -> Cell {
    match severity {
        IssueSeverity::Error => Cell::new("ERROR")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        IssueSeverity::Warning => Cell::new("WARN").fg(Color::Yellow),
        IssueSeverity::Info => dim_cell("INFO"),
    }
}

fn severity_rank(severity: IssueSeverity) -> u8 {
    match severity {
        IssueSeverity::Error => 0,
        IssueSeverity::Warning => 1,
        IssueSeverity::Info => 2,
    }
}

pub fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
