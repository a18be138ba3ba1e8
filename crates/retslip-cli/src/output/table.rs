use retslip_core::business::BusinessSummary;
use retslip_core::model::{CanonicalRecord, Field};
use retslip_core::trace::{TraceBundle, TraceSeverity};
use retslip_core::validate::CompletenessReport;

/// Columns shown in the plain-text record listing. JSON output carries all 18.
const RECORD_COLUMNS: [Field; 12] = [
    Field::State,
    Field::ReturnPrefix,
    Field::ReturnSlip,
    Field::ReturnDate,
    Field::Customer,
    Field::Definitive,
    Field::CountedDate,
    Field::Tablets,
    Field::Total,
    Field::Open,
    Field::TabletsTotal,
    Field::ValidationDelay,
];

/// Longest value shown per cell before truncation.
const MAX_CELL: usize = 24;

pub fn print_records(records: &[CanonicalRecord]) {
    if records.is_empty() {
        println!("No records assembled.");
        return;
    }

    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| RECORD_COLUMNS.iter().map(|f| clip(r.get(*f))).collect())
        .collect();

    let widths: Vec<usize> = RECORD_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, f)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(f.name().len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<&str> = RECORD_COLUMNS.iter().map(|f| f.name()).collect();
    print_row(&header, &widths);
    println!(
        "{}",
        "-".repeat(widths.iter().sum::<usize>() + 2 * widths.len())
    );
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        print_row(&cells, &widths);
    }

    let overflowed = records.iter().filter(|r| !r.overflow().is_empty()).count();
    println!("\n{} record(s)", records.len());
    if overflowed > 0 {
        println!("{overflowed} record(s) carry values past the last column (see JSON output)");
    }
}

fn print_row(cells: &[&str], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(c, &w)| format!("{c:<w$}"))
        .collect();
    println!("{}", line.join("  ").trim_end());
}

fn clip(value: &str) -> String {
    let value = value.replace('\n', " ");
    if value.chars().count() <= MAX_CELL {
        value
    } else {
        let head: String = value.chars().take(MAX_CELL - 3).collect();
        format!("{head}...")
    }
}

pub fn print_events(trace: &TraceBundle) {
    println!("Events (trace schema {}):", trace.trace_schema_version);
    for event in &trace.events {
        let marker = match event.kind.severity() {
            TraceSeverity::Critical => "!!",
            TraceSeverity::Important => " !",
            TraceSeverity::Info => "  ",
        };
        println!("{marker} {}", event.message());
    }
}

pub fn print_completeness(report: &CompletenessReport, trace: &TraceBundle) {
    println!("=== Completeness ===\n");
    println!("  Records:        {}", report.total_records);
    println!("  Valid slips:    {}", report.valid_slips);
    println!("  Dropped rows:   {}", report.dropped_records);
    println!("  Completeness:   {}%", report.completeness_percent);
    println!("  Rejected rows:  {}", trace.rejected_count());
    println!();

    match &report.sequence {
        Some(seq) if seq.is_contiguous() => println!(
            "  Sequence complete: {} to {} ({} slips)",
            seq.first, seq.last, seq.expected
        ),
        Some(seq) => println!(
            "  Sequence incomplete: {} of {} missing between {} and {}",
            seq.missing, seq.expected, seq.first, seq.last
        ),
        None => println!("  Sequence: fewer than two valid slips"),
    }
    if report.duplicate_slips > 0 {
        println!("  Duplicate slips: {}", report.duplicate_slips);
    }
    if let Some(totals) = &report.gross_totals {
        println!("  Totals line: {} / {}", totals.tablets, totals.open);
    }

    let flagged: Vec<_> = trace.review_flags().collect();
    if !flagged.is_empty() {
        println!("\n  Flagged for review:");
        for event in flagged {
            println!("    {}", event.message());
        }
    }

    println!("\n  Extraction quality: {}", report.grade);
}

pub fn print_summary(summary: &BusinessSummary) {
    println!("=== Key figures ===\n");
    println!("  Total slips:   {}", summary.total);
    println!("  Closed:        {}", summary.closed);
    println!("  Pending:       {}", summary.pending);
    println!("  Closure rate:  {}%", summary.closure_rate);

    if !summary.warehouses.is_empty() {
        println!("\n=== Warehouses ===\n");
        println!(
            "  {:<10} {:>6} {:>7} {:>8} {:>8} {:>9}",
            "Warehouse", "Total", "Closed", "Pending", "Rate %", "Avg days"
        );
        for wh in &summary.warehouses {
            let avg = wh
                .average_days
                .map(|d| d.to_string())
                .unwrap_or_else(|| "N/A".into());
            println!(
                "  {:<10} {:>6} {:>7} {:>8} {:>8} {:>9}",
                wh.warehouse, wh.total, wh.closed, wh.pending, wh.closure_rate, avg
            );
        }
    }

    if let Some(times) = &summary.closing_times {
        println!("\n=== Business days to close ===\n");
        println!("  Mean:    {}", times.mean);
        println!("  Median:  {}", times.median);
        println!("  Max:     {}", times.max);
    }

    if !summary.top_customers.is_empty() {
        println!("\n=== Top customers ===\n");
        for c in &summary.top_customers {
            let avg = c
                .average_days
                .map(|d| format!(", avg {d} days"))
                .unwrap_or_default();
            println!("  {:<50} {:>4} slips, {} closed{}", c.customer_name, c.total, c.closed, avg);
        }
    }

    println!("\n=== Alerts ===\n");
    if summary.alerts.is_empty() {
        println!("  All KPIs within target.");
    } else {
        for alert in &summary.alerts {
            println!("  - {alert}");
        }
    }
}
