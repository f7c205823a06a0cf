use console::style;
use rollcall_core::etl::{AggregateReport, LoadReport};
use rollcall_core::StageReport;

pub fn print_stage(report: &StageReport) {
    let remaining = report.remaining();
    let marker = if remaining == 0 {
        style("●").green()
    } else {
        style("●").yellow()
    };

    eprintln!("{} {}", marker, style(report.stage).bold());
    eprintln!("  Found:     {}", report.found);
    eprintln!("  Fixed:     {}", report.fixed);
    eprintln!("  Remaining: {remaining}");
    if report.skipped > 0 {
        eprintln!("  Skipped:   {}", report.skipped);
    }
    for (kind, keys) in &report.buckets {
        eprintln!("    {}: {}", style(kind).dim(), keys.len());
    }
    print_load("Written", &report.load);
}

pub fn print_aggregate(report: &AggregateReport) {
    eprintln!("{} {}", style("●").green(), style("aggregate").bold());
    eprintln!("  Pages:           {}", report.pages);
    eprintln!("  Representatives: {}", report.representatives);
    eprintln!("  In state totals: {}", report.counted);
    print_load("Summaries", &report.summaries);
    print_load("State education", &report.state_education);
    print_load("State party", &report.state_party);
    print_load("State gender", &report.state_gender);
}

fn print_load(label: &str, load: &LoadReport) {
    eprintln!(
        "  {label}: {} in {} batches",
        load.total,
        load.batches.len()
    );
}
