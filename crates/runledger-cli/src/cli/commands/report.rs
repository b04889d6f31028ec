use super::open_store;
use crate::cli::args::{ReportArgs, ReportFormat};
use crate::exit_codes::EXIT_SUCCESS;
use runledger_core::config::resolve_config;
use runledger_core::report::filter::TimeFilter;
use runledger_core::{Report, ReportContext};

pub fn run(args: ReportArgs) -> anyhow::Result<i32> {
    // Reject conflicting selectors before touching config or store.
    let filter = TimeFilter::from_selectors(args.days_back, args.latest)?;

    let cfg = resolve_config(args.store.config.as_deref())?;
    let store = open_store(&args.store, &cfg)?;
    let settings = cfg.report;
    let sections = if args.sections.is_empty() {
        settings.sections.clone()
    } else {
        args.sections
    };

    let now = chrono::Local::now().naive_local();
    let ctx = ReportContext::new(&store, filter, &settings, now)?;
    let report = Report::generate(&ctx, &sections)?;

    match args.format {
        ReportFormat::Text => print!("{}", report.render_text(settings.column_width)),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(EXIT_SUCCESS)
}
