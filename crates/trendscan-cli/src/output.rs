use std::io::{self, Write};

use serde::Serialize;
use trendscan_core::{AnalysisResult, Outcome, ScanReport};

use crate::cli::OutputFormat;
use crate::error::CliError;

pub fn render_results(
    results: &[AnalysisResult],
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => write_json(&mut out, &results, pretty)?,
        OutputFormat::Table => write_results_table(&mut out, results)?,
    }
    out.flush()?;
    Ok(())
}

pub fn render_report(report: &ScanReport, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => write_json(&mut out, report, pretty)?,
        OutputFormat::Table => write_report_table(&mut out, report)?,
    }
    out.flush()?;
    Ok(())
}

fn write_json<W: Write, T: Serialize + ?Sized>(
    out: &mut W,
    value: &T,
    pretty: bool,
) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_results_table<W: Write>(out: &mut W, results: &[AnalysisResult]) -> io::Result<()> {
    if results.is_empty() {
        return writeln!(out, "no candidates qualified");
    }

    writeln!(
        out,
        "{:<10} {:>10} {:>10} {:>8} {:>9}  {}",
        "SYMBOL", "PRICE", "STOP", "REL VOL", "RS", "STATUS"
    )?;
    for result in results {
        writeln!(
            out,
            "{:<10} {:>10.2} {:>10.2} {:>8.2} {:>9.2}  {}",
            result.symbol.as_str(),
            result.price,
            result.stop_loss,
            result.relative_volume,
            result.rs_rating,
            result.classification
        )?;
    }
    Ok(())
}

fn write_report_table<W: Write>(out: &mut W, report: &ScanReport) -> io::Result<()> {
    write_results_table(out, &report.results)?;

    let excluded: Vec<_> = report
        .outcomes
        .iter()
        .filter(|candidate| candidate.outcome.result().is_none())
        .collect();
    if !excluded.is_empty() {
        writeln!(out)?;
        for candidate in excluded {
            let detail = match &candidate.outcome {
                Outcome::NotQualified(rejection) => format!("not qualified: {rejection}"),
                Outcome::Unavailable(reason) => format!("unavailable: {reason}"),
                Outcome::Qualified(_) => continue,
            };
            writeln!(out, "{:<10} {detail}", candidate.symbol.as_str())?;
        }
    }

    let summary = &report.summary;
    writeln!(out)?;
    if let Some(benchmark) = &report.benchmark {
        writeln!(
            out,
            "benchmark {} {:+.2}% over {} sessions",
            benchmark.symbol(),
            benchmark.reference_return_percent(),
            benchmark.lookback()
        )?;
    }
    writeln!(
        out,
        "scan {}: {} requested, {} dispatched, {} qualified, {} not qualified, {} unavailable in {}ms",
        report.scan_id,
        summary.requested,
        summary.dispatched,
        summary.qualified,
        summary.not_qualified,
        summary.unavailable,
        summary.elapsed_ms
    )
}
