use crate::types::{RunReport, Verdict};
use anyhow::Result;
use colored_json::ToColoredJson;
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

const RULE_WIDTH: usize = 50;

fn format_seconds(seconds: f64) -> String {
    format!("{:.4}s", seconds)
}

fn verdict_label(verdict: &Verdict) -> &'static str {
    if verdict.correct { "correct" } else { "INCORRECT" }
}

/// One summary table row: left-aligned metric, right-aligned value
fn table_row(metric: &str, value: &str) -> String {
    format!("{:<15} | {:>11}", metric, value)
}

/// Print human-readable summary
pub fn print_summary(report: &RunReport) -> Result<()> {
    let mut out = StandardStream::stdout(ColorChoice::Auto);
    let rule = "=".repeat(RULE_WIDTH);

    writeln!(out, "\n{}", rule)?;
    writeln!(
        out,
        "Matrix Multiplication: {n}x{n} ({}) | Ranks: {}",
        report.precision,
        report.ranks,
        n = report.n
    )?;
    writeln!(out, "{}", rule)?;

    if report.dropped_rows > 0 {
        writeln!(
            out,
            "\nNote: {} of {} rows not divisible across {} ranks were left out of the distributed product.",
            report.dropped_rows, report.n, report.ranks
        )?;
    }

    let timings = &report.timings;
    writeln!(out)?;
    if let Some(serial) = timings.serial_seconds {
        writeln!(out, "[Serial]      Time: {}", format_seconds(serial))?;
    }
    writeln!(
        out,
        "[Distributed] Time: {}  (distribute {}, compute {}, gather {})",
        format_seconds(timings.distributed_seconds),
        format_seconds(timings.distribute_seconds),
        format_seconds(timings.compute_seconds),
        format_seconds(timings.gather_seconds)
    )?;

    if let Some(record) = &report.record {
        writeln!(out, "Speedup:    {:.2}x (Ideal: {}x)", record.speedup, report.ranks)?;
        writeln!(out, "Efficiency: {:.2}%", record.efficiency_percent)?;
    }

    if let Some(verdict) = &report.verdict {
        write!(out, "Result:     ")?;
        let color = if verdict.correct { Color::Green } else { Color::Red };
        out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        write!(out, "{}", verdict_label(verdict))?;
        out.reset()?;
        writeln!(
            out,
            " (max |diff| {:.3e}, tolerance {:.0e})",
            verdict.max_abs_diff, verdict.tolerance
        )?;
    } else {
        writeln!(out, "Result:     not validated (no serial baseline)")?;
    }

    writeln!(out, "\nPerformance Summary:")?;
    writeln!(out, "{}", table_row("Metric", "Value"))?;
    writeln!(out, "{}", table_row(&"-".repeat(15), &"-".repeat(11)))?;
    if let Some(serial) = timings.serial_seconds {
        writeln!(out, "{}", table_row("Serial Time", &format_seconds(serial)))?;
    }
    writeln!(
        out,
        "{}",
        table_row("Distributed", &format_seconds(timings.distributed_seconds))
    )?;
    if let Some(record) = &report.record {
        writeln!(out, "{}", table_row("Speedup", &format!("{:.2}x", record.speedup)))?;
        writeln!(
            out,
            "{}",
            table_row("Efficiency", &format!("{:.2}%", record.efficiency_percent))
        )?;
    }
    writeln!(out)?;

    Ok(())
}

/// Print JSON output
pub fn print_json(report: &RunReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{}", json.to_colored_json_auto()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0.0), "0.0000s");
        assert_eq!(format_seconds(0.38214), "0.3821s");
        assert_eq!(format_seconds(12.5), "12.5000s");
    }

    #[test]
    fn test_verdict_label() {
        let mut verdict = Verdict {
            correct: true,
            max_abs_diff: 0.0,
            tolerance: 1e-4,
        };
        assert_eq!(verdict_label(&verdict), "correct");
        verdict.correct = false;
        assert_eq!(verdict_label(&verdict), "INCORRECT");
    }

    #[test]
    fn test_table_row_alignment() {
        assert_eq!(table_row("Speedup", "1.82x"), "Speedup         |       1.82x");
        assert_eq!(table_row("Metric", "Value").len(), 15 + 3 + 11);
    }
}
