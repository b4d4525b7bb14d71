use crate::types::PerformanceRecord;
use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

const FIELDS: usize = 6;

/// Append one record to the performance log, creating the file if needed.
///
/// The file is opened in append mode and never truncated.
pub fn append_record(path: &Path, record: &PerformanceRecord) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context(format!("Failed to open performance log: {}", path.display()))?;

    writeln!(file, "{}", format_record(record))
        .context(format!("Failed to append to performance log: {}", path.display()))?;

    Ok(())
}

/// `N,G,serial_time_seconds,distributed_time_seconds,speedup,efficiency_percent`
pub fn format_record(record: &PerformanceRecord) -> String {
    format!(
        "{},{},{:.4},{:.4},{:.4},{:.2}",
        record.n,
        record.ranks,
        record.serial_seconds,
        record.distributed_seconds,
        record.speedup,
        record.efficiency_percent
    )
}

/// Read every record back, e.g. to plot serial against distributed time
pub fn read_records(path: &Path) -> Result<Vec<PerformanceRecord>> {
    let file = File::open(path)
        .context(format!("Failed to open performance log: {}", path.display()))?;

    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = parse_record(&line)
            .context(format!("{}:{}: malformed record", path.display(), index + 1))?;
        records.push(record);
    }

    Ok(records)
}

pub fn parse_record(line: &str) -> Result<PerformanceRecord> {
    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() != FIELDS {
        anyhow::bail!("expected {} fields, found {}", FIELDS, fields.len());
    }

    Ok(PerformanceRecord {
        n: fields[0].parse().context("Failed to parse N")?,
        ranks: fields[1].parse().context("Failed to parse G")?,
        serial_seconds: fields[2].parse().context("Failed to parse serial time")?,
        distributed_seconds: fields[3]
            .parse()
            .context("Failed to parse distributed time")?,
        speedup: fields[4].parse().context("Failed to parse speedup")?,
        efficiency_percent: fields[5].parse().context("Failed to parse efficiency")?,
        timestamp: None,
        precision: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_record() -> PerformanceRecord {
        PerformanceRecord::new(200, 2, 0.3821, 0.2176)
    }

    #[test]
    fn test_format_record() {
        assert_eq!(
            format_record(&sample_record()),
            "200,2,0.3821,0.2176,1.7560,87.80"
        );
    }

    #[test]
    fn test_parse_record() {
        let record = parse_record("150,2,0.2015,0.1253,1.61,80.50").unwrap();
        assert_eq!(record.n, 150);
        assert_eq!(record.ranks, 2);
        assert_relative_eq!(record.serial_seconds, 0.2015);
        assert_relative_eq!(record.distributed_seconds, 0.1253);
        assert_relative_eq!(record.speedup, 1.61);
        assert_relative_eq!(record.efficiency_percent, 80.5);
    }

    #[test]
    fn test_parse_record_rejects_bad_lines() {
        assert!(parse_record("200,2,0.1").is_err());
        assert!(parse_record("200,two,0.1,0.1,1.0,50.00").is_err());
    }

    #[test]
    fn test_append_never_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("performance.log");

        append_record(&path, &sample_record()).unwrap();
        append_record(&path, &PerformanceRecord::new(100, 4, 0.05, 0.03)).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "200,2,0.3821,0.2176,1.7560,87.80");
        assert!(lines[1].starts_with("100,4,0.0500,0.0300,"));

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].ranks, 4);
    }

    #[test]
    fn test_read_records_names_bad_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("performance.log");
        std::fs::write(&path, "200,2,0.1,0.1,1.0,50.00\ngarbage\n").unwrap();

        let err = read_records(&path).unwrap_err();
        assert!(format!("{:#}", err).contains(":2: malformed record"));
    }
}
