use matbench::coordinator::{self, RunConfig};
use matbench::csv_writer;
use matbench::group::run_local;

fn run_logged(config: &RunConfig, ranks: usize) {
    let report = run_local(ranks, |group| coordinator::run::<f32>(group, config))
        .unwrap()
        .unwrap();
    assert!(report.record.is_some());
}

fn is_well_formed(line: &str) -> bool {
    let fields: Vec<&str> = line.split(',').collect();
    let decimals = |s: &str| s.split('.').nth(1).map(str::len);

    fields.len() == 6
        && fields[0] == "200"
        && fields[1] == "2"
        && fields[2..5].iter().all(|f| decimals(*f) == Some(4))
        && decimals(fields[5]) == Some(2)
        && fields[2..].iter().all(|f| f.parse::<f64>().is_ok())
}

#[test]
fn test_two_runs_append_two_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("performance.log");
    let config = RunConfig {
        n: 200,
        log_path: Some(path.clone()),
        ..RunConfig::default()
    };

    run_logged(&config, 2);
    let first = std::fs::read_to_string(&path).unwrap();
    assert_eq!(first.lines().count(), 1);

    run_logged(&config, 2);
    let both = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = both.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(both.starts_with(&first));
    assert!(lines.iter().all(|l| is_well_formed(l)), "{:?}", lines);

    let records = csv_writer::read_records(&path).unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.n == 200 && r.ranks == 2));
}

#[test]
fn test_skipping_serial_baseline_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("performance.log");
    let config = RunConfig {
        n: 20,
        serial_baseline: false,
        log_path: Some(path.clone()),
        ..RunConfig::default()
    };

    let report = run_local(2, |group| coordinator::run::<f64>(group, &config))
        .unwrap()
        .unwrap();
    assert!(report.record.is_none());
    assert!(!path.exists());
}
