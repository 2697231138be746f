use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

fn two_domain_matrix() -> String {
    let n = 12;
    let split = 5;

    let mut lines = vec![];
    for r in 0..n {
        let mut fields = vec![];
        for c in 0..n {
            let (a, b): (f64, f64) = if r <= split && c <= split {
                (5.0, -0.8)
            } else if r > split && c > split {
                (2.5, -0.1)
            } else {
                (0.0, -0.02)
            };
            let d = (r as f64 - c as f64).abs();
            fields.push(format!("{:.6}", (a + b * d).exp()));
        }
        lines.push(fields.join("\t"));
    }

    lines.join("\n") + "\n"
}

#[test]
fn command_scan() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let input = temp.path().join("matrix.tsv");
    let output = temp.path().join("profile.tsv");

    std::fs::write(&input, two_domain_matrix())?;

    let mut cmd = cargo_bin_cmd!("domseg");
    cmd.arg("scan")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let profile = std::fs::read_to_string(&output)?;
    let lines: Vec<&str> = profile.lines().collect();
    assert_eq!(lines.len(), 12);

    // Positions 0 and 1 are never scanned.
    assert_eq!(lines[0], "0\tNaN");
    assert_eq!(lines[1], "1\tNaN");

    let score = |line: &str| -> f64 { line.split('\t').nth(1).unwrap().parse().unwrap() };

    // The profile peaks at the true boundary.
    assert!(score(lines[5]) > score(lines[4]));
    assert!(score(lines[5]) > score(lines[6]));

    Ok(())
}
