use anyhow::Result;
use rail_terms::checker::{run_check, CheckOutcome};
use rail_terms::terms::{filter_by_category, load_terms, search};
use std::fs;
use tempfile::tempdir;

const TERMS_CSV: &str = "\
id,term,fullForm,category,description,commonUse
1,AWS,Automatic Warning System,signalling,Cab warning of signal aspect,Every approach
2,DMU,Diesel Multiple Unit,rolling-stock,Self-propelled diesel train,Branch lines
3,TPWS,Train Protection & Warning System,signalling,\"Stops trains at red signals, trips brakes\",Mainline
4,OHLE
5,P-Way,Permanent Way,track,The track and its formation,Engineering
";

#[test]
fn well_formed_file_reports_structure_and_counts() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("BritishRailTerms.csv");
    fs::write(&path, TERMS_CSV)?;

    let mut out = Vec::new();
    let outcome = run_check(&path, &mut out);
    let output = String::from_utf8(out)?;

    let report = match outcome {
        CheckOutcome::Checked(report) => report,
        other => panic!("expected a report, got {:?}", other),
    };
    assert!(report.is_valid());
    assert_eq!(report.stats.total_rows, 5);
    // the OHLE row is too short to carry a category
    assert_eq!(report.stats.categories.total(), 4);

    assert!(output.contains("CSV structure is correct!"));
    assert!(output.contains("  Total terms: 5\n"));
    assert!(output.contains(
        "Terms by category:\n  signalling: 2 terms\n  rolling-stock: 1 terms\n  track: 1 terms\n"
    ));
    Ok(())
}

#[test]
fn mismatched_header_still_counts_rows() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("terms.csv");
    fs::write(&path, "ID,Term,FullForm,Category\n1,a,b,Cat1\n2,c,d,Cat2\n3,e,f,Cat1\n")?;

    let mut out = Vec::new();
    let outcome = run_check(&path, &mut out);
    let output = String::from_utf8(out)?;

    assert!(matches!(&outcome, CheckOutcome::Checked(r) if !r.is_valid()));
    assert!(output.contains("CSV structure doesn't match expected format"));
    assert!(output.contains("  Total terms: 3\n"));
    assert!(output.contains("  Cat1: 2 terms\n  Cat2: 1 terms\n"));
    Ok(())
}

#[test]
fn missing_file_prints_not_found() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("BritishRailTerms.csv");

    let mut out = Vec::new();
    let outcome = run_check(&path, &mut out);
    let output = String::from_utf8(out)?;

    assert!(matches!(outcome, CheckOutcome::FileNotFound));
    assert!(output.contains("not found"));
    assert!(output.contains("BritishRailTerms.csv"));
    Ok(())
}

#[test]
fn binary_garbage_prints_generic_error() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("garbage.csv");
    fs::write(&path, [0xff, 0xfe, 0x00, 0x9f, b',', 0xc3, b'\n'])?;

    let mut out = Vec::new();
    let outcome = run_check(&path, &mut out);
    let output = String::from_utf8_lossy(&out).into_owned();

    match outcome {
        CheckOutcome::Failed(message) => {
            assert!(message.starts_with("Error reading file: "));
            assert!(message.contains("UTF-8") || message.contains("utf-8"), "{message}");
        }
        other => panic!("expected a failure, got {:?}", other),
    }
    assert!(output.contains("Error reading file: "));
    Ok(())
}

#[test]
fn empty_file_prints_generic_error() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("empty.csv");
    fs::write(&path, "")?;

    let mut out = Vec::new();
    let outcome = run_check(&path, &mut out);

    assert!(matches!(outcome, CheckOutcome::Failed(_)));
    assert_eq!(
        String::from_utf8(out)?,
        "Error reading file: no header row found\n"
    );
    Ok(())
}

#[test]
fn catalog_search_and_filter_from_disk() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("BritishRailTerms.csv");
    fs::write(&path, TERMS_CSV)?;

    let terms = load_terms(&path)?;
    assert_eq!(terms.len(), 5);

    let hits: Vec<_> = search(&terms, "warning").iter().map(|t| t.term.clone()).collect();
    assert_eq!(hits, vec!["AWS", "TPWS"]);

    let signalling = filter_by_category(&terms, "Signalling");
    assert_eq!(signalling.len(), 2);

    assert!(matches!(
        load_terms(&dir.path().join("missing.csv")),
        Err(rail_terms::error::CheckError::NotFound(_))
    ));
    Ok(())
}

#[test]
fn blank_lines_and_bom_on_disk() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("BritishRailTerms.csv");
    fs::write(
        &path,
        "\u{feff}id,term,fullForm,category,description,commonUse\r\n1,a,b,Cat1,x,y\r\n\r\n2,c,d,Cat1,x,y\r\n",
    )?;

    let mut out = Vec::new();
    let outcome = run_check(&path, &mut out);
    let output = String::from_utf8(out)?;

    let report = match outcome {
        CheckOutcome::Checked(report) => report,
        other => panic!("expected a report, got {:?}", other),
    };
    assert!(!report.is_valid());
    assert_eq!(report.stats.total_rows, 3);
    assert_eq!(report.stats.categories.count("Cat1"), 2);
    assert!(output.contains("CSV structure doesn't match expected format"));
    Ok(())
}
