use std::error::Error;
use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::tempdir;

const FACE_UP_JOB: &str = r#"{
    "address": "192.168.0.40",
    "capabilities": {
        "name": "Hallway",
        "face_down_tray": false,
        "supported_scalings": ["auto", "none"],
        "supported_input_formats": 5,
        "certificate": [1, 2, 3]
    },
    "params": {
        "job_name": "minutes",
        "duplex": "long-edge",
        "page_range": "1-2"
    },
    "documents": [
        { "path": "/spool/a.pdf", "mime_type": "application/pdf", "page_count": 3 },
        { "path": "/spool/b.pdf", "mime_type": "application/pdf", "page_count": 2 }
    ]
}"#;

fn write_job(dir: &Path, contents: &str) -> Result<std::path::PathBuf, Box<dyn Error>> {
    let path = dir.join("job.json");
    fs::write(&path, contents)?;
    Ok(path)
}

#[test]
fn plan_lists_face_up_job_last_document_first() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let job = write_job(dir.path(), FACE_UP_JOB)?;

    Command::cargo_bin("printseq-cli")?
        .args(["plan", job.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("stacking: face-up"))
        .stdout(predicate::str::contains("duplex: long-edge"))
        .stdout(predicate::str::contains("print-scaling: auto"))
        .stdout(predicate::str::contains("pages-per-set: 5"))
        .stdout(predicate::str::contains("1. doc 1 /spool/b.pdf page 2 [pdf]"))
        .stdout(predicate::str::contains("4. doc 0 /spool/a.pdf page 1 [pdf]"))
        .stdout(predicate::str::contains("end-of-document (page 3)"));

    Ok(())
}

#[test]
fn plan_json_encodes_certificate_and_requests() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let job = write_job(dir.path(), FACE_UP_JOB)?;

    let output = Command::cargo_bin("printseq-cli")?
        .args(["plan", job.to_str().unwrap(), "--json"])
        .output()?;
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["certificate"], "AQID");
    assert_eq!(report["format"], "pdf");
    assert_eq!(report["stacking"], "face-up");
    assert_eq!(report["smart_duplex"], false);

    let pages: Vec<(u64, u64)> = report["plan"]["requests"]
        .as_array()
        .ok_or("requests should be an array")?
        .iter()
        .map(|request| {
            (
                request["document"].as_u64().unwrap_or(u64::MAX),
                request["page_number"].as_u64().unwrap_or(0),
            )
        })
        .collect();
    assert_eq!(pages, vec![(1, 2), (1, 1), (0, 2), (0, 1)]);
    assert_eq!(report["plan"]["end_marker"]["last_page"], true);
    assert!(report["plan"]["end_marker"]["content"].is_null());

    Ok(())
}

#[test]
fn unsupported_printer_is_refused() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let job = write_job(
        dir.path(),
        r#"{
            "capabilities": { "name": "Ancient", "ipp_version_major": 0 },
            "documents": [
                { "path": "/spool/a.pdf", "mime_type": "application/pdf", "page_count": 1 }
            ]
        }"#,
    )?;

    Command::cargo_bin("printseq-cli")?
        .args(["plan", job.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not supported"));

    Ok(())
}

#[test]
fn empty_document_list_is_refused() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let job = write_job(dir.path(), r#"{ "capabilities": {}, "documents": [] }"#)?;

    Command::cargo_bin("printseq-cli")?
        .args(["plan", job.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty file list"));

    Ok(())
}
