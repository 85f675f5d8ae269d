use std::fs;
use std::path::PathBuf;

use printseq_printing::{
    prepare_job, DocumentDescriptor, DuplexMode, JobParameters, PrinterCapabilities,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct JobCase {
    name: String,
    printer: PrinterCapabilities,
    params: JobParameters,
    two_sided: bool,
    documents: Vec<DocumentDescriptor>,
    expected: Expected,
}

#[derive(Debug, Deserialize)]
struct Expected {
    pages: Vec<(usize, u32)>,
    end_marker: u32,
    print_scaling: String,
    duplex_disabled: bool,
    pages_per_set: u32,
}

fn load_cases() -> Vec<JobCase> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/jobs.ron");
    let text = fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read fixture {:?}: {err}", path));
    ron::from_str(&text).unwrap_or_else(|err| panic!("failed to parse fixture {:?}: {err}", path))
}

#[test]
fn fixture_jobs_plan_as_expected() {
    let cases = load_cases();
    assert!(!cases.is_empty(), "expected at least one fixture case");

    for case in cases {
        let mut params = case.params.clone();
        if case.two_sided {
            params.duplex = DuplexMode::LongEdge;
        }

        let prepared = prepare_job(&case.documents, &params, &case.printer)
            .unwrap_or_else(|err| panic!("{}: preparation failed: {err}", case.name));

        let pages: Vec<(usize, u32)> = prepared
            .plan
            .pages()
            .iter()
            .map(|request| (request.document.unwrap_or(usize::MAX), request.page_number))
            .collect();
        assert_eq!(pages, case.expected.pages, "{}: page order", case.name);
        assert_eq!(
            prepared.plan.end_marker.page_number, case.expected.end_marker,
            "{}: end marker",
            case.name
        );
        assert_eq!(
            prepared.params.print_scaling, case.expected.print_scaling,
            "{}: scaling",
            case.name
        );
        assert_eq!(
            prepared.smart_duplex, case.expected.duplex_disabled,
            "{}: smart duplex",
            case.name
        );
        if case.expected.duplex_disabled {
            assert_eq!(prepared.params.duplex, DuplexMode::Off, "{}", case.name);
        }
        assert_eq!(
            prepared.params.job_pages_per_set, case.expected.pages_per_set,
            "{}: page total",
            case.name
        );
    }
}
