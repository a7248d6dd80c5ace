mod common;

use common::{strings, upload};
use sheetmerge_sheet::{MemoryStore, Session, SessionId, Table, TemplateConfig, UploadedFile};

/// A default-geometry template: company at B1, code at B2, sub-table
/// headers on row 4 at A-C and E-G. Each data row spans both sub-tables.
fn template(company: &str, code: &str, data: &[&[&str]]) -> Vec<Vec<String>> {
    let mut rows = vec![
        strings(&["회사", company]),
        strings(&["코드", code]),
        Vec::new(),
        strings(&["Name", "Dept", "Title", "", "Name2", "Dept2", "Title2"]),
    ];
    rows.extend(data.iter().map(|row| strings(row)));
    rows
}

fn template_file(name: &str, rows: &[Vec<String>]) -> UploadedFile {
    let borrowed: Vec<Vec<&str>> = rows
        .iter()
        .map(|row| row.iter().map(String::as_str).collect())
        .collect();
    let slices: Vec<&[&str]> = borrowed.iter().map(Vec::as_slice).collect();
    upload(name, &slices)
}

#[test]
fn test_flatten_workbook() {
    let mut rows = template(
        "Acme",
        "C1",
        &[
            &["Kim", "Sales", "Lead", "", "Lee", "Ops", "Staff"],
            &["Park", "HR", "Manager"],
        ],
    );
    // blank left side ends the data even though rows follow
    rows.push(Vec::new());
    rows.push(strings(&["", "", "", "", "Ghost"]));
    rows.push(strings(&["Late", "Row", "Here"]));
    let file = template_file("acme.xlsx", &rows);

    let table = Table::from_template_bytes(&file.bytes, &TemplateConfig::default(), &file.name).unwrap();

    assert_eq!(
        table.headers(),
        strings(&["코드", "회사", "Name", "Dept", "Title", "Name2", "Dept2", "Title2"]).as_slice()
    );
    assert_eq!(table.row_count(), 2);
    assert_eq!(
        table.rows()[0],
        strings(&["C1", "Acme", "Kim", "Sales", "Lead", "Lee", "Ops", "Staff"])
    );
    assert_eq!(
        table.rows()[1],
        strings(&["C1", "Acme", "Park", "HR", "Manager", "", "", ""])
    );
    assert_eq!(table.source_name(), "acme.xlsx");
}

#[test]
fn test_upload_templates_merges_without_header_check() {
    let mut store = MemoryStore::new();
    let mut session = Session::new(&mut store, SessionId::new("user"));

    let acme = template("Acme", "C1", &[&["Kim", "Sales", "Lead", "", "Lee", "Ops", "Staff"]]);
    let globex = template(
        "Globex",
        "C2",
        &[
            &["Choi", "Dev", "Senior"],
            &["Jung", "Dev", "Junior", "", "Han", "QA", "Tester"],
        ],
    );

    let report = session
        .upload_templates(&[
            template_file("acme.xlsx", &acme),
            UploadedFile::new("corrupt.xlsx", b"\x00\x01\x02".to_vec()),
            template_file("globex.xlsx", &globex),
        ])
        .unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.total_rows, 3);

    let table = session.table();
    assert_eq!(table.source_name(), "acme.xlsx");
    assert_eq!(table.rows()[0][..2], strings(&["C1", "Acme"])[..]);
    assert_eq!(table.rows()[1][..3], strings(&["C2", "Globex", "Choi"])[..]);
    assert_eq!(table.rows()[2][5..], strings(&["Han", "QA", "Tester"])[..]);
}

#[test]
fn test_upload_templates_uses_session_config() {
    let mut store = MemoryStore::new();
    let mut session = Session::new(&mut store, SessionId::new("user"));
    session
        .save_config(TemplateConfig {
            company_row: 0,
            company_col: 0,
            code_row: 0,
            code_col: 1,
            data_start_row: 1,
            left_table_start_col: 0,
            right_table_start_col: 2,
            col_count: 2,
        })
        .unwrap();

    let file = upload(
        "compact.xlsx",
        &[
            &["Initech", "I-9"],
            &["a", "b", "c", "d"],
            &["1", "2", "3", "4"],
        ],
    );
    session.upload_templates(&[file]).unwrap();

    let table = session.table();
    assert_eq!(table.headers(), strings(&["코드", "회사", "a", "b", "c", "d"]).as_slice());
    assert_eq!(table.rows(), &[strings(&["I-9", "Initech", "1", "2", "3", "4"])]);
}

#[test]
fn test_template_then_generic_upload_share_table() {
    let mut store = MemoryStore::new();
    let mut session = Session::new(&mut store, SessionId::new("user"));

    let acme = template("Acme", "C1", &[&["Kim", "Sales", "Lead", "", "Lee", "Ops", "Staff"]]);
    session
        .upload_templates(&[template_file("acme.xlsx", &acme)])
        .unwrap();

    // A plain sheet with the flattened header merges into the same table.
    let report = session
        .upload(&[upload(
            "flat.xlsx",
            &[
                &["코드", "회사", "Name", "Dept", "Title", "Name2", "Dept2", "Title2"],
                &["C9", "Other", "Yoon", "Legal", "Head", "", "", ""],
            ],
        )])
        .unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(session.table().row_count(), 2);
}
