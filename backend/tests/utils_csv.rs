use attendance_backend::utils::csv::{render_csv, render_sectioned_csv};

#[test]
fn csv_handles_newlines_and_commas_in_fields() {
    let csv = render_csv(&["Notes"], &[vec!["line1\nline2".into()], vec!["a, b, c".into()]])
        .expect("render");
    assert_eq!(csv, "\"Notes\"\n\"line1\nline2\"\n\"a, b, c\"\n");
}

#[test]
fn csv_formula_guard_covers_plus_and_at() {
    let csv = render_csv(&["Value"], &[vec!["+1+2".into()], vec!["@SUM(A1)".into()]])
        .expect("render");
    assert!(csv.contains("\"'+1+2\""));
    assert!(csv.contains("\"'@SUM(A1)\""));
}

#[test]
fn csv_leaves_plain_text_and_empty_cells_alone() {
    let csv = render_csv(&["A", "B"], &[vec!["normal text".into(), String::new()]])
        .expect("render");
    assert_eq!(csv, "\"A\",\"B\"\n\"normal text\",\"\"\n");
}

#[test]
fn sectioned_csv_allows_ragged_rows_and_blank_separators() {
    let csv = render_sectioned_csv(&[
        vec![vec!["Title".into()], vec!["Key".into(), "Value".into()]],
        vec![vec!["A".into(), "B".into(), "C".into()]],
    ])
    .expect("render");
    assert_eq!(
        csv,
        "\"Title\"\n\"Key\",\"Value\"\n\n\"A\",\"B\",\"C\"\n"
    );
}
