use revtree::change::parse_line;
use revtree::{ChangeBatch, ChangeError, ChangeKind};
use test_case::test_case;

#[test_case("A\tsrc/a.rs", ChangeKind::Add, "src/a.rs", None ; "add")]
#[test_case("D\tsrc/a.rs", ChangeKind::Delete, "src/a.rs", None ; "delete")]
#[test_case("M\tREADME", ChangeKind::Modify, "README", None ; "modify")]
#[test_case("T\tbin/tool", ChangeKind::Modify, "bin/tool", None ; "type change")]
#[test_case("R100\ta/x\tb/x", ChangeKind::Rename, "a/x", Some("b/x") ; "exact rename")]
#[test_case("R042\ta/x\ta/y", ChangeKind::Rename, "a/x", Some("a/y") ; "partial rename")]
#[test_case("R\told\tnew", ChangeKind::Rename, "old", Some("new") ; "rename without score")]
#[test_case("A  spaced/out.txt", ChangeKind::Add, "spaced/out.txt", None ; "whitespace separated")]
#[test_case("A\tdir/trailing/", ChangeKind::Add, "dir/trailing", None ; "trailing separator")]
fn parses_valid_line(line: &str, kind: ChangeKind, path: &str, new_path: Option<&str>) {
    let event = parse_line(1, line).unwrap();
    assert_eq!(event.kind(), kind);
    assert_eq!(event.path().join("/"), path);
    assert_eq!(event.new_path().map(|labels| labels.join("/")), new_path.map(String::from));
}

#[test_case("X\tsrc/a.rs" ; "unknown kind")]
#[test_case("C075\ta\tb" ; "copy")]
#[test_case("AM\tsrc/a.rs" ; "suffixed status")]
#[test_case("R100\tonly-one" ; "rename missing target")]
#[test_case("R9x\ta\tb" ; "bad rename score")]
#[test_case("A" ; "missing path")]
#[test_case("D\ta\tb" ; "extra path")]
fn rejects_malformed_line(line: &str) {
    assert!(matches!(
        parse_line(7, line),
        Err(ChangeError::Malformed { line: 7, .. })
    ));
}

#[test_case("A\ta//b" ; "empty segment")]
#[test_case("A\t/" ; "root only")]
#[test_case("M\tnotes[1].txt" ; "reserved bracket")]
fn rejects_invalid_path(line: &str) {
    assert!(matches!(
        parse_line(3, line),
        Err(ChangeError::InvalidPath { line: 3, .. })
    ));
}

#[test]
fn batch_reports_first_bad_line() {
    let text = "A\tok\n\nM\tfine\nZ\tbad\nA\tnever/read\n";
    match ChangeBatch::from_name_status("v2", text) {
        Err(ChangeError::Malformed { line, .. }) => assert_eq!(line, 4),
        other => panic!("expected malformed line, got {:?}", other),
    }
}
