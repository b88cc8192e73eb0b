use super::fukui_tepco::{convert, FukuiTepcoFiles};
use super::*;
use crate::DnetError;

#[test]
fn basic() {
    let data = r#"
nodes:
  - [section_-001, section_0001]
  - [section_0001, switch_0001]
  - [switch_0001, section_0002]
switches: [switch_0001]
sections:
  section_-001:
    load: [0, 0, 0, 0, 0, 0]
    impedance: [0.1, 0, 0.1, 0, 0.1, 0]
    substation: true
  section_0001:
    load: [10, 1, 10, 1, 10, 1]
    impedance: [1, 0.5, 1, 0.5, 1, 0.5]
  section_0002:
    load: [5, 0, 5, 0, 5, 0]
    impedance: [2, 0, 2, 0, 2, 0]
"#;
    let doc = NetworkDocument::from_yaml(data).unwrap();
    assert_eq!(doc.nodes.len(), 3);
    assert_eq!(doc.switches, vec!["switch_0001"]);
    assert_eq!(doc.sections.len(), 3);
    assert_eq!(doc.substation_count(), 1);

    let s1 = &doc.sections["section_0001"];
    assert!(!s1.substation);
    assert_eq!(s1.load_phases()[0], Complex64::new(10.0, 1.0));
    assert_eq!(s1.impedance_phases()[2], Complex64::new(1.0, 0.5));

    let round_trip = NetworkDocument::from_yaml(&doc.to_yaml().unwrap()).unwrap();
    assert_eq!(round_trip, doc);
}

#[test]
fn wrong_load_length() {
    let data = r#"
nodes: []
switches: []
sections:
  section_0001:
    load: [10, 1, 10]
    impedance: [1, 0, 1, 0, 1, 0]
"#;
    assert!(NetworkDocument::from_yaml(data).is_err());
}

#[test]
fn read_fixtures() {
    let doc = NetworkDocument::read_from_file("../networks/line.yaml").unwrap();
    assert_eq!(doc.switches.len(), 2);
    assert_eq!(doc.substation_count(), 2);

    let err = NetworkDocument::read_from_file("../networks/does_not_exist.yaml").unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}

fn legacy_line() -> FukuiTepcoFiles {
    FukuiTepcoFiles {
        switches: "2 4\n".to_string(),
        topology: "1 10 11 0\n2 11 12 0\n3 12 13 0\n4 13 14 0\n5 14 15 0\n".to_string(),
        loads: "0 1 10 11 10 0 10 0 10 0\n\
                0 3 12 13 20 0 20 0 20 0\n\
                0 5 14 15 30 0 30 0 30 0\n"
            .to_string(),
        impedances: "1 0 10 11 1 0 0 0 0 0\n\
                     1 1 10 11 0 0 1 0 0 0\n\
                     1 2 10 11 0 0 0 0 1 0\n\
                     3 0 12 13 2 0 0 0 0 0\n\
                     3 1 12 13 0 0 2 0 0 0\n\
                     3 2 12 13 0 0 0 0 2 0\n\
                     5 0 14 15 3 0 0 0 0 0\n\
                     5 1 14 15 0 0 3 0 0 0\n\
                     5 2 14 15 0 0 0 0 3 0\n"
            .to_string(),
        roots: "0 10 0 0 0 0.1 0\n0 15 0 0 0 0.1 0\n".to_string(),
    }
}

#[test]
fn fukui_tepco_line() {
    let doc = convert(&legacy_line()).unwrap();
    assert_eq!(doc.switches, vec!["switch_0002", "switch_0004"]);
    assert_eq!(
        doc.sections.keys().collect::<Vec<_>>(),
        vec![
            "section_-010",
            "section_-015",
            "section_0001",
            "section_0003",
            "section_0005"
        ]
    );
    assert_eq!(doc.nodes.len(), 6);
    assert_eq!(doc.nodes[0], vec!["section_-010", "section_0001"]);
    assert_eq!(doc.nodes[1], vec!["section_0001", "switch_0002"]);
    assert_eq!(doc.substation_count(), 2);

    let root = &doc.sections["section_-010"];
    assert!(root.substation);
    assert_eq!(root.impedance, [0.1, 0.0, 0.1, 0.0, 0.1, 0.0]);
    let s3 = &doc.sections["section_0003"];
    assert!(!s3.substation);
    assert_eq!(s3.load, [20.0, 0.0, 20.0, 0.0, 20.0, 0.0]);
    assert_eq!(s3.impedance, [2.0, 0.0, 2.0, 0.0, 2.0, 0.0]);
}

#[test]
fn fukui_tepco_root_next_to_switch() {
    let mut files = legacy_line();
    // A substation at node 11 would touch switch 2.
    files.roots = "0 11 0 0 0 0.1 0\n".to_string();
    assert!(matches!(convert(&files), Err(DnetError::Structural(_))));
}

#[test]
fn fukui_tepco_malformed_row() {
    let mut files = legacy_line();
    files.topology = "1 10 11\n".to_string();
    assert!(matches!(convert(&files), Err(DnetError::BadInput(_))));
}
