use roster_model::{
    CellCategory, CellValue, MappingKey, MappingTable, ModelError, Separators, TransformOptions,
    UnmappedPolicy, normalize_code,
};

#[test]
fn later_duplicate_key_wins_in_place() {
    let table = MappingTable::from_pairs(
        "HAN",
        [("B1", "NP"), ("B2", "SB"), ("b1", "Rest")],
    );

    assert_eq!(table.entry_count(), 2);
    assert_eq!(table.entries()[0].code, "b1");
    assert_eq!(table.entries()[0].replacement, "Rest");
    assert_eq!(table.entries()[1].code, "B2");
    assert_eq!(table.get("B1"), Some("Rest"));
}

#[test]
fn blank_codes_are_ignored() {
    let table = MappingTable::from_pairs("HAN", [("  ", "X"), ("", "Y"), ("OT", "")]);
    assert_eq!(table.entry_count(), 1);
    assert_eq!(table.get("ot"), Some(""));
}

#[test]
fn merge_applies_other_table_on_top() {
    let mut base = MappingTable::from_pairs("SGN", [("B1", "NP"), ("B2", "SB")]);
    let update = MappingTable::from_pairs("SGN", [("B2", "Standby"), ("OFF", "Nghỉ")]);
    base.merge(&update);

    assert_eq!(base.entry_count(), 3);
    assert_eq!(base.get("B2"), Some("Standby"));
    assert_eq!(base.get("off"), Some("Nghỉ"));
}

#[test]
fn mapping_key_classification() {
    assert_eq!(MappingKey::classify("B19"), MappingKey::Exact("B19".to_string()));
    assert!(MappingKey::classify("^O'.*").is_pattern());
    assert!(MappingKey::classify("TR\\d+$").is_pattern());
    assert!(MappingKey::classify("BD*_O").is_pattern());
    assert_eq!(MappingKey::classify(" OT ").as_str(), "OT");
}

#[test]
fn normalize_code_trims_and_uppercases() {
    assert_eq!(normalize_code("  b19 "), "B19");
    assert_eq!(normalize_code("đt"), "ĐT");
}

#[test]
fn category_significance_order() {
    assert_eq!(
        CellCategory::Unchanged.combine(CellCategory::Empty),
        CellCategory::Empty
    );
    assert_eq!(
        CellCategory::Empty.combine(CellCategory::Mapped),
        CellCategory::Mapped
    );
    assert_eq!(
        CellCategory::Mapped.combine(CellCategory::Unchanged),
        CellCategory::Mapped
    );
}

#[test]
fn separators_parse_and_reject() {
    let parsed = Separators::parse("/;/").expect("parse separators");
    assert_eq!(parsed.as_slice(), &['/', ';']);
    assert_eq!(Separators::parse(""), Err(ModelError::EmptySeparators));
    assert_eq!(
        Separators::parse("\t"),
        Err(ModelError::InvalidSeparator('\t'))
    );
    assert_eq!(Separators::default().as_slice(), &['/', ',', ';', ' ']);
}

#[test]
fn transform_options_builders() {
    let options = TransformOptions::new()
        .with_unmapped_policy(UnmappedPolicy::Delete)
        .with_separators(Separators::parse("/").expect("parse"));
    assert_eq!(options.unmapped_policy, UnmappedPolicy::Delete);
    assert_eq!(options.separators.as_slice(), &['/']);
    assert_eq!(TransformOptions::default().unmapped_policy, UnmappedPolicy::Preserve);
}

#[test]
fn unmapped_policy_serializes_lowercase() {
    let json = serde_json::to_string(&UnmappedPolicy::Delete).expect("serialize");
    assert_eq!(json, "\"delete\"");
}

#[test]
fn cell_value_display_text() {
    assert_eq!(CellValue::Number(12.0).display_text(), "12");
    assert_eq!(CellValue::Number(1.5).display_text(), "1.5");
    assert_eq!(CellValue::Bool(true).display_text(), "TRUE");
    let formula = CellValue::Formula {
        formula: "A1&B1".to_string(),
        cached: Some(Box::new(CellValue::Text("B1B2".to_string()))),
    };
    assert_eq!(formula.display_text(), "B1B2");
    assert_eq!(formula.as_text(), None);
}
