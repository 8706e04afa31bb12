//! Tests for the in-memory stages: change list, extraction and naming.

use xdb_edit::{ChangeListError, NamingPolicy, NamingTemplate, ReferenceExtractor, parse_change_list};

#[test]
fn test_crlf_change_list_to_mirror_names() {
    let list = "./citi_4vallees/dbo.ADD_RES.StoredProcedure.sql:33:\tINSERT INTO [CITI_STATS].[dbo].[TB_MANUALRESERVATION]\r\n\
                \r\n\
                ./citi_4vallees/dbo.GET.sql:0:SELECT 1\r\n";
    let entries = parse_change_list(list);
    assert_eq!(entries.len(), 2);
    assert_eq!(
        entries[1].parsed,
        Err(ChangeListError::LineNumber("0".to_string()))
    );

    let request = entries[0].parsed.clone().expect("Should parse");
    assert_eq!(request.database_hint, "citi_4vallees");
    assert_eq!(request.line_index, 32);

    let extractor = ReferenceExtractor::new("CITI_").expect("valid prefix");
    let refs = extractor
        .extract_all(&request.original_text)
        .expect("Should find reference");
    let policy = NamingPolicy::Mirror(NamingTemplate::parse("mr_{1}__{2}").expect("valid template"));
    let rewritten = policy
        .rewrite_statement(&request.database_hint, &request.original_text, &refs)
        .expect("Should rewrite");
    assert_eq!(rewritten, "\tINSERT INTO mr_CITI_STATS__TB_MANUALRESERVATION");
}

#[test]
fn test_self_reference_keeps_foreign_names() {
    let stmt = "select * from citi_ip..tb_ip i join CITI_CORE.dbo.TB_CLIENT c on 1 = 1";
    let extractor = ReferenceExtractor::new("CITI_").expect("valid prefix");
    let refs = extractor.extract_all(stmt).expect("Should find references");
    assert_eq!(refs.len(), 2);

    let rewritten = NamingPolicy::SelfReference
        .rewrite_statement("citi_ip", stmt, &refs)
        .expect("Should rewrite");
    assert_eq!(rewritten, "select * from tb_ip i join CITI_CORE.dbo.TB_CLIENT c on 1 = 1");
}

#[test]
fn test_custom_prefix() {
    let extractor = ReferenceExtractor::new("ACME_").expect("valid prefix");
    assert!(extractor.extract_all("FROM CITI_A..T").is_err());
    let reference = extractor
        .extract_first("FROM [acme_sales]..[orders]")
        .expect("Should match");
    assert_eq!(reference.database, "acme_sales");
    assert_eq!(reference.schema, "dbo");
    assert!(!reference.explicit_schema);
}
