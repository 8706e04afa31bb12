//! Tests for the supplementary generators.

use std::fs;

use tempfile::TempDir;
use xdb_cli::{
    ExternalDataSourceEntry, GenerateError, INITIAL_CONFIG, InitialConfig, MASTER_KEY_CONFIG,
    MasterKeyEntry, MasterMirrorEntry, SEARCH_AND_REPLACE_CONFIG, SqlTemplates, TableEntry,
    generate_external_data_sources, generate_from_template, generate_master_keys,
    generate_master_mirror, generate_sqlcmd_script, generate_table_list, load_entries,
    load_required, load_rewrite_settings, write_blank_configs,
};
use xdb_edit::ScriptDialect;

fn master_key(local_db: &str) -> MasterKeyEntry {
    MasterKeyEntry {
        local_db: Some(local_db.to_string()),
        ..MasterKeyEntry::default()
    }
}

#[test]
fn test_master_keys_inherit_and_write() {
    let dir = TempDir::new().expect("Create temp dir");
    let entries = vec![
        MasterKeyEntry {
            folder: Some("keys".to_string()),
            local_db: Some("citi_stats".to_string()),
            password: Some("pw".to_string()),
            credential: Some("pool_cred".to_string()),
            identity: Some("pool_user".to_string()),
            secret: Some("s3cret".to_string()),
        },
        master_key("citi_core"),
    ];

    let report = generate_master_keys(entries, &SqlTemplates::builtin(), dir.path())
        .expect("Should generate");

    assert_eq!(report.written.len(), 2);
    let second = dir.path().join("keys/CreateMasterKey__citi_core__x__x.sql");
    assert_eq!(report.written[1], second);
    let sql = fs::read_to_string(&second).expect("Read script");
    assert!(sql.contains("-- Master key and scoped credential for citi_core"));
    assert!(sql.contains("[pool_cred]"));
}

#[test]
fn test_existing_outputs_are_kept() {
    let dir = TempDir::new().expect("Create temp dir");
    let entry = MasterKeyEntry {
        local_db: Some("citi_a".to_string()),
        password: Some("pw".to_string()),
        credential: Some("c".to_string()),
        identity: Some("i".to_string()),
        secret: Some("s".to_string()),
        folder: None,
    };
    let existing = dir.path().join("CreateMasterKey__citi_a__x__x.sql");
    fs::write(&existing, "hand edited").expect("Write existing");

    let report = generate_master_keys(vec![entry], &SqlTemplates::builtin(), dir.path())
        .expect("Should generate");

    assert!(report.written.is_empty());
    assert_eq!(report.skipped, vec![existing.clone()]);
    assert_eq!(fs::read_to_string(&existing).expect("Read"), "hand edited");
}

#[test]
fn test_missing_field_writes_nothing() {
    let dir = TempDir::new().expect("Create temp dir");
    let result = generate_master_keys(
        vec![master_key("citi_a")],
        &SqlTemplates::builtin(),
        dir.path(),
    );

    assert!(matches!(
        result,
        Err(GenerateError::MissingField {
            index: 1,
            field: "password"
        })
    ));
    assert_eq!(fs::read_dir(dir.path()).expect("Read dir").count(), 0);
}

#[test]
fn test_two_way_data_sources() {
    let dir = TempDir::new().expect("Create temp dir");
    let entries = vec![
        ExternalDataSourceEntry {
            local_db: Some("citi_a".to_string()),
            external_db: Some("citi_b".to_string()),
            server_name: Some("srv.database.windows.net".to_string()),
            credential: Some("pool_cred".to_string()),
            twoway: Some("1".to_string()),
            folder: None,
        },
        ExternalDataSourceEntry {
            external_db: Some("citi_c".to_string()),
            twoway: Some("0".to_string()),
            ..ExternalDataSourceEntry::default()
        },
    ];

    let report = generate_external_data_sources(entries, &SqlTemplates::builtin(), dir.path())
        .expect("Should generate");

    let names: Vec<String> = report
        .written
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "CreateExternalDataSource_citi_a__citi_b.sql",
            "CreateExternalDataSource_citi_b__citi_a.sql",
            "CreateExternalDataSource_citi_a__citi_c.sql",
        ]
    );
    let reverse = fs::read_to_string(dir.path().join("CreateExternalDataSource_citi_b__citi_a.sql"))
        .expect("Read script");
    assert!(reverse.contains("DATABASE_NAME = 'citi_a'"));
    assert!(reverse.contains("LOCATION = 'srv.database.windows.net'"));
}

#[test]
fn test_sqlcmd_script_for_directory() {
    let dir = TempDir::new().expect("Create temp dir");
    fs::write(dir.path().join("b.sql"), "select 2").expect("Write");
    fs::write(dir.path().join("a.SQL"), "select 1").expect("Write");
    fs::write(dir.path().join("notes.txt"), "x").expect("Write");
    fs::create_dir(dir.path().join("nested.sql")).expect("Create dir");

    let path = generate_sqlcmd_script(dir.path(), "sql01", ScriptDialect::PowerShell)
        .expect("Should generate");

    assert_eq!(path, dir.path().join("apply.ps1"));
    assert_eq!(
        fs::read_to_string(&path).expect("Read script"),
        "sqlcmd -b -S sql01 -i \"a.SQL\"\n\
         if ($LASTEXITCODE -eq 0) {git add \"a.SQL\"}\n\
         sqlcmd -b -S sql01 -i \"b.sql\"\n\
         if ($LASTEXITCODE -eq 0) {git add \"b.sql\"}\n\n"
    );

    assert!(matches!(
        generate_sqlcmd_script(dir.path(), "sql01", ScriptDialect::PowerShell),
        Err(GenerateError::OutputExists(_))
    ));
}

#[test]
fn test_sqlcmd_setup_errors() {
    let dir = TempDir::new().expect("Create temp dir");
    assert!(matches!(
        generate_sqlcmd_script(&dir.path().join("missing"), "sql01", ScriptDialect::Cmd),
        Err(GenerateError::NotADirectory(_))
    ));
    assert!(matches!(
        generate_sqlcmd_script(dir.path(), "", ScriptDialect::Cmd),
        Err(GenerateError::MissingServer)
    ));
    assert!(matches!(
        generate_sqlcmd_script(dir.path(), "sql01", ScriptDialect::Cmd),
        Err(GenerateError::Script(_))
    ));
    assert!(!dir.path().join("apply.bat").exists());
}

#[test]
fn test_blank_configs_load_back() {
    let dir = TempDir::new().expect("Create temp dir");
    let config_dir = dir.path().join("config");

    let report = write_blank_configs(&config_dir).expect("Should write");
    assert_eq!(report.written.len(), 5);

    let settings = load_rewrite_settings(&config_dir).expect("Should load");
    assert_eq!(settings.local_server, None);
    assert_eq!(settings.database_prefix.as_deref(), Some("CITI_"));

    let entries: Vec<MasterKeyEntry> =
        load_entries(&config_dir.join(MASTER_KEY_CONFIG)).expect("Should load");
    assert_eq!(entries, vec![MasterKeyEntry::default()]);
    let initial: InitialConfig =
        load_required(&config_dir.join(INITIAL_CONFIG)).expect("Should load");
    assert_eq!(initial, InitialConfig::default());

    fs::write(config_dir.join(SEARCH_AND_REPLACE_CONFIG), "{\"localServer\":\"sql01\"}")
        .expect("Write config");
    let again = write_blank_configs(&config_dir).expect("Should write");
    assert!(again.written.is_empty());
    assert_eq!(again.skipped.len(), 5);
    assert_eq!(
        load_rewrite_settings(&config_dir)
            .expect("Should load")
            .local_server
            .as_deref(),
        Some("sql01")
    );
}

fn file_names(paths: &[std::path::PathBuf]) -> Vec<String> {
    paths
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_master_mirror_scripts_by_kind() {
    let dir = TempDir::new().expect("Create temp dir");
    let entries = vec![
        MasterMirrorEntry {
            folder: Some("master".to_string()),
            master_db: Some("citi_ip".to_string()),
            mirror_db: Some("citi_stats".to_string()),
            table: Some("tb_ip".to_string()),
        },
        MasterMirrorEntry {
            table: Some("tb_location".to_string()),
            ..MasterMirrorEntry::default()
        },
    ];

    let report = generate_master_mirror(entries, &SqlTemplates::builtin(), dir.path())
        .expect("Should generate");

    assert_eq!(
        file_names(&report.written),
        vec![
            "MasterAlterTable_citi_ip_citi_stats_tb_ip.sql",
            "MasterAlterTable_citi_ip_citi_stats_tb_location.sql",
            "MasterCreateSP_citi_ip_citi_stats_tb_ip.sql",
            "MasterCreateSP_citi_ip_citi_stats_tb_location.sql",
        ]
    );
    let sp = fs::read_to_string(
        dir.path()
            .join("master/MasterCreateSP_citi_ip_citi_stats_tb_location.sql"),
    )
    .expect("Read script");
    assert!(sp.contains("[dbo].[mr_push__citi_stats__tb_location]"));
}

#[test]
fn test_master_mirror_missing_table() {
    let dir = TempDir::new().expect("Create temp dir");
    let entry = MasterMirrorEntry {
        master_db: Some("citi_ip".to_string()),
        mirror_db: Some("citi_stats".to_string()),
        ..MasterMirrorEntry::default()
    };
    assert!(matches!(
        generate_master_mirror(vec![entry], &SqlTemplates::builtin(), dir.path()),
        Err(GenerateError::MissingField {
            index: 1,
            field: "table"
        })
    ));
    assert_eq!(fs::read_dir(dir.path()).expect("Read dir").count(), 0);
}

#[test]
fn test_table_list_written_once() {
    let dir = TempDir::new().expect("Create temp dir");
    let config = InitialConfig {
        folder: Some("lists".to_string()),
        master_tables: Some("CITI_STATS..TB_RESERVATION\r\nCITI_IP.dbo.TB_IP\r\n".to_string()),
        ..InitialConfig::default()
    };

    let report = generate_table_list(&config, dir.path()).expect("Should generate");
    let path = dir.path().join("lists/TableList.json");
    assert_eq!(report.written, vec![path.clone()]);

    let tables: Vec<TableEntry> = load_required(&path).expect("Should load");
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[0].remote_db.as_deref(), Some("CITI_STATS"));
    assert_eq!(tables[1].table.as_deref(), Some("TB_IP"));

    fs::write(&path, "[]").expect("Edit list");
    let again = generate_table_list(&config, dir.path()).expect("Should generate");
    assert_eq!(again.skipped, vec![path.clone()]);
    assert_eq!(fs::read_to_string(&path).expect("Read list"), "[]");
}

#[test]
fn test_table_list_rejects_two_part_name() {
    let dir = TempDir::new().expect("Create temp dir");
    let config = InitialConfig {
        master_tables: Some("CITI_STATS..TB_A\nCITI_STATS.TB_B".to_string()),
        ..InitialConfig::default()
    };
    assert!(matches!(
        generate_table_list(&config, dir.path()),
        Err(GenerateError::NotThreePart(line)) if line == "CITI_STATS.TB_B"
    ));
    assert!(!dir.path().join("TableList.json").exists());
}

#[test]
fn test_template_from_config_fields() {
    let dir = TempDir::new().expect("Create temp dir");
    let template = dir.path().join("GrantMirror.sql");
    fs::write(
        &template,
        "-- {{ mirrorDB }} on {{serverName}}\nGRANT SELECT ON SCHEMA::dbo TO [{{ mirrorDB }}_reader]",
    )
    .expect("Write template");
    let fields = serde_json::json!({
        "mirrorDB": "citi_stats",
        "serverName": "srv.database.windows.net",
        "folder": null
    });
    let fields = fields.as_object().cloned().expect("Object");

    let out = dir.path().join("scripts");
    let report = generate_from_template(&template, fields, &SqlTemplates::builtin(), &out)
        .expect("Should generate");

    let path = out.join("GrantMirror__citi_stats__x__x.sql");
    assert_eq!(report.written, vec![path.clone()]);
    assert_eq!(
        fs::read_to_string(&path).expect("Read script"),
        "-- citi_stats on srv.database.windows.net\n\
         GRANT SELECT ON SCHEMA::dbo TO [citi_stats_reader]\n"
    );
}

#[test]
fn test_template_unknown_placeholder_writes_nothing() {
    let dir = TempDir::new().expect("Create temp dir");
    let template = dir.path().join("Logging.sql");
    fs::write(&template, "-- {{ mirrorDB }} {{ folder }} {{ loggingUrl }}").expect("Write template");
    let fields = serde_json::json!({ "mirrorDB": "citi_stats", "folder": null });
    let fields = fields.as_object().cloned().expect("Object");

    let out = dir.path().join("scripts");
    assert!(matches!(
        generate_from_template(&template, fields, &SqlTemplates::builtin(), &out),
        Err(GenerateError::TemplateFile { .. })
    ));
    assert!(!out.exists());

    let no_mirror = serde_json::Map::new();
    assert!(matches!(
        generate_from_template(&template, no_mirror, &SqlTemplates::builtin(), &out),
        Err(GenerateError::MissingField {
            field: "mirrorDB",
            ..
        })
    ));
}
