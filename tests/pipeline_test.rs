use chatbase::catalog::TableCatalog;
use chatbase::config::DbConfig;
use chatbase::executor::{QueryExecutor, QueryOutcome};
use chatbase::generator::SqlGenerator;
use chatbase::schema::ColumnDescriptor;
use chatbase::selector::TableSelector;
use chatbase::session::SessionLog;
use chatbase::spelling::SpellingCorrector;
use chatbase::synthesizer::AnswerSynthesizer;
use chatbase::tagger::EntityTagger;
use chatbase::vocabulary::Vocabulary;
use std::collections::BTreeMap;
use std::io::Write;

fn bugfix_vocabulary() -> Vocabulary {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"organization": ["acme corp"]}}"#).unwrap();
    Vocabulary::load(file.path()).unwrap()
}

/// The end-to-end front half of the pipeline: correction, tagging, and the
/// prompts the two generation stages would send.
#[test]
fn test_bugfix_commits_scenario() {
    let vocabulary = bugfix_vocabulary();
    let corrector = SpellingCorrector::default();
    let tagger = EntityTagger;

    let input = "show me bugfix commits for acme corp last 3 months";
    let corrected = corrector.correct(&vocabulary, input);
    assert_eq!(corrected, input);

    let tagged = tagger.tag(&vocabulary, &corrected);
    assert_eq!(
        tagged,
        "show me bugfix commits for acme corp(organization) last 3 months"
    );

    // The table-selection prompt embeds the tagged form and the catalog.
    let catalog = TableCatalog::from_pairs([
        ("t_org_repo", "Repositories"),
        ("t_commit_file", "Commit Files"),
    ]);
    let selector_prompt = TableSelector.build_prompt(input, &tagged, &catalog);
    assert!(selector_prompt.contains("acme corp(organization)"));
    assert!(selector_prompt.contains("t_org_repo"));
    assert!(selector_prompt.contains("t_commit_file"));

    // The generation prompt rejects hardcoded dates in favor of relative
    // date arithmetic.
    let mut table_columns = BTreeMap::new();
    table_columns.insert(
        "t_commit_file".to_string(),
        vec![ColumnDescriptor {
            name: "commit_date".to_string(),
            data_type: "datetime".to_string(),
            nullable: "YES".to_string(),
            key: String::new(),
            default: None,
            extra: String::new(),
        }],
    );
    let generator_prompt = SqlGenerator.build_prompt(input, &vocabulary, &table_columns);
    assert!(generator_prompt.contains("DATE_SUB()"));
    assert!(generator_prompt.contains("Do not use any hardcoded values"));

    // The synthesis prompt forbids raw table and column names in the answer.
    let synthesizer_prompt = AnswerSynthesizer.build_prompt(input, &[]);
    assert!(synthesizer_prompt.contains("Do not reference database-specific elements"));
}

#[test]
fn test_misspelled_entity_is_corrected_before_tagging() {
    let vocabulary = bugfix_vocabulary();
    let corrector = SpellingCorrector::default();
    let tagger = EntityTagger;

    let corrected = corrector.correct(&vocabulary, "commits for acme cor");
    assert_eq!(corrected, "commits for acme corp");
    assert_eq!(
        tagger.tag(&vocabulary, &corrected),
        "commits for acme corp(organization)"
    );
}

#[test]
fn test_session_log_survives_across_requests() {
    let mut log = SessionLog::new();
    log.append("question one", "answer one");
    log.append("question two", "answer two");

    let users: Vec<_> = log.turns().iter().map(|t| t.user.as_str()).collect();
    assert_eq!(users, vec!["question one", "question two"]);
}

fn test_db_config() -> Option<DbConfig> {
    let host = std::env::var("CHATBASE_TEST_DB_HOST").ok()?;
    Some(DbConfig {
        host,
        user: std::env::var("CHATBASE_TEST_DB_USER").unwrap_or_else(|_| "root".to_string()),
        password: std::env::var("CHATBASE_TEST_DB_PASSWORD").unwrap_or_default(),
        database: std::env::var("CHATBASE_TEST_DB_NAME").unwrap_or_else(|_| "chatbase_test".to_string()),
        port: std::env::var("CHATBASE_TEST_DB_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3306),
    })
}

/// Per-statement failure isolation against a live database. Skipped unless
/// CHATBASE_TEST_DB_HOST points at a MySQL test instance.
#[tokio::test]
async fn test_executor_isolates_failed_statement() {
    let Some(db) = test_db_config() else {
        eprintln!("Skipping test: CHATBASE_TEST_DB_HOST not set");
        return;
    };

    let executor = QueryExecutor::new(db);
    let statements = vec![
        "SELECT 1;".to_string(),
        "SELECT * FROM table_that_does_not_exist;".to_string(),
        "SELECT 2;".to_string(),
    ];

    let records = executor.execute(&statements).await.unwrap();
    assert_eq!(records.len(), 3);
    assert!(!records[0].outcome.is_no_data());
    assert!(records[1].outcome.is_no_data());
    assert!(!records[2].outcome.is_no_data());
    assert_eq!(records[1].statement, statements[1]);
    assert!(matches!(&records[0].outcome, QueryOutcome::Rows(rows) if rows.len() == 1));
}
