//! Chat pipeline.
//!
//! Orchestrates one request end to end: spelling correction, entity tagging,
//! table selection, schema introspection, SQL generation, execution, answer
//! synthesis. Every stage runs sequentially on the calling task; all
//! intermediate data is constructed fresh per request.

use crate::catalog::TableCatalog;
use crate::config::DbConfig;
use crate::error::Result;
use crate::executor::QueryExecutor;
use crate::generator::SqlGenerator;
use crate::llm::CompletionClient;
use crate::schema::SchemaGateway;
use crate::selector::TableSelector;
use crate::session::SessionLog;
use crate::spelling::SpellingCorrector;
use crate::synthesizer::AnswerSynthesizer;
use crate::tagger::EntityTagger;
use crate::vocabulary::Vocabulary;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::info;

/// Everything the presentation layer may want to show about one request:
/// the answer plus the per-stage diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub corrected_input: String,
    pub tagged_input: String,
    pub selected_tables: Vec<String>,
    pub statements: Vec<String>,
    pub results: Vec<Value>,
}

pub struct ChatPipeline {
    vocabulary: Vocabulary,
    catalog: TableCatalog,
    corrector: SpellingCorrector,
    tagger: EntityTagger,
    selector: TableSelector,
    generator: SqlGenerator,
    synthesizer: AnswerSynthesizer,
    client: CompletionClient,
    schema: SchemaGateway,
    executor: QueryExecutor,
}

impl ChatPipeline {
    pub fn new(
        vocabulary: Vocabulary,
        catalog: TableCatalog,
        client: CompletionClient,
        db: DbConfig,
    ) -> Self {
        Self {
            vocabulary,
            catalog,
            corrector: SpellingCorrector::default(),
            tagger: EntityTagger,
            selector: TableSelector,
            generator: SqlGenerator,
            synthesizer: AnswerSynthesizer,
            client,
            schema: SchemaGateway::new(db.clone()),
            executor: QueryExecutor::new(db),
        }
    }

    /// Run one request. A turn is appended to the session log only when the
    /// whole pipeline succeeds; on failure the log is untouched and survives
    /// for the next request.
    pub async fn ask(&self, input: &str, log: &mut SessionLog) -> Result<ChatResponse> {
        info!("Processing question: {}", input);

        let corrected = self.corrector.correct(&self.vocabulary, input);
        let tagged = self.tagger.tag(&self.vocabulary, &corrected);
        info!("Tagged input: {}", tagged);

        let tables = self
            .selector
            .select(&self.client, input, &tagged, &self.catalog)
            .await?;

        let mut table_columns = BTreeMap::new();
        for table in &tables {
            let columns = self.schema.columns(table).await?;
            info!("Introspected {} column(s) for {}", columns.len(), table.trim());
            table_columns.insert(table.trim().to_string(), columns);
        }

        let statements = self
            .generator
            .generate(&self.client, input, &self.vocabulary, &table_columns)
            .await?;
        for statement in &statements {
            info!("Generated statement: {}", statement);
        }

        let records = self.executor.execute(&statements).await?;
        let answer = self
            .synthesizer
            .synthesize(&self.client, input, &records)
            .await?;

        log.append(input, &answer);

        Ok(ChatResponse {
            answer,
            corrected_input: corrected,
            tagged_input: tagged,
            selected_tables: tables,
            statements,
            results: records.iter().map(|record| record.as_json()).collect(),
        })
    }
}
