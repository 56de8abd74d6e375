//! Table selector.
//!
//! Asks the completion service which catalog tables are relevant to the
//! user's question. The reply is treated as untrusted text: it is split on
//! commas and trimmed, nothing more. Returned identifiers are NOT validated
//! against the catalog; an invalid one surfaces downstream when the schema
//! gateway introspects it.

use crate::catalog::TableCatalog;
use crate::error::{ChatError, Result};
use crate::llm::CompletionClient;
use tracing::info;

#[derive(Debug, Default)]
pub struct TableSelector;

impl TableSelector {
    /// Ask the model for the relevant tables and parse its reply.
    pub async fn select(
        &self,
        client: &CompletionClient,
        raw_input: &str,
        tagged_input: &str,
        catalog: &TableCatalog,
    ) -> Result<Vec<String>> {
        let prompt = self.build_prompt(raw_input, tagged_input, catalog);
        let reply = client.complete(&prompt).await?;
        let tables = parse_table_list(&reply);
        if tables.is_empty() {
            return Err(ChatError::Parse(format!(
                "table selector reply contained no table names: {:?}",
                reply
            )));
        }
        info!("Selected tables: {}", tables.join(", "));
        Ok(tables)
    }

    pub fn build_prompt(
        &self,
        raw_input: &str,
        tagged_input: &str,
        catalog: &TableCatalog,
    ) -> String {
        format!(
            r#"You are a database assistant selecting the tables needed to answer a question.

USER QUESTION: "{}"
TAGGED QUESTION: "{}"

AVAILABLE TABLES:
{}

INSTRUCTIONS:
1. Select only the tables relevant to the question
2. Only use table names from the list above
3. Reply with a comma-separated list of table names and nothing else

FORMAT:
table_name_1, table_name_2, table_name_3"#,
            raw_input,
            tagged_input,
            catalog.describe()
        )
    }
}

/// Split a comma-separated reply into trimmed, non-empty identifiers.
pub fn parse_table_list(reply: &str) -> Vec<String> {
    reply
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect()
}
