//! SQL generator.
//!
//! Asks the completion service for read-only SQL answering the question over
//! the selected tables' columns, then sanitizes the raw reply into executable
//! statements. The read-only constraint is a policy request carried by the
//! prompt, not an enforced guarantee; sanitation is surface-level (fence
//! removal, whitespace, terminators).

use crate::error::{ChatError, Result};
use crate::llm::CompletionClient;
use crate::schema::ColumnDescriptor;
use crate::vocabulary::Vocabulary;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Default)]
pub struct SqlGenerator;

impl SqlGenerator {
    /// Generate and sanitize the statements for one request.
    pub async fn generate(
        &self,
        client: &CompletionClient,
        user_input: &str,
        vocabulary: &Vocabulary,
        table_columns: &BTreeMap<String, Vec<ColumnDescriptor>>,
    ) -> Result<Vec<String>> {
        let prompt = self.build_prompt(user_input, vocabulary, table_columns);
        let reply = client.complete(&prompt).await?;
        let statements = sanitize_statements(&reply);
        if statements.is_empty() {
            return Err(ChatError::Parse(format!(
                "SQL generator reply contained no statements: {:?}",
                reply
            )));
        }
        info!("Generated {} statement(s)", statements.len());
        Ok(statements)
    }

    pub fn build_prompt(
        &self,
        user_input: &str,
        vocabulary: &Vocabulary,
        table_columns: &BTreeMap<String, Vec<ColumnDescriptor>>,
    ) -> String {
        let mut schema_info = String::new();
        for (table, columns) in table_columns {
            schema_info.push_str(&format!("Table: {}\n", table));
            for column in columns {
                schema_info.push_str(&format!("  - {}\n", column.describe()));
            }
        }

        let entities = serde_json::to_string_pretty(vocabulary.categories())
            .unwrap_or_else(|_| "{}".to_string());

        format!(
            r#"You are a SQL generator for a MySQL database.

USER QUESTION: "{}"

ENTITY VOCABULARY:
{}

TABLES AND COLUMNS:
{}
INSTRUCTIONS:
1. Generate only the SQL queries needed to answer the question, based strictly on the tables and columns above
2. Join tables or use subqueries only across the tables above
3. If the question asks for the past N months or days, use DATE_SUB() with the current date instead of a hardcoded date
4. Do not use any hardcoded values in the queries
5. Do not wrap the queries in 'sql' or ``` markers
6. Do not generate CREATE, UPDATE or DELETE queries even if the question asks for them
7. Terminate every query with a semicolon

FORMAT:
SELECT * FROM table_name WHERE condition;
SELECT column1, column2 FROM table_name WHERE condition;
SELECT column1 FROM table_name WHERE condition IN (SELECT column2 FROM table_name WHERE condition);"#,
            user_input, entities, schema_info
        )
    }
}

/// Clean a raw model reply into executable statements: drop markdown fence
/// lines, split on `;`, collapse internal whitespace, trim, and restore the
/// terminating `;` on each statement.
pub fn sanitize_statements(raw: &str) -> Vec<String> {
    let without_fences = raw
        .lines()
        .filter(|line| !line.trim().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n");

    let whitespace = Regex::new(r"\s+").unwrap();

    without_fences
        .split(';')
        .map(|segment| whitespace.replace_all(segment, " ").trim().to_string())
        .filter(|segment| !segment.is_empty() && segment != "```sql" && segment != "```")
        .map(|segment| format!("{};", segment))
        .collect()
}
