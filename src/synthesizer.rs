//! Answer synthesizer.
//!
//! Turns the raw query results into a natural-language answer, stripped of
//! schema artifacts. The model is asked to wrap its answer in a fixed
//! delimiter pair; post-processing removes the delimiters and surrounding
//! whitespace. A reply missing the delimiters is kept as-is after trimming.

use crate::error::Result;
use crate::executor::QueryRecord;
use crate::llm::CompletionClient;
use serde_json::Value;

pub const ANSWER_OPEN: &str = "<answer>";
pub const ANSWER_CLOSE: &str = "</answer>";

#[derive(Debug, Default)]
pub struct AnswerSynthesizer;

impl AnswerSynthesizer {
    /// Produce the final user-facing answer from the result records.
    pub async fn synthesize(
        &self,
        client: &CompletionClient,
        user_input: &str,
        records: &[QueryRecord],
    ) -> Result<String> {
        let prompt = self.build_prompt(user_input, records);
        let reply = client.complete(&prompt).await?;
        Ok(strip_answer_tags(&reply))
    }

    pub fn build_prompt(&self, user_input: &str, records: &[QueryRecord]) -> String {
        let data = Value::Array(records.iter().map(QueryRecord::as_json).collect());

        format!(
            r#"You have been provided with query results containing relevant information.

USER QUESTION: "{}"

QUERY RESULTS:
{}

INSTRUCTIONS:
1. Answer the question based on this data in a clear, informative and natural way
2. Do not reference database-specific elements such as column names, table names or raw IDs
3. Reply with only the answer to the question
4. Enclose your answer in {} tags

FORMAT:
{}
Your answer here
{}"#,
            user_input,
            serde_json::to_string_pretty(&data).unwrap_or_else(|_| "[]".to_string()),
            ANSWER_OPEN,
            ANSWER_OPEN,
            ANSWER_CLOSE
        )
    }
}

/// Remove the delimiter pair and surrounding whitespace.
pub fn strip_answer_tags(reply: &str) -> String {
    reply
        .replace(ANSWER_OPEN, "")
        .replace(ANSWER_CLOSE, "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::QueryOutcome;
    use serde_json::json;

    #[test]
    fn test_delimiters_stripped() {
        assert_eq!(
            strip_answer_tags("<answer>\n42 commits were merged.\n</answer>"),
            "42 commits were merged."
        );
    }

    #[test]
    fn test_missing_delimiters_kept_after_trim() {
        assert_eq!(strip_answer_tags("  plain reply  "), "plain reply");
    }

    #[test]
    fn test_prompt_embeds_results_and_policy() {
        let synthesizer = AnswerSynthesizer;
        let records = vec![QueryRecord {
            statement: "SELECT COUNT(*) FROM t_commit_file;".to_string(),
            outcome: QueryOutcome::Rows(vec![json!({"COUNT(*)": 42})]),
        }];
        let prompt = synthesizer.build_prompt("how many commits", &records);
        assert!(prompt.contains("how many commits"));
        assert!(prompt.contains("SELECT COUNT(*) FROM t_commit_file;"));
        assert!(prompt.contains("Do not reference database-specific elements"));
        assert!(prompt.contains(ANSWER_OPEN));
        assert!(prompt.contains(ANSWER_CLOSE));
    }
}
