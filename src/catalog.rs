//! Static table catalog.
//!
//! Maps table identifiers to human-readable descriptions. Used only as
//! prompt context for table selection, never to validate generated SQL
//! against the real schema.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct TableCatalog {
    tables: BTreeMap<String, String>,
}

impl TableCatalog {
    /// The catalog compiled into the process.
    pub fn builtin() -> Self {
        Self::from_pairs([
            ("t_bu", "Business Unit"),
            ("t_bug", "Bug Reports"),
            ("t_commit_file", "Commit Files"),
            ("t_configs", "Config Settings"),
            ("t_cost_proj_advisor_checks", "Cost Advisor Checks"),
            ("t_cost_proj_advisor_low_util_ec2", "Low Utilization EC2"),
            ("t_cost_project_user_role", "Project User Roles"),
            ("t_em_answers", "Employee Answers"),
            ("t_em_arch_pillar", "Architecture Pillars"),
            ("t_em_cloud_service_master", "Cloud Service Master"),
            ("t_em_devops_questions", "DevOps Questions"),
            ("t_em_metric_master", "Metric Master"),
            ("t_em_metric_trend", "Metric Trend"),
            ("t_em_metric_trend_copy", "Metric Trend Copy"),
            ("t_em_project", "Projects"),
            ("t_em_project_cloud_service", "Project Cloud Services"),
            ("t_em_questions", "Questions"),
            ("t_em_well_arch_score", "Well-Architected Scores"),
            ("t_employee", "Employees"),
            ("t_employee_alias", "Employee Aliases"),
            ("t_employee_metric_trend", "Metric Trends"),
            ("t_manager_employee", "Manager Relationships"),
            ("t_org", "Organizations"),
            ("t_org_domain", "Organization Domains"),
            ("t_org_repo", "Repositories"),
            ("t_pr_commit", "Pull Request Commits"),
            ("t_pr_review", "Pull Request Reviews"),
            ("t_pr_review_copy", "Reviews Copy"),
            ("t_qa_test_case", "Test Cases"),
            ("t_qa_test_case_copy", "Test Cases Copy"),
            ("t_repo_pr", "Repository Pull Requests"),
            ("t_squad", "Squads"),
            ("t_squad_employee", "Squad Employees"),
            ("t_theme", "Themes"),
        ])
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            tables: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// One `identifier: description` line per table, for prompt embedding.
    pub fn describe(&self) -> String {
        self.tables
            .iter()
            .map(|(name, description)| format!("- {}: {}", name, description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tables
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
