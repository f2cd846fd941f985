//! Console output for decision records

use colored::Colorize;
use hive_application::{HealthLevel, SwarmHealth};
use hive_domain::{DecisionRecord, DecisionStatus};

/// Formats decision records for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete decision record
    pub fn format(record: &DecisionRecord) -> String {
        let mut output = String::new();

        output.push_str(&Self::header(&format!("{} decision", record.decision_type)));
        output.push('\n');

        output.push_str(&format!("{} {}\n", "Topic:".cyan().bold(), record.topic));
        output.push_str(&format!("{} {}\n", "Id:".cyan().bold(), record.id));

        let status = match record.status() {
            DecisionStatus::Decided => "DECIDED".green().bold(),
            DecisionStatus::Deferred => "DEFERRED".yellow().bold(),
        };
        output.push_str(&format!("{} {}\n\n", "Status:".cyan().bold(), status));

        output.push_str(&record.content);
        output.push('\n');

        if let Some(result) = record.majority() {
            output.push_str(&Self::section_header("Tally"));
            for option in &result.voting_stats.options {
                let line = format!(
                    "  {:<24} {:>6.2}  {:>5.1}%  ({} voters)",
                    option.option_id, option.tally, option.percentage, option.voters
                );
                if option.option_id == result.winner.id {
                    output.push_str(&format!("{}\n", line.green()));
                } else {
                    output.push_str(&format!("{}\n", line));
                }
            }

            output.push_str(&Self::section_header("Votes"));
            for vote in &result.votes {
                output.push_str(&format!(
                    "  {:<16} -> {:<20} confidence {:.2} x weight {:.2}\n",
                    vote.agent_id.as_str(),
                    vote.option_id,
                    vote.confidence,
                    vote.weight
                ));
            }
        }

        let participation = record.outcome.participation();
        output.push_str(&format!(
            "\n{} {} of {} eligible voters ({:.0}%)\n",
            "Participation:".dimmed(),
            participation.actual_voters,
            participation.eligible_voters,
            participation.percentage()
        ));

        if !record.related_decisions.is_empty() {
            output.push_str(&format!(
                "{} {}\n",
                "Related:".dimmed(),
                record.related_decisions.join(", ")
            ));
        }

        output.push_str(&Self::footer());

        output
    }

    /// Format as JSON
    pub fn format_json(record: &DecisionRecord) -> String {
        serde_json::to_string_pretty(record).unwrap_or_else(|_| "{}".to_string())
    }

    /// One-line swarm health summary
    pub fn format_health(health: &SwarmHealth) -> String {
        let level = health.overall.to_string();
        let level = match health.overall {
            HealthLevel::Healthy => level.green(),
            HealthLevel::Degraded => level.yellow(),
            HealthLevel::Critical => level.red(),
        };
        format!(
            "{} {} ({} of {} agents available, {} deferred, memory: {})",
            "Swarm:".dimmed(),
            level.bold(),
            health.available_agents,
            health.total_agents,
            health.deferred_decisions,
            health.memory.backend
        )
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("{}\n", "=".repeat(60).cyan())
    }
}
