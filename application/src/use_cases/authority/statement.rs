//! Human-readable decision statements.

use hive_domain::{MajorityResult, Participation, RoundOutcome, TieResolution};

/// Synthesize the statement stored in a decision record.
///
/// `heading` names the kind of cycle (e.g. "Decision" or
/// "Emergency response (high)"). `related` are ids of similar past
/// decisions.
pub fn decision_statement(
    heading: &str,
    topic: &str,
    outcome: &RoundOutcome,
    related: &[String],
) -> String {
    let mut statement = match outcome {
        RoundOutcome::Closed(result) => decided(heading, topic, result),
        RoundOutcome::Deferred(participation) => deferred(heading, topic, participation),
    };

    if !related.is_empty() {
        statement.push_str(&format!(" Related decisions: {}.", related.join(", ")));
    }
    statement
}

fn decided(heading: &str, topic: &str, result: &MajorityResult) -> String {
    let mut statement = format!(
        "{} on '{}': {} ({:.1}% of weighted support, {} of {} agents voted).",
        heading,
        topic,
        result.winner.value.summary(),
        result.winner_percentage(),
        result.participation.actual_voters,
        result.participation.eligible_voters,
    );

    if let Some(tie) = &result.tie {
        let by = match tie.resolution {
            TieResolution::Authority => "the coordinating authority",
            TieResolution::DeterministicFirst => "the first-listed option rule",
        };
        statement.push_str(&format!(
            " Tie between {} resolved by {}.",
            tie.tied_options.join(", "),
            by
        ));
    }
    statement
}

fn deferred(heading: &str, topic: &str, participation: &Participation) -> String {
    format!(
        "{} on '{}' deferred: quorum not met ({} of {} agents voted, {:.0}%). Re-queued for another round.",
        heading,
        topic,
        participation.actual_voters,
        participation.eligible_voters,
        participation.percentage(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_domain::{
        AgentId, Ballot, QuorumThreshold, RoundId, TopicKind, VoteOption, VotingRound, VotingTopic,
    };
    use std::collections::HashMap;
    use std::time::Duration;

    fn closed(votes: &[(&str, &str, f64)]) -> RoundOutcome {
        let topic = VotingTopic::new(
            "t",
            TopicKind::Decision,
            "Next step?",
            vec![
                VoteOption::labeled("automate-follow-ups", "Automate"),
                VoteOption::labeled("hire", "Hire"),
            ],
        );
        let mut round = VotingRound::open(
            RoundId::new("round-1"),
            topic,
            votes.iter().map(|(a, _, _)| AgentId::new(*a)),
            HashMap::new(),
            QuorumThreshold::default(),
            Duration::from_secs(1),
        )
        .unwrap();
        for (agent, option, confidence) in votes {
            round.cast(Ballot::new(*agent, *option, *confidence)).unwrap();
        }
        let sealed = round.seal().unwrap();
        round.complete(sealed, None).unwrap()
    }

    #[test]
    fn test_decided_statement() {
        let outcome = closed(&[
            ("a", "automate-follow-ups", 0.9),
            ("b", "automate-follow-ups", 0.6),
            ("c", "hire", 0.5),
        ]);
        let statement = decision_statement("Decision", "Next step?", &outcome, &[]);
        assert_eq!(
            statement,
            "Decision on 'Next step?': automate-follow-ups (75.0% of weighted support, 3 of 3 agents voted)."
        );
    }

    #[test]
    fn test_tie_and_related_are_mentioned() {
        let outcome = closed(&[("a", "hire", 0.5), ("b", "automate-follow-ups", 0.5)]);
        let related = vec!["decision-1".to_string(), "decision-7".to_string()];
        let statement = decision_statement("Decision", "Next step?", &outcome, &related);
        assert!(statement.contains("Tie between automate-follow-ups, hire"));
        assert!(statement.contains("first-listed option rule"));
        assert!(statement.ends_with("Related decisions: decision-1, decision-7."));
    }

    #[test]
    fn test_deferred_statement() {
        let outcome = RoundOutcome::Deferred(Participation::new(6, 2));
        let statement = decision_statement("Decision", "Expand?", &outcome, &[]);
        assert!(statement.contains("deferred: quorum not met (2 of 6 agents voted, 33%)"));
    }
}
