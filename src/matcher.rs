//! First-match-wins evaluation of an ordered rule list.
//!
//! Rule lists are short and change often, so every call evaluates from
//! scratch. Cost is O(rules × clauses) per target.

use labels::LabelSet;

use crate::model::{Action, Rule};

/// The first rule in `rules` whose selector matches `labels`.
#[inline]
pub fn first_match<'a>(rules: &'a [Rule], labels: &LabelSet) -> Option<&'a Rule> {
    rules.iter().find(|rule| rule.matches(labels))
}

/// Whether a target with `labels` should be profiled. Targets matched by no
/// rule are dropped.
#[inline]
pub fn decide(rules: &[Rule], labels: &LabelSet) -> bool {
    first_match(rules, labels).is_some_and(|rule| rule.action == Action::Keep)
}

#[cfg(test)]
mod tests {
    use labels::labels;

    use super::*;
    use crate::model::{Clause, Operator, Selector};

    fn rule(clauses: &[(&str, &str)], action: Action) -> Rule {
        Rule::new(
            clauses
                .iter()
                .map(|(k, v)| Clause::equal(*k, *v))
                .collect(),
            action,
        )
    }

    fn label_sets() -> Vec<LabelSet> {
        vec![
            LabelSet::new(),
            labels!("ns" => "a"),
            labels!("ns" => "b"),
            labels!("ns" => "a", "pod" => "api-0"),
            labels!("ns" => "", "pod" => "api-1"),
        ]
    }

    #[test]
    fn no_rules_drops_everything() {
        for labels in label_sets() {
            assert!(!decide(&[], &labels), "{labels}");
        }
    }

    #[test]
    fn empty_selector_keeps_everything() {
        let rules = [rule(&[], Action::Keep)];

        for labels in label_sets() {
            assert!(decide(&rules, &labels), "{labels}");
        }
    }

    #[test]
    fn first_match_wins() {
        let rules = [
            rule(&[("ns", "a"), ("pod", "api-0")], Action::Drop),
            rule(&[("ns", "a")], Action::Keep),
            rule(&[], Action::Drop),
        ];

        assert!(!decide(&rules, &labels!("ns" => "a", "pod" => "api-0")));
        assert!(decide(&rules, &labels!("ns" => "a", "pod" => "api-1")));
        assert!(!decide(&rules, &labels!("ns" => "b")));

        let deciding = first_match(&rules, &labels!("ns" => "a")).unwrap();
        assert_eq!(deciding, &rules[1]);
        assert_eq!(first_match(&rules[..2], &labels!("ns" => "b")), None);
    }

    #[test]
    fn prepending_non_matching_rule_keeps_decision() {
        let base = vec![
            rule(&[("ns", "a")], Action::Keep),
            rule(&[("pod", "api-1")], Action::Keep),
        ];
        let unrelated = [
            rule(&[("ns", "zzz")], Action::Drop),
            rule(&[("ns", "zzz")], Action::Keep),
            Rule::new(
                Selector(vec![Clause {
                    key: "ns".into(),
                    op: Operator::NotEqual,
                    value: "zzz".into(),
                }]),
                Action::Drop,
            ),
        ];

        for labels in label_sets() {
            let want = decide(&base, &labels);

            for extra in &unrelated {
                assert!(!extra.matches(&labels));

                let mut rules = vec![extra.clone()];
                rules.extend(base.iter().cloned());
                assert_eq!(decide(&rules, &labels), want, "{labels}");
            }
        }
    }

    #[test]
    fn rule_with_unsupported_operator_is_skipped() {
        let rules = [
            Rule::new(
                Selector(vec![Clause {
                    key: "ns".into(),
                    op: Operator::RegexMatch,
                    value: ".*".into(),
                }]),
                Action::Drop,
            ),
            rule(&[], Action::Keep),
        ];

        assert!(decide(&rules, &labels!("ns" => "a")));
    }

    #[test]
    fn deterministic() {
        let rules = [rule(&[("ns", "a")], Action::Keep)];
        let labels = labels!("ns" => "a");

        let first = decide(&rules, &labels);
        for _ in 0..10 {
            assert_eq!(decide(&rules, &labels), first);
        }
    }
}
