//! Minimal robots.txt parser backing the robots policy provider.

use std::collections::HashMap;

/// Parsed robots.txt rules, grouped per user-agent.
#[derive(Debug, Clone, Default)]
pub struct RobotsTxt {
    /// Rules keyed by lowercase user-agent token
    rules: HashMap<String, AgentRules>,
    /// Rules for `*`
    default_rules: AgentRules,
}

#[derive(Debug, Clone, Default)]
struct AgentRules {
    disallow: Vec<String>,
    allow: Vec<String>,
}

impl RobotsTxt {
    /// Parse robots.txt content. Unknown directives are ignored.
    pub fn parse(content: &str) -> Self {
        let mut robots = Self::default();
        let mut current_agents: Vec<String> = Vec::new();
        let mut current = AgentRules::default();
        let mut in_rules = false;

        let mut flush = |agents: &mut Vec<String>, rules: &mut AgentRules, robots: &mut Self| {
            for agent in agents.drain(..) {
                if agent == "*" {
                    robots.default_rules = rules.clone();
                } else {
                    robots.rules.insert(agent, rules.clone());
                }
            }
            *rules = AgentRules::default();
        };

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let Some((directive, value)) = line.split_once(':') else {
                continue;
            };
            let directive = directive.trim().to_lowercase();
            let value = value.trim();

            match directive.as_str() {
                "user-agent" => {
                    // A user-agent line after rule lines starts a new group
                    if in_rules {
                        flush(&mut current_agents, &mut current, &mut robots);
                        in_rules = false;
                    }
                    current_agents.push(value.to_lowercase());
                }
                "disallow" => {
                    in_rules = true;
                    if !value.is_empty() {
                        current.disallow.push(value.to_string());
                    }
                }
                "allow" => {
                    in_rules = true;
                    if !value.is_empty() {
                        current.allow.push(value.to_string());
                    }
                }
                _ => {}
            }
        }
        flush(&mut current_agents, &mut current, &mut robots);

        robots
    }

    /// Check whether a path is fetchable for a user-agent.
    ///
    /// Prefix matching; the longest matching rule wins, with `Allow`
    /// breaking ties against an equally specific `Disallow`.
    pub fn is_allowed(&self, user_agent: &str, path: &str) -> bool {
        let agent = user_agent.to_lowercase();
        let rules = self
            .rules
            .iter()
            .find(|(token, _)| agent.contains(token.as_str()))
            .map(|(_, rules)| rules)
            .unwrap_or(&self.default_rules);

        let longest_match = |prefixes: &[String]| {
            prefixes
                .iter()
                .filter(|p| path.starts_with(p.as_str()))
                .map(|p| p.len())
                .max()
        };

        match (longest_match(&rules.allow), longest_match(&rules.disallow)) {
            (Some(allow), Some(disallow)) => allow >= disallow,
            (None, Some(_)) => false,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# example policy
User-agent: *
Disallow: /private/
Allow: /private/public-report

User-agent: communitybot
Disallow: /
";

    #[test]
    fn default_rules_apply_to_unknown_agents() {
        let robots = RobotsTxt::parse(SAMPLE);
        assert!(robots.is_allowed("somebot", "/index.html"));
        assert!(!robots.is_allowed("somebot", "/private/archive"));
    }

    #[test]
    fn allow_overrides_more_general_disallow() {
        let robots = RobotsTxt::parse(SAMPLE);
        assert!(robots.is_allowed("somebot", "/private/public-report.pdf"));
    }

    #[test]
    fn specific_agent_rules_win() {
        let robots = RobotsTxt::parse(SAMPLE);
        assert!(!robots.is_allowed("CommunityBot/1.2", "/index.html"));
    }

    #[test]
    fn empty_robots_allows_everything() {
        let robots = RobotsTxt::parse("");
        assert!(robots.is_allowed("anybot", "/anything"));
    }

    #[test]
    fn comments_and_blank_lines_ignored() {
        let robots = RobotsTxt::parse("# only comments\n\n# nothing else\n");
        assert!(robots.is_allowed("anybot", "/"));
    }
}
