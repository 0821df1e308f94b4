/// A raw display name split into its normalized form and optional team token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub display: String,
    pub team: Option<String>,
}

/// Parses the `"Person (team)"` display-name convention.
///
/// The team token is uppercased so that `"Bob (teamx)"` and `"Cara (TeamX)"`
/// land in the same team. A degenerate `"Name()"` form is stripped down to
/// just the name; a name without a trailing parenthetical carries no team.
pub fn parse_display_name(raw: &str) -> ParsedName {
    let name = raw.trim_end();

    // Function-like names with empty parentheses, e.g. "attackOnTitans()"
    if let Some(stripped) = strip_empty_parens(name) {
        return ParsedName {
            display: stripped.to_string(),
            team: None,
        };
    }

    if let Some((person, team)) = split_team_token(name) {
        let team = team.to_uppercase();
        return ParsedName {
            display: format!("{} ({})", person, team),
            team: Some(team),
        };
    }

    ParsedName {
        display: raw.to_string(),
        team: None,
    }
}

fn strip_empty_parens(name: &str) -> Option<&str> {
    let inner = name.strip_suffix(')')?;
    let inner = inner.trim_end();
    let person = inner.strip_suffix('(')?;
    Some(person.trim_end())
}

fn split_team_token(name: &str) -> Option<(&str, &str)> {
    let body = name.strip_suffix(')')?;
    let open = body.find('(')?;
    let person = body[..open].trim_end();
    let team = &body[open + 1..];
    if person.is_empty() || team.is_empty() {
        return None;
    }
    Some((person, team))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uppercases_team_token() {
        let parsed = parse_display_name("Dana (eng)");
        assert_eq!(parsed.display, "Dana (ENG)");
        assert_eq!(parsed.team.as_deref(), Some("ENG"));
    }

    #[test]
    fn test_strips_empty_parens() {
        let parsed = parse_display_name("attackOnTitans()");
        assert_eq!(parsed.display, "attackOnTitans");
        assert_eq!(parsed.team, None);
    }

    #[test]
    fn test_plain_name_unchanged() {
        let parsed = parse_display_name("Eve");
        assert_eq!(parsed.display, "Eve");
        assert_eq!(parsed.team, None);
    }

    #[test]
    fn test_already_uppercase_is_stable() {
        let parsed = parse_display_name("Bob (TEAMX)");
        assert_eq!(parsed.display, "Bob (TEAMX)");
        assert_eq!(parsed.team.as_deref(), Some("TEAMX"));
    }

    #[test]
    fn test_whitespace_between_name_and_team() {
        let parsed = parse_display_name("Bob  (teamx)");
        assert_eq!(parsed.display, "Bob (TEAMX)");
        assert_eq!(parsed.team.as_deref(), Some("TEAMX"));
    }

    #[test]
    fn test_bare_parenthetical_has_no_person() {
        let parsed = parse_display_name("(teamx)");
        assert_eq!(parsed.display, "(teamx)");
        assert_eq!(parsed.team, None);
    }
}
