//! Parsing of the line-oriented commands read by the `fairplay` binary.

use fairplay_core::dto::round::{CoordinatesInput, StartRoundRequest};

/// Default number of rows printed by `rounds`.
pub const DEFAULT_ROUNDS_LIMIT: usize = 10;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommandId {
    Help,
    Start,
    Stroke,
    Putts,
    Penalties,
    Fairway,
    Gir,
    Next,
    Prev,
    Show,
    End,
    Resume,
    Discard,
    Rounds,
    Round,
    Delete,
    Quit,
}

pub struct CommandInfo {
    pub id: CommandId,
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
    pub aliases: &'static [&'static str],
}

pub const COMMANDS: &[CommandInfo] = &[
    CommandInfo {
        id: CommandId::Help,
        name: "help",
        usage: "help",
        description: "Show this help.",
        aliases: &["?", "h"],
    },
    CommandInfo {
        id: CommandId::Start,
        name: "start",
        usage: "start <9|18> [stats] [@lat,lon] [course name]",
        description: "Start a new round, replacing any round in progress.",
        aliases: &[],
    },
    CommandInfo {
        id: CommandId::Stroke,
        name: "stroke",
        usage: "stroke [hole] <strokes>",
        description: "Set strokes for a hole (default: current hole).",
        aliases: &["s"],
    },
    CommandInfo {
        id: CommandId::Putts,
        name: "putts",
        usage: "putts [hole] <putts>",
        description: "Set putts for a hole in a stats round.",
        aliases: &[],
    },
    CommandInfo {
        id: CommandId::Penalties,
        name: "penalties",
        usage: "penalties [hole] <penalties>",
        description: "Set penalty strokes for a hole in a stats round.",
        aliases: &["pen"],
    },
    CommandInfo {
        id: CommandId::Fairway,
        name: "fairway",
        usage: "fairway [hole]",
        description: "Toggle fairway hit.",
        aliases: &["fw"],
    },
    CommandInfo {
        id: CommandId::Gir,
        name: "gir",
        usage: "gir [hole]",
        description: "Toggle green in regulation.",
        aliases: &[],
    },
    CommandInfo {
        id: CommandId::Next,
        name: "next",
        usage: "next",
        description: "Go to the next hole.",
        aliases: &["n"],
    },
    CommandInfo {
        id: CommandId::Prev,
        name: "prev",
        usage: "prev",
        description: "Go to the previous hole.",
        aliases: &["p"],
    },
    CommandInfo {
        id: CommandId::Show,
        name: "show",
        usage: "show",
        description: "Print the round in progress.",
        aliases: &[],
    },
    CommandInfo {
        id: CommandId::End,
        name: "end",
        usage: "end",
        description: "Finish the round and save it.",
        aliases: &["finish"],
    },
    CommandInfo {
        id: CommandId::Resume,
        name: "resume",
        usage: "resume",
        description: "Resume the saved draft if it is recent enough.",
        aliases: &[],
    },
    CommandInfo {
        id: CommandId::Discard,
        name: "discard",
        usage: "discard",
        description: "Throw the saved draft away.",
        aliases: &[],
    },
    CommandInfo {
        id: CommandId::Rounds,
        name: "rounds",
        usage: "rounds [limit]",
        description: "List finished rounds, newest first.",
        aliases: &["history"],
    },
    CommandInfo {
        id: CommandId::Round,
        name: "round",
        usage: "round <id>",
        description: "Show a finished round with its stats.",
        aliases: &[],
    },
    CommandInfo {
        id: CommandId::Delete,
        name: "delete",
        usage: "delete <id>",
        description: "Delete a finished round.",
        aliases: &["rm"],
    },
    CommandInfo {
        id: CommandId::Quit,
        name: "quit",
        usage: "quit",
        description: "Save the draft and exit.",
        aliases: &["exit", "q"],
    },
];

/// A parsed input line.
#[derive(Debug, Clone)]
pub enum Command {
    Help,
    Start(StartRoundRequest),
    Stroke { hole: Option<u32>, value: i64 },
    Putts { hole: Option<u32>, value: i64 },
    Penalties { hole: Option<u32>, value: i64 },
    Fairway { hole: Option<u32> },
    Gir { hole: Option<u32> },
    Next,
    Prev,
    Show,
    End,
    Resume,
    Discard,
    Rounds { limit: usize },
    Round { id: i64 },
    Delete { id: i64 },
    Quit,
}

pub fn find_command(name: &str) -> Option<&'static CommandInfo> {
    COMMANDS
        .iter()
        .find(|command| command.name == name || command.aliases.contains(&name))
}

pub fn build_help() -> String {
    let mut help = String::from("Commands:");
    for command in COMMANDS {
        help.push_str("\n  ");
        help.push_str(command.usage);
        let padding = 48usize.saturating_sub(command.usage.len());
        help.push_str(&" ".repeat(padding.max(2)));
        help.push_str(command.description);
    }
    help
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();
    let info = find_command(&name.to_ascii_lowercase())
        .ok_or_else(|| format!("unknown command `{name}`; type `help`"))?;
    let usage = || format!("usage: {}", info.usage);

    let command = match info.id {
        CommandId::Help => Command::Help,
        CommandId::Start => Command::Start(parse_start(&args).map_err(|err| {
            format!("{err}; {}", usage())
        })?),
        CommandId::Stroke => {
            let (hole, value) = hole_and_value(&args).ok_or_else(usage)?;
            Command::Stroke { hole, value }
        }
        CommandId::Putts => {
            let (hole, value) = hole_and_value(&args).ok_or_else(usage)?;
            Command::Putts { hole, value }
        }
        CommandId::Penalties => {
            let (hole, value) = hole_and_value(&args).ok_or_else(usage)?;
            Command::Penalties { hole, value }
        }
        CommandId::Fairway => Command::Fairway {
            hole: optional_hole(&args).ok_or_else(usage)?,
        },
        CommandId::Gir => Command::Gir {
            hole: optional_hole(&args).ok_or_else(usage)?,
        },
        CommandId::Next => Command::Next,
        CommandId::Prev => Command::Prev,
        CommandId::Show => Command::Show,
        CommandId::End => Command::End,
        CommandId::Resume => Command::Resume,
        CommandId::Discard => Command::Discard,
        CommandId::Rounds => Command::Rounds {
            limit: match args.as_slice() {
                [] => DEFAULT_ROUNDS_LIMIT,
                [limit] => limit.parse::<usize>().map_err(|_| usage())?,
                _ => return Err(usage()),
            },
        },
        CommandId::Round => Command::Round {
            id: single_id(&args).ok_or_else(usage)?,
        },
        CommandId::Delete => Command::Delete {
            id: single_id(&args).ok_or_else(usage)?,
        },
        CommandId::Quit => Command::Quit,
    };
    Ok(Some(command))
}

fn parse_start(args: &[&str]) -> Result<StartRoundRequest, String> {
    let (count, rest) = args
        .split_first()
        .ok_or_else(|| "missing hole count".to_string())?;
    let holes_count = count
        .parse::<u32>()
        .map_err(|_| format!("`{count}` is not a hole count"))?;

    let mut with_stats = false;
    let mut location = None;
    let mut course_words = Vec::new();
    for word in rest {
        if word.eq_ignore_ascii_case("stats") && course_words.is_empty() {
            with_stats = true;
        } else if let Some(coords) = word.strip_prefix('@') {
            location = Some(parse_coordinates(coords)?);
        } else {
            course_words.push(*word);
        }
    }

    Ok(StartRoundRequest {
        holes_count,
        course: (!course_words.is_empty()).then(|| course_words.join(" ")),
        with_stats,
        include_weather: location.is_some(),
        location,
    })
}

fn parse_coordinates(value: &str) -> Result<CoordinatesInput, String> {
    let invalid = || format!("`@{value}` is not `@lat,lon`");
    let (lat, lon) = value.split_once(',').ok_or_else(invalid)?;
    Ok(CoordinatesInput {
        latitude: lat.trim().parse().map_err(|_| invalid())?,
        longitude: lon.trim().parse().map_err(|_| invalid())?,
    })
}

fn hole_and_value(args: &[&str]) -> Option<(Option<u32>, i64)> {
    match args {
        [value] => Some((None, value.parse().ok()?)),
        [hole, value] => Some((Some(hole.parse().ok()?), value.parse().ok()?)),
        _ => None,
    }
}

fn optional_hole(args: &[&str]) -> Option<Option<u32>> {
    match args {
        [] => Some(None),
        [hole] => hole.parse().ok().map(Some),
        _ => None,
    }
}

fn single_id(args: &[&str]) -> Option<i64> {
    match args {
        [id] => id.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_ignored() {
        assert!(parse_line("   ").unwrap().is_none());
    }

    #[test]
    fn start_parses_flags_location_and_course() {
        let Some(Command::Start(request)) =
            parse_line("start 18 stats @57.7,11.97 Royal Links").unwrap()
        else {
            panic!("expected start");
        };
        assert_eq!(request.holes_count, 18);
        assert!(request.with_stats);
        assert!(request.include_weather);
        assert_eq!(request.course.as_deref(), Some("Royal Links"));
        let location = request.location.unwrap();
        assert_eq!(location.latitude, 57.7);
        assert_eq!(location.longitude, 11.97);
    }

    #[test]
    fn start_without_extras_is_a_plain_round() {
        let Some(Command::Start(request)) = parse_line("start 9").unwrap() else {
            panic!("expected start");
        };
        assert!(!request.with_stats);
        assert!(!request.include_weather);
        assert!(request.course.is_none());
    }

    #[test]
    fn hole_argument_is_optional() {
        assert!(matches!(
            parse_line("stroke 5").unwrap(),
            Some(Command::Stroke { hole: None, value: 5 })
        ));
        assert!(matches!(
            parse_line("s 3 -1").unwrap(),
            Some(Command::Stroke {
                hole: Some(3),
                value: -1
            })
        ));
        assert!(matches!(
            parse_line("fw").unwrap(),
            Some(Command::Fairway { hole: None })
        ));
    }

    #[test]
    fn aliases_and_case_resolve() {
        assert!(matches!(parse_line("EXIT").unwrap(), Some(Command::Quit)));
        assert!(matches!(
            parse_line("history").unwrap(),
            Some(Command::Rounds {
                limit: DEFAULT_ROUNDS_LIMIT
            })
        ));
    }

    #[test]
    fn malformed_input_reports_usage() {
        assert!(parse_line("bogey").unwrap_err().contains("unknown command"));
        assert!(parse_line("round x").unwrap_err().starts_with("usage:"));
        assert!(parse_line("start").unwrap_err().contains("missing hole count"));
        assert!(parse_line("start 9 @north").is_err());
    }

    #[test]
    fn help_lists_every_command() {
        let help = build_help();
        for command in COMMANDS {
            assert!(help.contains(command.usage));
        }
    }
}
