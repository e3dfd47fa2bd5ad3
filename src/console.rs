//! Line oriented terminal front end for a running session.

use std::str::FromStr;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::grouping::{Group, GroupStatus, Summary};
use crate::model::{AgentSummary, Rule};
use crate::sync::{Handle, SessionClosed, State, View};

pub const HELP: &str = "\
Commands:
  keys               list selected and available label keys
  group <k1,k2,...>  group by exactly these keys
  add <key>          append a grouping key
  remove <key>       remove a grouping key
  toggle <row>       flip profiling for a group row
  delete <id>        delete a rule
  rules              list rules in evaluation order
  agents             list agents
  show               print the group table
  help               print this help
  quit               exit";

#[derive(Debug, PartialEq)]
pub enum Input {
    Empty,
    Keys,
    Group(Vec<String>),
    Add(String),
    Remove(String),
    Toggle(usize),
    Delete(i64),
    Rules,
    Agents,
    Show,
    Help,
    Quit,
}

fn one_arg<'a>(cmd: &str, args: &[&'a str]) -> Result<&'a str, String> {
    match args {
        [arg] => Ok(arg),
        _ => Err(format!("usage: {cmd} <arg>, see help")),
    }
}

impl FromStr for Input {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let Some(cmd) = parts.next() else {
            return Ok(Input::Empty);
        };
        let args = parts.collect::<Vec<_>>();

        let input = match cmd {
            "keys" => Input::Keys,
            "group" => Input::Group(
                args.iter()
                    .flat_map(|arg| arg.split(','))
                    .filter(|key| !key.is_empty())
                    .map(String::from)
                    .collect(),
            ),
            "add" => Input::Add(one_arg(cmd, &args)?.to_string()),
            "remove" => Input::Remove(one_arg(cmd, &args)?.to_string()),
            "toggle" => {
                let row = one_arg(cmd, &args)?;
                match row.parse::<usize>() {
                    Ok(row) if row > 0 => Input::Toggle(row),
                    _ => return Err(format!("invalid row {row:?}")),
                }
            }
            "delete" => {
                let id = one_arg(cmd, &args)?;
                Input::Delete(id.parse().map_err(|_| format!("invalid rule id {id:?}"))?)
            }
            "rules" => Input::Rules,
            "agents" => Input::Agents,
            "show" => Input::Show,
            "help" | "?" => Input::Help,
            "quit" | "exit" | "q" => Input::Quit,
            _ => return Err(format!("unknown command {cmd:?}, try help")),
        };

        Ok(input)
    }
}

const MINIMUM_PADDING: usize = 2;

/// Renders views as plain text tables, optionally with ANSI colors.
#[derive(Clone, Copy, Debug, Default)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub const fn new(color: bool) -> Self {
        Renderer { color }
    }

    fn paint(&self, text: String, code: &str) -> String {
        if self.color && !code.is_empty() {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text
        }
    }

    /// `paints(row, column)` returns the color code of a cell, empty for none.
    fn table<F>(&self, header: &[&str], rows: &[Vec<String>], paints: F) -> String
    where
        F: Fn(usize, usize) -> &'static str,
    {
        let mut widths = header
            .iter()
            .map(|name| name.chars().count())
            .collect::<Vec<_>>();
        for row in rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let pad = |cell: &str, col: usize| {
            if col + 1 == widths.len() {
                cell.to_string()
            } else {
                format!("{cell:width$}", width = widths[col] + MINIMUM_PADDING)
            }
        };

        let mut out = String::new();
        let head = header
            .iter()
            .enumerate()
            .map(|(col, name)| pad(name, col))
            .collect::<String>();
        out.push_str(&self.paint(head, "7"));
        out.push('\n');

        for (index, row) in rows.iter().enumerate() {
            for (col, cell) in row.iter().enumerate() {
                out.push_str(&self.paint(pad(cell, col), paints(index, col)));
            }
            out.truncate(out.trim_end_matches(' ').len());
            out.push('\n');
        }

        out
    }

    pub fn summary(&self, state: State, summary: &Summary) -> String {
        let state = match state {
            State::Subscribed => self.paint(state.to_string(), "32"),
            State::Exhausted => self.paint(state.to_string(), "31"),
            _ => self.paint(state.to_string(), "33"),
        };

        format!("cnc - {state} | {}", self.totals(summary))
    }

    pub fn totals(&self, summary: &Summary) -> String {
        format!(
            "{} targets, {} profiled, {} groups",
            summary.targets, summary.profiled, summary.groups
        )
    }

    pub fn groups(&self, keys: &[String], groups: &[Group]) -> String {
        let mut header = vec!["#"];
        header.extend(keys.iter().map(String::as_str));
        header.extend(["Total", "Profiled", "Status"]);

        let rows = groups
            .iter()
            .enumerate()
            .map(|(index, group)| {
                let mut row = vec![(index + 1).to_string()];
                row.extend(group.values.iter().map(|value| {
                    if value.is_empty() {
                        "-".to_string()
                    } else {
                        value.clone()
                    }
                }));
                row.push(group.total.to_string());
                row.push(group.profiled.to_string());
                row.push(group.status().to_string());
                row
            })
            .collect::<Vec<_>>();

        let status_col = header.len() - 1;
        self.table(&header, &rows, |index, col| {
            if col != status_col {
                return "";
            }

            match groups[index].status() {
                GroupStatus::AllKept => "32",
                GroupStatus::Partial => "33",
                GroupStatus::NoneKept => "",
            }
        })
    }

    pub fn rules(&self, rules: &[Rule]) -> String {
        if rules.is_empty() {
            return "no rules, every target is dropped\n".to_string();
        }

        let rows = rules
            .iter()
            .map(|rule| {
                vec![
                    rule.id.map_or_else(|| "-".to_string(), |id| id.to_string()),
                    rule.action.to_string(),
                    rule.selector.to_string(),
                ]
            })
            .collect::<Vec<_>>();

        self.table(&["ID", "Action", "Selector"], &rows, |_, _| "")
    }

    pub fn agents(&self, agents: &[AgentSummary]) -> String {
        let rows = agents
            .iter()
            .map(|agent| {
                vec![
                    agent.name.clone(),
                    agent.targets.to_string(),
                    agent.last_updated.map_or_else(
                        || "-".to_string(),
                        |ts| ts.format("%Y-%m-%d %H:%M:%S").to_string(),
                    ),
                ]
            })
            .collect::<Vec<_>>();

        self.table(&["Agent", "Targets", "Last Updated"], &rows, |_, _| "")
    }

    pub fn keys(&self, view: &View) -> String {
        format!(
            "selected: {}\navailable: {}\n",
            view.keys.join(", "),
            view.available_keys.join(", ")
        )
    }

    pub fn view(&self, view: &View) -> String {
        format!(
            "{}\n\n{}",
            self.summary(view.state, &view.summary),
            self.groups(&view.keys, &view.groups)
        )
    }
}

pub enum Outcome {
    Print(String),
    Quit,
}

/// Executes console input against a session.
pub struct Console {
    handle: Handle,
    renderer: Renderer,
}

impl Console {
    pub fn new(handle: Handle, renderer: Renderer) -> Self {
        Console { handle, renderer }
    }

    pub fn execute(&self, input: Input) -> Result<Outcome, SessionClosed> {
        let view = self.handle.view();

        let text = match input {
            Input::Empty => String::new(),
            Input::Quit => return Ok(Outcome::Quit),
            Input::Help => format!("{HELP}\n"),
            Input::Keys => self.renderer.keys(&view),
            Input::Rules => self.renderer.rules(&view.rules),
            Input::Agents => self.renderer.agents(&view.agents),
            Input::Show => self.renderer.view(&view),
            Input::Group(keys) => {
                self.handle.set_keys(keys)?;
                String::new()
            }
            Input::Add(key) => {
                self.handle.select_key(key)?;
                String::new()
            }
            Input::Remove(key) => {
                self.handle.deselect_key(key)?;
                String::new()
            }
            Input::Delete(id) => {
                self.handle.delete_rule(id)?;
                String::new()
            }
            Input::Toggle(row) => match view.groups.get(row - 1) {
                Some(group) => {
                    if view.state != State::Subscribed {
                        format!("not connected, toggle of row {row} dropped\n")
                    } else {
                        self.handle.toggle_group(view.keys.clone(), group.clone())?;
                        String::new()
                    }
                }
                None => format!("no group in row {row}\n"),
            },
        };

        Ok(Outcome::Print(text))
    }

    /// Read commands from `input` and print the view whenever it changes,
    /// until quit, end of input or the session stops.
    #[allow(clippy::print_stdout)]
    pub async fn run<R>(self, input: R)
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut views = self.handle.watch();

        println!("{}", self.renderer.view(&views.borrow_and_update()));

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let line = match line {
                        Ok(Some(line)) => line,
                        Ok(None) => return,
                        Err(err) => {
                            warn!(message = "Read console input failed", %err);
                            return;
                        }
                    };

                    match line.parse::<Input>() {
                        Ok(input) => match self.execute(input) {
                            Ok(Outcome::Print(text)) => print!("{text}"),
                            Ok(Outcome::Quit) => return,
                            Err(err) => {
                                println!("{err}");
                                return;
                            }
                        },
                        Err(err) => println!("{err}"),
                    }
                }

                changed = views.changed() => {
                    if changed.is_err() {
                        return;
                    }

                    println!("{}", self.renderer.view(&views.borrow_and_update()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{Action, Clause, Selector};

    #[test]
    fn parse_input() {
        for (line, want) in [
            ("", Input::Empty),
            ("   ", Input::Empty),
            ("keys", Input::Keys),
            ("group ns,pod", Input::Group(vec!["ns".into(), "pod".into()])),
            ("group ns, pod", Input::Group(vec!["ns".into(), "pod".into()])),
            ("group", Input::Group(vec![])),
            ("add container", Input::Add("container".into())),
            ("remove ns", Input::Remove("ns".into())),
            ("toggle 2", Input::Toggle(2)),
            ("delete 42", Input::Delete(42)),
            ("rules", Input::Rules),
            ("agents", Input::Agents),
            (" show ", Input::Show),
            ("?", Input::Help),
            ("q", Input::Quit),
        ] {
            assert_eq!(line.parse::<Input>(), Ok(want), "line: {line:?}");
        }
    }

    #[test]
    fn parse_input_errors() {
        for line in ["toggle", "toggle 0", "toggle x", "delete", "delete x", "add", "add a b", "bogus"] {
            assert!(line.parse::<Input>().is_err(), "line: {line:?}");
        }
    }

    #[test]
    fn render_groups() {
        let groups = vec![
            Group {
                values: vec!["a".into(), "app".into()],
                total: 2,
                profiled: 2,
            },
            Group {
                values: vec!["bb".into(), "".into()],
                total: 10,
                profiled: 3,
            },
        ];
        let keys = vec!["ns".to_string(), "container".to_string()];

        let text = Renderer::new(false).groups(&keys, &groups);
        assert_eq!(
            text,
            "\
#  ns  container  Total  Profiled  Status
1  a   app        2      2         all kept
2  bb  -          10     3         partial
"
        );

        let colored = Renderer::new(true).groups(&keys, &groups);
        assert!(colored.starts_with("\x1b[7m#"));
        assert!(colored.contains("\x1b[32mall kept\x1b[0m"));
        assert!(colored.contains("\x1b[33mpartial\x1b[0m"));
    }

    #[test]
    fn render_rules() {
        let renderer = Renderer::new(false);
        assert_eq!(renderer.rules(&[]), "no rules, every target is dropped\n");

        let rules = vec![
            Rule {
                id: Some(3),
                selector: Selector(vec![Clause::equal("ns", "a")]),
                action: Action::Keep,
            },
            Rule::new(Selector::default(), Action::Drop),
        ];
        assert_eq!(
            renderer.rules(&rules),
            "\
ID  Action  Selector
3   keep    ns=\"a\"
-   drop
"
        );
    }

    #[test]
    fn render_summary() {
        let summary = Summary {
            targets: 5,
            profiled: 2,
            groups: 3,
        };

        assert_eq!(
            Renderer::new(false).summary(State::Subscribed, &summary),
            "cnc - subscribed | 5 targets, 2 profiled, 3 groups"
        );
        assert!(
            Renderer::new(true)
                .summary(State::Exhausted, &summary)
                .contains("\x1b[31mexhausted\x1b[0m")
        );
    }
}
