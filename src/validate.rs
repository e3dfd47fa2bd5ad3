use std::fmt;
use std::io::IsTerminal;
use std::path::PathBuf;

use argh::FromArgs;
use cnc::config::{Config, Error};
use exitcode::ExitCode;

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "validate",
    description = "Validate the config file and print the effective config, then exit",
    help_triggers("-h", "--help")
)]
pub struct Validate {
    #[argh(option, short = 'c', long = "config", description = "config file to validate")]
    config: Option<PathBuf>,
}

impl Validate {
    pub fn run(&self) -> ExitCode {
        let mut fmt = Formatter::new(std::io::stdout().is_terminal());

        let config = match &self.config {
            Some(path) => match Config::load(path) {
                Ok(config) => {
                    fmt.success(format!("Loaded {path:?}"));
                    config
                }
                Err(Error::Invalid(errors)) => {
                    fmt.title(format!("Invalid config {path:?}"));
                    fmt.sub_error(errors);
                    return exitcode::CONFIG;
                }
                Err(err) => {
                    fmt.error(err.to_string());
                    return exitcode::CONFIG;
                }
            },
            None => {
                fmt.warning("No config file given, using defaults");
                Config::default()
            }
        };

        match serde_yaml::to_string(&config) {
            Ok(text) => {
                fmt.title("Effective config");
                fmt.print(text);
            }
            Err(err) => {
                fmt.error(format!("Serialize config failed, {err}"));
                return exitcode::SOFTWARE;
            }
        }

        fmt.validated();
        exitcode::OK
    }
}

struct Formatter {
    /// Width of largest printed line
    max_line_width: usize,
    /// Can empty line be printed
    print_space: bool,
    color: bool,
    // Intros
    error_intro: &'static str,
    warning_intro: &'static str,
    success_intro: &'static str,
}

impl Formatter {
    fn new(color: bool) -> Self {
        Self {
            max_line_width: 0,
            print_space: false,
            error_intro: if color {
                // red
                "\x1b[31mx\x1b[0m"
            } else {
                "x"
            },
            warning_intro: if color {
                // yellow
                "\x1b[33m~\x1b[0m"
            } else {
                "~"
            },
            success_intro: if color {
                // green
                "\x1b[32m√\x1b[0m"
            } else {
                "√"
            },
            color,
        }
    }

    /// Final confirmation that validation process was successful.
    #[allow(clippy::print_stdout)]
    fn validated(&self) {
        println!("{:-^width$}", "", width = self.max_line_width);

        if self.color {
            // escape codes would count towards the padding otherwise
            println!(
                "{:>width$}",
                "\x1b[32mValidated\x1b[0m", // green
                width = self.max_line_width + 9
            );
        } else {
            println!("{:>width$}", "Validated", width = self.max_line_width)
        }
    }

    fn success(&mut self, msg: impl AsRef<str>) {
        self.print(format!("{} {}\n", self.success_intro, msg.as_ref()))
    }

    fn warning(&mut self, warning: impl AsRef<str>) {
        self.print(format!("{} {}\n", self.warning_intro, warning.as_ref()))
    }

    fn error(&mut self, error: impl AsRef<str>) {
        self.print(format!("{} {}\n", self.error_intro, error.as_ref()))
    }

    fn title(&mut self, title: impl AsRef<str>) {
        self.space();
        self.print(format!(
            "{}\n{:-<width$}\n",
            title.as_ref(),
            "",
            width = title.as_ref().len()
        ))
    }

    fn sub_error<I: IntoIterator>(&mut self, errors: I)
    where
        I::Item: fmt::Display,
    {
        for msg in errors {
            self.print(format!("{} {}\n", self.error_intro, msg));
        }
        self.space();
    }

    /// Prints empty space if necessary.
    fn space(&mut self) {
        if self.print_space {
            self.print_space = false;
            #[allow(clippy::print_stdout)]
            {
                println!();
            }
        }
    }

    fn print(&mut self, print: impl AsRef<str>) {
        let width = print
            .as_ref()
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        self.max_line_width = width.max(self.max_line_width);
        self.print_space = true;
        #[allow(clippy::print_stdout)]
        {
            print!("{}", print.as_ref())
        }
    }
}
