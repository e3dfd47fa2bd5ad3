use std::io::IsTerminal;
use std::path::PathBuf;

use argh::FromArgs;
use cnc::console::Renderer;
use cnc::grouping::{DEFAULT_GROUP_BY, Grouping, Summary};
use cnc::snapshot::{Error, Snapshot};
use exitcode::ExitCode;

#[derive(Debug, FromArgs, PartialEq)]
#[argh(
    subcommand,
    name = "groups",
    description = "Group the targets of a saved data message, then exit",
    help_triggers("-h", "--help")
)]
pub struct Groups {
    #[argh(
        option,
        short = 's',
        description = "file holding a data message or only its payload"
    )]
    snapshot: PathBuf,

    #[argh(
        option,
        short = 'b',
        default = "DEFAULT_GROUP_BY.to_string()",
        description = "comma separated label keys to group by"
    )]
    by: String,

    #[argh(switch, short = 'r', description = "print the rules as well")]
    rules: bool,
}

impl Groups {
    #[allow(clippy::print_stdout, clippy::print_stderr)]
    pub fn run(&self) -> ExitCode {
        let snapshot = match Snapshot::load(&self.snapshot) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                eprintln!("{err}");

                return match err {
                    Error::Io { .. } => exitcode::NOINPUT,
                    _ => exitcode::DATAERR,
                };
            }
        };

        let grouping = Grouping::new(self.by.split(',').map(str::trim).filter(|key| !key.is_empty()));
        let groups = snapshot.groups(&grouping);
        let renderer = Renderer::new(std::io::stdout().is_terminal());

        if self.rules {
            println!("{}", renderer.rules(&snapshot.rules));
        }

        println!(
            "{} | {}",
            self.snapshot.display(),
            renderer.totals(&Summary::of(&groups))
        );
        println!();
        print!("{}", renderer.groups(grouping.keys(), &groups));

        exitcode::OK
    }
}
