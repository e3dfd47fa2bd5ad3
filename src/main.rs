mod groups;
mod launch;
mod validate;

use launch::RootCommand;

fn main() {
    let root: RootCommand = argh::from_env();

    if let Err(code) = root.run() {
        std::process::exit(code);
    }
}
