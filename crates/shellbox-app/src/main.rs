//! SHELLBOX interactive entry point.
//!
//! Reads command lines from stdin and runs them against an in-memory
//! filesystem seeded with a small home directory. Type `help` to list
//! commands and `exit` (or send EOF) to quit.

mod session;

use std::io::{self, BufRead, Write};

use anyhow::Result;

use session::{Reply, Session, load_config};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Config path from CLI arg, SHELLBOX_CONFIG env var, or defaults.
    let config = load_config(std::env::args().nth(1))?;
    log::info!("Starting SHELLBOX as {}@{}", config.user, config.hostname);

    let mut session = Session::new(config)?;
    if let Some(motd) = session.fs().file_content("/etc/motd") {
        print!("{motd}");
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut input = stdin.lock();
    let mut line = String::new();
    loop {
        write!(stdout, "{}", session.prompt())?;
        stdout.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(stdout)?;
            break;
        }
        match session.handle(&line) {
            Reply::Lines(lines) => {
                for l in lines {
                    writeln!(stdout, "{l}")?;
                }
            },
            Reply::Error(msg) => eprintln!("{msg}"),
            Reply::Clear => write!(stdout, "\x1b[2J\x1b[H")?,
            Reply::Exit => break,
        }
    }
    log::info!("session closed");
    Ok(())
}
