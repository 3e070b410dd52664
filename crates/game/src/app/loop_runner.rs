use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use tracing::{error, info};

use super::bootstrap::AppWiring;
use super::console::{parse_line, Reply, Session};

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let mut session = Session::new(app.game, &app.config);
    session.start();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = drive(&mut session, stdin.lock(), &mut out);
    session.shutdown();

    match result {
        Ok(()) => {
            info!("session_ended");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "console_io_failed");
            ExitCode::FAILURE
        }
    }
}

/// Reads commands until `quit` or end of input.
fn drive(session: &mut Session, input: impl BufRead, out: &mut impl Write) -> io::Result<()> {
    print_lines(out, &session.render())?;
    for line in input.lines() {
        let line = line?;
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                writeln!(out, "error: {err}")?;
                continue;
            }
        };
        match session.execute(command) {
            Ok(Reply::Lines(lines)) => print_lines(out, &lines)?,
            Ok(Reply::Quit) => break,
            Err(err) => writeln!(out, "error: {err}")?,
        }
        out.flush()?;
    }
    Ok(())
}

fn print_lines(out: &mut impl Write, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()
}
