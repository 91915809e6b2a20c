use indicatif::ProgressBar;
use outpost::moves::execute::{generate_legal, make_move, undo_move};
use outpost::moves::perft::perft;
use outpost::moves::types::MoveList;
use outpost::search::context::InputQueue;
use outpost::uci::{AUTHOR, Command, Engine, NAME};
use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Instant;

fn main() -> ExitCode {
    outpost::logger::init_logging("logs/outpost.log", "outpost=info");

    let mut engine = Engine::new();
    let input = InputQueue::spawn_stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let _ = writeln!(out, "{} by {}", NAME, AUTHOR);
    let _ = out.flush();

    loop {
        let Some(line) = input.next_line() else {
            // The GUI hung up without `quit`.
            let _ = writeln!(out, "info string error: stdin closed");
            return ExitCode::FAILURE;
        };

        // Developer command, kept out of the protocol handler.
        if let Command::Perft(depth) = Command::parse(&line) {
            run_perft(&engine, depth);
            continue;
        }

        match engine.handle(&line, &mut out, Some(&input)) {
            Ok(true) => {}
            Ok(false) => return ExitCode::SUCCESS,
            Err(err) => {
                let _ = writeln!(out, "info string error: {}", err);
                return ExitCode::FAILURE;
            }
        }
    }
}

/// Perft divide with a progress bar over the root moves.
fn run_perft(engine: &Engine, depth: u32) {
    let depth = depth.max(1);
    let tables = engine.tables();
    let mut board = engine.board.clone();

    let mut moves = MoveList::new();
    generate_legal(&mut board, tables, &mut moves, true);

    let start = Instant::now();
    let bar = ProgressBar::new(moves.len() as u64);
    let mut total = 0u64;
    for sm in &moves {
        let undo = make_move(&mut board, sm.mv);
        let nodes = perft(&mut board, tables, depth - 1);
        undo_move(&mut board, undo);
        total += nodes;
        bar.println(format!("{}: {}", sm.mv, nodes));
        bar.inc(1);
    }
    bar.finish_and_clear();
    println!(
        "perft {} = {} nodes in {} ms",
        depth,
        total,
        start.elapsed().as_millis()
    );
}
