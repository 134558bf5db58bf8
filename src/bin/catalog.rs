//! Offline catalog explorer.
//!
//! A REPL over a catalog loaded from two saved responses.
//!
//! Usage:
//!   cargo run --bin catalog -- asset_index.json active_symbols.json
//!   catalog  (then `load <asset_index.json> <active_symbols.json>`)

use contractbook::{
    Catalog, ContractFilter, ContractView, DurationValue, SelectionFlow, SelectionInput,
    SelectionState,
};
use std::io::{self, BufRead, Write};
use std::path::Path;

fn main() {
    let mut catalog = Catalog::new();

    println!("Contract catalog explorer v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'help' for commands, 'quit' to exit.\n");

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let [assets, actives] = args.as_slice() {
        load(&mut catalog, &[assets.as_str(), actives.as_str()]);
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("catalog> ");
        let _ = stdout.flush();

        let Some(line) = read_line(&stdin) else {
            break; // EOF
        };
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts.first().map(|s| s.to_lowercase());

        match cmd.as_deref() {
            Some("help" | "h" | "?") => print_help(),
            Some("quit" | "exit" | "q") => break,
            Some("load") => load(&mut catalog, &parts[1..]),
            Some("report" | "r") => println!("{}", catalog.report()),
            Some("markets" | "m") => print_markets(&catalog),
            Some("available" | "a") => print_views(&catalog.available_contracts()),
            Some("symbol" | "s") => match parts.get(1) {
                Some(symbol) => print_views(&catalog.contracts_for_symbol(symbol)),
                None => println!("Usage: symbol <symbol>"),
            },
            Some("duration" | "d") => handle_duration(&catalog, &parts[1..]),
            Some("modality") => handle_modality(&catalog, &parts[1..]),
            Some("find" | "f") => handle_find(&catalog, &parts[1..]),
            Some("params" | "p") => {
                let params = match parts.get(1) {
                    Some(pattern) => catalog.parameters().find(pattern),
                    None => catalog.parameters().all(),
                };
                for p in params {
                    println!("  {p}");
                }
            }
            Some("select") => run_selection(&catalog, &stdin),
            Some(cmd) => println!("Unknown command: '{}'. Type 'help' for commands.", cmd),
            None => {}
        }
    }

    println!("Goodbye!");
}

fn read_line(stdin: &io::Stdin) -> Option<String> {
    let mut line = String::new();
    match stdin.lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

fn print_help() {
    println!(
        r#"
Commands:
  load <assets.json> <actives.json>  Populate from two saved responses
  report                             Counts and skipped symbols
  markets                            Markets and submarkets, open or closed
  available                          Every tradeable (symbol, contract) pair
  symbol <symbol>                    Contracts of one symbol
  duration <token> [fit]             Contracts admitting a duration
  modality <pattern> [exact]         Contracts by modality name
  find key=value ...                 Combined search (symbol, market, submarket,
                                     name, group, modality, duration, fit)
  params [pattern]                   Distinct parameters
  select                             Walk the selection wizard
  help                               Show this help
  quit                               Exit

Examples:
  duration 7t fit                    Envelopes expressed in ticks containing 7t
  find market=forex group=callput duration=30m
"#
    );
}

fn read_json(path: &str) -> Result<serde_json::Value, String> {
    let text = std::fs::read_to_string(Path::new(path)).map_err(|e| format!("{path}: {e}"))?;
    serde_json::from_str(&text).map_err(|e| format!("{path}: {e}"))
}

fn load(catalog: &mut Catalog, args: &[&str]) {
    let [assets, actives] = args else {
        println!("Usage: load <asset_index.json> <active_symbols.json>");
        return;
    };
    let responses = read_json(assets).and_then(|a| Ok((a, read_json(actives)?)));
    match responses {
        Ok((a, s)) => match catalog.populate(&a, &s) {
            Ok(report) => {
                println!("Loaded {report}");
                for symbol in &report.skipped {
                    println!("  skipped {symbol}: no asset_index row");
                }
            }
            Err(e) => println!("Populate failed: {e}"),
        },
        Err(e) => println!("Cannot read: {e}"),
    }
}

fn print_markets(catalog: &Catalog) {
    let markets = catalog.markets_with_status();
    if markets.is_empty() {
        println!("(empty)");
        return;
    }
    for market in markets {
        let flag = if market.is_open { "" } else { " (closed)" };
        println!("  {}{flag}", market.display_name);
        for sub in catalog.submarkets_for(&market.code) {
            let flag = if sub.is_open { "" } else { " (closed)" };
            println!("    {}{flag}", sub.display_name);
        }
    }
}

fn print_views(views: &[ContractView<'_>]) {
    if views.is_empty() {
        println!("No contracts.");
        return;
    }
    for view in views.iter().take(50) {
        println!("  {view}");
    }
    if views.len() > 50 {
        println!("  ... and {} more", views.len() - 50);
    }
}

fn handle_duration(catalog: &Catalog, args: &[&str]) {
    let Some(token) = args.first() else {
        println!("Usage: duration <token> [fit]");
        return;
    };
    match DurationValue::parse(token) {
        Ok(value) => {
            let fit = args.get(1).is_some_and(|s| s.eq_ignore_ascii_case("fit"));
            print_views(&catalog.by_duration(&value, fit));
        }
        Err(e) => println!("{e}"),
    }
}

fn handle_modality(catalog: &Catalog, args: &[&str]) {
    let Some(pattern) = args.first() else {
        println!("Usage: modality <pattern> [exact]");
        return;
    };
    let exact = args.get(1).is_some_and(|s| s.eq_ignore_ascii_case("exact"));
    print_views(&catalog.by_modality(pattern, exact));
}

fn handle_find(catalog: &Catalog, args: &[&str]) {
    let mut filter = ContractFilter::new();
    for arg in args {
        let Some((key, value)) = arg.split_once('=') else {
            println!("Expected key=value, got '{arg}'");
            return;
        };
        filter = match key {
            "symbol" => filter.symbol(value),
            "market" => filter.market(value),
            "submarket" => filter.submarket(value),
            "name" => filter.display_name(value),
            "group" => filter.modality_group(value),
            "modality" => filter.modality_name(value),
            "fit" => filter.fit_in_units(matches!(value, "1" | "true" | "yes")),
            "duration" => match DurationValue::parse(value) {
                Ok(d) => filter.duration(d),
                Err(e) => {
                    println!("{e}");
                    return;
                }
            },
            other => {
                println!("Unknown filter: '{other}'");
                return;
            }
        };
    }
    if filter.is_empty() {
        println!("find needs at least one filter");
        return;
    }
    print_views(&catalog.find_matches(&filter));
}

fn run_selection(catalog: &Catalog, stdin: &io::Stdin) {
    let mut flow = SelectionFlow::new(catalog);
    while !flow.is_finished() {
        let choices = flow.choices();
        if choices.is_empty() {
            println!("Nothing to choose from here.");
            let _ = flow.advance(SelectionInput::Cancel);
            break;
        }
        println!("{}:", flow.state().prompt());
        for choice in &choices {
            println!("  {:<20} {}", choice.value, choice);
        }
        print!("> ");
        let _ = io::stdout().flush();
        let input = match read_line(stdin) {
            Some(line) if !line.is_empty() => SelectionInput::Choose(line),
            _ => SelectionInput::Cancel,
        };
        if let Err(e) = flow.advance(input) {
            println!("{e}");
        }
    }
    match flow.state() {
        SelectionState::Confirmed(selection) => println!("Selected {selection}"),
        _ => println!("Selection cancelled."),
    }
}
