use std::error::Error;
use std::io::{self, Write};
use ticker_cache::utils::display::DisplayFormatter;
use ticker_cache::{Config, TickerService, TickerSymbol};
use tracing::{debug, info};

const HISTORY_ROWS: usize = 5;

fn print_help() {
    println!("Commands:");
    println!("  <ticker>        - Show data for a ticker (cached for 5 minutes)");
    println!("  list [query]    - Load the ticker list from the backend");
    println!("  search <term>   - Filter the loaded ticker list");
    println!("  cached          - Show cached tickers");
    println!("  clear [ticker]  - Clear the whole cache, or one ticker");
    println!("  help            - Show this help");
    println!("  exit            - Exit the program");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    info!("Starting ticker dashboard against {}", config.backend_url);

    let service = TickerService::from_config(&config);
    let display = DisplayFormatter::new();

    println!("=== Stock Ticker Dashboard ===");
    print_help();

    let mut input = String::new();
    loop {
        input.clear();
        print!("> ");
        io::stdout().flush()?;
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        let mut words = input.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let arg = words.next();

        match command {
            "exit" => {
                debug!("Received exit command");
                break;
            }
            "help" => print_help(),
            "list" => match service.refresh_ticker_list(arg.unwrap_or("")).await {
                Ok(list) => {
                    println!("{}", display.format_header("Tickers"));
                    let rows: Vec<Vec<String>> =
                        list.filter("").into_iter().map(|t| vec![t]).collect();
                    println!("{}", display.format_table(&["Symbol"], &rows));
                    println!("{} tickers", list.len());
                }
                Err(e) => eprintln!("{}", e),
            },
            "search" => {
                let matches = service.search(arg.unwrap_or(""));
                if service.ticker_list().is_empty() {
                    println!("No tickers loaded; run `list` first");
                } else {
                    println!("{}", matches.join("  "));
                    println!("{} tickers", matches.len());
                }
            }
            "cached" => {
                let now = service.now_millis();
                println!("{}", display.format_cache_listing(&service.cache().snapshot(), now));
            }
            "clear" => match arg.map(TickerSymbol::parse) {
                None => {
                    service.clear();
                    println!("Cache cleared");
                }
                Some(Ok(ticker)) => {
                    if service.clear_for(&ticker) {
                        println!("Cleared {}", ticker);
                    } else {
                        println!("{} was not cached", ticker);
                    }
                }
                Some(Err(e)) => eprintln!("{}", e),
            },
            symbol => {
                let ticker = match TickerSymbol::parse(symbol) {
                    Ok(ticker) => ticker,
                    Err(e) => {
                        eprintln!("{}", e);
                        continue;
                    }
                };
                debug!("Requesting data for ticker: {}", ticker);
                match service.select(&ticker).await {
                    Ok(fetched) => {
                        println!(
                            "{}",
                            display.format_stock_summary(&fetched.data, fetched.from_cache)
                        );
                        let history = fetched.data.recent_history(HISTORY_ROWS);
                        if !history.is_empty() {
                            println!("\nRecent History:");
                            println!("{}", display.format_history(history));
                        }
                    }
                    Err(e) => eprintln!("{}", e),
                }
            }
        }
    }

    info!("Shutting down");
    Ok(())
}
