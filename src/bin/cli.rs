#![cfg(not(tarpaulin_include))]

use clap::Parser;
use fulfillment_board::source::FileSheetSource;
use fulfillment_board::{DateFilter, OrderBoard, OrderColumns, Record, aggregate, fetch_records};
use std::path::PathBuf;
use std::process::ExitCode;

/// Print the order board for a local export of the order sheet.
#[derive(Parser, Debug)]
#[command(name = "orders_report", version)]
struct Args {
    /// Sheet export to read (.csv, .xlsx, .xls or .ods)
    #[arg(short, long)]
    file: PathBuf,

    /// Worksheet to read from a workbook
    #[arg(short, long, default_value = "발주발송관리")]
    sheet: String,

    /// Only show orders whose main line is due on this date ("all" for every order)
    #[arg(short, long)]
    date: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let source = FileSheetSource::new(&args.file, &args.sheet);
    let records = match fetch_records(&source).await {
        Ok(records) => records,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let columns = OrderColumns::default();
    let filter = DateFilter::parse(args.date.as_deref());
    let board = aggregate(&records, &filter, &columns);
    print_board(&board, &columns);

    ExitCode::SUCCESS
}

fn print_board(board: &OrderBoard, columns: &OrderColumns) {
    println!("Delivery dates: {}", board.delivery_dates.join(", "));

    for product in &board.products {
        println!();
        println!("== {} ({} orders)", product.product, product.orders.len());

        for (order_number, group) in &product.orders {
            match &group.main_info {
                Some(main) => println!(
                    "  [{}] due {}",
                    order_number,
                    main.get(&columns.delivery_date).unwrap_or("-")
                ),
                None => println!("  [{}] (no main item)", order_number),
            }
            for sub in &group.sub_products {
                println!("      + {}", summarize(sub, columns));
            }
        }
    }
}

// Every column except the ones already shown in the order heading.
fn summarize(record: &Record, columns: &OrderColumns) -> String {
    record
        .columns()
        .filter(|(name, value)| {
            !value.is_empty()
                && *name != columns.product
                && *name != columns.order_number
                && *name != columns.kind
        })
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(" ")
}
