/*!
# Fulfillment Board

An internal order board for fulfillment staff, backed by the shop's order sheet.

## Overview

Orders are exported into a spreadsheet, one row per ordered line. Each order
has a main line (the combination option product) and any number of sub lines
(additional configuration products). The board reads the sheet fresh on every
request, groups the rows by managed product name and order number, and shows
one tab per product with the orders sorted by order number. A delivery-date
picker narrows the board to the orders whose main line is due on that day.

## Architecture

### Data Source Layer
- **SheetSource** - async trait returning the worksheet as a grid of strings
- **GoogleSheetsSource** - finds the document by name through the Drive API
  and reads the worksheet through the Sheets API
- **FileSheetSource** - reads a local `.csv`, `.xlsx`, `.xls` or `.ods` export
- **records_from_grid** - header row trimmed, rows zipped into records

### Core
- **Record** - one row keyed by header name
- **aggregate** - product -> order -> (main line, sub lines), plus the sorted
  distinct delivery dates

### Web Layer (feature `web`)
- **Technologies**: Rust, axum, handlebars
- Single shared password checked against an Argon2 hash
- Server-side sessions referenced from a signed cookie
- Errors from the sheet are rendered inline on the board

## Modules

- **record**: row model
- **orders**: grouping and date filtering
- **source**: sheet backends
- **error**: error types
- **config**: startup configuration from the environment
- **login**: password gate, sessions and auth middleware
- **pages**: page templates
- **app**: routing

## Routes

- `/` - redirects to the login page
- `/login` - login form (GET) and password check (POST)
- `/logout` - ends the session
- `/orders?delivery_date=<date|all>` - the order board (login required)
*/

pub mod error;
pub mod orders;
pub mod record;
pub mod source;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod config;
#[cfg(feature = "web")]
pub mod login;
#[cfg(feature = "web")]
pub mod pages;

pub use error::SourceError;
pub use orders::{DateFilter, OrderBoard, OrderColumns, OrderGroup, ProductOrders, aggregate};
pub use record::Record;
pub use source::{SheetSource, fetch_records, records_from_grid};

#[cfg(feature = "web")]
pub use config::AppConfig;
