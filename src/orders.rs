//! Grouping of order rows into per-product, per-order groups.
//!
//! A sheet row is either the main line of an order (the combination option
//! product) or one of its sub lines (additional configuration products).
//! Staff work product by product, so rows are bucketed by managed product
//! name first and by order number second.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::record::Record;

/// Column names and kind values the aggregator reads from each record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderColumns {
    pub product: String,
    pub order_number: String,
    pub kind: String,
    pub delivery_date: String,
    /// Kind value marking the main line of an order.
    pub main_kind: String,
    /// Kind value marking a sub line of an order.
    pub sub_kind: String,
}

impl Default for OrderColumns {
    fn default() -> Self {
        OrderColumns {
            product: "관리용상품명".to_string(),
            order_number: "주문번호".to_string(),
            kind: "상품종류".to_string(),
            delivery_date: "배송희망일".to_string(),
            main_kind: "조합형옵션상품".to_string(),
            sub_kind: "추가구성상품".to_string(),
        }
    }
}

/// How a record takes part in its order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    Main,
    Sub,
}

impl OrderColumns {
    pub fn line_kind(&self, record: &Record) -> Option<LineKind> {
        match record.get(&self.kind) {
            Some(kind) if kind == self.main_kind => Some(LineKind::Main),
            Some(kind) if kind == self.sub_kind => Some(LineKind::Sub),
            _ => None,
        }
    }
}

/// Delivery-date selection coming from the `delivery_date` query parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DateFilter {
    #[default]
    All,
    On(String),
}

impl DateFilter {
    pub const ALL: &'static str = "all";

    /// Absent, empty and `"all"` all mean no filtering.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") | Some(Self::ALL) => DateFilter::All,
            Some(date) => DateFilter::On(date.to_string()),
        }
    }

    pub fn selected(&self) -> Option<&str> {
        match self {
            DateFilter::All => None,
            DateFilter::On(date) => Some(date),
        }
    }
}

/// The main line of an order plus its sub lines.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OrderGroup {
    pub main_info: Option<Record>,
    pub sub_products: Vec<Record>,
}

/// All orders of one managed product, keyed by order number.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProductOrders {
    pub product: String,
    pub orders: BTreeMap<String, OrderGroup>,
}

/// Result of [`aggregate`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OrderBoard {
    /// Product buckets in the order their first row appears in the sheet.
    pub products: Vec<ProductOrders>,
    /// Distinct non-empty delivery dates of the unfiltered input, ascending.
    pub delivery_dates: Vec<String>,
}

impl OrderBoard {
    pub fn product(&self, name: &str) -> Option<&ProductOrders> {
        self.products.iter().find(|p| p.product == name)
    }

    pub fn order_count(&self) -> usize {
        self.products.iter().map(|p| p.orders.len()).sum()
    }
}

/// Distinct non-empty delivery dates, in ascending string order.
pub fn delivery_dates(records: &[Record], columns: &OrderColumns) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.get_non_empty(&columns.delivery_date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Keep the records of every order whose main line is due on `date`.
///
/// Sub lines follow their main line; their own date cell is not consulted.
pub fn filter_by_main_date<'a>(
    records: &'a [Record],
    date: &str,
    columns: &OrderColumns,
) -> Vec<&'a Record> {
    let due: HashSet<&str> = records
        .iter()
        .filter(|r| columns.line_kind(r) == Some(LineKind::Main))
        .filter(|r| r.get(&columns.delivery_date) == Some(date))
        .filter_map(|r| r.get_non_empty(&columns.order_number))
        .collect();

    records
        .iter()
        .filter(|r| {
            r.get_non_empty(&columns.order_number)
                .is_some_and(|order| due.contains(order))
        })
        .collect()
}

/// Group order rows by product and order number.
///
/// Rows without a product name or order number are skipped, as are rows
/// whose kind is neither the main nor the sub value. When an order has more
/// than one main line the last one in sheet order is kept.
pub fn aggregate(records: &[Record], filter: &DateFilter, columns: &OrderColumns) -> OrderBoard {
    let delivery_dates = delivery_dates(records, columns);

    let selected: Vec<&Record> = match filter {
        DateFilter::All => records.iter().collect(),
        DateFilter::On(date) => filter_by_main_date(records, date, columns),
    };

    let mut products: Vec<ProductOrders> = Vec::new();
    let mut bucket_index: HashMap<&str, usize> = HashMap::new();

    for record in selected {
        let Some(product) = record.get_non_empty(&columns.product) else {
            continue;
        };
        let index = *bucket_index.entry(product).or_insert_with(|| {
            products.push(ProductOrders {
                product: product.to_string(),
                orders: BTreeMap::new(),
            });
            products.len() - 1
        });

        let Some(order_number) = record.get_non_empty(&columns.order_number) else {
            continue;
        };
        let Some(kind) = columns.line_kind(record) else {
            continue;
        };

        let group = products[index]
            .orders
            .entry(order_number.to_string())
            .or_default();
        match kind {
            LineKind::Main => group.main_info = Some(record.clone()),
            LineKind::Sub => group.sub_products.push(record.clone()),
        }
    }

    OrderBoard {
        products,
        delivery_dates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN: &str = "조합형옵션상품";
    const SUB: &str = "추가구성상품";

    fn row(product: &str, order: &str, kind: &str, date: &str) -> Record {
        Record::from_pairs([
            ("관리용상품명", product),
            ("주문번호", order),
            ("상품종류", kind),
            ("배송희망일", date),
        ])
    }

    fn run(records: &[Record], filter: &DateFilter) -> OrderBoard {
        aggregate(records, filter, &OrderColumns::default())
    }

    #[test]
    fn empty_input_gives_empty_board() {
        assert_eq!(run(&[], &DateFilter::All), OrderBoard::default());
    }

    #[test]
    fn worked_example() {
        let records = vec![
            row("A", "2", MAIN, "2024-01-02"),
            row("A", "1", MAIN, "2024-01-01"),
            row("A", "1", SUB, ""),
        ];

        let board = run(&records, &DateFilter::All);
        assert_eq!(board.delivery_dates, vec!["2024-01-01", "2024-01-02"]);
        assert_eq!(board.products.len(), 1);

        let a = board.product("A").unwrap();
        let ids: Vec<&str> = a.orders.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(a.orders["1"].main_info.as_ref(), Some(&records[1]));
        assert_eq!(a.orders["1"].sub_products, vec![records[2].clone()]);
        assert_eq!(a.orders["2"].main_info.as_ref(), Some(&records[0]));
        assert!(a.orders["2"].sub_products.is_empty());

        let filtered = run(&records, &DateFilter::On("2024-01-01".into()));
        let a = filtered.product("A").unwrap();
        assert_eq!(a.orders.len(), 1);
        assert_eq!(a.orders["1"].sub_products.len(), 1);
        assert_eq!(filtered.delivery_dates, board.delivery_dates);
    }

    #[test]
    fn main_and_sub_meet_regardless_of_row_order() {
        let sub_first = vec![row("P", "7", SUB, ""), row("P", "7", MAIN, "d")];
        let board = run(&sub_first, &DateFilter::All);
        let group = &board.product("P").unwrap().orders["7"];
        assert_eq!(group.main_info.as_ref(), Some(&sub_first[1]));
        assert_eq!(group.sub_products, vec![sub_first[0].clone()]);
    }

    #[test]
    fn rows_missing_product_or_order_are_dropped() {
        let records = vec![
            Record::from_pairs([("주문번호", "1"), ("상품종류", MAIN)]),
            row("", "2", MAIN, ""),
            row("A", "", MAIN, ""),
            row("A", "3", MAIN, ""),
        ];
        let board = run(&records, &DateFilter::All);

        assert_eq!(board.products.len(), 1);
        assert_eq!(board.order_count(), 1);
        assert!(board.product("A").unwrap().orders.contains_key("3"));
    }

    #[test]
    fn all_rows_without_product_still_report_dates() {
        let records = vec![Record::from_pairs([("배송희망일", "2024-03-01")])];
        let board = run(&records, &DateFilter::All);
        assert!(board.products.is_empty());
        assert_eq!(board.delivery_dates, vec!["2024-03-01"]);
    }

    #[test]
    fn unknown_kind_is_ignored_without_creating_an_order() {
        let records = vec![row("A", "1", "단일상품", "")];
        let board = run(&records, &DateFilter::All);
        assert!(board.product("A").unwrap().orders.is_empty());
    }

    #[test]
    fn order_without_main_keeps_its_subs() {
        let records = vec![row("A", "9", SUB, ""), row("A", "9", SUB, "")];
        let board = run(&records, &DateFilter::All);
        let group = &board.product("A").unwrap().orders["9"];
        assert!(group.main_info.is_none());
        assert_eq!(group.sub_products.len(), 2);
    }

    #[test]
    fn duplicate_main_last_one_wins() {
        let records = vec![row("A", "1", MAIN, "x"), row("A", "1", MAIN, "y")];
        let board = run(&records, &DateFilter::All);
        let main = board.product("A").unwrap().orders["1"].main_info.clone();
        assert_eq!(main, Some(records[1].clone()));
    }

    #[test]
    fn sub_products_keep_sheet_order() {
        let records = vec![
            row("A", "1", SUB, "first"),
            row("A", "1", MAIN, ""),
            row("A", "1", SUB, "second"),
        ];
        let board = run(&records, &DateFilter::All);
        let subs = &board.product("A").unwrap().orders["1"].sub_products;
        assert_eq!(subs[0].get("배송희망일"), Some("first"));
        assert_eq!(subs[1].get("배송희망일"), Some("second"));
    }

    #[test]
    fn products_keep_first_seen_order() {
        let records = vec![
            row("Z", "1", MAIN, ""),
            row("A", "2", MAIN, ""),
            row("Z", "3", MAIN, ""),
        ];
        let names: Vec<String> = run(&records, &DateFilter::All)
            .products
            .into_iter()
            .map(|p| p.product)
            .collect();
        assert_eq!(names, vec!["Z", "A"]);
    }

    #[test]
    fn orders_sort_as_strings() {
        let records = vec![
            row("A", "10", MAIN, ""),
            row("A", "9", MAIN, ""),
            row("A", "100", MAIN, ""),
        ];
        let board = run(&records, &DateFilter::All);
        let ids: Vec<&String> = board.product("A").unwrap().orders.keys().collect();
        assert_eq!(ids, vec!["10", "100", "9"]);
    }

    #[test]
    fn date_filter_follows_the_main_row_date() {
        let records = vec![
            row("A", "1", MAIN, "2024-05-01"),
            row("A", "1", SUB, "2024-05-09"),
            row("A", "2", MAIN, "2024-05-02"),
            row("A", "2", SUB, "2024-05-01"),
            row("B", "1", SUB, ""),
        ];
        let board = run(&records, &DateFilter::On("2024-05-01".into()));

        let a = board.product("A").unwrap();
        assert_eq!(a.orders.keys().collect::<Vec<_>>(), vec!["1"]);
        assert_eq!(a.orders["1"].sub_products.len(), 1);
        // Order numbers match across products, so B's sub row for order 1 stays.
        assert_eq!(board.product("B").unwrap().orders["1"].sub_products.len(), 1);
    }

    #[test]
    fn date_filter_with_no_match_empties_the_board_but_not_the_dates() {
        let records = vec![row("A", "1", MAIN, "2024-05-01")];
        let board = run(&records, &DateFilter::On("1999-01-01".into()));
        assert!(board.products.is_empty());
        assert_eq!(board.delivery_dates, vec!["2024-05-01"]);
    }

    #[test]
    fn all_and_absent_filters_match_unfiltered() {
        let records = vec![row("A", "1", MAIN, "d1"), row("A", "2", MAIN, "d2")];
        let unfiltered = run(&records, &DateFilter::All);
        assert_eq!(run(&records, &DateFilter::parse(Some("all"))), unfiltered);
        assert_eq!(run(&records, &DateFilter::parse(None)), unfiltered);
        assert_eq!(run(&records, &DateFilter::parse(Some(""))), unfiltered);
    }

    #[test]
    fn delivery_dates_are_distinct_and_sorted() {
        let records = vec![
            row("A", "1", MAIN, "2024-02-01"),
            row("A", "2", MAIN, "2024-01-15"),
            row("A", "3", SUB, "2024-02-01"),
            row("A", "4", MAIN, ""),
        ];
        assert_eq!(
            delivery_dates(&records, &OrderColumns::default()),
            vec!["2024-01-15", "2024-02-01"]
        );
    }

    #[test]
    fn custom_columns_are_honoured() {
        let columns = OrderColumns {
            product: "product".into(),
            order_number: "order".into(),
            kind: "kind".into(),
            delivery_date: "date".into(),
            main_kind: "main".into(),
            sub_kind: "sub".into(),
        };
        let records = vec![Record::from_pairs([
            ("product", "A"),
            ("order", "1"),
            ("kind", "main"),
            ("date", "2024-01-01"),
        ])];
        let board = aggregate(&records, &DateFilter::All, &columns);
        assert!(board.product("A").unwrap().orders["1"].main_info.is_some());
    }
}
