use handlebars::{Handlebars, RenderError};
use serde::Serialize;

use crate::error::ConfigError;
use crate::orders::{DateFilter, OrderBoard};

const LAYOUT: &str = include_str!("./templates/layout.hbs");
const LOGIN: &str = include_str!("./templates/login.hbs");
const ORDERS: &str = include_str!("./templates/orders.hbs");

/// Data behind the login page
#[derive(Debug, Default, Serialize)]
pub struct LoginView {
    pub error: Option<String>,
    pub notice: Option<String>,
}

/// Data behind the orders board
#[derive(Debug, Serialize)]
pub struct OrdersView {
    pub board: OrderBoard,
    /// `"all"` or the selected delivery date, echoed into the date picker.
    pub selected_date: String,
    /// Dates offered by the picker: the board's dates plus a selected date
    /// that no row carries.
    pub date_options: Vec<String>,
    pub order_count: usize,
    pub error: Option<String>,
}

impl OrdersView {
    pub fn new(board: OrderBoard, filter: &DateFilter) -> Self {
        let mut date_options = board.delivery_dates.clone();
        if let Some(date) = filter.selected() {
            if let Err(at) = date_options.binary_search_by(|d| d.as_str().cmp(date)) {
                date_options.insert(at, date.to_string());
            }
        }

        OrdersView {
            order_count: board.order_count(),
            selected_date: filter.selected().unwrap_or(DateFilter::ALL).to_string(),
            date_options,
            board,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>, filter: &DateFilter) -> Self {
        OrdersView {
            error: Some(error.into()),
            ..OrdersView::new(OrderBoard::default(), filter)
        }
    }
}

/// Compiled page templates.
pub struct Pages {
    registry: Handlebars<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, ConfigError> {
        let mut registry = Handlebars::new();
        registry
            .register_partial("layout", LAYOUT)
            .map_err(|e| ConfigError::Template(e.to_string()))?;
        registry
            .register_template_string("login", LOGIN)
            .map_err(|e| ConfigError::Template(e.to_string()))?;
        registry
            .register_template_string("orders", ORDERS)
            .map_err(|e| ConfigError::Template(e.to_string()))?;
        Ok(Pages { registry })
    }

    pub fn login(&self, view: &LoginView) -> Result<String, RenderError> {
        self.registry.render("login", view)
    }

    pub fn orders(&self, view: &OrdersView) -> Result<String, RenderError> {
        self.registry.render("orders", view)
    }
}
