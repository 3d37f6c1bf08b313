// Graintrade listing table parsing
use crate::model::{ParserError, Record};
use crate::normalizer::{PriceInput, normalize_price};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Column layout of a listing row: date, -, direction label, -, -, price.
const DATE_CELL: usize = 0;
const DIRECTION_CELL: usize = 2;
const PRICE_CELL: usize = 5;
const MIN_CELLS: usize = 6;

pub trait Parser {
    fn parse(&self, html: &str) -> Result<Vec<Record>, ParserError>;
}

pub struct ListingParser {
    usd_rate: f64,
}

impl ListingParser {
    pub fn new(usd_rate: f64) -> Self {
        Self { usd_rate }
    }

    fn parse_row(&self, row: ElementRef<'_>, cell_selector: &Selector, label_selector: &Selector) -> Result<Record, ParserError> {
        let cells: Vec<ElementRef<'_>> = row.select(cell_selector).collect();
        if cells.len() < MIN_CELLS {
            return Err(ParserError::MissingField(format!(
                "expected {} cells, found {}",
                MIN_CELLS,
                cells.len()
            )));
        }

        let raw_date = cell_text(cells[DATE_CELL]);
        let direction = cells[DIRECTION_CELL]
            .select(label_selector)
            .next()
            .map(|label| cell_text(label).to_lowercase())
            .unwrap_or_default();
        let price_text = cell_text(cells[PRICE_CELL]);

        let price_usd_per_ton = normalize_price(&PriceInput::Text(price_text.clone()), self.usd_rate)
            .map_err(|e| ParserError::MissingField(format!("price '{}': {}", price_text, e)))?;

        Ok(Record {
            raw_date,
            direction,
            price_usd_per_ton,
        })
    }
}

impl Parser for ListingParser {
    fn parse(&self, html: &str) -> Result<Vec<Record>, ParserError> {
        let document = Html::parse_document(html);

        let body_selector = selector("tbody")?;
        let row_selector = selector("tr")?;
        let cell_selector = selector("td")?;
        let label_selector = selector("span")?;

        // Layout tables get an implied tbody too; take the first body holding a listing-shaped row.
        let listing_body = document.select(&body_selector).find(|body| {
            body.select(&row_selector)
                .any(|row| row.select(&cell_selector).count() >= MIN_CELLS)
        });
        let Some(body) = listing_body else {
            debug!("No listing table on page");
            return Ok(Vec::new());
        };

        let mut records = Vec::new();
        for row in body.select(&row_selector) {
            match self.parse_row(row, &cell_selector, &label_selector) {
                Ok(record) => records.push(record),
                Err(e) => debug!("Skipping row: {}", e),
            }
        }

        Ok(records)
    }
}

fn selector(css: &str) -> Result<Selector, ParserError> {
    Selector::parse(css).map_err(|e| ParserError::HtmlParseError(e.to_string()))
}

/// Text of an element with every text node trimmed and joined.
fn cell_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect::<String>()
}
