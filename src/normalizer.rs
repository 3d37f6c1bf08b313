use crate::model::PriceError;

/// Marker of prices quoted in hryvnia.
const DOMESTIC_CURRENCY_MARKER: &str = "грн";

/// Raw price as it reaches normalization: scraped cell text, or a number
/// that has already been through normalization once.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceInput {
    Numeric(f64),
    Text(String),
}

impl From<&str> for PriceInput {
    fn from(text: &str) -> Self {
        PriceInput::Text(text.to_string())
    }
}

impl From<u32> for PriceInput {
    fn from(value: u32) -> Self {
        PriceInput::Numeric(f64::from(value))
    }
}

/// Converts a raw price into a strictly positive whole number of USD per ton.
///
/// Text is stripped down to digits, `.` and `,` (with `,` read as the decimal
/// separator) and divided by `usd_rate` when it mentions hryvnia. Numbers are
/// only rounded. Rounding is half away from zero.
pub fn normalize_price(input: &PriceInput, usd_rate: f64) -> Result<u32, PriceError> {
    if !usd_rate.is_finite() || usd_rate <= 0.0 {
        return Err(PriceError::InvalidRate(usd_rate));
    }

    let value = match input {
        PriceInput::Numeric(value) => {
            if !value.is_finite() {
                return Err(PriceError::Unparsable(value.to_string()));
            }
            *value
        }
        PriceInput::Text(raw) => {
            let cleaned: String = raw
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
                .map(|c| if c == ',' { '.' } else { c })
                .collect();
            if cleaned.is_empty() {
                return Err(PriceError::Empty);
            }
            let parsed = cleaned
                .parse::<f64>()
                .map_err(|_| PriceError::Unparsable(cleaned.clone()))?;
            if parsed <= 0.0 {
                return Err(PriceError::NotPositive);
            }
            if raw.to_lowercase().contains(DOMESTIC_CURRENCY_MARKER) {
                parsed / usd_rate
            } else {
                parsed
            }
        }
    };

    let rounded = value.round();
    if rounded <= 0.0 {
        return Err(PriceError::NotPositive);
    }
    if rounded > f64::from(u32::MAX) {
        return Err(PriceError::Unparsable(value.to_string()));
    }
    Ok(rounded as u32)
}
