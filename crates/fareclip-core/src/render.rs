use crate::catalog::AirlineCatalog;
use crate::pipeline::{ExtractionResult, FlightLeg};
use serde::Serialize;

/// Flight-number field shown when the airline could not be determined.
pub const UNKNOWN_AIRLINE: &str = "UNKNOWN";

/// The field strings a caller pastes into its pricing form. Cached alongside
/// the structured result so a repeated paste reproduces them exactly,
/// including any resolver decisions baked in during the first extraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedFields {
    /// "1,500,000"
    pub price: String,
    pub legs: Vec<RenderedLeg>,
    /// Luggage/meal summary assembled from the airline catalog.
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedLeg {
    /// "HÀ NỘI (HAN) → TP HỒ CHÍ MINH (SGN)"
    pub route: String,
    /// "THỨ HAI | 12/05 | 08:00 - 10:10"
    pub schedule: String,
    /// "VIETJET AIR | VJ1175", "UNKNOWN | VJ1175", or "??"
    pub flight: String,
    /// "AIRBUS A320" or the pending placeholder
    pub aircraft: String,
}

pub fn render(result: &ExtractionResult, catalog: &AirlineCatalog) -> RenderedFields {
    RenderedFields {
        price: format_price(result.price),
        legs: result.legs.iter().map(render_leg).collect(),
        note: booking_note(&result.legs, catalog),
    }
}

fn render_leg(leg: &FlightLeg) -> RenderedLeg {
    let flight = match &leg.flight_number {
        Some(code) => {
            let airline = leg
                .airline
                .as_deref()
                .map(|a| a.to_uppercase())
                .unwrap_or_else(|| UNKNOWN_AIRLINE.to_string());
            format!("{} | {}", airline, code)
        }
        None => "??".to_string(),
    };

    RenderedLeg {
        route: format!(
            "{} → {}",
            leg.departure.display().to_uppercase(),
            leg.arrival.display().to_uppercase()
        ),
        schedule: format!(
            "{} | {} | {} - {}",
            leg.day.display_vi(),
            leg.date,
            leg.time_start,
            leg.time_end
        ),
        flight,
        aircraft: leg.aircraft.display(),
    }
}

/// Thousands-grouped price, "1,500,000". Zero (no price found) renders as
/// "0" so the field is still deterministic.
pub fn format_price(price: u64) -> String {
    let digits = price.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// The tax/meal line plus one luggage line per distinct airline, in leg
/// order.
fn booking_note(legs: &[FlightLeg], catalog: &AirlineCatalog) -> String {
    let airlines: Vec<&str> = {
        let mut seen = Vec::new();
        for leg in legs {
            if let Some(name) = leg.airline.as_deref() {
                if !seen.contains(&name) {
                    seen.push(name);
                }
            }
        }
        seen
    };

    let has_meal = airlines
        .iter()
        .filter_map(|name| catalog.get(name))
        .any(|info| info.meal_included);

    let mut note = if has_meal {
        "Tổng giá vé đã bao gồm toàn bộ thuế, phí, suất ăn.".to_string()
    } else {
        "Tổng giá vé đã bao gồm toàn bộ thuế, phí.".to_string()
    };

    for name in airlines {
        if let Some(info) = catalog.get(name) {
            note.push('\n');
            note.push_str(&format!(
                "● Với mỗi vé {}, được mang {}",
                info.name, info.luggage_text
            ));
        }
    }
    note
}
