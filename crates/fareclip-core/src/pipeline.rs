use crate::catalog::AirlineCatalog;
use crate::patterns::{
    canonical_manufacturer, canonical_model, manufacturer_for_model, CompiledPatterns,
};
use crate::registry::{City, CityRegistry};
use crate::resolver::AirportResolver;
use serde::Serialize;

pub const UNKNOWN_CITY: &str = "??";
pub const UNKNOWN_DATE: &str = "??/??";
pub const UNKNOWN_TIME: &str = "??:??";
/// "Đang cập nhật" — aircraft-type placeholder when the type is missing or
/// failed validation.
pub const AIRCRAFT_PENDING: &str = "Đang cập nhật";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
    Unknown,
}

impl DayOfWeek {
    /// Parses the Vietnamese forms the day/date matcher produces:
    /// "thứ hai", "t.hai", "chủ nhật", "c.nhật", ...
    pub fn from_vietnamese(s: &str) -> Self {
        let s = s.trim().to_lowercase();
        if s == "chủ nhật" || s == "c.nhật" || s == "t.nhật" {
            return DayOfWeek::Sunday;
        }
        let rest = s
            .strip_prefix("thứ")
            .or_else(|| s.strip_prefix("t."))
            .unwrap_or(&s)
            .trim();
        match rest {
            "hai" => DayOfWeek::Monday,
            "ba" => DayOfWeek::Tuesday,
            "tư" => DayOfWeek::Wednesday,
            "năm" => DayOfWeek::Thursday,
            "sáu" => DayOfWeek::Friday,
            "bảy" => DayOfWeek::Saturday,
            _ => DayOfWeek::Unknown,
        }
    }

    /// Uppercase Vietnamese display form, "??" when unknown.
    pub fn display_vi(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "THỨ HAI",
            DayOfWeek::Tuesday => "THỨ BA",
            DayOfWeek::Wednesday => "THỨ TƯ",
            DayOfWeek::Thursday => "THỨ NĂM",
            DayOfWeek::Friday => "THỨ SÁU",
            DayOfWeek::Saturday => "THỨ BẢY",
            DayOfWeek::Sunday => "CHỦ NHẬT",
            DayOfWeek::Unknown => "??",
        }
    }
}

/// A route endpoint: either a city resolved against the registry or the raw
/// cleaned string when resolution failed or was left undecided.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Endpoint {
    City(City),
    Raw { name: String, code: Option<String> },
}

impl Endpoint {
    pub fn display(&self) -> String {
        match self {
            Endpoint::City(city) => city.display(),
            Endpoint::Raw { name, code: Some(code) } => format!("{} ({})", name, code),
            Endpoint::Raw { name, code: None } => name.clone(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Endpoint::City(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AircraftType {
    Named {
        manufacturer: String,
        model: Option<String>,
    },
    Pending,
}

impl AircraftType {
    pub fn display(&self) -> String {
        match self {
            AircraftType::Named { manufacturer, model: Some(model) } => {
                format!("{} {}", manufacturer, model).to_uppercase()
            }
            AircraftType::Named { manufacturer, model: None } => manufacturer.to_uppercase(),
            AircraftType::Pending => AIRCRAFT_PENDING.to_string(),
        }
    }
}

/// One directional flight segment. Every field a pass could not determine
/// holds its deterministic placeholder, so rendering never needs null checks
/// beyond "is this the placeholder".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightLeg {
    pub departure: Endpoint,
    pub arrival: Endpoint,
    pub day: DayOfWeek,
    pub date: String,
    pub time_start: String,
    pub time_end: String,
    pub flight_number: Option<String>,
    /// Catalog key; `None` means the airline is explicitly unknown, which is
    /// still rendered (as UNKNOWN) rather than dropped.
    pub airline: Option<String>,
    pub aircraft: AircraftType,
    pub duration_minutes: Option<u32>,
}

impl Default for FlightLeg {
    fn default() -> Self {
        Self {
            departure: Endpoint::Raw { name: UNKNOWN_CITY.to_string(), code: None },
            arrival: Endpoint::Raw { name: UNKNOWN_CITY.to_string(), code: None },
            day: DayOfWeek::Unknown,
            date: UNKNOWN_DATE.to_string(),
            time_start: UNKNOWN_TIME.to_string(),
            time_end: UNKNOWN_TIME.to_string(),
            flight_number: None,
            airline: None,
            aircraft: AircraftType::Pending,
            duration_minutes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    /// Ticket price in VND; 0 when no price token was found.
    pub price: u64,
    /// 1 leg for a one-way booking, 2 for a round trip.
    pub legs: Vec<FlightLeg>,
    pub is_round_trip: bool,
    /// Human-readable extraction gaps, in pass order, surfaced once in
    /// aggregate after extraction.
    pub warnings: Vec<String>,
}

/// Borrowed view of everything a pass needs. The pipeline never owns or
/// mutates the registry, catalog, or patterns.
pub struct PassContext<'a> {
    pub registry: &'a CityRegistry,
    pub catalog: &'a AirlineCatalog,
    pub patterns: &'a CompiledPatterns,
    pub resolver: &'a dyn AirportResolver,
}

/// Intermediate extraction state threaded through the passes.
#[derive(Debug, Default)]
struct Draft {
    raw: String,
    /// Control-stripped original, case preserved for display-ish matching.
    original: String,
    /// Lowercased, whitespace-collapsed working copy.
    normalized: String,
    price: u64,
    /// Airline names mentioned anywhere in the text; fallback source for
    /// flight codes whose prefix resolves to nothing.
    airline_candidates: Vec<String>,
    routes: Vec<(String, String)>,
    endpoints: Vec<(Endpoint, Endpoint)>,
    days: Vec<DayOfWeek>,
    dates: Vec<String>,
    times: Vec<(String, String)>,
    flights: Vec<FlightCode>,
    aircraft: [Option<AircraftType>; 2],
    durations: Vec<u32>,
    is_round_trip: bool,
    warnings: Vec<String>,
}

#[derive(Debug, Clone)]
struct FlightCode {
    code: String,
    airline: Option<String>,
    /// Byte offset of the match in the normalized text; used by the
    /// aircraft-assignment heuristic.
    pos: usize,
}

type PassFn = fn(&PassContext, &mut Draft);

/// The pipeline is an explicit ordered list of independent passes. Each pass
/// tolerates failure: it appends a warning and leaves placeholders instead
/// of erroring, so partial results always survive.
const PASSES: &[(&str, PassFn)] = &[
    ("normalize", pass_normalize),
    ("price", pass_price),
    ("airlines", pass_airlines),
    ("routes", pass_routes),
    ("cities", pass_cities),
    ("schedule", pass_schedule),
    ("flights", pass_flights),
    ("aircraft", pass_aircraft),
    ("duration", pass_duration),
];

pub fn run(ctx: &PassContext, raw_text: &str) -> ExtractionResult {
    let mut draft = Draft { raw: raw_text.to_string(), ..Draft::default() };
    for (name, pass) in PASSES {
        log::trace!("[Pipeline] pass {}", name);
        pass(ctx, &mut draft);
    }
    assemble(draft)
}

fn pass_normalize(_ctx: &PassContext, draft: &mut Draft) {
    draft.original = draft
        .raw
        .chars()
        .filter(|&c| c >= ' ' || c == '\n' || c == '\t')
        .collect();
    draft.normalized = draft
        .original
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
}

fn pass_price(ctx: &PassContext, draft: &mut Draft) {
    let max = ctx
        .patterns
        .price
        .find_iter(&draft.original)
        .filter_map(|m| m.as_str().replace(['.', ','], "").parse::<u64>().ok())
        .max();
    match max {
        Some(price) => draft.price = price,
        None => draft.warnings.push("No ticket price found in the text.".to_string()),
    }
}

fn pass_airlines(ctx: &PassContext, draft: &mut Draft) {
    for airline in ctx.catalog.airlines() {
        let name = airline.name.to_lowercase();
        let code = airline.iata_code.to_lowercase();
        if draft.normalized.contains(&name) || draft.normalized.contains(&code) {
            draft.airline_candidates.push(airline.name.clone());
        }
    }
    if draft.airline_candidates.is_empty() {
        draft
            .warnings
            .push("No airline could be identified from the text.".to_string());
    }
}

fn pass_routes(ctx: &PassContext, draft: &mut Draft) {
    for caps in ctx.patterns.route.captures_iter(&draft.normalized) {
        let pair = (caps[1].trim().to_string(), caps[2].trim().to_string());
        if !draft.routes.contains(&pair) {
            draft.routes.push(pair);
        }
    }

    if draft.routes.is_empty() {
        // Loose fallback: free-form word pairs or bare XXX-YYY codes mapped
        // back through the registry.
        for caps in ctx.patterns.route_fallback.captures_iter(&draft.normalized) {
            let pair = match (caps.get(1), caps.get(2), caps.get(3), caps.get(4)) {
                (Some(dep), Some(arr), _, _) => {
                    (dep.as_str().trim().to_string(), arr.as_str().trim().to_string())
                }
                (_, _, Some(c1), Some(c2)) => {
                    let dep = ctx
                        .registry
                        .find_by_code(c1.as_str())
                        .map(|c| c.normalized_key.clone())
                        .unwrap_or_else(|| c1.as_str().to_string());
                    let arr = ctx
                        .registry
                        .find_by_code(c2.as_str())
                        .map(|c| c.normalized_key.clone())
                        .unwrap_or_else(|| c2.as_str().to_string());
                    (dep, arr)
                }
                _ => continue,
            };
            if !pair.0.is_empty() && !pair.1.is_empty() && !draft.routes.contains(&pair) {
                draft.routes.push(pair);
            }
        }
    }

    draft.routes.truncate(2);
    draft.is_round_trip = draft.routes.len() >= 2;
    if draft.routes.is_empty() {
        draft.warnings.push("No route found in the text.".to_string());
    }
}

fn pass_cities(ctx: &PassContext, draft: &mut Draft) {
    let routes = std::mem::take(&mut draft.routes);
    for (dep, arr) in &routes {
        let departure = resolve_endpoint(ctx, dep, &mut draft.warnings);
        let arrival = resolve_endpoint(ctx, arr, &mut draft.warnings);
        draft.endpoints.push((departure, arrival));
    }
    draft.routes = routes;
}

/// Cleans one matched city string (embedded code and terminal annotations
/// stripped) and resolves it against the registry, escalating to the
/// resolver when several airports share the name.
fn resolve_endpoint(ctx: &PassContext, raw: &str, warnings: &mut Vec<String>) -> Endpoint {
    let code = ctx
        .patterns
        .city_code
        .captures(raw)
        .map(|caps| caps[1].to_uppercase());

    let cleaned = ctx.patterns.city_annotation.replace_all(raw, "");
    let cleaned = ctx.patterns.tp_prefix.replace(cleaned.trim(), "");
    let cleaned = cleaned.trim().to_string();

    if ctx.registry.contains_key(&cleaned.to_lowercase()) {
        let mut matches = ctx.registry.find_by_key(&cleaned);
        if let Some(code) = &code {
            matches.retain(|c| c.code == *code);
        }
        if matches.len() > 1 {
            let candidates: Vec<City> = matches.iter().map(|&c| c.clone()).collect();
            return match ctx.resolver.resolve(&candidates) {
                Some(city) => Endpoint::City(city.clone()),
                None => {
                    warnings.push(format!(
                        "City '{}' is ambiguous ({} airports) and was left unresolved.",
                        cleaned,
                        candidates.len()
                    ));
                    Endpoint::Raw { name: cleaned, code }
                }
            };
        }
        if let Some(city) = matches.first() {
            return Endpoint::City((*city).clone());
        }
    }

    warnings.push(format!("City '{}' is not in the registry.", cleaned));
    Endpoint::Raw { name: cleaned, code }
}

fn pass_schedule(ctx: &PassContext, draft: &mut Draft) {
    for caps in ctx.patterns.day_date.captures_iter(&draft.normalized) {
        draft.days.push(DayOfWeek::from_vietnamese(&caps[1]));
        draft.dates.push(caps[2].to_string());
    }
    if draft.days.is_empty() {
        // No day+date pairs: fall back to standalone dates with unknown days
        // so downstream fields always have a slot to render.
        for m in ctx.patterns.standalone_date.find_iter(&draft.original) {
            draft.dates.push(m.as_str().to_string());
        }
        let slots = if draft.is_round_trip { 2 } else { 1 };
        draft.days = vec![DayOfWeek::Unknown; slots];
    }

    for caps in ctx.patterns.time_range.captures_iter(&draft.original) {
        draft.times.push((caps[1].to_string(), caps[2].to_string()));
    }
    if draft.times.is_empty() {
        draft
            .warnings
            .push("No flight time found for leg 1.".to_string());
    } else if draft.is_round_trip && draft.times.len() < 2 {
        draft
            .warnings
            .push("No flight time found for leg 2.".to_string());
    }
}

fn pass_flights(ctx: &PassContext, draft: &mut Draft) {
    // Annotated "VJ1175 : Vietjet Air" entries take priority: the agent has
    // labelled the carrier explicitly.
    for caps in ctx.patterns.flight_annotated.captures_iter(&draft.normalized) {
        let airline = ctx.catalog.normalize_name(caps[3].trim());
        if let Some(info) = airline {
            let code = format!("{}{}", caps[1].to_uppercase(), &caps[2]);
            if draft.flights.iter().any(|f| f.code == code) {
                continue;
            }
            if !draft.airline_candidates.contains(&info.name) {
                draft.airline_candidates.insert(0, info.name.clone());
            }
            draft.flights.push(FlightCode {
                code,
                airline: Some(info.name.clone()),
                pos: caps.get(0).map(|m| m.start()).unwrap_or(0),
            });
        }
    }

    if draft.flights.is_empty() {
        for caps in ctx.patterns.flight_bare.captures_iter(&draft.normalized) {
            let code = format!("{}{}", caps[1].to_uppercase(), &caps[2]);
            if draft.flights.iter().any(|f| f.code == code) {
                continue;
            }
            let airline = ctx
                .catalog
                .normalize_name(&caps[1])
                .or_else(|| ctx.catalog.by_code_prefix(&code))
                .map(|info| info.name.clone())
                .or_else(|| draft.airline_candidates.first().cloned());
            if airline.is_none() {
                draft
                    .warnings
                    .push(format!("Could not identify the airline for code {}.", code));
            }
            let pos = caps.get(0).map(|m| m.start()).unwrap_or(0);
            draft.flights.push(FlightCode { code, airline, pos });
        }
    }

    draft.flights.truncate(2);
    if draft.flights.is_empty() {
        draft
            .warnings
            .push("No flight code found in the text.".to_string());
    } else if draft.flights.len() >= 2 {
        // Two distinct codes imply an outbound and a return even when only
        // one route line survived the route pass.
        draft.is_round_trip = true;
    }
}

fn pass_aircraft(ctx: &PassContext, draft: &mut Draft) {
    // (position, manufacturer mention, optional model token)
    let mut mentions: Vec<(usize, String, Option<String>)> = ctx
        .patterns
        .aircraft
        .captures_iter(&draft.normalized)
        .map(|caps| {
            (
                caps.get(1).map(|m| m.start()).unwrap_or(0),
                caps[1].to_string(),
                caps.get(2).map(|m| m.as_str().to_string()),
            )
        })
        .collect();

    if mentions.is_empty() {
        // Bare model fallback: "A320" with no manufacturer word still names
        // the aircraft unambiguously through the model table.
        mentions = ctx
            .patterns
            .aircraft_bare_model
            .find_iter(&draft.normalized)
            .filter_map(|m| {
                manufacturer_for_model(m.as_str()).map(|(manufacturer, model)| {
                    (m.start(), manufacturer.to_string(), Some(model.to_string()))
                })
            })
            .collect();
    }

    if !draft.is_round_trip {
        match mentions.first() {
            Some((_, manufacturer, model)) => {
                let aircraft = validate_aircraft(manufacturer, model.as_deref(), 1, &mut draft.warnings);
                draft.aircraft[0] = Some(aircraft);
            }
            None => {
                draft
                    .warnings
                    .push("No aircraft type found for leg 1.".to_string());
            }
        }
        return;
    }

    match mentions.len() {
        0 => {
            draft.warnings.push("No aircraft type found for leg 1.".to_string());
            draft.warnings.push("No aircraft type found for leg 2.".to_string());
        }
        1 => {
            // A single mention describes the leg it sits textually closest
            // to: after the second flight code it belongs to the return leg,
            // otherwise (or when positions are unavailable) to leg 1.
            let (pos, manufacturer, model) = &mentions[0];
            let leg_idx = match draft.flights.get(1) {
                Some(second) if *pos >= second.pos => 1,
                _ => 0,
            };
            let aircraft = validate_aircraft(
                manufacturer,
                model.as_deref(),
                leg_idx + 1,
                &mut draft.warnings,
            );
            draft.aircraft[leg_idx] = Some(aircraft);
            let other = 1 - leg_idx;
            draft
                .warnings
                .push(format!("No aircraft type found for leg {}.", other + 1));
        }
        _ => {
            for (i, (_, manufacturer, model)) in mentions.iter().take(2).enumerate() {
                let aircraft =
                    validate_aircraft(manufacturer, model.as_deref(), i + 1, &mut draft.warnings);
                draft.aircraft[i] = Some(aircraft);
            }
        }
    }
}

/// Validates a manufacturer/model pair against the model table. Invalid
/// combinations degrade: bad model keeps the manufacturer, bad manufacturer
/// falls back to the pending placeholder. Both record a warning.
fn validate_aircraft(
    manufacturer_raw: &str,
    model_raw: Option<&str>,
    leg: usize,
    warnings: &mut Vec<String>,
) -> AircraftType {
    let Some(manufacturer) = canonical_manufacturer(manufacturer_raw) else {
        warnings.push(format!(
            "Manufacturer '{}' for leg {} is not recognized.",
            manufacturer_raw, leg
        ));
        return AircraftType::Pending;
    };

    match model_raw {
        Some(model) => match canonical_model(manufacturer, model) {
            Some(canonical) => AircraftType::Named {
                manufacturer: manufacturer.to_string(),
                model: Some(canonical.to_string()),
            },
            None => {
                warnings.push(format!(
                    "Model '{}' is not a valid {} model for leg {}.",
                    model, manufacturer, leg
                ));
                AircraftType::Named { manufacturer: manufacturer.to_string(), model: None }
            }
        },
        None => AircraftType::Named { manufacturer: manufacturer.to_string(), model: None },
    }
}

fn pass_duration(ctx: &PassContext, draft: &mut Draft) {
    for caps in ctx.patterns.duration.captures_iter(&draft.normalized) {
        let hours: u32 = caps[1].parse().unwrap_or(0);
        let minutes: u32 = caps
            .get(2)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        draft.durations.push(hours * 60 + minutes);
    }
}

fn assemble(draft: Draft) -> ExtractionResult {
    let leg_count = if draft.is_round_trip { 2 } else { 1 };
    let mut legs = Vec::with_capacity(leg_count);

    for i in 0..leg_count {
        let mut leg = FlightLeg::default();
        if let Some((dep, arr)) = draft.endpoints.get(i) {
            leg.departure = dep.clone();
            leg.arrival = arr.clone();
        }
        if let Some(day) = draft.days.get(i) {
            leg.day = *day;
        }
        if let Some(date) = draft.dates.get(i) {
            leg.date = date.to_uppercase();
        }
        if let Some((start, end)) = draft.times.get(i) {
            leg.time_start = start.clone();
            leg.time_end = end.clone();
        }
        if let Some(flight) = draft.flights.get(i) {
            leg.flight_number = Some(flight.code.clone());
            leg.airline = flight.airline.clone();
        }
        if let Some(aircraft) = &draft.aircraft[i] {
            leg.aircraft = aircraft.clone();
        }
        leg.duration_minutes = draft.durations.get(i).copied();
        legs.push(leg);
    }

    ExtractionResult {
        price: draft.price,
        legs,
        is_round_trip: draft.is_round_trip,
        warnings: draft.warnings,
    }
}
