use serde::{Deserialize, Serialize};

/// Vehicle models tracked by the plant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CarModel {
    #[serde(rename = "EQE")]
    Eqe,
    #[serde(rename = "SA2")]
    Sa2,
    #[serde(rename = "HA2")]
    Ha2,
}

impl CarModel {
    pub const ALL: [CarModel; 3] = [CarModel::Eqe, CarModel::Sa2, CarModel::Ha2];

    pub fn as_str(&self) -> &'static str {
        match self {
            CarModel::Eqe => "EQE",
            CarModel::Sa2 => "SA2",
            CarModel::Ha2 => "HA2",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "EQE" => Some(CarModel::Eqe),
            "SA2" => Some(CarModel::Sa2),
            "HA2" => Some(CarModel::Ha2),
            _ => None,
        }
    }
}

/// Inspection work areas - a closed set of five stations on the line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Area {
    #[serde(rename = "Linha OK")]
    LinhaOk,
    #[serde(rename = "Linha de Teste")]
    LinhaDeTeste,
    #[serde(rename = "Teste de Estrada")]
    TesteDeEstrada,
    #[serde(rename = "Teste de Chuva")]
    TesteDeChuva,
    #[serde(rename = "Inspeção OffLine")]
    InspecaoOffLine,
}

impl Area {
    pub const ALL: [Area; 5] = [
        Area::LinhaOk,
        Area::LinhaDeTeste,
        Area::TesteDeEstrada,
        Area::TesteDeChuva,
        Area::InspecaoOffLine,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Area::LinhaOk => "Linha OK",
            Area::LinhaDeTeste => "Linha de Teste",
            Area::TesteDeEstrada => "Teste de Estrada",
            Area::TesteDeChuva => "Teste de Chuva",
            Area::InspecaoOffLine => "Inspeção OffLine",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Area::ALL.iter().copied().find(|a| a.as_str() == s)
    }

    /// First word of the area name, uppercased - used as the area tag in
    /// defect ranking labels (e.g. "Linha OK" -> "LINHA")
    pub fn tag(&self) -> String {
        self.as_str()
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_uppercase()
    }

    /// Acting-section options for the two areas that have them.
    /// Returns None for areas without sub-area detail.
    pub fn acting_sections(&self) -> Option<&'static [&'static str]> {
        match self {
            Area::InspecaoOffLine => Some(&OFFLINE_SECTIONS),
            Area::TesteDeEstrada => Some(&ROAD_TEST_SECTIONS),
            _ => None,
        }
    }

    /// VIN and operator id are mandatory only at the offline inspection post
    pub fn requires_vin(&self) -> bool {
        matches!(self, Area::InspecaoOffLine)
    }
}

/// Acting sections for "Inspeção OffLine"
pub const OFFLINE_SECTIONS: [&str; 6] = [
    "Resinspeção Linha Ok",
    "reinspeção Linha de Teste/Chassis",
    "reinspeção teste de estrada",
    "reinspeção teste de chuva",
    "reinspeção recebimento",
    "reinspeção CL4/Global",
];

/// Acting sections for "Teste de Estrada"
pub const ROAD_TEST_SECTIONS: [&str; 2] = ["Teste de Estrada", "Chassis"];

/// An approved ("OK") inspection event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassRecord {
    pub id: String,
    pub timestamp_ms: i64,
    pub model: CarModel,
    pub area: Area,
    pub vin: String,
    pub quantity: u32,
    pub operator_id: String,
    pub time_slot: String,
    #[serde(default)]
    pub acting_section: Option<String>,
    #[serde(default)]
    pub released: Option<String>,
    #[serde(default)]
    pub is_reinspection: bool,
}

/// A rejected ("NOT OK") inspection event with its defect description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefectRecord {
    pub id: String,
    pub timestamp_ms: i64,
    pub model: CarModel,
    pub area: Area,
    pub vin: String,
    pub defect: String,
    pub quantity: u32,
    pub operator_id: String,
    pub time_slot: String,
    #[serde(default)]
    pub acting_section: Option<String>,
    #[serde(default)]
    pub released: Option<String>,
    #[serde(default)]
    pub is_reinspection: bool,
}

/// A line-downtime event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DowntimeRecord {
    pub id: String,
    pub timestamp_ms: i64,
    pub area: Area,
    pub start_time: String,
    pub end_time: String,
    pub duration_minutes: u32,
    pub reason: String,
    #[serde(default)]
    pub operator_id: Option<String>,
}

/// Parse a time string in "HH:MM" format and return (hour, minute)
pub fn parse_time(time_str: &str) -> Result<(u32, u32), String> {
    let parts: Vec<&str> = time_str.split(':').collect();
    if parts.len() != 2 {
        return Err(format!("Invalid time format '{}', expected HH:MM", time_str));
    }
    let hour: u32 = parts[0]
        .parse()
        .map_err(|_| format!("Invalid hour in '{}'", time_str))?;
    let minute: u32 = parts[1]
        .parse()
        .map_err(|_| format!("Invalid minute in '{}'", time_str))?;
    if hour >= 24 || minute >= 60 {
        return Err(format!("Time '{}' out of range", time_str));
    }
    Ok((hour, minute))
}

/// Convert time to minutes since midnight
pub fn time_to_minutes(hour: u32, minute: u32) -> u32 {
    hour * 60 + minute
}

/// Minutes between two times of day, wrapping across midnight.
/// "23:30" to "00:15" yields 45.
pub fn wraparound_minutes(start: &str, end: &str) -> Result<u32, String> {
    let (start_h, start_m) = parse_time(start)?;
    let (end_h, end_m) = parse_time(end)?;
    let mut diff =
        time_to_minutes(end_h, end_m) as i32 - time_to_minutes(start_h, start_m) as i32;
    if diff < 0 {
        diff += 24 * 60;
    }
    Ok(diff as u32)
}

/// Separator used in combined time-slot strings ("08:00 as 09:00")
pub const SLOT_SEPARATOR: &str = " as ";

/// The start-time portion of a combined slot string, used as the sort key
/// for the time-slot series. Slots without the separator sort by the whole
/// string.
pub fn slot_start(slot: &str) -> &str {
    match slot.split_once(SLOT_SEPARATOR) {
        Some((start, _)) if !start.is_empty() => start,
        _ => slot,
    }
}
