use chrono::{NaiveTime, Timelike};

pub const DAY_START_HOUR: u32 = 8;
pub const LAST_SLOT_HOUR: u32 = 18;
pub const LAST_SLOT_MINUTE: u32 = 45;
pub const SLOT_STEP_MINUTES: u32 = 15;
pub const GRID_SIZE: usize = 44;

/// Bookable time points of a working day: 08:00 through 18:45 every 15 minutes.
pub fn generate_grid() -> Vec<NaiveTime> {
    let mut grid = Vec::with_capacity(GRID_SIZE);
    for hour in DAY_START_HOUR..=LAST_SLOT_HOUR {
        for minute in (0..60).step_by(SLOT_STEP_MINUTES as usize) {
            if hour == LAST_SLOT_HOUR && minute > LAST_SLOT_MINUTE {
                break;
            }
            if let Some(time) = NaiveTime::from_hms_opt(hour, minute, 0) {
                grid.push(time);
            }
        }
    }
    grid
}

pub fn is_on_grid(time: NaiveTime) -> bool {
    let first = DAY_START_HOUR * 60;
    let last = LAST_SLOT_HOUR * 60 + LAST_SLOT_MINUTE;
    let minutes = time.hour() * 60 + time.minute();
    time.second() == 0
        && time.nanosecond() == 0
        && (first..=last).contains(&minutes)
        && minutes % SLOT_STEP_MINUTES == 0
}

/// Parses `HH:MM` or `HH:MM:SS`.
pub fn parse_slot_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

pub fn format_slot_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}
