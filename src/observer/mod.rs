//! Observer location and local date-time, plus the controls that edit them.

use bevy::prelude::*;
use chrono::{
    DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Timelike, Utc,
};

pub mod geolocation;
pub mod input;

use crate::config::AppSettings;
use crate::ephemeris::Observer;

/// Where and when the sky is observed. Any change triggers a scene sync.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ObserverState {
    pub latitude: f64,
    pub longitude: f64,
    /// Wall-clock time in the system time zone, minute resolution.
    pub local: NaiveDateTime,
}

impl ObserverState {
    pub fn new(latitude: f64, longitude: f64, local: NaiveDateTime) -> Self {
        Self {
            latitude,
            longitude,
            local: truncate_to_minute(local),
        }
    }

    pub fn from_settings(settings: &AppSettings) -> Self {
        Self::new(
            settings.default_latitude,
            settings.default_longitude,
            Local::now().naive_local(),
        )
    }

    pub fn observer(&self) -> Observer {
        Observer::new(self.latitude, self.longitude)
    }

    /// The local wall-clock time as a UTC instant.
    pub fn utc(&self) -> DateTime<Utc> {
        local_to_utc(self.local)
    }

    pub fn set_now(&mut self) {
        self.local = truncate_to_minute(Local::now().naive_local());
    }
}

/// Interpret a naive wall-clock time in the system zone. Times inside a DST gap
/// are pushed forward an hour, like a calendar would.
pub fn local_to_utc(local: NaiveDateTime) -> DateTime<Utc> {
    Local
        .from_local_datetime(&local)
        .earliest()
        .or_else(|| {
            Local
                .from_local_datetime(&(local + TimeDelta::hours(1)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&local))
}

fn truncate_to_minute(local: NaiveDateTime) -> NaiveDateTime {
    local
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(local)
}

/// Build a date-time from possibly out-of-range fields, rolling over like a
/// calendar: month 13 is January of the next year, day 0 is the last day of
/// the previous month, minute 60 is the next hour, negatives roll back.
pub fn normalize_date_time(
    year: i64,
    month: i64,
    day: i64,
    hour: i64,
    minute: i64,
) -> Option<NaiveDateTime> {
    let total_months = year.checked_mul(12)?.checked_add(month.checked_sub(1)?)?;
    let year = i32::try_from(total_months.div_euclid(12)).ok()?;
    let month = u32::try_from(total_months.rem_euclid(12) + 1).ok()?;

    NaiveDate::from_ymd_opt(year, month, 1)?
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(TimeDelta::try_days(day.checked_sub(1)?)?)?
        .checked_add_signed(TimeDelta::try_hours(hour)?)?
        .checked_add_signed(TimeDelta::try_minutes(minute)?)
}

/// Editable components of the observer's date-time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeField {
    Day,
    Month,
    Year,
    Hour,
    Minute,
}

impl DateTimeField {
    pub const ORDER: [DateTimeField; 5] = [
        DateTimeField::Day,
        DateTimeField::Month,
        DateTimeField::Year,
        DateTimeField::Hour,
        DateTimeField::Minute,
    ];

    pub fn get(self, local: NaiveDateTime) -> i64 {
        match self {
            DateTimeField::Day => local.day() as i64,
            DateTimeField::Month => local.month() as i64,
            DateTimeField::Year => local.year() as i64,
            DateTimeField::Hour => local.hour() as i64,
            DateTimeField::Minute => local.minute() as i64,
        }
    }

    /// Replace this field and renormalize the whole date-time.
    pub fn set(self, local: NaiveDateTime, value: i64) -> Option<NaiveDateTime> {
        let mut parts = DateTimeField::ORDER.map(|field| field.get(local));
        let index = DateTimeField::ORDER.iter().position(|f| *f == self)?;
        parts[index] = value;
        let [day, month, year, hour, minute] = parts;
        normalize_date_time(year, month, day, hour, minute)
    }

    pub fn width(self) -> usize {
        match self {
            DateTimeField::Year => 4,
            _ => 2,
        }
    }

    pub fn next(self) -> DateTimeField {
        let index = DateTimeField::ORDER
            .iter()
            .position(|f| *f == self)
            .unwrap_or(0);
        DateTimeField::ORDER[(index + 1) % DateTimeField::ORDER.len()]
    }
}

pub struct ObserverPlugin;

impl Plugin for ObserverPlugin {
    fn build(&self, app: &mut App) {
        let settings = app
            .world()
            .get_resource::<AppSettings>()
            .cloned()
            .unwrap_or_default();

        app.insert_resource(ObserverState::from_settings(&settings))
            .init_resource::<input::FieldEditor>()
            .add_systems(
                Startup,
                (input::spawn_input_bar, geolocation::setup_geolocation_worker),
            )
            .add_systems(
                Update,
                (
                    input::focus_clicked_field,
                    input::edit_focused_field,
                    input::handle_control_buttons,
                    geolocation::apply_geolocation_results,
                    input::refresh_field_texts,
                )
                    .chain(),
            );
    }
}
