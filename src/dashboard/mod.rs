//! Ten-day stargazing dashboard (OpenWeatherMap forecast + ephemeris).

use bevy::prelude::*;

pub mod builder;
pub mod cache;
pub mod fetcher;
pub mod systems;
pub mod types;

use crate::ephemeris::LowPrecisionEphemeris;

pub struct DashboardPlugin;

impl Plugin for DashboardPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<types::DashboardState>()
            .init_resource::<types::ForecastCards>()
            .init_resource::<LowPrecisionEphemeris>()
            .add_systems(
                Startup,
                (systems::setup_weather_worker, systems::spawn_dashboard),
            )
            .add_systems(
                Update,
                (
                    systems::tick_clock,
                    systems::request_weather,
                    systems::apply_weather_results,
                    systems::rebuild_forecast,
                    systems::render_cards,
                    systems::handle_card_clicks,
                    systems::update_header,
                )
                    .chain(),
            );
    }
}
