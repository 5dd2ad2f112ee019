//! Core math shared across the app: time scales and frame conversions.

pub mod coordinates;
