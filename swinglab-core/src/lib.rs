//! SwingLab Core — engine, domain types, strategy components, data layer.
//!
//! This crate contains the heart of the backtesting system:
//! - Domain types (bars, candidates, positions, trades, portfolio)
//! - Day-by-day engine loop with four phases per day
//! - Portfolio bookkeeping with capacity/cash enforcement and partial exits
//! - Scanner / ExitPolicy / PositionSizer traits plus builtin implementations
//! - Explicit strategy registry (select components by name)
//! - Metrics module (pure functions over trades + equity curve)
//! - Data layer: BarStore trait, Yahoo/CSV/synthetic stores, Parquet cache

pub mod components;
pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod metrics;
