//! Strategy registry — explicit map from component name to factory.
//!
//! Populated by an explicit [`StrategyRegistry::with_builtins`] call at
//! startup; there are no import-time side effects and no global mutable state.
//! "Select strategy by name" configuration flows through here: a config names
//! a scanner/exit/sizer, the registry builds the trait objects.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::exit::{
    CompositeExit, ExitPolicy, HardStop, MaBreakExit, ScaleOutExit, TargetExit, TimeLimitExit,
    TrailingStop,
};
use super::scanner::{BreakoutScanner, NullScanner, PullbackScanner, Scanner};
use super::sizer::{FixedDollarSizer, FixedFractionSizer, PositionSizer, RiskParitySizer};
use crate::data::BarStore;

/// Serializable component selection: a name plus numeric parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl ComponentSpec {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Named f64 parameter with a fallback.
    pub fn param(&self, name: &str, default: f64) -> f64 {
        self.params.get(name).copied().unwrap_or(default)
    }

    /// Named usize parameter with a fallback.
    pub fn param_usize(&self, name: &str, default: usize) -> usize {
        self.params
            .get(name)
            .copied()
            .map(|v| v as usize)
            .unwrap_or(default)
    }
}

/// Errors from component construction.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown scanner type: {0}")]
    UnknownScanner(String),
    #[error("unknown exit policy type: {0}")]
    UnknownExit(String),
    #[error("unknown sizer type: {0}")]
    UnknownSizer(String),
}

/// What scanner factories need beyond their params: the data source and the
/// symbol universe to scan.
#[derive(Clone)]
pub struct ScannerContext {
    pub store: Arc<dyn BarStore>,
    pub universe: Vec<String>,
}

type ScannerFactory = fn(&ComponentSpec, &ScannerContext) -> Box<dyn Scanner>;
type ExitFactory = fn(&ComponentSpec) -> Box<dyn ExitPolicy>;
type SizerFactory = fn(&ComponentSpec) -> Box<dyn PositionSizer>;

/// The registry itself. BTreeMaps keep listings deterministic.
#[derive(Default)]
pub struct StrategyRegistry {
    scanners: BTreeMap<String, ScannerFactory>,
    exits: BTreeMap<String, ExitFactory>,
    sizers: BTreeMap<String, SizerFactory>,
}

impl StrategyRegistry {
    /// An empty registry. Callers registering only custom components start here.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard registry: every builtin scanner, exit policy, and sizer.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtins();
        registry
    }

    /// Explicit registration of the builtin component set.
    pub fn register_builtins(&mut self) {
        self.register_scanner("null", |_, _| Box::new(NullScanner));
        self.register_scanner("breakout", |spec, ctx| {
            Box::new(
                BreakoutScanner::new(
                    ctx.store.clone(),
                    ctx.universe.clone(),
                    spec.param_usize("lookback", 55),
                )
                .with_stop_atr_mult(spec.param("stop_atr_mult", 2.0))
                .with_min_volume(spec.param("min_volume", 0.0) as u64),
            )
        });
        self.register_scanner("pullback", |spec, ctx| {
            Box::new(
                PullbackScanner::new(
                    ctx.store.clone(),
                    ctx.universe.clone(),
                    spec.param_usize("fast_period", 10),
                    spec.param_usize("slow_period", 50),
                )
                .with_proximity_pct(spec.param("proximity_pct", 1.5))
                .with_stop_pct(spec.param("stop_pct", 5.0)),
            )
        });

        self.register_exit("hard_stop", |spec| {
            Box::new(HardStop::new(spec.param("stop_pct", 5.0)))
        });
        self.register_exit("trailing_stop", |spec| {
            Box::new(TrailingStop::new(spec.param("trail_pct", 8.0)))
        });
        self.register_exit("ma_break", |spec| {
            Box::new(MaBreakExit::new(spec.param_usize("period", 20)))
        });
        self.register_exit("time_limit", |spec| {
            Box::new(TimeLimitExit::new(spec.param("max_days", 30.0) as i64))
        });
        self.register_exit("target", |spec| {
            Box::new(TargetExit::new(spec.param("target_pct", 10.0)))
        });
        self.register_exit("scale_out", |spec| {
            Box::new(ScaleOutExit::new(
                spec.param("target_pct", 8.0),
                spec.param("scale_fraction", 0.5),
                spec.param("trail_pct", 6.0),
            ))
        });
        // Priority order here is the composite's contract: protective stop
        // first, then the trailing stop, target, MA break, and time limit.
        self.register_exit("composite_default", |spec| {
            Box::new(CompositeExit::new(vec![
                Box::new(HardStop::new(spec.param("stop_pct", 5.0))),
                Box::new(TrailingStop::new(spec.param("trail_pct", 8.0))),
                Box::new(TargetExit::new(spec.param("target_pct", 15.0))),
                Box::new(MaBreakExit::new(spec.param_usize("ma_period", 20))),
                Box::new(TimeLimitExit::new(spec.param("max_days", 40.0) as i64)),
            ]))
        });

        self.register_sizer("fixed_fraction", |spec| {
            Box::new(FixedFractionSizer::new(spec.param("fraction", 0.1)))
        });
        self.register_sizer("fixed_dollar", |spec| {
            Box::new(FixedDollarSizer::new(spec.param("amount", 10_000.0)))
        });
        self.register_sizer("risk_parity", |spec| {
            Box::new(RiskParitySizer::new(spec.param("risk_fraction", 0.01)))
        });
    }

    pub fn register_scanner(&mut self, name: impl Into<String>, factory: ScannerFactory) {
        self.scanners.insert(name.into(), factory);
    }

    pub fn register_exit(&mut self, name: impl Into<String>, factory: ExitFactory) {
        self.exits.insert(name.into(), factory);
    }

    pub fn register_sizer(&mut self, name: impl Into<String>, factory: SizerFactory) {
        self.sizers.insert(name.into(), factory);
    }

    pub fn create_scanner(
        &self,
        spec: &ComponentSpec,
        ctx: &ScannerContext,
    ) -> Result<Box<dyn Scanner>, RegistryError> {
        self.scanners
            .get(&spec.kind)
            .map(|f| f(spec, ctx))
            .ok_or_else(|| RegistryError::UnknownScanner(spec.kind.clone()))
    }

    pub fn create_exit(&self, spec: &ComponentSpec) -> Result<Box<dyn ExitPolicy>, RegistryError> {
        self.exits
            .get(&spec.kind)
            .map(|f| f(spec))
            .ok_or_else(|| RegistryError::UnknownExit(spec.kind.clone()))
    }

    pub fn create_sizer(
        &self,
        spec: &ComponentSpec,
    ) -> Result<Box<dyn PositionSizer>, RegistryError> {
        self.sizers
            .get(&spec.kind)
            .map(|f| f(spec))
            .ok_or_else(|| RegistryError::UnknownSizer(spec.kind.clone()))
    }

    pub fn scanner_names(&self) -> Vec<&str> {
        self.scanners.keys().map(|s| s.as_str()).collect()
    }

    pub fn exit_names(&self) -> Vec<&str> {
        self.exits.keys().map(|s| s.as_str()).collect()
    }

    pub fn sizer_names(&self) -> Vec<&str> {
        self.sizers.keys().map(|s| s.as_str()).collect()
    }
}
