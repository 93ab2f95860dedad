//! `addd::engine::Engine`: the public engine API (`spec.md` §6.1), as an
//! instance-based analogue of the spec's process-wide singleton (see
//! `DESIGN.md` for why this crate prefers an instance over a literal
//! global).

use addd_core::edge::{Edge, WeightHandle};
use addd_core::manager::Manager;
use addd_core::node::Var;
use addd_gates::GateLibrary;
use addd_manager::{EvbddManager, ManagerConfig};
use addd_rules_evbdd::NormStrategy;

use crate::config::EngineConfig;
use crate::constructors::{self, ControlOption};
use crate::error::EngineResult;
use crate::measurement::{self, MeasurementRng};

/// A running instance of the engine: a manager plus the normalization
/// strategy fixed for its lifetime. `init`/`quit` in `spec.md` §6.1
/// correspond here to [`Engine::init`] and simply dropping the value.
pub struct Engine {
    manager: EvbddManager,
    strategy: NormStrategy,
}

impl Engine {
    /// `init(min_wgt, max_wgt, tolerance, weight_backend, norm_strategy)`.
    pub fn init(config: &EngineConfig) -> Self {
        let manager_config = ManagerConfig {
            workers: config.workers,
            node_table_min: config.node_table_min,
            node_table_max: config.node_table_max,
            weight_table_min: config.weight_table_min,
            weight_table_max: config.weight_table_max,
            cache_min: config.cache_min,
            cache_max: config.cache_max,
            tolerance: config.tolerance,
            weight_backend: config.weight_backend(),
        };
        Engine {
            manager: EvbddManager::new(manager_config),
            strategy: config.norm_strategy(),
        }
    }

    /// `quit()`: tears the tables down by dropping them.
    pub fn quit(self) {}

    pub fn basis_state(&self, n: Var, bits: &[bool]) -> EngineResult<Edge> {
        constructors::basis_state(&self.manager, n, bits)
    }

    pub fn identity_matrix(&self, n: Var) -> EngineResult<Edge> {
        constructors::identity_matrix(&self.manager, self.strategy, n)
    }

    pub fn single_qubit_gate(
        &self,
        gates: &dyn GateLibrary,
        n: Var,
        target: Var,
        gate: addd_gates::GateId,
    ) -> EngineResult<Edge> {
        constructors::single_qubit_gate(&self.manager, self.strategy, gates, n, target, gate)
    }

    pub fn single_qubit_gate_stack(
        &self,
        gates: &dyn GateLibrary,
        n: Var,
        gate_ids: &[addd_gates::GateId],
    ) -> EngineResult<Edge> {
        constructors::single_qubit_gate_stack(&self.manager, self.strategy, gates, n, gate_ids)
    }

    pub fn controlled_gate(
        &self,
        gates: &dyn GateLibrary,
        n: Var,
        ctrl: Var,
        target: Var,
        gate: addd_gates::GateId,
    ) -> EngineResult<Edge> {
        constructors::controlled_gate(&self.manager, self.strategy, gates, n, ctrl, target, gate)
    }

    pub fn multi_controlled_gate(
        &self,
        gates: &dyn GateLibrary,
        n: Var,
        options: &[ControlOption],
        gate: addd_gates::GateId,
    ) -> EngineResult<Edge> {
        constructors::multi_controlled_gate(&self.manager, self.strategy, gates, n, options, gate)
    }

    pub fn all_control_phase(&self, n: Var, bits: &[bool]) -> EngineResult<Edge> {
        constructors::all_control_phase(&self.manager, self.strategy, n, bits)
    }

    pub fn plus(&self, a: Edge, b: Edge) -> EngineResult<Edge> {
        Ok(addd_rules_evbdd::plus(&self.manager, self.strategy, a, b)?)
    }

    pub fn matvec(&self, mat: Edge, vec: Edge, n: Var) -> EngineResult<Edge> {
        Ok(addd_rules_evbdd::matvec(&self.manager, self.strategy, mat, vec, 0, n)?)
    }

    pub fn matmat(&self, a: Edge, b: Edge, n: Var) -> EngineResult<Edge> {
        Ok(addd_rules_evbdd::matmat(&self.manager, self.strategy, a, b, 0, n)?)
    }

    pub fn inner_product(&self, a: Edge, b: Edge, n: Var) -> EngineResult<WeightHandle> {
        Ok(addd_rules_evbdd::inner_product(&self.manager, a, b, 0, n)?)
    }

    pub fn tensor(&self, a: Edge, b: Edge, n_a: Var) -> EngineResult<Edge> {
        Ok(addd_rules_evbdd::tensor(&self.manager, self.strategy, a, b, n_a)?)
    }

    pub fn measure_qubit(
        &self,
        state: Edge,
        q: Var,
        n: Var,
        rng: &mut dyn MeasurementRng,
    ) -> EngineResult<(Edge, bool, f64)> {
        measurement::measure_qubit(&self.manager, self.strategy, state, q, n, rng)
    }

    pub fn measure_all(
        &self,
        state: Edge,
        n: Var,
        rng: &mut dyn MeasurementRng,
    ) -> EngineResult<(Edge, Vec<bool>, f64)> {
        measurement::measure_all(&self.manager, state, n, rng)
    }

    pub fn get_amplitude(&self, edge: Edge, bits: &[bool], n: Var) -> EngineResult<WeightHandle> {
        measurement::get_amplitude(&self.manager, edge, bits, n)
    }

    pub fn weight_value(&self, handle: WeightHandle) -> (f64, f64) {
        self.manager.weight_value(handle)
    }

    pub fn protect(&self, edge: Edge) {
        self.manager.protect(edge);
    }

    pub fn unprotect(&self, edge: Edge) {
        self.manager.unprotect(edge);
    }

    pub fn set_auto_gc(&self, enabled: bool) {
        self.manager.set_auto_gc(enabled);
    }

    pub fn set_gc_threshold(&self, fraction: f64) {
        self.manager.set_gc_threshold(fraction);
    }

    /// Force a GC cycle regardless of `set_auto_gc`/`set_gc_threshold`,
    /// used by the GC-transparency property tests.
    pub fn force_gc(&self) -> bool {
        self.manager.force_gc()
    }

    pub fn manager(&self) -> &EvbddManager {
        &self.manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use addd_gates::{StandardGateLibrary, H};

    #[test]
    fn bell_state_amplitudes_match() {
        let engine = Engine::init(&EngineConfig::default());
        let gates = StandardGateLibrary::new();

        let state = engine.basis_state(2, &[false, false]).unwrap();
        let h0 = engine.single_qubit_gate(&gates, 2, 0, H).unwrap();
        let after_h = engine.matvec(h0, state, 2).unwrap();
        let cnot = engine
            .controlled_gate(&gates, 2, 0, 1, addd_gates::X)
            .unwrap();
        let bell = engine.matvec(cnot, after_h, 2).unwrap();

        let norm = engine.inner_product(bell, bell, 2).unwrap();
        let (re, im) = engine.weight_value(norm);
        assert!((re - 1.0).abs() < 1e-9);
        assert!(im.abs() < 1e-9);

        let amp00 = engine.get_amplitude(bell, &[false, false], 2).unwrap();
        let amp11 = engine.get_amplitude(bell, &[true, true], 2).unwrap();
        let (re00, _) = engine.weight_value(amp00);
        let (re11, _) = engine.weight_value(amp11);
        assert!((re00.abs() - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-9);
        assert!((re11.abs() - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-9);
    }
}
