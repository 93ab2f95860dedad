//! Measurement (C8, `spec.md` §4.7), grounded on `qmdd_measure_q0`/
//! `qmdd_measure_all`/`qmdd_unnormed_prob`/`qmdd_get_amplitude`/
//! `qmdd_amp_to_prob`/`qmdd_amp_from_prob`/`qmdd_remove_global_phase`.
//!
//! The original measures an arbitrary qubit `k` by swapping it to
//! position 0, measuring there, and swapping back — reusing a general
//! variable-swap circuit primitive this engine otherwise has no use
//! for. [`marginal_prob_at`] and [`project_qubit`] generalize the same
//! recursive cofactor/cache machinery `qmdd_unnormed_prob` is built on
//! directly to an arbitrary target level instead, so no swap primitive
//! is needed at all.

use addd_core::apply_cache::ApplyCache;
use addd_core::edge::{Edge, WeightHandle};
use addd_core::manager::Manager;
use addd_core::node::{Node, NodeHandle, Var};
use addd_core::{AdddError, AdddResult, HasApplyCache};
use addd_derive::Countable;
use addd_manager::apply_cache::DirectMappedApplyCache;
use addd_manager::scheduler;
use addd_manager::worker::RefGuard;
use addd_manager::EvbddManager;
use addd_rules_evbdd::{make_edge, NormStrategy};

use crate::constructors::basis_state;
use crate::error::{EngineError, EngineResult};

/// Operator tags for the measurement-specific slice of the shared apply
/// cache. Kept separate from `addd_rules_evbdd::EvbddOp` since neither
/// crate needs to know about the other's operators.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Countable)]
pub enum MeasureOp {
    UnnormedProb,
    MarginalProb,
}

impl HasApplyCache<MeasureOp> for EvbddManager {
    type Cache = DirectMappedApplyCache;

    fn apply_cache(&self) -> &Self::Cache {
        EvbddManager::apply_cache(self)
    }
}

/// Source of measurement coin flips. A driver injects whatever RNG it
/// likes (e.g. wrapping `rand::rngs::StdRng`); `DeterministicRng` below
/// is only for tests.
pub trait MeasurementRng {
    fn next_f64(&mut self) -> f64;
}

/// Always returns the same value. Useful for forcing a specific branch
/// in a deterministic test.
pub struct DeterministicRng(pub f64);

impl MeasurementRng for DeterministicRng {
    fn next_f64(&mut self) -> f64 {
        self.0
    }
}

fn raw_cofactor(manager: &EvbddManager, edge: Edge, v: Var) -> (Edge, Edge) {
    match manager.get_node(edge.target) {
        Node::Terminal => (
            Edge::new(NodeHandle::TERMINAL, WeightHandle::ONE),
            Edge::new(NodeHandle::TERMINAL, WeightHandle::ONE),
        ),
        Node::Inner(node) if node.var == v => (node.low(), node.high()),
        Node::Inner(_) => (
            Edge::new(edge.target, WeightHandle::ONE),
            Edge::new(edge.target, WeightHandle::ONE),
        ),
    }
}

fn scaled_cofactor(manager: &EvbddManager, edge: Edge, v: Var) -> AdddResult<(Edge, Edge)> {
    let (low, high) = raw_cofactor(manager, edge, v);
    let low = Edge::new(low.target, manager.weight_mul(edge.weight, low.weight)?);
    let high = Edge::new(high.target, manager.weight_mul(edge.weight, high.weight)?);
    Ok((low, high))
}

/// `qmdd_unnormed_prob`: the squared magnitude of the sub-vector rooted
/// at `edge`, treating it as a full amplitude edge (its own weight
/// folded in). Memoized in the operation cache keyed by `(target,
/// weight, level, n)`.
pub fn unnormed_prob(manager: &EvbddManager, edge: Edge, level: Var, n: Var) -> AdddResult<f64> {
    if edge.is_zero() {
        return Ok(0.0);
    }
    if level == n {
        return Ok(manager.weight_abs(edge.weight).powi(2));
    }

    let key = [edge.target.0, edge.weight.0 as u64, level as u64, n as u64];
    if let Some(cached) =
        ApplyCache::<MeasureOp>::get(manager.apply_cache(), MeasureOp::UnnormedProb, &key)
    {
        let (re, _) = manager.weight_value(cached.weight);
        return Ok(re);
    }

    let ge = RefGuard::push(edge);
    let (low, high) = raw_cofactor(manager, edge, level);
    let g1 = RefGuard::push(low);
    let g2 = RefGuard::push(high);
    let (prob_low, prob_high) = scheduler::join(
        || unnormed_prob(manager, g1.get(), level + 1, n),
        || unnormed_prob(manager, g2.get(), level + 1, n),
    );
    let prob_root = manager.weight_abs(ge.get().weight).powi(2);
    let prob_res = prob_root * (prob_low? + prob_high?);

    let handle = manager.intern_weight(prob_res, 0.0)?;
    ApplyCache::<MeasureOp>::insert(
        manager.apply_cache(),
        MeasureOp::UnnormedProb,
        &key,
        Edge::new(NodeHandle::TERMINAL, handle),
    );
    Ok(prob_res)
}

/// Marginal `(p0, p1)` of qubit `target` under `edge`, recursing down
/// through every level strictly above `target` (folding `edge`'s own
/// weight into both children at each of those levels, exactly like
/// `plus`'s `scaled_cofactor` step) before falling back to
/// [`unnormed_prob`] for everything below `target`.
pub fn marginal_prob_at(
    manager: &EvbddManager,
    edge: Edge,
    level: Var,
    target: Var,
    n: Var,
) -> AdddResult<(f64, f64)> {
    if level == target {
        let (low, high) = raw_cofactor(manager, edge, level);
        let prob_root = manager.weight_abs(edge.weight).powi(2);
        let p0 = prob_root * unnormed_prob(manager, low, level + 1, n)?;
        let p1 = prob_root * unnormed_prob(manager, high, level + 1, n)?;
        return Ok((p0, p1));
    }

    let key = [
        edge.target.0,
        edge.weight.0 as u64,
        level as u64,
        target as u64,
        n as u64,
    ];
    if let Some(cached) =
        ApplyCache::<MeasureOp>::get(manager.apply_cache(), MeasureOp::MarginalProb, &key)
    {
        return Ok(manager.weight_value(cached.weight));
    }

    let (low, high) = scaled_cofactor(manager, edge, level)?;
    let g1 = RefGuard::push(low);
    let g2 = RefGuard::push(high);
    let (below_low, below_high) = scheduler::join(
        || marginal_prob_at(manager, g1.get(), level + 1, target, n),
        || marginal_prob_at(manager, g2.get(), level + 1, target, n),
    );
    let (p0_low, p1_low) = below_low?;
    let (p0_high, p1_high) = below_high?;
    let p0 = p0_low + p0_high;
    let p1 = p1_low + p1_high;

    let handle = manager.intern_weight(p0, p1)?;
    ApplyCache::<MeasureOp>::insert(
        manager.apply_cache(),
        MeasureOp::MarginalProb,
        &key,
        Edge::new(NodeHandle::TERMINAL, handle),
    );
    Ok((p0, p1))
}

/// Post-measurement edge given the outcome bit at `target` and the
/// precomputed normalization `norm = sqrt(prob_observed)`. Above
/// `target` both branches are carried along (folding `edge`'s weight in
/// exactly like [`marginal_prob_at`]); at `target`, the unobserved
/// branch is zeroed and the accumulated root weight is divided by
/// `norm` — matching `qmdd_measure_q0`, which performs that division
/// only once, at its own root, rather than at every intermediate level.
pub fn project_qubit(
    manager: &EvbddManager,
    strategy: NormStrategy,
    edge: Edge,
    level: Var,
    target: Var,
    outcome: bool,
    norm: f64,
) -> AdddResult<Edge> {
    if level == target {
        let (low, high) = raw_cofactor(manager, edge, level);
        let (low, high) = if !outcome {
            (low, Edge::ZERO)
        } else {
            (Edge::ZERO, high)
        };
        let res = make_edge(manager, level, low, high, strategy)?;
        let combined = manager.weight_mul(edge.weight, res.weight)?;
        let (re, im) = manager.weight_value(combined);
        let scaled = manager.intern_weight(re / norm, im / norm)?;
        return Ok(Edge::new(res.target, scaled));
    }

    let (low, high) = scaled_cofactor(manager, edge, level)?;
    let g1 = RefGuard::push(low);
    let g2 = RefGuard::push(high);
    let (new_low, new_high) = scheduler::join(
        || project_qubit(manager, strategy, g1.get(), level + 1, target, outcome, norm),
        || project_qubit(manager, strategy, g2.get(), level + 1, target, outcome, norm),
    );
    make_edge(manager, level, new_low?, new_high?, strategy)
}

fn warn_on_drift(p0: f64, p1: f64, tolerance: f64) {
    let drift = (p0 + p1 - 1.0).abs();
    if drift > tolerance {
        tracing::warn!(
            error = %AdddError::MeasurementNorm(p0 + p1, drift),
            "measurement probabilities drifted past tolerance"
        );
    }
}

/// `qmdd_measure_qubit`/`qmdd_measure_q0` generalized to any `target`.
pub fn measure_qubit(
    manager: &EvbddManager,
    strategy: NormStrategy,
    edge: Edge,
    target: Var,
    n: Var,
    rng: &mut dyn MeasurementRng,
) -> EngineResult<(Edge, bool, f64)> {
    if n == 0 {
        return Err(EngineError::NoQubits);
    }
    if target >= n {
        return Err(AdddError::Overflow(target, n - 1).into());
    }

    let (p0, p1) = marginal_prob_at(manager, edge, 0, target, n)?;
    warn_on_drift(p0, p1, 1e-6);

    let rnd = rng.next_f64();
    let outcome = rnd >= p0;
    let prob_chosen = if outcome { p1 } else { p0 };
    let norm = prob_chosen.sqrt();

    let res = project_qubit(manager, strategy, edge, 0, target, outcome, norm)?;
    let abs = manager.weight_abs(res.weight);
    let phase_free = manager.intern_weight(abs, 0.0)?;
    Ok((Edge::new(res.target, phase_free), outcome, prob_chosen))
}

/// `qmdd_measure_all`: proceeds top down, qubit by qubit, multiplying
/// conditional probabilities as it descends and returning both the
/// outcome bit string and the post-measurement basis state.
pub fn measure_all(
    manager: &EvbddManager,
    edge: Edge,
    n: Var,
    rng: &mut dyn MeasurementRng,
) -> EngineResult<(Edge, Vec<bool>, f64)> {
    if n == 0 {
        return Err(EngineError::NoQubits);
    }

    let mut bits = vec![false; n as usize];
    let mut cur = edge;
    let mut prob_path = 1.0_f64;
    let mut prob_roots = 1.0_f64;

    for k in 0..n {
        let (low, high) = raw_cofactor(manager, cur, k);
        let prob_low_raw = unnormed_prob(manager, low, k + 1, n)?;
        let prob_high_raw = unnormed_prob(manager, high, k + 1, n)?;
        prob_roots *= manager.weight_abs(cur.weight).powi(2);
        let prob_low = prob_low_raw * prob_roots / prob_path;
        let prob_high = prob_high_raw * prob_roots / prob_path;

        warn_on_drift(prob_low, prob_high, manager.tolerance());

        let rnd = rng.next_f64();
        let bit = rnd >= prob_low;
        bits[k as usize] = bit;
        cur = if bit { high } else { low };
        prob_path *= if bit { prob_high } else { prob_low };
    }

    let post = basis_state(manager, n, &bits)?;
    Ok((post, bits, prob_path))
}

/// `qmdd_get_amplitude`: the amplitude of basis state `bits` under
/// `edge`, found by following `bits` down through scaled cofactors to
/// the terminal.
pub fn get_amplitude(manager: &EvbddManager, edge: Edge, bits: &[bool], n: Var) -> EngineResult<WeightHandle> {
    if bits.len() != n as usize {
        return Err(EngineError::BitLengthMismatch(bits.len(), n as usize));
    }
    let mut cur = edge;
    for (k, &bit) in bits.iter().enumerate() {
        let (low, high) = scaled_cofactor(manager, cur, k as Var)?;
        cur = if bit { high } else { low };
    }
    Ok(cur.weight)
}

/// `qmdd_amp_to_prob`.
pub fn amp_to_prob(manager: &EvbddManager, handle: WeightHandle) -> f64 {
    manager.weight_abs(handle).powi(2)
}

/// `qmdd_amp_from_prob`.
pub fn amp_from_prob(manager: &EvbddManager, prob: f64) -> AdddResult<WeightHandle> {
    manager.intern_weight(prob.sqrt(), 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use addd_gates::{StandardGateLibrary, H};
    use addd_manager::ManagerConfig;
    use addd_rules_evbdd::matvec;

    use crate::constructors::single_qubit_gate;

    fn fresh_manager() -> EvbddManager {
        EvbddManager::new(ManagerConfig::default())
    }

    #[test]
    fn measuring_a_basis_state_always_returns_its_own_bits() {
        let manager = fresh_manager();
        let state = basis_state(&manager, 2, &[true, false]).unwrap();
        let mut rng = DeterministicRng(0.0);

        let (post, outcome, prob) =
            measure_qubit(&manager, NormStrategy::Low, state, 0, 2, &mut rng).unwrap();
        assert!(outcome);
        assert!((prob - 1.0).abs() < 1e-9);
        assert_eq!(post.target, state.target);
    }

    #[test]
    fn measure_all_on_hadamard_state_respects_the_forced_coin() {
        let manager = fresh_manager();
        let gates = StandardGateLibrary::new();
        let zero = basis_state(&manager, 1, &[false]).unwrap();
        let h = single_qubit_gate(&manager, NormStrategy::Low, &gates, 1, 0, H).unwrap();
        let after_h = matvec(&manager, NormStrategy::Low, h, zero, 0, 1).unwrap();

        let mut always_one = DeterministicRng(0.999);
        let (post, bits, prob) = measure_all(&manager, after_h, 1, &mut always_one).unwrap();
        assert_eq!(bits, vec![true]);
        assert!((prob - 0.5).abs() < 1e-6);
        assert_eq!(post.target, basis_state(&manager, 1, &[true]).unwrap().target);
    }

    #[test]
    fn get_amplitude_on_bell_state_has_equal_weight_on_both_basis_terms() {
        let manager = fresh_manager();
        let gates = StandardGateLibrary::new();
        let zero = basis_state(&manager, 2, &[false, false]).unwrap();
        let h0 = single_qubit_gate(&manager, NormStrategy::Low, &gates, 2, 0, H).unwrap();
        let after_h = matvec(&manager, NormStrategy::Low, h0, zero, 0, 2).unwrap();
        let cnot = crate::constructors::controlled_gate(
            &manager,
            NormStrategy::Low,
            &gates,
            2,
            0,
            1,
            addd_gates::X,
        )
        .unwrap();
        let bell = matvec(&manager, NormStrategy::Low, cnot, after_h, 0, 2).unwrap();

        let amp00 = get_amplitude(&manager, bell, &[false, false], 2).unwrap();
        let amp01 = get_amplitude(&manager, bell, &[false, true], 2).unwrap();
        assert!((manager.weight_abs(amp00) - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-9);
        assert!(manager.weight_abs(amp01).abs() < 1e-9);
    }
}
