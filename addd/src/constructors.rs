//! State and gate constructors (C7, `spec.md` §4.6), grounded directly
//! on `qmdd_create_basis_state`/`qmdd_stack_matrix`/`qmdd_stack_control`/
//! `qmdd_create_all_identity_matrix`/`qmdd_create_single_qubit_gate(s)`/
//! `qmdd_create_controlled_gate`/`qmdd_create_multi_cgate`/
//! `qmdd_create_all_control_phase`.

use addd_core::edge::{Edge, WeightHandle};
use addd_core::manager::Manager;
use addd_core::node::Var;
use addd_core::AdddError;
use addd_gates::{GateId, GateLibrary};
use addd_manager::worker::RefGuard;
use addd_manager::EvbddManager;
use addd_rules_evbdd::{make_edge, plus, NormStrategy};

use crate::error::{EngineError, EngineResult};

const IDENTITY: [[WeightHandle; 2]; 2] = [
    [WeightHandle::ONE, WeightHandle::ZERO],
    [WeightHandle::ZERO, WeightHandle::ONE],
];
const PROJ0: [[WeightHandle; 2]; 2] = [
    [WeightHandle::ONE, WeightHandle::ZERO],
    [WeightHandle::ZERO, WeightHandle::ZERO],
];
const PROJ1: [[WeightHandle; 2]; 2] = [
    [WeightHandle::ZERO, WeightHandle::ZERO],
    [WeightHandle::ZERO, WeightHandle::ONE],
];

fn require_qubits(n: Var) -> EngineResult<()> {
    if n == 0 {
        return Err(EngineError::NoQubits);
    }
    Ok(())
}

fn matrix1_weights(
    manager: &EvbddManager,
    gates: &dyn GateLibrary,
    gate: GateId,
) -> EngineResult<[[WeightHandle; 2]; 2]> {
    let m = gates.resolve1(gate)?;
    let mut out = [[WeightHandle::ZERO; 2]; 2];
    for i in 0..2 {
        for j in 0..2 {
            out[i][j] = manager.intern_weight(m[i][j].re, m[i][j].im)?;
        }
    }
    Ok(out)
}

/// `qmdd_create_basis_state`: the computational basis state `|bits⟩`.
pub fn basis_state(manager: &EvbddManager, n: Var, bits: &[bool]) -> EngineResult<Edge> {
    require_qubits(n)?;
    if bits.len() != n as usize {
        return Err(EngineError::BitLengthMismatch(bits.len(), n as usize));
    }
    let mut edge = Edge::ONE;
    for k in (0..n).rev() {
        let (low, high) = if bits[k as usize] {
            (Edge::ZERO, edge)
        } else {
            (edge, Edge::ZERO)
        };
        edge = make_edge(manager, k, low, high, NormStrategy::Low)?;
    }
    Ok(edge)
}

/// `qmdd_stack_matrix`: stack one 2x2 block at qubit `k`'s paired
/// variables `2k, 2k+1` below `below`. `below`'s own weight is folded
/// into the result once, at the very end, rather than per quadrant.
pub fn stack_matrix(
    manager: &EvbddManager,
    strategy: NormStrategy,
    below: Edge,
    k: Var,
    entries: [[WeightHandle; 2]; 2],
) -> EngineResult<Edge> {
    let s = 2 * k;
    let t = s + 1;
    let u00 = Edge::new(below.target, entries[0][0]);
    let u01 = Edge::new(below.target, entries[0][1]);
    let u10 = Edge::new(below.target, entries[1][0]);
    let u11 = Edge::new(below.target, entries[1][1]);

    let low = make_edge(manager, t, u00, u10, strategy)?;
    let high = make_edge(manager, t, u01, u11, strategy)?;
    let res = make_edge(manager, s, low, high, strategy)?;

    let root_weight = manager.weight_mul(below.weight, res.weight)?;
    Ok(Edge::new(res.target, root_weight))
}

/// `qmdd_stack_control`: `|0⟩⟨0| ⊗ case0 + |1⟩⟨1| ⊗ case1` at qubit `k`'s
/// paired variables. `case0`/`case1`'s own weights are already carried
/// by the edges themselves, so no extra folding happens here.
pub fn stack_control(
    manager: &EvbddManager,
    strategy: NormStrategy,
    case0: Edge,
    case1: Edge,
    k: Var,
) -> EngineResult<Edge> {
    let s = 2 * k;
    let t = s + 1;
    let low = make_edge(manager, t, case0, Edge::ZERO, strategy)?;
    let high = make_edge(manager, t, Edge::ZERO, case1, strategy)?;
    Ok(make_edge(manager, s, low, high, strategy)?)
}

/// `qmdd_create_all_identity_matrix`.
pub fn identity_matrix(manager: &EvbddManager, strategy: NormStrategy, n: Var) -> EngineResult<Edge> {
    require_qubits(n)?;
    let mut edge = Edge::ONE;
    for k in (0..n).rev() {
        edge = stack_matrix(manager, strategy, edge, k, IDENTITY)?;
    }
    Ok(edge)
}

/// `qmdd_create_single_qubit_gate`: identity everywhere except `target`,
/// which carries `gate`.
pub fn single_qubit_gate(
    manager: &EvbddManager,
    strategy: NormStrategy,
    gates: &dyn GateLibrary,
    n: Var,
    target: Var,
    gate: GateId,
) -> EngineResult<Edge> {
    require_qubits(n)?;
    let gate_weights = matrix1_weights(manager, gates, gate)?;
    let mut edge = Edge::ONE;
    for k in (0..n).rev() {
        let entries = if k == target { gate_weights } else { IDENTITY };
        edge = stack_matrix(manager, strategy, edge, k, entries)?;
    }
    Ok(edge)
}

/// `qmdd_create_single_qubit_gates`: a distinct gate per qubit.
pub fn single_qubit_gate_stack(
    manager: &EvbddManager,
    strategy: NormStrategy,
    gates: &dyn GateLibrary,
    n: Var,
    gate_ids: &[GateId],
) -> EngineResult<Edge> {
    require_qubits(n)?;
    if gate_ids.len() != n as usize {
        return Err(EngineError::BitLengthMismatch(gate_ids.len(), n as usize));
    }
    let mut edge = Edge::ONE;
    for k in (0..n).rev() {
        let entries = matrix1_weights(manager, gates, gate_ids[k as usize])?;
        edge = stack_matrix(manager, strategy, edge, k, entries)?;
    }
    Ok(edge)
}

/// `qmdd_create_controlled_gate`: `C(ctrl -> target, gate)`, requiring
/// `ctrl < target` in variable order (callers below that order must
/// reorder first, per `spec.md` §4.6).
pub fn controlled_gate(
    manager: &EvbddManager,
    strategy: NormStrategy,
    gates: &dyn GateLibrary,
    n: Var,
    ctrl: Var,
    target: Var,
    gate: GateId,
) -> EngineResult<Edge> {
    require_qubits(n)?;
    if ctrl >= target {
        return Err(AdddError::InvalidOrder { ctrl, target }.into());
    }
    let gate_weights = matrix1_weights(manager, gates, gate)?;

    let mut prev = Edge::ONE;
    let mut branch0 = Edge::ONE;
    let mut branch1 = Edge::ONE;
    for k in (0..n).rev() {
        if k > target || k < ctrl {
            prev = stack_matrix(manager, strategy, prev, k, IDENTITY)?;
        } else if k == target {
            branch0 = stack_matrix(manager, strategy, prev, k, IDENTITY)?;
            branch1 = stack_matrix(manager, strategy, prev, k, gate_weights)?;
        } else if k == ctrl {
            prev = stack_control(manager, strategy, branch0, branch1, k)?;
        } else {
            branch0 = stack_matrix(manager, strategy, branch0, k, IDENTITY)?;
            branch1 = stack_matrix(manager, strategy, branch1, k, IDENTITY)?;
        }
    }
    Ok(prev)
}

/// Per-qubit role in a [`multi_controlled_gate`] call.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ControlOption {
    Ignore,
    ControlOn0,
    ControlOn1,
    Target,
}

/// `qmdd_create_multi_cgate`: `U_proj + I - proj`, where `U_proj` is the
/// control projector tensored with `gate` on the target wire and `proj`
/// is the same projector with identity on the target wire.
pub fn multi_controlled_gate(
    manager: &EvbddManager,
    strategy: NormStrategy,
    gates: &dyn GateLibrary,
    n: Var,
    options: &[ControlOption],
    gate: GateId,
) -> EngineResult<Edge> {
    require_qubits(n)?;
    if options.len() != n as usize {
        return Err(EngineError::BitLengthMismatch(options.len(), n as usize));
    }
    let gate_weights = matrix1_weights(manager, gates, gate)?;
    let identity = identity_matrix(manager, strategy, n)?;

    let mut u_proj = Edge::ONE;
    let mut proj = Edge::ONE;
    for k in (0..n).rev() {
        let (u_entries, p_entries) = match options[k as usize] {
            ControlOption::Ignore => (IDENTITY, IDENTITY),
            ControlOption::ControlOn0 => (PROJ0, PROJ0),
            ControlOption::ControlOn1 => (PROJ1, PROJ1),
            ControlOption::Target => (gate_weights, IDENTITY),
        };
        u_proj = stack_matrix(manager, strategy, u_proj, k, u_entries)?;
        proj = stack_matrix(manager, strategy, proj, k, p_entries)?;
    }

    let neg_proj = Edge::new(proj.target, manager.weight_neg(proj.weight)?);
    // `u_proj` crosses the first `plus` call (itself GC-capable) before
    // it is used again in the second; resolve it back through the guard
    // rather than trusting the value captured before that call.
    let g1 = RefGuard::push(u_proj);
    let _g2 = RefGuard::push(identity);
    let _g3 = RefGuard::push(neg_proj);
    let sum = plus(manager, strategy, identity, neg_proj)?;
    Ok(plus(manager, strategy, g1.get(), sum)?)
}

/// `qmdd_create_all_control_phase`: the diagonal matrix negating exactly
/// amplitude `|bits⟩`.
pub fn all_control_phase(manager: &EvbddManager, strategy: NormStrategy, n: Var, bits: &[bool]) -> EngineResult<Edge> {
    require_qubits(n)?;
    if bits.len() != n as usize {
        return Err(EngineError::BitLengthMismatch(bits.len(), n as usize));
    }
    const Z: [[WeightHandle; 2]; 2] = [
        [WeightHandle::ONE, WeightHandle::ZERO],
        [WeightHandle::ZERO, WeightHandle::MINUS_ONE],
    ];

    let top = n - 1;
    let mut ccphase = stack_matrix(manager, strategy, Edge::ONE, top, Z)?;
    if !bits[top as usize] {
        ccphase = Edge::new(ccphase.target, manager.weight_neg(ccphase.weight)?);
    }

    let mut identity = Edge::ONE;
    for k in (0..top).rev() {
        identity = stack_matrix(manager, strategy, identity, k + 1, IDENTITY)?;
        ccphase = if bits[k as usize] {
            stack_control(manager, strategy, identity, ccphase, k)?
        } else {
            stack_control(manager, strategy, ccphase, identity, k)?
        };
    }
    Ok(ccphase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use addd_gates::{StandardGateLibrary, H, I, X};
    use addd_manager::ManagerConfig;

    fn fresh_manager() -> EvbddManager {
        EvbddManager::new(ManagerConfig::default())
    }

    #[test]
    fn basis_state_rejects_length_mismatch() {
        let manager = fresh_manager();
        let err = basis_state(&manager, 2, &[true]).unwrap_err();
        assert!(matches!(err, EngineError::BitLengthMismatch(1, 2)));
    }

    #[test]
    fn single_qubit_identity_leaves_basis_state_unchanged() {
        let manager = fresh_manager();
        let gates = StandardGateLibrary::new();
        let state = basis_state(&manager, 2, &[true, false]).unwrap();
        let id = single_qubit_gate(&manager, NormStrategy::Low, &gates, 2, 0, I).unwrap();
        let applied = addd_rules_evbdd::matvec(&manager, NormStrategy::Low, id, state, 0, 2).unwrap();
        assert_eq!(applied.target, state.target);
    }

    #[test]
    fn controlled_gate_rejects_bad_order() {
        let manager = fresh_manager();
        let gates = StandardGateLibrary::new();
        let err = controlled_gate(&manager, NormStrategy::Low, &gates, 2, 1, 0, X).unwrap_err();
        assert!(matches!(err, EngineError::Core(AdddError::InvalidOrder { .. })));
    }

    #[test]
    fn hadamard_matvec_on_zero_splits_evenly() {
        let manager = fresh_manager();
        let gates = StandardGateLibrary::new();
        let state = basis_state(&manager, 1, &[false]).unwrap();
        let h = single_qubit_gate(&manager, NormStrategy::Low, &gates, 1, 0, H).unwrap();
        let applied = addd_rules_evbdd::matvec(&manager, NormStrategy::Low, h, state, 0, 1).unwrap();
        let prob = addd_rules_evbdd::inner_product(&manager, applied, applied, 0, 1).unwrap();
        let (re, im) = manager.weight_value(prob);
        assert!((re - 1.0).abs() < 1e-9);
        assert!(im.abs() < 1e-9);
    }
}
