//! Seed scenario 5 (`spec.md` §8): a Clifford circuit over several
//! qubits followed by its explicit inverse returns exactly the initial
//! all-zero basis edge handle.

use addd::{Engine, EngineConfig};
use addd_gates::{StandardGateLibrary, H, S, S_DAG, X};

const N: u32 = 10;

#[test]
fn clifford_circuit_and_its_inverse_compose_to_identity_on_the_state() {
    let engine = Engine::init(&EngineConfig::default());
    let gates = StandardGateLibrary::new();

    let zero = engine.basis_state(N, &[false; N as usize]).unwrap();

    let h = |q: u32, e: &Engine, state: addd_core::edge::Edge| {
        let g = e.single_qubit_gate(&gates, N, q, H).unwrap();
        e.matvec(g, state, N).unwrap()
    };
    let s = |q: u32, e: &Engine, state: addd_core::edge::Edge| {
        let g = e.single_qubit_gate(&gates, N, q, S).unwrap();
        e.matvec(g, state, N).unwrap()
    };
    let s_dag = |q: u32, e: &Engine, state: addd_core::edge::Edge| {
        let g = e.single_qubit_gate(&gates, N, q, S_DAG).unwrap();
        e.matvec(g, state, N).unwrap()
    };
    let cnot = |c: u32, t: u32, e: &Engine, state: addd_core::edge::Edge| {
        let g = e.controlled_gate(&gates, N, c, t, X).unwrap();
        e.matvec(g, state, N).unwrap()
    };
    // CZ is controlled-Z: compose it from the single-qubit Z under a
    // control, since `controlled_gate` only takes a single-qubit gate.
    let cz = |c: u32, t: u32, e: &Engine, state: addd_core::edge::Edge| {
        let g = e.controlled_gate(&gates, N, c, t, addd_gates::Z).unwrap();
        e.matvec(g, state, N).unwrap()
    };

    let mut state = zero;
    state = h(0, &engine, state);
    state = h(2, &engine, state);
    state = h(4, &engine, state);
    state = h(6, &engine, state);
    state = h(8, &engine, state);
    state = s(1, &engine, state);
    state = s(3, &engine, state);
    state = s(5, &engine, state);
    state = cnot(0, 1, &engine, state);
    state = cnot(2, 3, &engine, state);
    state = cnot(4, 5, &engine, state);
    state = cnot(6, 7, &engine, state);
    state = cnot(8, 9, &engine, state);
    state = cz(1, 4, &engine, state);
    state = cz(3, 8, &engine, state);
    state = h(5, &engine, state);
    state = h(7, &engine, state);
    state = s(9, &engine, state);

    // inverse: reverse order, invert every gate (H and CNOT/CZ are
    // self-inverse, S's inverse is S_DAG).
    state = s_dag(9, &engine, state);
    state = h(7, &engine, state);
    state = h(5, &engine, state);
    state = cz(3, 8, &engine, state);
    state = cz(1, 4, &engine, state);
    state = cnot(8, 9, &engine, state);
    state = cnot(6, 7, &engine, state);
    state = cnot(4, 5, &engine, state);
    state = cnot(2, 3, &engine, state);
    state = cnot(0, 1, &engine, state);
    state = s_dag(5, &engine, state);
    state = s_dag(3, &engine, state);
    state = s_dag(1, &engine, state);
    state = h(8, &engine, state);
    state = h(6, &engine, state);
    state = h(4, &engine, state);
    state = h(2, &engine, state);
    state = h(0, &engine, state);

    assert_eq!(state, zero);
}
