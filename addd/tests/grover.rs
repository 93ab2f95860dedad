//! Seed scenario 2 (`spec.md` §8): 3-qubit Grover search for `111`.
//! After `floor(pi/4 * sqrt(8)) == 2` iterations the marked amplitude
//! squared must exceed `0.94`.

use addd::{Engine, EngineConfig};
use addd_gates::{StandardGateLibrary, H};

const N: u32 = 3;

fn apply_h_to_all(engine: &Engine, gates: &StandardGateLibrary, mut state: addd_core::edge::Edge) -> addd_core::edge::Edge {
    for q in 0..N {
        let h = engine.single_qubit_gate(gates, N, q, H).unwrap();
        state = engine.matvec(h, state, N).unwrap();
    }
    state
}

#[test]
fn grover_two_iterations_amplifies_the_marked_string_past_threshold() {
    let engine = Engine::init(&EngineConfig::default());
    let gates = StandardGateLibrary::new();

    let oracle = engine.all_control_phase(N, &[true, true, true]).unwrap();
    let zero_flip = engine.all_control_phase(N, &[false, false, false]).unwrap();

    let mut state = engine.basis_state(N, &[false, false, false]).unwrap();
    state = apply_h_to_all(&engine, &gates, state);

    for _ in 0..2 {
        state = engine.matvec(oracle, state, N).unwrap();
        state = apply_h_to_all(&engine, &gates, state);
        state = engine.matvec(zero_flip, state, N).unwrap();
        state = apply_h_to_all(&engine, &gates, state);
    }

    let amp = engine.get_amplitude(state, &[true, true, true], N).unwrap();
    let (re, im) = engine.weight_value(amp);
    let prob = re * re + im * im;
    assert!(prob > 0.94, "marked-string probability {prob} did not exceed 0.94");
}
