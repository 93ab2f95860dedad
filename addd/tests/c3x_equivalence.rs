//! Seed scenario 6 (`spec.md` §8): a triple-controlled `X` gate built via
//! `multi_controlled_gate` with `{ControlOn1, ControlOn1, ControlOn1,
//! Target}` must match the classical C3X truth table on every one of the
//! 16 four-qubit basis states — flip the target iff all three controls
//! are `1`.

use addd::constructors::ControlOption;
use addd::{Engine, EngineConfig};
use addd_gates::{StandardGateLibrary, X};

#[test]
fn multi_controlled_x_matches_the_classical_truth_table() {
    let engine = Engine::init(&EngineConfig::default());
    let gates = StandardGateLibrary::new();

    let c3x = engine
        .multi_controlled_gate(
            &gates,
            4,
            &[
                ControlOption::ControlOn1,
                ControlOption::ControlOn1,
                ControlOption::ControlOn1,
                ControlOption::Target,
            ],
            X,
        )
        .unwrap();

    for input in 0u8..16 {
        let bits: Vec<bool> = (0..4).map(|i| (input >> i) & 1 == 1).collect();
        let state = engine.basis_state(4, &bits).unwrap();
        let after = engine.matvec(c3x, state, 4).unwrap();

        let mut expected = bits.clone();
        if bits[0] && bits[1] && bits[2] {
            expected[3] = !expected[3];
        }

        for output in 0u8..16 {
            let output_bits: Vec<bool> = (0..4).map(|i| (output >> i) & 1 == 1).collect();
            let amp = engine.get_amplitude(after, &output_bits, 4).unwrap();
            let (re, im) = engine.weight_value(amp);
            let abs = (re * re + im * im).sqrt();
            let expected_abs = if output_bits == expected { 1.0 } else { 0.0 };
            assert!(
                (abs - expected_abs).abs() < 1e-9,
                "input {bits:?}, output {output_bits:?}: expected |amp| {expected_abs}, got {abs}"
            );
        }
    }
}

#[test]
fn multi_controlled_x_is_its_own_inverse() {
    let engine = Engine::init(&EngineConfig::default());
    let gates = StandardGateLibrary::new();

    let c3x = engine
        .multi_controlled_gate(
            &gates,
            4,
            &[
                ControlOption::ControlOn1,
                ControlOption::ControlOn1,
                ControlOption::ControlOn1,
                ControlOption::Target,
            ],
            X,
        )
        .unwrap();

    let identity = engine.matmat(c3x, c3x, 4).unwrap();
    let expected = engine.identity_matrix(4).unwrap();
    assert_eq!(identity, expected);
}
