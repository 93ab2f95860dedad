//! Seed scenario 1 (`spec.md` §8): Bell state via `H` on qubit 0 then
//! `CNOT(0 -> 1)`.

use addd::{Engine, EngineConfig};
use addd_gates::{StandardGateLibrary, X, H};

#[test]
fn bell_state_has_expected_amplitudes() {
    let engine = Engine::init(&EngineConfig::default());
    let gates = StandardGateLibrary::new();

    let zero = engine.basis_state(2, &[false, false]).unwrap();
    let h0 = engine.single_qubit_gate(&gates, 2, 0, H).unwrap();
    let after_h = engine.matvec(h0, zero, 2).unwrap();
    let cnot = engine.controlled_gate(&gates, 2, 0, 1, X).unwrap();
    let bell = engine.matvec(cnot, after_h, 2).unwrap();

    let inv_sqrt2 = std::f64::consts::FRAC_1_SQRT_2;
    let expected = [
        (&[false, false][..], inv_sqrt2),
        (&[false, true][..], 0.0),
        (&[true, false][..], 0.0),
        (&[true, true][..], inv_sqrt2),
    ];
    for (bits, expected_abs) in expected {
        let amp = engine.get_amplitude(bell, bits, 2).unwrap();
        let (re, im) = engine.weight_value(amp);
        let abs = (re * re + im * im).sqrt();
        assert!(
            (abs - expected_abs).abs() < 1e-9,
            "bits {bits:?}: expected |amp| {expected_abs}, got {abs}"
        );
    }
}

#[test]
fn bell_state_normalizes() {
    let engine = Engine::init(&EngineConfig::default());
    let gates = StandardGateLibrary::new();

    let zero = engine.basis_state(2, &[false, false]).unwrap();
    let h0 = engine.single_qubit_gate(&gates, 2, 0, H).unwrap();
    let after_h = engine.matvec(h0, zero, 2).unwrap();
    let cnot = engine.controlled_gate(&gates, 2, 0, 1, X).unwrap();
    let bell = engine.matvec(cnot, after_h, 2).unwrap();

    let norm = engine.inner_product(bell, bell, 2).unwrap();
    let (re, im) = engine.weight_value(norm);
    assert!((re - 1.0).abs() < 1e-9);
    assert!(im.abs() < 1e-9);
}
