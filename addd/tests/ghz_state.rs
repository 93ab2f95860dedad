//! GHZ state on 3 qubits: `H` on qubit 0, then `CNOT(0->1)`, `CNOT(0->2)`.
//! Supplements the Bell-state seed scenario to a third qubit.

use addd::{Engine, EngineConfig};
use addd_gates::{StandardGateLibrary, H, X};

#[test]
fn ghz_state_has_expected_amplitudes() {
    let engine = Engine::init(&EngineConfig::default());
    let gates = StandardGateLibrary::new();

    let zero = engine.basis_state(3, &[false, false, false]).unwrap();
    let h0 = engine.single_qubit_gate(&gates, 3, 0, H).unwrap();
    let after_h = engine.matvec(h0, zero, 3).unwrap();
    let cnot01 = engine.controlled_gate(&gates, 3, 0, 1, X).unwrap();
    let after_cnot01 = engine.matvec(cnot01, after_h, 3).unwrap();
    let cnot02 = engine.controlled_gate(&gates, 3, 0, 2, X).unwrap();
    let ghz = engine.matvec(cnot02, after_cnot01, 3).unwrap();

    let inv_sqrt2 = std::f64::consts::FRAC_1_SQRT_2;
    for bits in [
        [false, false, false],
        [false, false, true],
        [false, true, false],
        [false, true, true],
        [true, false, false],
        [true, false, true],
        [true, true, false],
        [true, true, true],
    ] {
        let amp = engine.get_amplitude(ghz, &bits, 3).unwrap();
        let (re, im) = engine.weight_value(amp);
        let abs = (re * re + im * im).sqrt();
        let expected = if bits == [false, false, false] || bits == [true, true, true] {
            inv_sqrt2
        } else {
            0.0
        };
        assert!(
            (abs - expected).abs() < 1e-9,
            "bits {bits:?}: expected |amp| {expected}, got {abs}"
        );
    }
}
