//! Measurement-path integration: simulated waveforms through the sampling
//! pipeline and the analysis functions.

use rust_scope::acquisition::SamplingPipeline;
use rust_scope::calibration::{CalibrationCurve, CalibrationSource};
use rust_scope::hardware::{SimulatedAdc, Waveform};
use rust_scope::limits::{BUFFER_DEPTH, FULL_SCALE_VOLTS};
use rust_scope::measurement;

fn curve() -> CalibrationCurve {
    CalibrationCurve::characterize(&CalibrationSource::ManufacturerDefault, FULL_SCALE_VOLTS)
        .unwrap()
}

async fn one_sweep(adc: SimulatedAdc, rate: u32) -> Vec<u16> {
    let mut pipeline = SamplingPipeline::new(Box::new(adc), BUFFER_DEPTH);
    pipeline.configure(rate).await.unwrap();
    pipeline.run_round().await.unwrap();
    pipeline.sweep().to_vec()
}

#[tokio::test]
async fn sine_frequency_recovered_within_tolerance() {
    let adc = SimulatedAdc::new(Waveform::Sine)
        .frequency(1000.0)
        .noise(0.0)
        .seed(1);
    let sweep = one_sweep(adc, 100_000).await;
    let snapshot = measurement::analyze(&sweep, 100_000, &curve(), 1.0);

    // 20 cycles fit in the 20 ms sweep
    assert!(
        (snapshot.freq.frequency - 1000.0).abs() <= 100.0,
        "frequency = {}",
        snapshot.freq.frequency
    );
    assert!((snapshot.freq.period - 0.001).abs() < 0.0002);
}

#[tokio::test]
async fn triangle_frequency_recovered_at_slower_rate() {
    let adc = SimulatedAdc::new(Waveform::Triangle)
        .frequency(500.0)
        .noise(0.0)
        .seed(1);
    let sweep = one_sweep(adc, 100_000).await;
    let snapshot = measurement::analyze(&sweep, 100_000, &curve(), 1.0);

    assert!(
        (snapshot.freq.frequency - 500.0).abs() <= 50.0,
        "frequency = {}",
        snapshot.freq.frequency
    );
}

#[tokio::test]
async fn square_wave_vpp_matches_generator_amplitude() {
    let adc = SimulatedAdc::new(Waveform::Square)
        .frequency(1000.0)
        .amplitude(1.0)
        .noise(0.0)
        .seed(1);
    let sweep = one_sweep(adc, 100_000).await;
    let snapshot = measurement::analyze(&sweep, 100_000, &curve(), 1.0);

    // plateaus at 0.65 V and 2.65 V survive the extrema smoothing
    assert!(
        (snapshot.vpp - 2.0).abs() < 0.05,
        "vpp = {}",
        snapshot.vpp
    );
    assert!((snapshot.vmean - 1.65).abs() < 0.05);
    assert!(measurement::signal_present(&snapshot.stats, &curve()));
}

#[tokio::test]
async fn quiet_dc_input_reports_no_signal() {
    let adc = SimulatedAdc::new(Waveform::Dc).noise(0.0);
    let sweep = one_sweep(adc, 100_000).await;
    let snapshot = measurement::analyze(&sweep, 100_000, &curve(), 1.0);

    assert_eq!(snapshot.freq.frequency, 0.0);
    assert!(snapshot.vpp < 0.01);
    assert!(!measurement::signal_present(&snapshot.stats, &curve()));
}

#[tokio::test]
async fn pulse_duty_cycle_shifts_the_mean() {
    let adc = SimulatedAdc::new(Waveform::Pulse)
        .frequency(1000.0)
        .amplitude(2.0)
        .offset(0.0)
        .duty(0.25)
        .noise(0.0)
        .seed(1);
    let sweep = one_sweep(adc, 100_000).await;
    let snapshot = measurement::analyze(&sweep, 100_000, &curve(), 1.0);

    // high for a quarter of each period
    assert!(
        (snapshot.vmean - 0.5).abs() < 0.1,
        "vmean = {}",
        snapshot.vmean
    );
}

#[tokio::test]
async fn probe_attenuation_scales_reported_voltages_only() {
    let adc = SimulatedAdc::new(Waveform::Sine)
        .frequency(1000.0)
        .noise(0.0)
        .seed(5);
    let sweep = one_sweep(adc, 100_000).await;

    let direct = measurement::analyze(&sweep, 100_000, &curve(), 1.0);
    let attenuated = measurement::analyze(&sweep, 100_000, &curve(), 10.0);

    assert!((attenuated.vpp - direct.vpp * 10.0).abs() < 1e-9);
    assert!((attenuated.vmean - direct.vmean * 10.0).abs() < 1e-9);
    // code-domain stats and frequency are probe-independent
    assert_eq!(attenuated.stats, direct.stats);
    assert_eq!(attenuated.freq, direct.freq);
}
