use sm_remap::sm::prelude::*;

fn model(offset: f64, bpms: &[(f64, f64)], stops: &[(f64, f64)]) -> TimingModel {
    TimingModel::new(
        offset,
        bpms.iter().map(|&(beat, bpm)| BpmChange { beat, bpm }).collect(),
        stops
            .iter()
            .map(|&(beat, duration)| Stop { beat, duration })
            .collect(),
    )
    .expect("test model must be valid")
}

#[test]
fn time_of_beat_zero_is_minus_offset() {
    for offset in [-1.5, -0.013, 0.0, 0.009, 2.25] {
        let model = model(offset, &[(0.0, 140.0)], &[]);
        assert_eq!(model.time_at(0.0), -offset);
    }
}

#[test]
fn beat_and_time_are_inverses_across_gimmicks() {
    let model = model(
        0.062,
        &[(0.0, 140.0), (32.0, 70.0), (64.0, 280.0)],
        &[(16.0, 0.35), (32.0, 0.7)],
    );
    for i in 0..=200 {
        let beat = f64::from(i) * 0.61;
        let there_and_back = model.beat_at(model.time_at(beat));
        assert!(
            (there_and_back - beat).abs() < 1e-9,
            "beat {beat} came back as {there_and_back}"
        );
    }
}

#[test]
fn a_stop_is_a_flat_interval_of_its_own_beat() {
    let model = model(0.0, &[(0.0, 120.0)], &[(8.0, 2.0)]);
    let start = model.time_at(8.0);
    for fraction in [0.0, 0.25, 0.5, 1.0] {
        assert_eq!(model.beat_at(start + fraction * 2.0), 8.0);
    }
    // Just past the pause the chart moves again.
    assert!(model.beat_at(start + 2.0 + 1e-6) > 8.0);
}
