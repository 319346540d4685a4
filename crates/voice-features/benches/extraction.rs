use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use voice_features::{
    AutocorrelationTracker, CovariateValidator, FeatureExtractor, NonlinearCalculator,
    PitchTracker, Sex, Waveform,
};

fn tone(sample_rate: u32, seconds: f64) -> Waveform {
    let n = (f64::from(sample_rate) * seconds) as usize;
    let samples = (0..n)
        .map(|i| {
            let t = i as f64 / f64::from(sample_rate);
            // Slow vibrato keeps the period sequence from being constant
            let phase = 2.0 * std::f64::consts::PI * (140.0 * t + 2.0 * (3.0 * t).sin());
            0.6 * phase.sin()
        })
        .collect();
    Waveform::new(samples, sample_rate).unwrap()
}

fn benchmark_full_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("Full extraction");
    group.sample_size(10);

    let extractor = FeatureExtractor::default();
    let covariates = CovariateValidator::default()
        .validate(60, Sex::Female, 10.0)
        .unwrap();

    for sample_rate in [16000u32, 44100].iter() {
        let wave = tone(*sample_rate, 3.0);
        group.bench_with_input(BenchmarkId::new("rate", sample_rate), &wave, |b, wave| {
            b.iter(|| black_box(extractor.extract(black_box(wave), &covariates)));
        });
    }

    group.finish();
}

fn benchmark_pitch_tracking(c: &mut Criterion) {
    let tracker = AutocorrelationTracker::default();
    let wave = tone(16000, 3.0);

    c.bench_function("pitch_track_3s_16khz", |b| {
        b.iter(|| black_box(tracker.track(black_box(&wave))));
    });
}

fn benchmark_nonlinear(c: &mut Criterion) {
    let mut group = c.benchmark_group("Nonlinear measures");
    let calculator = NonlinearCalculator::default();

    for count in [100usize, 500, 2000].iter() {
        let periods: Vec<f64> = (0..*count)
            .map(|i| 0.007 + 0.0002 * ((i as f64) * 0.37).sin())
            .collect();
        group.bench_with_input(BenchmarkId::new("periods", count), &periods, |b, periods| {
            b.iter(|| black_box(calculator.compute(black_box(periods))));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_full_extraction,
    benchmark_pitch_tracking,
    benchmark_nonlinear
);
criterion_main!(benches);
