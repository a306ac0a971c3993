use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use datadog_costs_metrics_sender::dates::month_window;
use datadog_costs_metrics_sender::secrets::extract_at_path;

fn secret_path_benchmark(c: &mut Criterion) {
    let cases = vec![
        (r#"{"apiKey":"abc"}"#, "apiKey"),
        (r#"{"datadog":{"apiKey":"abc","appKey":"def"}}"#, "datadog.appKey"),
        (r#"{"keys":[{"value":"a"},{"value":"b"}]}"#, "keys.1.value"),
        (r#"{"a":{"b":{"c":{"d":{"e":"deep"}}}}}"#, "a.b.c.d.e"),
    ];

    c.bench_function("extract_at_path", |b| {
        b.iter(|| {
            for (payload, path) in &cases {
                let _ = black_box(extract_at_path(black_box(payload), black_box(path)));
            }
        })
    });
}

fn month_window_benchmark(c: &mut Criterion) {
    let dates: Vec<_> = (1..=12)
        .map(|m| Utc.with_ymd_and_hms(2024, m, 15, 13, 37, 0).unwrap())
        .collect();

    c.bench_function("month_window", |b| {
        b.iter(|| {
            for date in &dates {
                black_box(month_window(black_box(date)));
            }
        })
    });
}

criterion_group!(benches, secret_path_benchmark, month_window_benchmark);
criterion_main!(benches);
