use std::time::{Duration, Instant};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dynmetric_core::ScheduleResolver;
use dynmetric_domain::{Pattern, Schedule};

fn schedules() -> Vec<Schedule> {
    vec![
        Schedule::new(vec![Pattern::starts_with("http.")], 10),
        Schedule::new(vec![Pattern::starts_with("db.")], 30),
        Schedule::new(vec![Pattern::equals("runtime.gc.pause")], 5),
        Schedule::new(vec![Pattern::any()], 60)
            .with_exclusions(vec![Pattern::starts_with("debug.")]),
    ]
}

fn instrument_names(count: usize) -> Vec<String> {
    let prefixes = ["http.", "db.", "runtime.", "debug.", "queue."];
    (0..count).map(|i| format!("{}metric_{i}", prefixes[i % prefixes.len()])).collect()
}

fn bench_rule_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_evaluation");

    for count in [100usize, 1_000, 10_000] {
        let names = instrument_names(count);

        group.bench_with_input(BenchmarkId::new("warm_memo", count), &names, |b, names| {
            let start = Instant::now();
            let resolver = ScheduleResolver::new();
            resolver.mark_start(start);
            resolver.apply_schedules(schedules()).unwrap();
            let mut tick = 0u64;

            b.iter(|| {
                tick += 5;
                let rule = resolver.build_rule(start + Duration::from_secs(tick)).unwrap();
                let due = names.iter().filter(|n| rule.is_due(n)).count();
                black_box(due)
            });
        });

        group.bench_with_input(BenchmarkId::new("after_reapply", count), &names, |b, names| {
            let start = Instant::now();
            let resolver = ScheduleResolver::new();
            resolver.mark_start(start);

            b.iter(|| {
                resolver.apply_schedules(schedules()).unwrap();
                let rule = resolver.build_rule(start + Duration::from_secs(60)).unwrap();
                let due = names.iter().filter(|n| rule.is_due(n)).count();
                black_box(due)
            });
        });
    }

    group.finish();
}

fn bench_tick_period(c: &mut Criterion) {
    let many: Vec<Schedule> =
        (1..=500).map(|i| Schedule::new(vec![Pattern::any()], i * 6)).collect();

    c.bench_function("tick_period_gcd_500", |b| {
        b.iter(|| black_box(dynmetric_core::schedule::resolver::tick_period_for(&many)));
    });
}

criterion_group!(benches, bench_rule_evaluation, bench_tick_period);
criterion_main!(benches);
