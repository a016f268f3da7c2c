//! Performance benchmarks for text sanitization
//!
//! Run with: cargo bench
//! Or for specific benchmarks: cargo bench -- <filter>

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::time::Duration;

use speech_dispatch::core::pronunciation::{Pronunciation, PronunciationReplacer};
use speech_dispatch::core::sanitize::sanitize;

/// Benchmark sanitization on typical chat replies
fn bench_sanitize(c: &mut Criterion) {
    let mut group = c.benchmark_group("sanitize");
    group.measurement_time(Duration::from_secs(5));

    // Plain text, nothing to strip
    let plain = "Te recomiendo la cafetería del centro, abre a las ocho.".to_string();

    // Typical assistant reply with emoji and bullets
    let decorated = "☕ ¡Hola! Estas son mis recomendaciones:\n\n• Café Sucre ⭐⭐⭐⭐\n• La Taza → 5 min 🚶\n✅ Wifi gratis  ❌ Sin estacionamiento 😀"
        .repeat(5);

    // Long reply approaching a full chat message
    let long = "🌟 Opción recomendada → Café colonial con terraza ✔ ".repeat(200);

    for (name, text) in [("plain", &plain), ("decorated", &decorated), ("long", &long)] {
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new(name, text.len()), text, |b, text| {
            b.iter(|| sanitize(black_box(text.as_str())));
        });
    }

    group.finish();
}

/// Benchmark pronunciation replacement after sanitizing
fn bench_pronunciations(c: &mut Criterion) {
    let replacer = PronunciationReplacer::new(&[
        Pronunciation::new("cappuccino", "capuchino"),
        Pronunciation::new("latte", "laté"),
        Pronunciation::new("espresso", "expreso"),
        Pronunciation::new("Sucre", "Súcre"),
    ]);
    let text = sanitize("Un cappuccino, un latte y un espresso en Sucre ☕ ".repeat(20).as_str());

    c.bench_function("pronunciations/apply", |b| {
        b.iter(|| replacer.apply(black_box(&text)));
    });
}

criterion_group!(benches, bench_sanitize, bench_pronunciations);
criterion_main!(benches);
