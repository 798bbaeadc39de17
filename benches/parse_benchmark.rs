//! Benchmark for rules text compilation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lore_engine::core::{Card, CardType};
use lore_engine::parser::{parse_card, parse_text};

const SAMPLES: &[(&str, &str)] = &[
    ("draw", "When you play this character, draw a card."),
    ("double_trigger", "When you play this character and whenever he quests, gain 1 lore."),
    ("conditional", "If you have 2 or more other characters in play, gain 2 lore. Otherwise, draw a card."),
    ("filtered_target", "Banish chosen opposing character with cost 3 or less."),
    (
        "look_at_top",
        "Look at the top 3 cards of your deck. Put one into your hand and the rest on the bottom of your deck in any order.",
    ),
    ("choose_one", "Choose one: - Draw a card. - Gain 2 lore."),
    ("static", "Your Pirate characters get +1 strength."),
    ("activated", "{E}, 4 {I} - Draw a card."),
];

fn bench_parse_single(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_text");

    for (label, text) in SAMPLES {
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(label), text, |b, text| {
            b.iter(|| {
                let result = parse_text(black_box("Benchmark Card"), black_box(text));
                black_box(result)
            });
        });
    }

    group.finish();
}

fn bench_parse_catalog(c: &mut Criterion) {
    let cards: Vec<Card> = SAMPLES
        .iter()
        .enumerate()
        .map(|(i, (_, text))| {
            Card::new(format!("B-{i}"), "Benchmark Card", CardType::Character, 3)
                .with_stats(2, 3, 1)
                .with_text(*text)
        })
        .collect();

    let mut group = c.benchmark_group("parse_catalog");
    group.throughput(Throughput::Elements(cards.len() as u64));
    group.bench_function("all_samples", |b| {
        b.iter(|| {
            let total: usize = cards.iter().map(|card| parse_card(black_box(card)).len()).sum();
            black_box(total)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_parse_single, bench_parse_catalog);
criterion_main!(benches);
