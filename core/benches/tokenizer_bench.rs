use criterion::{criterion_group, criterion_main, Criterion};
use lexis::stemmer::{stem_uncached, StemCache};
use lexis::tokenizer::tokenize;

const TEXT: &str = "En un lugar de la Mancha, de cuyo nombre no quiero acordarme, no ha mucho \
tiempo que vivía un hidalgo de los de lanza en astillero, adarga antigua, rocín flaco y galgo \
corredor. Una olla de algo más vaca que carnero, salpicón las más noches, duelos y quebrantos \
los sábados, lantejas los viernes, algún palomino de añadidura los domingos, consumían las tres \
partes de su hacienda.";

fn bench_tokenize(c: &mut Criterion) {
    let text = TEXT.repeat(50);
    c.bench_function("tokenize_quijote", |b| b.iter(|| tokenize(&text)));
}

fn bench_stem(c: &mut Criterion) {
    let words: Vec<String> = tokenize(TEXT).into_iter().map(|(w, _)| w).collect();
    c.bench_function("stem_uncached", |b| {
        b.iter(|| words.iter().map(|w| stem_uncached(w)).collect::<Vec<_>>())
    });
    let cache = StemCache::new();
    c.bench_function("stem_memoized", |b| {
        b.iter(|| words.iter().map(|w| cache.stem(w)).collect::<Vec<_>>())
    });
}

criterion_group!(benches, bench_tokenize, bench_stem);
criterion_main!(benches);
