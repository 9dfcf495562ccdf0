use crate::model::VectorModel;
use crate::query::{Query, QueryTerm};

/// Best replacement for one query term: the candidate maximizing
/// `affinity * word_relevance`, first seen wins ties.
fn best_candidate<'a>(term: &'a QueryTerm, model: &VectorModel) -> &'a str {
    let mut best: Option<(&str, f64)> = None;
    for (candidate, affinity) in &term.suggestions {
        let score = affinity * model.word_relevance(candidate);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((candidate.as_str(), score)),
        }
    }
    best.map(|(word, _)| word).unwrap_or(term.text.as_str())
}

/// "Did you mean": every query term replaced by its best candidate, in query order.
pub fn suggest(query: &Query, model: &VectorModel) -> String {
    query
        .terms
        .iter()
        .map(|t| best_candidate(t, model))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::InvertedIndex;
    use crate::source::{DocumentSource, FixtureSource};
    use crate::stemmer::StemCache;
    use crate::synonyms::Synonyms;

    fn setup(text: &str) -> (Query, VectorModel) {
        let idx = InvertedIndex::build(
            FixtureSource::new(vec![
                ("d0", "el gato negro duerme en la casa"),
                ("d1", "el perro ladra"),
                ("d2", "el pez nada en la pecera"),
            ])
            .load()
            .unwrap(),
        );
        let model = VectorModel::build(&idx);
        (Query::new(text, &idx, &StemCache::new(), &Synonyms::empty()), model)
    }

    #[test]
    fn misspelling_is_replaced() {
        let (q, model) = setup("gatto");
        assert_eq!(suggest(&q, &model), "gato");
    }

    #[test]
    fn keeps_query_order() {
        let (q, model) = setup("perro gatto");
        assert_eq!(suggest(&q, &model), "perro gato");
        let (q, model) = setup("gatto perro");
        assert_eq!(suggest(&q, &model), "gato perro");
    }

    #[test]
    fn unknown_terms_are_kept() {
        let (q, model) = setup("zzzz gato");
        assert_eq!(suggest(&q, &model), "zzzz gato");
    }

    #[test]
    fn empty_query_suggests_nothing() {
        let (q, model) = setup("");
        assert_eq!(suggest(&q, &model), "");
    }
}
