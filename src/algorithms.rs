//! Example pipelines built on the public graph surface.
//!
//! These live outside the engine: they only use builder methods and user
//! callbacks, the way any downstream crate would.

use std::cmp::Ordering;

use rowgraph_core::{Record, Result, Value};
use rowgraph_exec::Graph;
use rowgraph_operators::{GroupStream, Strategy};

const DELIMITERS: &[char] = &[
    ' ', '.', '?', '!', ':', ',', '-', '"', ';', '$', '%', '^', '&', '*', '(', ')', '@', '#', '~',
    '<', '>', '/', '\n', '[', ']',
];

/// Lowercased tokens of a text, split on punctuation and whitespace.
pub fn extract_words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(DELIMITERS)
        .filter(|word| !word.is_empty())
        .map(|word| word.to_lowercase())
}

fn text_of(record: &Record, field: &str) -> String {
    record
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

/// Count word occurrences across all documents.
///
/// Input records carry a text field; output records are
/// `{<text_field>: word, <count_field>: n}` ordered by ascending count.
pub fn word_count_graph(source: &str, text_field: &str, count_field: &str) -> Graph {
    let text = text_field.to_string();
    let count = count_field.to_string();

    let g = Graph::from_source(source).with_name("word_count");
    {
        let text = text.clone();
        let count = count.clone();
        g.map(move |record| {
            Ok(extract_words(&text_of(&record, &text))
                .map(|word| {
                    let mut out = Record::new();
                    out.set(count.clone(), 1);
                    out.set(text.clone(), word);
                    out
                })
                .collect())
        });
    }
    g.sort(text.as_str());
    {
        let key = text.clone();
        let text = text.clone();
        let count = count.clone();
        g.reduce(
            move |group: &mut GroupStream<'_>| {
                let mut word = Value::Null;
                let mut n = 0i64;
                for item in group.by_ref() {
                    let record = item?;
                    word = record.get(&text).cloned().unwrap_or(Value::Null);
                    n += 1;
                }
                let mut out = Record::new();
                out.set(count.clone(), n);
                out.set(text.clone(), word);
                Ok(vec![out])
            },
            key,
        );
    }
    g.sort(count.as_str());
    g
}

/// Inverted index: for each word, the top-3 documents by tf-idf.
pub fn inverted_index_graph(source: &str, doc_field: &str, text_field: &str) -> Graph {
    let doc = doc_field.to_string();
    let text = text_field.to_string();
    let text_left = format!("{text}_left");

    let input = Graph::from_source(source).with_name("tf_idf_input");

    let split_words = Graph::from_graph(&input).with_name("split_words");
    {
        let doc = doc.clone();
        let text = text.clone();
        split_words.map(move |record| {
            let doc_id = record.get(&doc).cloned().unwrap_or(Value::Null);
            Ok(extract_words(&text_of(&record, &text))
                .map(|word| {
                    let mut out = Record::new();
                    out.set(doc.clone(), doc_id.clone());
                    out.set(text.clone(), word);
                    out
                })
                .collect())
        });
    }

    let count_docs = Graph::from_graph(&input).with_name("count_docs");
    {
        let mut initial = Record::new();
        initial.set("docs_count", 0);
        count_docs.fold(
            |mut state: Record, _record: &Record| {
                let n = state.get("docs_count").and_then(Value::as_i64).unwrap_or(0);
                state.set("docs_count", n + 1);
                Ok(state)
            },
            initial,
        );
    }

    // idf per word: ln(total docs / docs containing the word).
    let count_idf = Graph::from_graph(&split_words).with_name("count_idf");
    count_idf.sort([doc.as_str(), text.as_str()]);
    count_idf.reduce(first_of_group, [doc.as_str(), text.as_str()]);
    count_idf.cross_join(&count_docs);
    count_idf.sort(text.as_str());
    {
        let key = text.clone();
        let text = text.clone();
        count_idf.reduce(
            move |group: &mut GroupStream<'_>| {
                let mut docs_count = 0.0;
                let mut word = Value::Null;
                let mut containing = 0.0;
                for item in group.by_ref() {
                    let record = item?;
                    word = record.get(&text).cloned().unwrap_or(Value::Null);
                    docs_count = record
                        .get("docs_count")
                        .and_then(Value::as_f64)
                        .unwrap_or(0.0);
                    containing += 1.0;
                }
                let mut out = Record::new();
                out.set(text.clone(), word);
                out.set("idf", (docs_count / containing).ln());
                Ok(vec![out])
            },
            key,
        );
    }

    // tf per (doc, word): occurrences / words in the doc.
    let calc_index = Graph::from_graph(&split_words).with_name("calc_index");
    calc_index.sort(doc.as_str());
    {
        let key = doc.clone();
        let doc = doc.clone();
        let text = text.clone();
        calc_index.reduce(
            move |group: &mut GroupStream<'_>| {
                let (doc_id, counts, total) = count_group_words(group, &doc, &text)?;
                Ok(counts
                    .into_iter()
                    .map(|(word, n)| {
                        let mut out = Record::new();
                        out.set(doc.clone(), doc_id.clone());
                        out.set(text.clone(), word);
                        out.set("tf", n as f64 / total as f64);
                        out
                    })
                    .collect())
            },
            key,
        );
    }
    calc_index.join(&count_idf, text.as_str(), Strategy::Left);
    calc_index.sort(text_left.as_str());
    {
        let key = text_left.clone();
        let doc = doc.clone();
        let text = text.clone();
        let text_left = text_left.clone();
        calc_index.reduce(
            move |group: &mut GroupStream<'_>| {
                let mut scored = Vec::new();
                for item in group.by_ref() {
                    let record = item?;
                    let tf = record.get("tf").and_then(Value::as_f64).unwrap_or(0.0);
                    let idf = record.get("idf").and_then(Value::as_f64).unwrap_or(0.0);
                    scored.push((tf * idf, record));
                }
                let fields = RankFields {
                    doc: &doc,
                    text: &text,
                    word: &text_left,
                    score: "tf_idf",
                };
                Ok(top_scored(scored, 3, &fields))
            },
            key,
        );
    }
    calc_index
}

/// Pointwise mutual information: for each document, the top-10 words by
/// `ln(freq in doc / freq in corpus)`, keeping words occurring at least
/// twice in the document.
pub fn pmi_graph(source: &str, doc_field: &str, text_field: &str) -> Graph {
    let doc = doc_field.to_string();
    let text = text_field.to_string();
    let text_left = format!("{text}_left");

    let split_words = Graph::from_source(source).with_name("pmi_split_words");
    {
        let doc = doc.clone();
        let text = text.clone();
        split_words.map(move |record| {
            let doc_id = record.get(&doc).cloned().unwrap_or(Value::Null);
            Ok(extract_words(&text_of(&record, &text))
                .map(|word| {
                    let mut out = Record::new();
                    out.set(doc.clone(), doc_id.clone());
                    out.set(text.clone(), word);
                    out
                })
                .collect())
        });
    }

    let count_words_total = Graph::from_graph(&split_words).with_name("count_words_total");
    {
        let mut initial = Record::new();
        initial.set("docs_count", 0);
        count_words_total.fold(
            |mut state: Record, _record: &Record| {
                let n = state.get("docs_count").and_then(Value::as_i64).unwrap_or(0);
                state.set("docs_count", n + 1);
                Ok(state)
            },
            initial,
        );
    }

    // Corpus-wide frequency of each word.
    let denominator = Graph::from_graph(&split_words).with_name("pmi_denominator");
    denominator.sort(text.as_str());
    {
        let key = text.clone();
        let text = text.clone();
        denominator.reduce(
            move |group: &mut GroupStream<'_>| {
                let mut word = Value::Null;
                let mut n = 0i64;
                for item in group.by_ref() {
                    let record = item?;
                    word = record.get(&text).cloned().unwrap_or(Value::Null);
                    n += 1;
                }
                let mut out = Record::new();
                out.set(text.clone(), word);
                out.set("word_count", n);
                Ok(vec![out])
            },
            key,
        );
    }
    denominator.cross_join(&count_words_total);
    {
        let text = text.clone();
        denominator.map(move |record| {
            let word_count = record.get("word_count").and_then(Value::as_f64).unwrap_or(0.0);
            let total = record.get("docs_count").and_then(Value::as_f64).unwrap_or(0.0);
            let mut out = Record::new();
            out.set(text.clone(), record.get(&text).cloned().unwrap_or(Value::Null));
            out.set("dn", word_count / total);
            Ok(vec![out])
        });
    }

    // In-document frequency, keeping words seen at least twice.
    let nominator = Graph::from_graph(&split_words).with_name("pmi_nominator");
    nominator.sort(doc.as_str());
    {
        let key = doc.clone();
        let doc = doc.clone();
        let text = text.clone();
        nominator.reduce(
            move |group: &mut GroupStream<'_>| {
                let (doc_id, counts, total) = count_group_words(group, &doc, &text)?;
                Ok(counts
                    .into_iter()
                    .filter(|(_, n)| *n >= 2)
                    .map(|(word, n)| {
                        let mut out = Record::new();
                        out.set(doc.clone(), doc_id.clone());
                        out.set(text.clone(), word);
                        out.set("no", n as f64 / total as f64);
                        out
                    })
                    .collect())
            },
            key,
        );
    }
    nominator.join(&denominator, text.as_str(), Strategy::Left);
    nominator.sort(doc.as_str());
    {
        let key = doc.clone();
        let doc = doc.clone();
        let text = text.clone();
        let text_left = text_left.clone();
        nominator.reduce(
            move |group: &mut GroupStream<'_>| {
                let mut scored = Vec::new();
                for item in group.by_ref() {
                    let record = item?;
                    let no = record.get("no").and_then(Value::as_f64).unwrap_or(0.0);
                    let dn = record.get("dn").and_then(Value::as_f64).unwrap_or(f64::NAN);
                    scored.push(((no / dn).ln(), record));
                }
                let fields = RankFields {
                    doc: &doc,
                    text: &text,
                    word: &text_left,
                    score: "pmi",
                };
                Ok(top_scored(scored, 10, &fields))
            },
            key,
        );
    }
    nominator
}

/// Reducer keeping only the first record of each group.
fn first_of_group(group: &mut GroupStream<'_>) -> Result<Vec<Record>> {
    let mut first = Vec::new();
    for item in group.by_ref() {
        let record = item?;
        if first.is_empty() {
            first.push(record);
        }
    }
    Ok(first)
}

/// Word counts within one group, plus the group's doc id and total size.
fn count_group_words(
    group: &mut GroupStream<'_>,
    doc_field: &str,
    text_field: &str,
) -> Result<(Value, Vec<(String, i64)>, i64)> {
    let mut doc_id = Value::Null;
    // Insertion-ordered so tie-breaks follow first appearance.
    let mut counts: Vec<(String, i64)> = Vec::new();
    let mut total = 0i64;
    for item in group.by_ref() {
        let record = item?;
        doc_id = record.get(doc_field).cloned().unwrap_or(Value::Null);
        let word = record
            .get(text_field)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        match counts.iter_mut().find(|(w, _)| *w == word) {
            Some((_, n)) => *n += 1,
            None => counts.push((word, 1)),
        }
        total += 1;
    }
    Ok((doc_id, counts, total))
}

/// Fields every ranked output record carries.
struct RankFields<'a> {
    doc: &'a str,
    text: &'a str,
    word: &'a str,
    score: &'a str,
}

/// Keep the top `limit` records by descending score (stable on ties).
fn top_scored(scored: Vec<(f64, Record)>, limit: usize, fields: &RankFields<'_>) -> Vec<Record> {
    let mut scored = scored;
    scored.sort_by(|(x, _), (y, _)| y.partial_cmp(x).unwrap_or(Ordering::Equal));
    scored
        .into_iter()
        .take(limit)
        .map(|(value, record)| {
            let mut out = Record::new();
            out.set(
                fields.text,
                record.get(fields.word).cloned().unwrap_or(Value::Null),
            );
            out.set(
                fields.doc,
                record.get(fields.doc).cloned().unwrap_or(Value::Null),
            );
            out.set(fields.score, value);
            out
        })
        .collect()
}
