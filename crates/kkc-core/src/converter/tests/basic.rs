use crate::converter::testutil::{test_dict, test_model, CountingModel};
use crate::converter::{convert, ConvertError, ConvertOptions, Segment};
use std::sync::Arc;

use crate::dict::{CompositeDictionary, CompressedDictionary, Dictionary};
use crate::lm::{InMemorySystemModel, NoUserModel};

fn best_surfaces(segments: &[Segment]) -> Vec<&str> {
    segments.iter().map(|s| s.best().surface.raw()).collect()
}

fn run(dict: &CompressedDictionary, kana: &str) -> Vec<Segment> {
    convert(dict, &NoUserModel, &test_model(), kana, &ConvertOptions::default()).unwrap()
}

#[test]
fn test_convert_sentence() {
    let dict = test_dict();
    let result = run(&dict, "わたしのなまえはなかのです。");
    assert_eq!(
        best_surfaces(&result),
        vec!["私", "の", "名前", "は", "中野", "です", "。"]
    );
    let joined: String = best_surfaces(&result).concat();
    assert_eq!(joined, "私の名前は中野です。");

    let readings: Vec<&str> = result.iter().map(|s| s.reading.as_str()).collect();
    assert_eq!(readings, vec!["わたし", "の", "なまえ", "は", "なかの", "です", "。"]);
}

#[test]
fn test_segments_tile_input() {
    let dict = test_dict();
    let result = run(&dict, "わたしのなまえはなかのです。");
    let mut pos = 0;
    for seg in &result {
        assert_eq!(seg.start, pos);
        assert_eq!(seg.end, pos + seg.reading.chars().count());
        pos = seg.end;
    }
    assert_eq!(pos, 14);
}

#[test]
fn test_convert_empty() {
    let dict = test_dict();
    assert!(run(&dict, "").is_empty());
}

#[test]
fn test_convert_single_word() {
    let dict = test_dict();
    let result = run(&dict, "きょう");
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].reading, "きょう");
    let surfaces: Vec<&str> = result[0].candidates.iter().map(|c| c.surface.raw()).collect();
    assert_eq!(surfaces, vec!["今日", "京", "きょう", "キョウ"]);
}

#[test]
fn test_convert_unknown_chars() {
    let dict = test_dict();
    let result = run(&dict, "ぬぬ");
    assert_eq!(best_surfaces(&result), vec!["ぬ", "ぬ"]);
}

#[test]
fn test_convert_non_kana_input() {
    let dict = test_dict();
    let result = run(&dict, "abc");
    assert_eq!(best_surfaces(&result), vec!["a", "b", "c"]);
    assert!(result.iter().all(|s| s.candidates.len() == 1));
}

#[test]
fn test_tiebreak_first_candidate() {
    let dict = CompressedDictionary::build(vec![("あ", vec!["亜", "阿"])]).unwrap();
    let model = InMemorySystemModel::builder().build();
    for _ in 0..10 {
        let result =
            convert(&dict, &NoUserModel, &model, "あ", &ConvertOptions::default()).unwrap();
        assert_eq!(result[0].best().surface.raw(), "亜");
    }
}

#[test]
fn test_unknown_kanji_preferred_over_kana() {
    // Neither spelling is modelled; the shorter surface gets the lower fallback.
    let dict = CompressedDictionary::build(vec![("がくせい", vec!["がくせい", "学生"])]).unwrap();
    let model = InMemorySystemModel::builder().defaults(20.0, 19.0, 20.0).build();
    let result =
        convert(&dict, &NoUserModel, &model, "がくせい", &ConvertOptions::default()).unwrap();
    assert_eq!(best_surfaces(&result), vec!["学生"]);
    assert_eq!(result[0].best().cost, 19.0);
    assert_eq!(result[0].candidates[1].surface.raw(), "がくせい");
    assert_eq!(result[0].candidates[1].cost, 20.0);
}

#[test]
fn test_expression_candidate_kept_raw() {
    let dict = CompressedDictionary::build(vec![("きょう", vec!["(today)", "今日"])]).unwrap();
    let model = InMemorySystemModel::builder()
        .unigram("(today)/きょう", 1.0)
        .build();
    let result =
        convert(&dict, &NoUserModel, &model, "きょう", &ConvertOptions::default()).unwrap();
    let best = &result[0].best().surface;
    assert!(best.is_expression());
    assert_eq!(best.raw(), "(today)");
}

#[test]
fn test_bigram_lookups_bounded_by_edges() {
    let dict = test_dict();
    let model = CountingModel::new(test_model());
    let kana = "わたしのなまえはなかのです";
    convert(&dict, &NoUserModel, &model, kana, &ConvertOptions::default()).unwrap();
    let first = model.bigram_calls();
    assert!(first > 0);

    // Caches live in the lattice, so a second conversion asks again, and
    // asks exactly as often.
    convert(&dict, &NoUserModel, &model, kana, &ConvertOptions::default()).unwrap();
    assert_eq!(model.bigram_calls(), 2 * first);
}

#[test]
fn test_clauses_fix_segmentation() {
    let dict = test_dict();
    let options = ConvertOptions {
        clauses: Some(vec![0..2, 2..3, 3..5]),
    };
    let result = convert(&dict, &NoUserModel, &test_model(), "なかのです", &options).unwrap();
    assert_eq!(best_surfaces(&result), vec!["中", "の", "です"]);
    let surfaces: Vec<&str> = result[0].candidates.iter().map(|c| c.surface.raw()).collect();
    assert_eq!(surfaces, vec!["中", "仲", "なか", "ナカ"]);
}

#[test]
fn test_invalid_clauses_rejected() {
    let dict = test_dict();
    let options = ConvertOptions {
        clauses: Some(vec![0..2, 3..5]),
    };
    let err = convert(&dict, &NoUserModel, &test_model(), "なかのです", &options).unwrap_err();
    assert!(matches!(err, ConvertError::InvalidClauses(_)));
}

#[test]
fn test_convert_is_deterministic() {
    let dict = test_dict();
    let a = run(&dict, "わたしのなまえはなかのです。");
    let b = run(&dict, "わたしのなまえはなかのです。");
    assert_eq!(a, b);
}

#[test]
fn test_convert_over_layered_dictionaries() {
    let system: Arc<dyn Dictionary> = Arc::new(test_dict());
    let kanji: Arc<dyn Dictionary> = Arc::new(
        CompressedDictionary::build(vec![("ぬ", vec!["奴"]), ("な", vec!["名", "奈"])]).unwrap(),
    );
    let dict = CompositeDictionary::new(vec![system, kanji]);
    let model = test_model();
    let result =
        convert(&dict, &NoUserModel, &model, "ぬな", &ConvertOptions::default()).unwrap();
    assert_eq!(result.len(), 2);
    let na: Vec<&str> = result[1].candidates.iter().map(|c| c.surface.raw()).collect();
    // Both layers, then the reading and its katakana. 奈 and な tie on the
    // fallback cost and keep lattice order.
    assert_eq!(na, vec!["名", "菜", "奈", "な", "ナ"]);
}
