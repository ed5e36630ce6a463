use question_forge::{extract_json_payload, normalize_orthography};

#[test]
fn normalize_is_idempotent() {
    let once = normalize_orthography("Die Straße ist groß, das Maß stimmt.");
    assert_eq!(once, "Die Strasse ist gross, das Mass stimmt.");
    assert_eq!(normalize_orthography(&once), once);
}

#[test]
fn normalize_leaves_other_umlauts_alone() {
    assert_eq!(normalize_orthography("Äpfel, Öl, Übung"), "Äpfel, Öl, Übung");
}

#[test]
fn clean_json_is_returned_unchanged() {
    let raw = r#"[{"text": "a", "blanks": ["a"]}]"#;
    assert_eq!(extract_json_payload(raw), raw);
}

#[test]
fn json_fence_is_stripped() {
    assert_eq!(extract_json_payload("```json\n[1,2]\n```"), "[1,2]");
}

#[test]
fn untagged_fence_is_stripped() {
    assert_eq!(extract_json_payload("```\n[\"x\"]\n```  "), "[\"x\"]");
}

#[test]
fn prose_around_an_array_is_dropped() {
    let raw = "Hier sind die Fragen:\n[{\"text\": \"t\"}]\nViel Erfolg!";
    assert_eq!(extract_json_payload(raw), "[{\"text\": \"t\"}]");
}

#[test]
fn object_is_used_when_no_array_exists() {
    let raw = "Result: {\"text\": \"t\", \"blanks\": []} done";
    // the inner [] is an array candidate, so the object only wins without brackets
    assert_eq!(extract_json_payload(raw), "[]");
    assert_eq!(extract_json_payload("Result: {\"a\": 1} done"), "{\"a\": 1}");
}

#[test]
fn text_without_brackets_is_returned_trimmed() {
    assert_eq!(extract_json_payload("  no json here \n"), "no json here");
}

#[test]
fn nested_arrays_are_kept_whole() {
    let raw = "[[1], [2]] trailing";
    assert_eq!(extract_json_payload(raw), "[[1], [2]]");
}
