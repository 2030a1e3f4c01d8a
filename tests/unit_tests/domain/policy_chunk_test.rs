use policy_chat::domain::PolicyChunk;

#[test]
fn given_conventional_file_name_when_parsing_then_chunk_and_policy_name_are_derived() {
    let chunk = PolicyChunk::from_file(
        "ch1-academic_credit_policy-len477.txt",
        "Credits transfer when...".to_string(),
        0,
    );

    assert_eq!(chunk.chunk, "ch1");
    assert_eq!(chunk.policy_name, "academic credit policy");
    assert_eq!(chunk.source, "ch1-academic_credit_policy-len477.txt");
    assert_eq!(chunk.id, "ch1-academic_credit_policy-len477_0");
    assert_eq!(chunk.text, "Credits transfer when...");
}

#[test]
fn given_name_without_length_suffix_when_parsing_then_rest_is_policy_name() {
    let chunk = PolicyChunk::from_file("ch7-parking_rules.txt", String::new(), 3);

    assert_eq!(chunk.chunk, "ch7");
    assert_eq!(chunk.policy_name, "parking rules");
    assert_eq!(chunk.id, "ch7-parking_rules_3");
}

#[test]
fn given_name_without_dash_when_parsing_then_stem_is_chunk_and_policy_name() {
    let chunk = PolicyChunk::from_file("student_handbook.txt", String::new(), 12);

    assert_eq!(chunk.chunk, "student_handbook");
    assert_eq!(chunk.policy_name, "student handbook");
    assert_eq!(chunk.id, "student_handbook_12");
}
