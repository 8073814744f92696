use marginalia_engine::{
    Document, LiveEntry, MatchStrategy, Proposal, RawProposal, RecreationMethod, SuggestionEngine,
    SuggestionId, Transaction, group_overlaps,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn live_originals(engine: &SuggestionEngine) -> Vec<String> {
    engine.state().suggestions().map(|s| s.original.clone()).collect()
}

#[test]
fn scenario_a_literal_proposal_spans_its_substring() {
    // Given a one-paragraph manuscript
    let mut engine = SuggestionEngine::new(Document::from_text(
        "The wind was blowing very hard through her hair.",
    ));

    // When a text-only proposal arrives
    let raw: RawProposal =
        serde_json::from_str(r#"{"original":"was blowing very hard","suggestion":"howled"}"#).unwrap();
    let report = engine.set_suggestions([raw]);

    // Then exactly one live suggestion spans that substring
    assert!(report.skipped.is_empty());
    assert_eq!(live_originals(&engine), vec!["was blowing very hard"]);
    let suggestion = engine.state().suggestions().next().unwrap();
    let text = marginalia_engine::mapping::text_between(engine.document(), suggestion.from, suggestion.to);
    assert_eq!(text.as_deref(), Some("was blowing very hard"));
    assert_eq!(engine.decorations().len(), 1);
}

#[test]
fn scenario_b_overlapping_spans_form_one_group() {
    let mut engine = SuggestionEngine::new(Document::from_text(
        "A sentence that is comfortably longer than twenty-five characters.",
    ));
    engine.set_suggestions([
        Proposal::at_positions(10, 20, "", "first"),
        Proposal::at_positions(15, 25, "", "second"),
    ]);

    let entries = group_overlaps(engine.state().suggestions().cloned().collect());
    let [LiveEntry::Conflict(group)] = entries.as_slice() else {
        panic!("expected a single conflict group, got {entries:?}");
    };
    assert_eq!((group.from, group.to), (10, 25));
    assert_eq!(group.members.len(), 2);
    assert_eq!(engine.state().entries(), entries.as_slice());
}

#[test]
fn scenario_c_accept_replaces_the_span() {
    let mut engine = SuggestionEngine::new(Document::from_text(
        "She read the letter twice and felt very sad about the news.",
    ));
    engine.set_suggestions([Proposal::at_offsets(40, 43, "sad", "heartbroken").with_id("sad")]);

    let patch = engine.accept_suggestion(&SuggestionId::from("sad"));

    assert!(patch.is_some());
    assert_eq!(
        engine.document().to_text(),
        "She read the letter twice and felt very heartbroken about the news."
    );
    assert_eq!(engine.document().slice((40..51).into()).as_deref(), Some("heartbroken"));
    assert!(engine.state().get(&SuggestionId::from("sad")).is_none());
}

#[test]
fn scenario_d_verbatim_text_is_recreated() {
    let mut engine = SuggestionEngine::new(Document::from_text(
        "We pushed a quick fix late on Friday.\n\nNobody noticed until Monday.",
    ));
    engine.set_suggestions([Proposal::literal("Monday", "Tuesday").with_id("day")]);

    let report = engine.reconcile(&[Proposal::literal("quick fix", "rapid fix")]);

    assert_eq!(report.recreated.len(), 1);
    assert_eq!(report.recreated[0].method, RecreationMethod::NormalizedExact);
    assert!(report.errors.is_empty());
    assert!(report.matched.is_empty());
    assert!(!report.orphaned.iter().any(|id| id == &report.recreated[0].suggestion.id));
    assert!(live_originals(&engine).contains(&"quick fix".to_string()));
}

#[test]
fn edited_spans_still_match_their_live_content_by_fingerprint() {
    // Given a suggestion whose span is typed into
    let mut engine = SuggestionEngine::new(Document::from_text(
        "The wind was blowing very hard through her hair.",
    ));
    engine.set_suggestions([Proposal::literal("very hard", "fiercely")]);
    engine.apply_transaction(&Transaction::new().insert(24, "X")).unwrap();
    assert_eq!(live_originals(&engine), vec!["veXry hard".to_string()]);

    // When the host asks about the content now on screen
    let result = engine
        .find_match(&Proposal::literal("veXry hard", "fiercely"))
        .unwrap();

    // Then it is the strongest content match
    assert_eq!(result.strategy, MatchStrategy::Fingerprint);
    assert!(result.confidence >= 0.95);
}

#[test]
fn collapsed_suggestions_are_never_reported_as_matched() {
    // Given a suggestion whose text was deleted out from under it
    let mut engine = SuggestionEngine::new(Document::from_text(
        "We shipped a quick fix on Friday.\n\nThe storm, however, kept raging all night.",
    ));
    engine.set_suggestions([Proposal::literal("quick fix", "rapid fix").with_id("fix")]);
    engine.apply_transaction(&Transaction::new().delete(14, 23)).unwrap();
    let collapsed = engine.state().get(&SuggestionId::from("fix")).unwrap();
    assert!(collapsed.is_degenerate());

    // When the same item comes back from upstream
    let report = engine.reconcile(&[Proposal::literal("quick fix", "rapid fix")]);

    // Then the dead suggestion is not claimed and the text cannot be found
    assert!(report.matched.is_empty());
    assert!(report.recreated.is_empty());
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.orphaned, vec![SuggestionId::from("fix")]);
}

#[rstest]
#[case::first_member("a", "The wind was blowing howled.")]
#[case::second_member("b", "The wind was blowing very fiercely.")]
fn accepting_any_group_member_discards_the_rest(#[case] accept: &str, #[case] expected: &str) {
    let mut engine = SuggestionEngine::new(Document::from_text("The wind was blowing very hard."));
    engine.set_suggestions([
        Proposal::literal("very hard", "howled").with_id("a"),
        Proposal::literal("hard", "fiercely").with_id("b"),
    ]);
    assert_eq!(engine.state().entries().len(), 1);

    engine.accept_suggestion(&SuggestionId::from(accept)).unwrap();

    assert_eq!(engine.document().flat_text(), expected);
    assert!(engine.state().is_empty());
    assert!(engine.decorations().is_empty());
}

#[rstest]
#[case::unknown("missing")]
#[case::already_accepted("a")]
fn stale_accepts_are_noops(#[case] id: &str) {
    let mut engine = SuggestionEngine::new(Document::from_text("One two three."));
    engine.set_suggestions([Proposal::literal("two", "2").with_id("a")]);
    engine.accept_suggestion(&SuggestionId::from("a"));
    let before = engine.snapshot();

    assert!(engine.accept_suggestion(&SuggestionId::from(id)).is_none());
    assert_eq!(engine.snapshot(), before);
}

#[test]
fn suggestions_follow_edits_across_paragraph_splits() {
    let mut engine = SuggestionEngine::new(Document::from_text("Intro text. The old harbour slept."));
    engine.set_suggestions([Proposal::literal("old harbour", "harbour").with_id("h")]);

    // split the paragraph after "Intro text."
    engine
        .apply_transaction(&Transaction::new().replace(12, 13, "\n\n"))
        .unwrap();

    assert_eq!(engine.document().block_count(), 2);
    let moved = engine.state().get(&SuggestionId::from("h")).unwrap();
    assert_eq!(moved.original, "old harbour");
    engine.accept_suggestion(&SuggestionId::from("h")).unwrap();
    assert_eq!(engine.document().to_text(), "Intro text.\n\nThe harbour slept.");
}
