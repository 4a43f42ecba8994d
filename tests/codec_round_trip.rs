mod common;

use awc_backend::codec::{
    import_challenge_from_text, parse_challenge_text, render_challenge_text, ChallengeFields, Dialect, ImportOutcome,
    RequirementFields, RequirementSet, LEGEND,
};
use awc_backend::domain::{Category, Challenge, Completion, LinkedItem, Mode, Progress, Requirement};
use awc_backend::error::ParseError;
use awc_backend::store::{ChallengeStore, MemoryStore};

use common::{tier_challenge, ROMANCE_TEMPLATE};

fn filled_fields() -> ChallengeFields {
    ChallengeFields {
        start: Some("01/02/2020".into()),
        finish: Some("DD/MM/YYYY".into()),
        extra: Some("Thanks for hosting!".into()),
        requirements: vec![
            RequirementFields {
                number: 1,
                completed: Some(Completion::Completed),
                start: Some("01/02/2020".into()),
                finish: Some("2/25/2020".into()),
                anime: LinkedItem::from_link("Cowboy Bebop", "https://anilist.co/anime/1/"),
                extra: Some("rewatch".into()),
                ..Default::default()
            },
            RequirementFields {
                number: 2,
                extra: Some("Female lead: Holo\nLoved it".into()),
                ..Default::default()
            },
        ],
        ..Default::default()
    }
}

#[test]
fn tier_code_has_two_requirement_lines_and_no_headers() {
    let (challenge, defs) = tier_challenge();
    let mut fields = ChallengeFields::default();
    // Drop the default extra so each requirement stays on one line.
    fields.requirements.push(RequirementFields { number: 2, extra: Some(String::new()), ..Default::default() });
    let text = render_challenge_text(&challenge, &[], &defs, &fields, Dialect::Legacy);

    let lines: Vec<&str> = text.lines().collect();
    let legend = lines.iter().position(|l| *l == LEGEND).unwrap();
    let block = &lines[legend + 2..];
    assert_eq!(block.len(), 2);
    assert!(block[0].starts_with("01) [O]"));
    assert!(block[1].starts_with("02) [O]"));
    assert!(!text.contains("__Mode:"));
    assert!(!text.contains("__Bonus__"));

    let parsed = parse_challenge_text(&text, &challenge, &defs).unwrap();
    let summary: Vec<(String, Mode, bool, Completion)> = parsed
        .requirements
        .iter()
        .map(|r| (r.number.clone(), r.mode, r.bonus, r.tracked().unwrap().completed))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("01".to_string(), Mode::Default, false, Completion::NotCompleted),
            ("02".to_string(), Mode::Default, false, Completion::NotCompleted),
        ]
    );
}

#[test]
fn current_dialect_round_trip_is_stable() {
    let (challenge, defs) = tier_challenge();
    let first = render_challenge_text(&challenge, &[], &defs, &filled_fields(), Dialect::Current);
    let parsed = parse_challenge_text(&first, &challenge, &defs).unwrap();

    assert_eq!(parsed.start, "2020-02-01");
    assert_eq!(parsed.extra, "Thanks for hosting!");
    let one = parsed.requirements[0].tracked().unwrap();
    assert_eq!(one.finish, "2020-02-25");
    assert_eq!(one.anime.id, 1);
    assert_eq!(one.extra, "rewatch");
    let two = parsed.requirements[1].tracked().unwrap();
    assert_eq!(two.extra, "Female lead: Holo\nLoved it");
    assert_eq!(two.anime, LinkedItem::placeholder());

    let second = render_challenge_text(&challenge, &[], &defs, &ChallengeFields::from_parsed(&parsed), Dialect::Current);
    assert_eq!(second, first);
    assert_eq!(parse_challenge_text(&second, &challenge, &defs).unwrap(), parsed);
}

#[test]
fn legacy_round_trip_is_stable() {
    let (challenge, defs) = tier_challenge();
    let first = render_challenge_text(&challenge, &[], &defs, &filled_fields(), Dialect::Legacy);
    let parsed = parse_challenge_text(&first, &challenge, &defs).unwrap();
    let second = render_challenge_text(&challenge, &[], &defs, &ChallengeFields::from_parsed(&parsed), Dialect::Legacy);
    assert_eq!(second, first);
}

#[test]
fn hard_only_genre_comment_round_trips() {
    let challenge = Challenge::new("Sports Challenge", 6000, Category::Genre);
    let mut row = Requirement::new(challenge.id, 1, Mode::Hard, false);
    row.text = "Watch a sports anime with 50+ episodes".into();
    let defs = RequirementSet::Stored(vec![row]);

    let comment = "# __Sports Challenge__\n\nChallenge Start Date: 2020-01-01\nChallenge Finish Date: DD/MM/YYYY\nLegend: [X] = Completed [O] = Not Completed\n\n<hr>\n\n__Mode: Hard__\n\n01) [X] __Watch a sports anime with 50+ episodes__\n[Haikyuu!!](https://anilist.co/anime/20464/)\nStart: 2020-01-01 Finish: 2020-01-20";
    let parsed = parse_challenge_text(comment, &challenge, &defs).unwrap();
    assert_eq!(parsed.requirements.len(), 1);
    assert_eq!(parsed.requirements[0].mode, Mode::Hard);

    let rendered = render_challenge_text(&challenge, &[], &defs, &ChallengeFields::from_parsed(&parsed), Dialect::Current);
    assert_eq!(rendered, comment);
    for header in ["__Mode: Easy__", "__Mode: Normal__", "__Bonus__", "__Misc__"] {
        assert!(!rendered.contains(header));
    }
}

#[test]
fn raw_requirement_passes_through_both_directions() {
    let challenge = Challenge::new("Rotating Picks", 7000, Category::Special);
    let mut raw = Requirement::new(challenge.id, 1, Mode::Default, false);
    raw.force_raw_edit = true;
    raw.raw_requirement = Some("01) [O] Pick any show airing this season\nCurrently: ???".into());
    let defs = RequirementSet::Stored(vec![raw]);

    let text = render_challenge_text(&challenge, &[], &defs, &ChallengeFields::default(), Dialect::Current);
    assert!(text.contains("01) [O] Pick any show airing this season\nCurrently: ???"));

    let edited = text.replace("Currently: ???", "Currently: Mob Psycho 100 [sic]");
    let parsed = parse_challenge_text(&edited, &challenge, &defs).unwrap();
    assert_eq!(
        parsed.requirements[0].progress,
        Progress::Raw { raw_requirement: "01) [O] Pick any show airing this season\nCurrently: Mob Psycho 100 [sic]".into() }
    );
    let again = render_challenge_text(&challenge, &[], &defs, &ChallengeFields::from_parsed(&parsed), Dialect::Current);
    assert_eq!(again, edited);
}

#[test]
fn failures_return_the_comment_untouched() {
    let (challenge, defs) = tier_challenge();
    let text = render_challenge_text(&challenge, &[], &defs, &filled_fields(), Dialect::Current);

    let no_legend = text.replace(LEGEND, "");
    let failure = parse_challenge_text(&no_legend, &challenge, &defs).unwrap_err();
    assert_eq!(failure.comment, no_legend);

    let unknown = text.replace("02) [O]", "09) [O]");
    let failure = parse_challenge_text(&unknown, &challenge, &defs).unwrap_err();
    assert!(matches!(failure.error, ParseError::UnknownRequirement { number: 9, bonus: false, .. }));
    assert_eq!(failure.comment, unknown);

    let bad_date = text.replace("Start: 2020-02-01 Finish: 2020-02-25", "Start: someday Finish: 2020-02-25");
    let failure = parse_challenge_text(&bad_date, &challenge, &defs).unwrap_err();
    assert!(matches!(failure.error, ParseError::Structural { expected: "date", .. }));
}

#[test]
fn up_to_date_marker_needs_permission() {
    let (mut challenge, defs) = tier_challenge();
    let text = render_challenge_text(&challenge, &[], &defs, &ChallengeFields::default(), Dialect::Current)
        .replace("01) [O]", "01) [U]");
    assert!(parse_challenge_text(&text, &challenge, &defs).is_err());

    challenge.allows_up_to_date = true;
    let text = text.replace(LEGEND, "Legend: [X] = Completed [O] = Not Completed [U] = Up-to-date");
    let parsed = parse_challenge_text(&text, &challenge, &defs).unwrap();
    assert_eq!(parsed.requirements[0].tracked().unwrap().completed, Completion::UpToDate);
}

#[test]
fn imported_template_decodes_and_re_encodes() {
    let mut store = MemoryStore::new();
    let outcome = import_challenge_from_text(&mut store, ROMANCE_TEMPLATE, 5000, Category::Genre).unwrap();
    let ImportOutcome::Created { challenge, requirements } = outcome else { panic!("expected a new challenge") };
    assert!(challenge.allows_up_to_date);
    assert_eq!(challenge.extra, "Have fun!");
    let modes: Vec<(u32, bool, Mode)> = requirements.iter().map(|r| (r.number, r.bonus, r.mode)).collect();
    assert_eq!(modes, vec![(1, false, Mode::Easy), (2, false, Mode::Hard), (1, true, Mode::Bonus)]);

    let defs = RequirementSet::for_challenge(&challenge, || store.requirements(challenge.id));
    let parsed = parse_challenge_text(ROMANCE_TEMPLATE, &challenge, &defs).unwrap();
    assert_eq!(parsed.requirements.len(), 3);
    assert_eq!(parsed.requirements[1].tracked().unwrap().anime.title, "Toradora!");

    let rendered = render_challenge_text(&challenge, &[], &defs, &ChallengeFields::from_parsed(&parsed), Dialect::Current);
    assert_eq!(rendered, ROMANCE_TEMPLATE);
}

#[test]
fn classic_template_uses_mock_definitions() {
    let challenge = Challenge::new("Classic Challenge 2017", 8000, Category::Classic);
    let defs = RequirementSet::for_challenge(&challenge, Vec::new);
    let text = render_challenge_text(&challenge, &[], &defs, &ChallengeFields::default(), Dialect::Current);
    assert!(text.contains("__Winter 2017__\n\n01) [O]"));
    assert!(text.contains("__Fall 2017__\n\n31) [O]"));

    let parsed = parse_challenge_text(&text, &challenge, &defs).unwrap();
    assert_eq!(parsed.requirements.len(), 40);
    assert!(parsed.requirements.iter().all(|r| r.mode == Mode::Default));
    assert_eq!(parsed.requirements[39].number, "40");
}

#[test]
fn legacy_raw_line_does_not_swallow_the_next_requirement() {
    let (challenge, _) = tier_challenge();
    let mut raw = Requirement::new(challenge.id, 1, Mode::Default, false);
    raw.force_raw_edit = true;
    raw.raw_requirement = Some("01) Pick any show airing this season".into());
    let mut normal = Requirement::new(challenge.id, 2, Mode::Default, false);
    normal.text = "Watch an anime with a female lead".into();
    let defs = RequirementSet::Stored(vec![raw, normal]);

    let first = render_challenge_text(&challenge, &[], &defs, &ChallengeFields::default(), Dialect::Legacy);
    let parsed = parse_challenge_text(&first, &challenge, &defs).unwrap();
    assert_eq!(parsed.requirements.len(), 2);
    assert_eq!(
        parsed.requirements[0].progress,
        Progress::Raw { raw_requirement: "01) Pick any show airing this season".into() }
    );
    assert_eq!(parsed.requirements[1].tracked().unwrap().completed, Completion::NotCompleted);

    let second = render_challenge_text(&challenge, &[], &defs, &ChallengeFields::from_parsed(&parsed), Dialect::Legacy);
    assert_eq!(second, first);
}

#[test]
fn current_inline_and_continuation_extra_round_trip() {
    let (challenge, defs) = tier_challenge();
    let mut fields = ChallengeFields::default();
    fields.requirements.push(RequirementFields {
        number: 1,
        extra: Some("fun\n~!img(https://imgur.com/x.png)!~".into()),
        ..Default::default()
    });
    let first = render_challenge_text(&challenge, &[], &defs, &fields, Dialect::Current);
    let parsed = parse_challenge_text(&first, &challenge, &defs).unwrap();
    assert_eq!(parsed.requirements[0].tracked().unwrap().extra, "fun\n~!img(https://imgur.com/x.png)!~");

    let second = render_challenge_text(&challenge, &[], &defs, &ChallengeFields::from_parsed(&parsed), Dialect::Current);
    assert_eq!(second, first);
    assert_eq!(parse_challenge_text(&second, &challenge, &defs).unwrap(), parsed);
}

#[test]
fn digit_led_extra_line_round_trips() {
    let (challenge, defs) = tier_challenge();
    let mut fields = ChallengeFields::default();
    fields.requirements.push(RequirementFields {
        number: 2,
        extra: Some("12 episodes watched".into()),
        ..Default::default()
    });
    for dialect in [Dialect::Legacy, Dialect::Current] {
        let first = render_challenge_text(&challenge, &[], &defs, &fields, dialect);
        let parsed = parse_challenge_text(&first, &challenge, &defs).unwrap();
        assert_eq!(parsed.requirements.len(), 2);
        assert_eq!(parsed.requirements[1].tracked().unwrap().extra, "12 episodes watched");
        let second = render_challenge_text(&challenge, &[], &defs, &ChallengeFields::from_parsed(&parsed), dialect);
        assert_eq!(second, first);
    }
}

#[test]
fn imported_legacy_block_with_unreadable_line_round_trips() {
    let mut store = MemoryStore::new();
    let template = "# __Movie Challenge__\n\nChallenge Start Date: DD/MM/YYYY\nChallenge Finish Date: DD/MM/YYYY\nLegend: [X] = Completed [O] = Not Completed\n\n01) [O] Start: DD/MM/YYYY Finish: DD/MM/YYYY __Watch a movie__ [Anime Title](https://anilist.co/anime/00000/)\n02) Pick one from the list in the thread\n03) [O] Start: DD/MM/YYYY Finish: DD/MM/YYYY __Watch a short__ [Anime Title](https://anilist.co/anime/00000/)";
    let outcome = import_challenge_from_text(&mut store, template, 6000, Category::Collection).unwrap();
    let challenge = outcome.challenge().clone();
    let defs = RequirementSet::Stored(store.requirements(challenge.id));
    assert_eq!(defs.len(), 3);

    let text = render_challenge_text(&challenge, &[], &defs, &ChallengeFields::default(), Dialect::Legacy);
    assert_eq!(text, template);
    let parsed = parse_challenge_text(&text, &challenge, &defs).unwrap();
    let numbers: Vec<&str> = parsed.requirements.iter().map(|r| r.number.as_str()).collect();
    assert_eq!(numbers, vec!["01", "02", "03"]);
    assert!(matches!(parsed.requirements[1].progress, Progress::Raw { .. }));
}
