use aggmetrics::{parse_many, MetricTag};

#[test]
fn scenario_six_parses_exactly_five_tags() {
    let tags = parse_many("env:dev, ver:5 ,, ,mark,note:,foo:bar").unwrap();
    assert_eq!(tags.len(), 5);
    assert_eq!(tags[0].name(), "env");
    assert_eq!(tags[0].value(), Some("dev"));
    assert_eq!(tags[1].name(), "ver");
    assert_eq!(tags[1].value(), Some("5"));
    assert_eq!(tags[2].name(), "mark");
    assert_eq!(tags[2].value(), None);
    assert_eq!(tags[3].name(), "note");
    assert_eq!(tags[3].value(), Some(""));
    assert_eq!(tags[4].name(), "foo");
    assert_eq!(tags[4].value(), Some("bar"));
}

#[test]
fn empty_segments_between_commas_are_ignored() {
    let tags = parse_many(",,,").unwrap();
    assert!(tags.is_empty());
}

#[test]
fn reserved_characters_in_name_or_value_are_rejected() {
    assert!(parse_many("bad:name:extra").is_err() || MetricTag::new("bad;name", None).is_err());
    assert!(MetricTag::new("name", Some("bad,value")).is_err());
    assert!(MetricTag::new("name", Some("bad:colon:value")).is_err());
}

#[test]
fn whitespace_around_name_and_value_is_trimmed() {
    let tag = MetricTag::new("  route  ", Some("  PutItem  ")).unwrap();
    assert_eq!(tag.canonical(), "route:PutItem");
}

#[test]
fn single_segment_without_colon_has_no_value() {
    let tags = parse_many("justaname").unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].value(), None);
}
