use imgprobe::types::{ImageType, SizeResult, Unit, Variant, parse_content_length};

#[test]
fn test_size_result_json_shape() {
    let result = SizeResult::pixels(16, 16, ImageType::Ico, "image/x-icon")
        .with_variants(vec![Variant::new(16, 16)]);
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["width"], 16.0);
    assert_eq!(json["type"], "ico");
    assert_eq!(json["mime"], "image/x-icon");
    assert_eq!(json["wUnits"], "px");
    assert_eq!(json["hUnits"], "px");
    assert_eq!(json["variants"][0]["height"], 16);
    assert!(json.get("orientation").is_none());
    assert!(json.get("length").is_none());
    assert!(json.get("url").is_none());
}

#[test]
fn test_zero_orientation_is_dropped() {
    let result = SizeResult::pixels(1, 1, ImageType::Jpg, "image/jpeg").with_orientation(0);
    assert_eq!(result.orientation, None);
    let result = result.with_orientation(5);
    assert_eq!(result.orientation, Some(5));
}

#[test]
fn test_annotate_response() {
    let base = SizeResult::new(2.5, 1.0, ImageType::Svg, "image/svg+xml", Unit::In, Unit::In);

    let annotated = base.clone().annotate_response(Some("1234"), "https://example.com/final.svg");
    assert_eq!(annotated.length, Some(1234));
    assert_eq!(annotated.url.as_deref(), Some("https://example.com/final.svg"));

    let not_numeric = base.clone().annotate_response(Some("12kb"), "https://example.com/");
    assert_eq!(not_numeric.length, None);
    assert!(not_numeric.url.is_some());

    let missing = base.annotate_response(None, "https://example.com/");
    assert_eq!(missing.length, None);
}

#[test]
fn test_parse_content_length() {
    assert_eq!(parse_content_length("0"), Some(0));
    assert_eq!(parse_content_length("987654321"), Some(987654321));
    assert_eq!(parse_content_length(""), None);
    assert_eq!(parse_content_length("-1"), None);
    assert_eq!(parse_content_length(" 12"), None);
    assert_eq!(parse_content_length("1e3"), None);
}

#[test]
fn test_unit_suffixes() {
    assert_eq!(Unit::from_suffix("12.5mm"), Unit::Mm);
    assert_eq!(Unit::from_suffix("3in"), Unit::In);
    assert_eq!(Unit::from_suffix("1.5em"), Unit::Em);
    assert_eq!(Unit::from_suffix("100"), Unit::Px);
    assert_eq!(Unit::from_suffix("100%"), Unit::Px);
    assert_eq!(Unit::Pc.to_string(), "pc");
}

#[test]
fn test_image_type_names() {
    assert_eq!(ImageType::Jpg.to_string(), "jpg");
    assert_eq!(serde_json::to_string(&ImageType::Heif).unwrap(), "\"heif\"");
}
