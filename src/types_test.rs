// Unit tests for types module

use super::*;

#[test]
fn test_parse_rect() {
    // Valid formats
    let rect = parse_rect("10,20,120x40").unwrap();
    assert_eq!(rect.x, 10.0);
    assert_eq!(rect.y, 20.0);
    assert_eq!(rect.width, 120.0);
    assert_eq!(rect.height, 40.0);

    let rect = parse_rect("300x150").unwrap();
    assert_eq!((rect.x, rect.y), (0.0, 0.0));
    assert_eq!((rect.width, rect.height), (300.0, 150.0));

    let rect = parse_rect(" 1.5, -8 , 10.25x2 ").unwrap();
    assert_eq!(rect.x, 1.5);
    assert_eq!(rect.y, -8.0);
    assert_eq!(rect.width, 10.25);

    // Invalid formats
    assert!(parse_rect("").is_err());
    assert!(parse_rect("120").is_err());
    assert!(parse_rect("120x").is_err());
    assert!(parse_rect("1,2").is_err());
    assert!(parse_rect("1,2,3,4x5").is_err());
    assert!(parse_rect("a,b,1x1").is_err());
    assert!(parse_rect("120X40").is_err()); // uppercase X
    assert!(parse_rect("-1x5").is_err());
    assert!(parse_rect("infx5").is_err());
}

#[test]
fn test_output_format_serialization() {
    assert_eq!(serde_json::to_string(&OutputFormat::Json).unwrap(), "\"json\"");
    assert_eq!(serde_json::to_string(&OutputFormat::Simple).unwrap(), "\"simple\"");

    let format: OutputFormat = serde_json::from_str("\"simple\"").unwrap();
    assert_eq!(format, OutputFormat::Simple);
}
