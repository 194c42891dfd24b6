#[cfg(feature = "serde")]
mod serde {
    use convenience::prelude::*;

    #[test]
    fn serializes_as_pairs() {
        let map = bidimap! { "foo" => 1, "bar" => 2 }.unwrap();
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"[["foo",1],["bar",2]]"#);
    }

    #[test]
    fn round_trip() {
        let map = bidimap! { "foo".to_string() => 1u32, "bar".to_string() => 2 }.unwrap();
        let json = serde_json::to_string(&map).unwrap();
        let back: BidiMap<String, u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn rejects_duplicates() {
        let err = serde_json::from_str::<BidiMap<String, u32>>(r#"[["foo",1],["bar",1]]"#).unwrap_err();
        assert!(err.to_string().contains("duplicate second key"));
    }
}
