// ABOUTME: Integration tests for validated domain types.
// ABOUTME: Covers image reference parsing, tag overrides, and service name rules.

use cohort::types::*;

mod image_ref_tests {
    use super::*;

    #[test]
    fn bare_name_defaults_to_latest() {
        let img = ImageRef::parse("nginx").unwrap();
        assert_eq!(img.repository(), "nginx");
        assert_eq!(img.tag(), Some("latest"));
        assert!(img.registry().is_none());
    }

    #[test]
    fn registry_port_is_not_a_tag() {
        let img = ImageRef::parse("registry.example.com:5000/team/web").unwrap();
        assert_eq!(img.repository(), "registry.example.com:5000/team/web");
        assert_eq!(img.registry(), Some("registry.example.com:5000"));
        assert_eq!(img.tag(), Some("latest"));
    }

    #[test]
    fn digest_without_tag_keeps_no_tag() {
        let img = ImageRef::parse("nginx@sha256:abc123").unwrap();
        assert_eq!(img.tag(), None);
        assert_eq!(img.digest(), Some("sha256:abc123"));
        assert_eq!(img.to_string(), "nginx@sha256:abc123");
    }

    #[test]
    fn with_tag_replaces_tag() {
        let img = ImageRef::parse("quay.io/org/api:v1").unwrap().with_tag("v2");
        assert_eq!(img.to_string(), "quay.io/org/api:v2");
    }

    #[test]
    fn rejects_empty_and_odd_characters() {
        assert!(matches!(ImageRef::parse("  "), Err(ParseImageRefError::Empty)));
        assert!(matches!(
            ImageRef::parse("nginx latest"),
            Err(ParseImageRefError::InvalidChar(' '))
        ));
        assert!(matches!(
            ImageRef::parse("nginx:"),
            Err(ParseImageRefError::EmptyTag(_))
        ));
    }
}

mod service_name_tests {
    use super::*;

    #[test]
    fn accepts_container_name_characters() {
        assert_eq!(ServiceName::new("web_api.v2-blue").unwrap().as_str(), "web_api.v2-blue");
    }

    #[test]
    fn rejects_leading_punctuation() {
        assert!(matches!(
            ServiceName::new("-web"),
            Err(ServiceNameError::InvalidStart)
        ));
    }

    #[test]
    fn rejects_slashes_and_length() {
        assert!(matches!(
            ServiceName::new("team/web"),
            Err(ServiceNameError::InvalidChar('/'))
        ));
        assert!(matches!(
            ServiceName::new(&"a".repeat(49)),
            Err(ServiceNameError::TooLong)
        ));
        assert!(matches!(ServiceName::new(""), Err(ServiceNameError::Empty)));
    }
}

mod container_id_tests {
    use super::*;

    #[test]
    fn short_form_is_eight_characters() {
        let id = ContainerId::new("0123456789abcdef0123");
        assert_eq!(id.short(), "01234567");
        assert_eq!(id.to_string(), "0123456789abcdef0123");
    }
}
