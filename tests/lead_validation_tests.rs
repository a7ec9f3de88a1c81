/// Unit tests for public lead-capture validation
/// Tests email validation and Brazilian phone validation/normalization
use fichapro_api::lead_capture::{is_valid_email, validate_br_phone};

#[cfg(test)]
mod email_validation_tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("lead@example.com"));
        assert!(is_valid_email("maria.souza@example.com"));
        assert!(is_valid_email("lead+ficha@example.co.uk"));
        assert!(is_valid_email("nome_sobrenome@example-domain.com"));
    }

    #[test]
    fn test_invalid_emails_basic() {
        // Missing @ or .
        assert!(!is_valid_email("leadexample.com"));
        assert!(!is_valid_email("lead@examplecom"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("lead@"));

        // Too short
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_invalid_emails_fake_patterns() {
        // Repeated digits (common fake patterns typed into capture forms)
        assert!(!is_valid_email("1199999999333@gmail.com"));
        assert!(!is_valid_email("lead999999@example.com"));
        assert!(!is_valid_email("1111111111@gmail.com"));
        assert!(!is_valid_email("000000@example.com"));
        assert!(!is_valid_email("teste123456789@example.com"));
    }

    #[test]
    fn test_invalid_emails_malformed() {
        assert!(!is_valid_email("lead @example.com")); // space
        assert!(!is_valid_email("lead@exam ple.com")); // space in domain
    }
}

#[cfg(test)]
mod phone_validation_tests {
    use super::*;

    #[test]
    fn test_valid_brazilian_cell_phones() {
        let (valid, normalized) = validate_br_phone("11987654321");
        assert!(valid);
        assert_eq!(normalized, "+5511987654321");

        // With formatting, as typed into the capture form
        let (valid, normalized) = validate_br_phone("(11) 98765-4321");
        assert!(valid);
        assert_eq!(normalized, "+5511987654321");

        // With country code
        let (valid, normalized) = validate_br_phone("+5511987654321");
        assert!(valid);
        assert_eq!(normalized, "+5511987654321");
    }

    #[test]
    fn test_valid_brazilian_landlines() {
        let (valid, normalized) = validate_br_phone("1133334444");
        assert!(valid);
        assert_eq!(normalized, "+551133334444");

        let (valid, normalized) = validate_br_phone("(11) 3333-4444");
        assert!(valid);
        assert_eq!(normalized, "+551133334444");
    }

    #[test]
    fn test_invalid_phones() {
        let (valid, _) = validate_br_phone("1234");
        assert!(!valid);

        let (valid, _) = validate_br_phone("");
        assert!(!valid);

        let (valid, _) = validate_br_phone("   ");
        assert!(!valid);

        // Invalid DDD (area code must be 11-99)
        let (valid, _) = validate_br_phone("0187654321");
        assert!(!valid);
    }

    #[test]
    fn test_phone_normalization_is_format_insensitive() {
        let formats = vec![
            "11987654321",
            "(11) 98765-4321",
            "+55 11 98765-4321",
            "5511987654321",
            "11 98765 4321",
        ];

        for format in formats {
            let (valid, normalized) = validate_br_phone(format);
            if valid {
                assert_eq!(
                    normalized, "+5511987654321",
                    "Failed for format: {}",
                    format
                );
            }
        }
    }
}
