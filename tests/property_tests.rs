/// Property-based tests using proptest
/// Tests invariants of the validation rules that should hold for all inputs
use proptest::prelude::*;
use customer_master_api::models::NewCustomer;
use customer_master_api::validation::{
    is_valid_email, validate_new_customer, COMPANY_NAME_MAX, CUSTOMER_ID_LENGTH,
};

fn request(customer_id: &str, company_name: &str) -> NewCustomer {
    NewCustomer {
        customer_id: Some(customer_id.to_string()),
        company_name: Some(company_name.to_string()),
        ..Default::default()
    }
}

fn rejected_fields(request: &NewCustomer) -> Vec<String> {
    validate_new_customer(request)
        .err()
        .unwrap_or_default()
        .into_iter()
        .map(|v| v.field)
        .collect()
}

// Property: validation should never panic
proptest! {
    #[test]
    fn email_validation_never_panics(email in "\\PC*") {
        let _ = is_valid_email(&email);
    }

    #[test]
    fn validation_never_panics(id in "\\PC*", name in "\\PC*") {
        let _ = validate_new_customer(&request(&id, &name));
    }
}

// Property: customerId length decides acceptance
proptest! {
    #[test]
    fn five_character_ids_accepted(id in "\\PC{5}") {
        prop_assert!(!rejected_fields(&request(&id, "Acme")).contains(&"customerId".to_string()));
    }

    #[test]
    fn other_id_lengths_rejected(id in "[A-Z0-9]{0,4}|[A-Z0-9]{6,12}") {
        prop_assert_ne!(id.chars().count(), CUSTOMER_ID_LENGTH);
        prop_assert!(rejected_fields(&request(&id, "Acme")).contains(&"customerId".to_string()));
    }
}

// Property: companyName bounds
proptest! {
    #[test]
    fn company_names_within_bounds_accepted(name in "[A-Za-z][A-Za-z ]{0,39}") {
        prop_assert!(validate_new_customer(&request("ABCDE", &name)).is_ok());
    }

    #[test]
    fn company_names_over_limit_rejected(name in "[A-Za-z]{41,80}") {
        prop_assert!(name.chars().count() > COMPANY_NAME_MAX);
        prop_assert_eq!(rejected_fields(&request("ABCDE", &name)), vec!["companyName".to_string()]);
    }

    #[test]
    fn blank_company_names_rejected(name in " {0,10}") {
        prop_assert_eq!(rejected_fields(&request("ABCDE", &name)), vec!["companyName".to_string()]);
    }
}

// Property: email syntax
proptest! {
    #[test]
    fn well_formed_emails_accepted(
        local in "[a-zA-Z][a-zA-Z0-9._+]{0,20}",
        domain in "[a-zA-Z][a-zA-Z0-9]{1,15}",
        tld in "[a-zA-Z]{2,6}"
    ) {
        let email = format!("{}@{}.{}", local, domain, tld);
        prop_assert!(is_valid_email(&email), "rejected {}", email);
    }

    #[test]
    fn emails_without_at_rejected(text in "[a-zA-Z0-9.]{1,30}") {
        prop_assert!(!is_valid_email(&text));
    }
}
