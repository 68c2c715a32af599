//! Required-field validation of canonical contacts before upload.

use tracing::debug;

use contactpipe_shared::CanonicalContact;

/// Result of validating an ordered set of contacts.
#[derive(Debug, Default)]
pub struct ValidationOutcome {
    /// Contacts that passed, in input order.
    pub accepted: Vec<CanonicalContact>,
    /// Number of contacts dropped from the upload set.
    pub rejected: usize,
}

/// Check whether a contact is eligible for upload.
///
/// Email is the only hard requirement: upsert-by-email needs a non-empty key.
/// Firstname and phone are required in intent, but their absence only marks
/// the record as incomplete; it does not disqualify it.
pub fn validate(contact: &CanonicalContact) -> bool {
    let p = &contact.properties;

    if p.email.trim().is_empty() {
        return false;
    }

    if p.firstname.trim().is_empty() || p.phone.trim().is_empty() {
        debug!(email = %p.email, "contact incomplete (missing firstname or phone), keeping");
    }

    true
}

/// Validate an ordered contact set, preserving input order of the survivors.
pub fn validate_all(contacts: Vec<CanonicalContact>) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();

    for contact in contacts {
        if validate(&contact) {
            outcome.accepted.push(contact);
        } else {
            outcome.rejected += 1;
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use contactpipe_shared::{ContactProperties, ID_PROPERTY_EMAIL};

    fn contact(email: &str, firstname: &str, phone: &str) -> CanonicalContact {
        CanonicalContact {
            properties: ContactProperties {
                email: email.into(),
                firstname: firstname.into(),
                phone: phone.into(),
                ..Default::default()
            },
            id: email.into(),
            id_property: ID_PROPERTY_EMAIL.into(),
        }
    }

    #[test]
    fn empty_email_hard_rejects() {
        assert!(!validate(&contact("", "Alice", "050111")));
        assert!(!validate(&contact("   ", "Alice", "050111")));
    }

    #[test]
    fn missing_firstname_or_phone_does_not_reject() {
        assert!(validate(&contact("a@x.com", "", "")));
    }

    #[test]
    fn validate_all_preserves_order_and_counts_rejects() {
        let outcome = validate_all(vec![
            contact("a@x.com", "Alice", "1"),
            contact("", "Nobody", "2"),
            contact("b@x.com", "Bob", "3"),
            contact(" ", "Blank", "4"),
        ]);

        assert_eq!(outcome.rejected, 2);
        let emails: Vec<_> = outcome
            .accepted
            .iter()
            .map(|c| c.properties.email.as_str())
            .collect();
        assert_eq!(emails, ["a@x.com", "b@x.com"]);
    }
}
