//! Property-based tests: secret material never leaks through Debug
//! output, whatever the value looks like.

use keyvault_client::{Credentials, SecretEntry};
use proptest::prelude::*;
use secrecy::ExposeSecret;

fn secret_value_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9!@#$%^&*]{8,64}"
}

fn identifier_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{2,20}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// For any client secret, the credentials Debug output shows
    /// [REDACTED] and never the secret itself, while the non-secret
    /// fields stay visible.
    #[test]
    fn credentials_debug_never_exposes_the_secret(
        secret in secret_value_strategy(),
        tenant in identifier_strategy(),
        client in identifier_strategy(),
        vault in identifier_strategy(),
    ) {
        let credentials = Credentials::new(
            tenant.clone(),
            client.clone(),
            secret.clone(),
            vault.clone(),
        );

        let output = format!("{credentials:?}");

        prop_assert!(
            !output.contains(&secret),
            "debug output must not contain the client secret"
        );
        prop_assert!(output.contains("[REDACTED]"));
        prop_assert!(output.contains(&tenant));
        prop_assert!(output.contains(&vault));

        // The secret is still reachable where it is actually needed.
        prop_assert_eq!(credentials.client_secret.expose_secret(), secret.as_str());
    }

    /// For any secret value, a SecretEntry's Debug output never
    /// contains the value.
    #[test]
    fn secret_entry_debug_never_exposes_the_value(
        name in identifier_strategy(),
        value in secret_value_strategy(),
        version in "[a-f0-9]{8,32}",
    ) {
        let entry = SecretEntry {
            name: name.clone(),
            value: value.clone(),
            version: version.clone(),
            enabled: true,
            created_on: None,
            updated_on: None,
        };

        let output = format!("{entry:?}");

        prop_assert!(
            !output.contains(&value),
            "debug output must not contain the secret value"
        );
        prop_assert!(output.contains("[REDACTED]"));
        prop_assert!(output.contains(&name));
        prop_assert!(output.contains(&version));
    }
}
