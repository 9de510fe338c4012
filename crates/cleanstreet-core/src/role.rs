//! Email-to-role resolution against the admin allow-list.

use std::collections::BTreeSet;

use database::validation::normalize_email;
use database::Role;

/// Maps an email address to a role.
///
/// Pure and deterministic: the allow-list is fixed at construction and
/// compared in normalized form (trimmed, lower-cased). Only ever yields
/// `Admin` or `User`; workers are provisioned explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleResolver {
    admins: BTreeSet<String>,
}

impl RoleResolver {
    /// Build a resolver from admin email addresses. Blank entries are ignored.
    pub fn new<I, S>(admin_emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let admins = admin_emails
            .into_iter()
            .map(|email| normalize_email(email.as_ref()))
            .filter(|email| !email.is_empty())
            .collect();
        Self { admins }
    }

    /// Build a resolver from a comma-separated list, as found in configuration.
    pub fn from_comma_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// Resolve the role for `email`.
    pub fn resolve(&self, email: &str) -> Role {
        if self.is_admin(email) {
            Role::Admin
        } else {
            Role::User
        }
    }

    /// Whether `email` is on the allow-list.
    pub fn is_admin(&self, email: &str) -> bool {
        self.admins.contains(&normalize_email(email))
    }

    /// Normalized allow-list entries, in order.
    pub fn admin_emails(&self) -> impl Iterator<Item = &str> {
        self.admins.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> RoleResolver {
        RoleResolver::new(["admin@example.com", " Chief@City.gov "])
    }

    #[test]
    fn test_admin_match_ignores_case_and_whitespace() {
        let resolver = resolver();
        assert_eq!(resolver.resolve("ADMIN@Example.com "), Role::Admin);
        assert_eq!(resolver.resolve("chief@city.gov"), Role::Admin);
        assert_eq!(resolver.resolve("\tchief@CITY.gov\n"), Role::Admin);
    }

    #[test]
    fn test_non_admin_is_user() {
        let resolver = resolver();
        assert_eq!(resolver.resolve("someone@example.com"), Role::User);
        assert_eq!(resolver.resolve(""), Role::User);
        assert_eq!(resolver.resolve("admin@example.co"), Role::User);
    }

    #[test]
    fn test_never_resolves_worker() {
        let resolver = RoleResolver::new(["w@example.com"]);
        for email in ["w@example.com", "x@example.com"] {
            assert_ne!(resolver.resolve(email), Role::Worker);
        }
    }

    #[test]
    fn test_resolution_is_stable_under_normalization() {
        let resolver = resolver();
        for variant in ["Admin@Example.Com", "  admin@example.com", "ADMIN@EXAMPLE.COM\t"] {
            assert_eq!(
                resolver.resolve(variant),
                resolver.resolve(&normalize_email(variant))
            );
        }
    }

    #[test]
    fn test_from_comma_list() {
        let resolver = RoleResolver::from_comma_list("a@example.com, B@example.com,,");
        assert_eq!(
            resolver.admin_emails().collect::<Vec<_>>(),
            vec!["a@example.com", "b@example.com"]
        );
        assert_eq!(RoleResolver::from_comma_list("").admin_emails().count(), 0);
    }
}
