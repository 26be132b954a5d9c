//! Common validation utilities shared across modules

/// Check if a string is empty or only whitespace
pub fn is_empty_or_whitespace(s: &str) -> bool {
    s.trim().is_empty()
}

/// Validate that a hostname/domain doesn't contain invalid characters
pub fn validate_hostname_chars(hostname: &str) -> bool {
    !hostname.is_empty()
        && hostname.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '*')
        && !hostname.starts_with('-')
        && !hostname.ends_with('-')
}

/// Validate domain name format for ACME certificate requests
pub fn is_acme_domain(domain: &str) -> bool {
    // Wildcards cannot be issued over TLS-ALPN-01
    if domain.starts_with("*.") || domain.contains('*') {
        return false;
    }
    if domain.len() > 253 || !domain.contains('.') {
        return false;
    }
    if !validate_hostname_chars(domain) || domain.ends_with('.') {
        return false;
    }
    domain.split('.').all(|label| !label.is_empty() && label.len() <= 63 && !label.starts_with('-') && !label.ends_with('-'))
}
