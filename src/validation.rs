use lazy_static::lazy_static;
use regex::Regex;

use crate::models::EmployeeInput;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
}

pub const MIN_NAME_LEN: usize = 2;
pub const MIN_ADDRESS_LEN: usize = 10;

// Trim and escape characters that could turn into markup when echoed back
pub fn sanitize_input(input: &str) -> String {
    input
        .trim()
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn sanitize(input: &EmployeeInput) -> EmployeeInput {
    EmployeeInput {
        name: sanitize_input(&input.name),
        email: sanitize_input(&input.email),
        role: sanitize_input(&input.role),
        phone: sanitize_input(&input.phone),
        alamat: sanitize_input(&input.alamat),
    }
}

/// Checks an already sanitized input. The error is the (error, message) pair
/// shown to the client.
pub fn validate(input: &EmployeeInput) -> Result<(), (&'static str, &'static str)> {
    if input.name.chars().count() < MIN_NAME_LEN {
        return Err(("Invalid name", "Name must be at least 2 characters long"));
    }
    if !is_valid_email(&input.email) {
        return Err(("Invalid email", "Please provide a valid email address"));
    }
    if input.role.is_empty() {
        return Err(("Invalid role", "Role is required"));
    }
    if input.phone.is_empty() {
        return Err(("Invalid phone", "Phone is required"));
    }
    if input.alamat.chars().count() < MIN_ADDRESS_LEN {
        return Err(("Invalid address", "Address must be at least 10 characters long"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> EmployeeInput {
        EmployeeInput {
            name: "John Doe".into(),
            email: "john@example.com".into(),
            role: "Developer".into(),
            phone: "1234567890".into(),
            alamat: "Jl. Merdeka No. 10, Jakarta".into(),
        }
    }

    #[test]
    fn sanitize_escapes_markup() {
        let cases = [
            (
                "<script>alert('xss')</script>",
                "&lt;script&gt;alert(&#39;xss&#39;)&lt;/script&gt;",
            ),
            ("John Doe", "John Doe"),
            ("test@example.com", "test@example.com"),
            ("  test  ", "test"),
            ("say \"hi\"", "say &quot;hi&quot;"),
            ("", ""),
        ];
        for (input, expected) in cases {
            assert_eq!(sanitize_input(input), expected, "input: {input:?}");
        }
    }

    #[test]
    fn email_format() {
        let cases = [
            ("test@example.com", true),
            ("user.name@domain.co.uk", true),
            ("a+tag@sub.example.org", true),
            ("invalid-email", false),
            ("@domain.com", false),
            ("user@", false),
            ("", false),
            ("user@domain", false),
        ];
        for (email, expected) in cases {
            assert_eq!(is_valid_email(email), expected, "email: {email:?}");
        }
    }

    #[test]
    fn accepts_valid_input() {
        assert!(validate(&valid_input()).is_ok());
    }

    #[test]
    fn reports_first_failing_field() {
        let mut input = valid_input();
        input.name = "J".into();
        assert_eq!(validate(&input).unwrap_err().0, "Invalid name");

        let mut input = valid_input();
        input.email = "nope".into();
        assert_eq!(validate(&input).unwrap_err().0, "Invalid email");

        let mut input = valid_input();
        input.role.clear();
        assert_eq!(validate(&input).unwrap_err().0, "Invalid role");

        let mut input = valid_input();
        input.phone.clear();
        assert_eq!(validate(&input).unwrap_err().0, "Invalid phone");

        let mut input = valid_input();
        input.alamat = "short".into();
        assert_eq!(validate(&input).unwrap_err().0, "Invalid address");
    }

    #[test]
    fn whitespace_only_fields_fail_after_sanitizing() {
        let mut input = valid_input();
        input.role = "   ".into();
        assert!(validate(&sanitize(&input)).is_err());
    }
}
