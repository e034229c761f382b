use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ContestError;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

// 可选的 + 号，10 到 15 位数字
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{10,15}$").expect("Invalid phone regex"));

/// 名称类字段（姓名、队名、学校名、任务标题）的最大长度
pub const MAX_NAME_LEN: usize = 100;

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if !EMAIL_RE.is_match(email) {
        return Err("Email format is invalid");
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    if !PHONE_RE.is_match(phone) {
        return Err("Phone number must be 10 to 15 digits");
    }
    Ok(())
}

/// 非空且不超过 `MAX_NAME_LEN` 个字符，返回去除首尾空白后的值
pub fn validate_name<'a>(field: &str, value: &'a str) -> Result<&'a str, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        ));
    }
    Ok(trimmed)
}

/// 密码策略验证结果
#[derive(Debug, Clone)]
pub struct PasswordValidationResult {
    pub is_valid: bool,
    pub errors: Vec<&'static str>,
}

impl PasswordValidationResult {
    pub fn error_message(&self) -> String {
        self.errors.join("; ")
    }
}

/// 验证密码是否符合安全策略
///
/// 策略要求：
/// - 最小长度：6 字符
/// - 必须包含：字母 + 数字
/// - 不能是常见弱密码
pub fn validate_password(password: &str) -> PasswordValidationResult {
    let mut errors = Vec::new();

    if password.len() < 6 {
        errors.push("Password must be at least 6 characters long");
    }

    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        errors.push("Password must contain at least one letter");
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one digit");
    }

    let weak_passwords = [
        "password1",
        "abc123",
        "qwerty123",
        "admin123",
        "abcd1234",
        "iloveyou1",
    ];
    if weak_passwords
        .iter()
        .any(|&weak| password.eq_ignore_ascii_case(weak))
    {
        errors.push("Password is too common, please choose a stronger password");
    }

    PasswordValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// 注册类请求的公共字段校验
pub fn validate_account_fields(
    name: &str,
    email: &str,
    phone: &str,
    password: &str,
) -> Result<(), ContestError> {
    validate_name("Name", name).map_err(ContestError::validation)?;
    validate_email(email).map_err(ContestError::validation)?;
    validate_phone(phone).map_err(ContestError::validation)?;
    let result = validate_password(password);
    if !result.is_valid {
        return Err(ContestError::validation(result.error_message()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_password() {
        assert!(validate_password("Secure1").is_valid);
        assert!(validate_password("team2024go").is_valid);
    }

    #[test]
    fn test_short_password() {
        let result = validate_password("a1");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password must be at least 6 characters long")
        );
    }

    #[test]
    fn test_no_digit() {
        let result = validate_password("abcdefgh");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password must contain at least one digit")
        );
    }

    #[test]
    fn test_common_password() {
        let result = validate_password("Password1");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password is too common, please choose a stronger password")
        );
    }

    #[test]
    fn test_email_and_phone() {
        assert!(validate_email("leader@college.edu").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("+919876543210").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("98765-43210").is_err());
    }

    #[test]
    fn test_name_trimmed_and_bounded() {
        assert_eq!(validate_name("Team name", "  Byte Club ").unwrap(), "Byte Club");
        assert!(validate_name("Team name", "   ").is_err());
        assert!(validate_name("Team name", &"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_account_fields() {
        assert!(validate_account_fields("Asha", "asha@example.com", "9876543210", "Secure1").is_ok());
        let err = validate_account_fields("Asha", "asha", "9876543210", "Secure1").unwrap_err();
        assert_eq!(err.code(), "E007");
    }
}
