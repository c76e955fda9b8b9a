use once_cell::sync::Lazy;
use regex::Regex;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("Invalid username regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

/// 学校账号多为 DepEd 工号或 名.姓 形式
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if !(3..=32).contains(&username.len()) {
        return Err("Username length must be between 3 and 32 characters");
    }
    if !USERNAME_RE.is_match(username) {
        return Err("Username must contain only letters, numbers, dots, underscores or hyphens");
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if !EMAIL_RE.is_match(email) {
        return Err("Email format is invalid");
    }
    Ok(())
}

const WEAK_PASSWORDS: &[&str] = &[
    "password1",
    "12345678",
    "qwerty123",
    "admin123",
    "teacher123",
    "school123",
    "principal1",
];

/// 检查密码强度，返回全部不满足的规则
///
/// 至少 8 位，同时包含大写、小写字母和数字，且不在常见弱密码表中。
pub fn password_issues(password: &str) -> Vec<&'static str> {
    let rules: [(bool, &'static str); 4] = [
        (
            password.chars().count() >= 8,
            "Password must be at least 8 characters long",
        ),
        (
            password.chars().any(|c| c.is_ascii_uppercase()),
            "Password must contain at least one uppercase letter",
        ),
        (
            password.chars().any(|c| c.is_ascii_lowercase()),
            "Password must contain at least one lowercase letter",
        ),
        (
            password.chars().any(|c| c.is_ascii_digit()),
            "Password must contain at least one digit",
        ),
    ];

    let mut issues: Vec<&'static str> = rules
        .into_iter()
        .filter_map(|(ok, msg)| (!ok).then_some(msg))
        .collect();

    if WEAK_PASSWORDS
        .iter()
        .any(|weak| password.eq_ignore_ascii_case(weak))
    {
        issues.push("Password is too common, please choose a stronger password");
    }
    issues
}

pub fn validate_password(password: &str) -> Result<(), String> {
    let issues = password_issues(password);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues.join("; "))
    }
}
