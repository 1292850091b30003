//! 密码强度策略
//!
//! 与服务端规则一致：至少 8 个字符，包含大写、小写、数字和特殊字符。
//! 每满足一条得 1 分（0-5）。

use once_cell::sync::Lazy;
use regex::Regex;

static UPPERCASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]").expect("valid regex"));
static LOWERCASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]").expect("valid regex"));
static DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").expect("valid regex"));
static SPECIAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[!@#$%^&*(),.?":{}|<>]"#).expect("valid regex"));

/// 最小长度（按字符计）
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PasswordRequirements {
    pub length: bool,
    pub uppercase: bool,
    pub lowercase: bool,
    pub digit: bool,
    pub special: bool,
}

impl PasswordRequirements {
    fn satisfied(&self) -> u8 {
        [self.length, self.uppercase, self.lowercase, self.digit, self.special]
            .into_iter()
            .filter(|ok| *ok)
            .count() as u8
    }
}

/// 校验结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordValidation {
    pub is_valid: bool,
    pub score: u8,
    pub requirements: PasswordRequirements,
    pub errors: Vec<&'static str>,
}

/// 校验密码
pub fn validate_password(password: &str) -> PasswordValidation {
    let requirements = PasswordRequirements {
        length: password.chars().count() >= MIN_PASSWORD_LENGTH,
        uppercase: UPPERCASE.is_match(password),
        lowercase: LOWERCASE.is_match(password),
        digit: DIGIT.is_match(password),
        special: SPECIAL.is_match(password),
    };

    let mut errors = Vec::new();
    if !requirements.length {
        errors.push("Le mot de passe doit contenir au moins 8 caractères");
    }
    if !requirements.uppercase {
        errors.push("Le mot de passe doit contenir au moins une majuscule");
    }
    if !requirements.lowercase {
        errors.push("Le mot de passe doit contenir au moins une minuscule");
    }
    if !requirements.digit {
        errors.push("Le mot de passe doit contenir au moins un chiffre");
    }
    if !requirements.special {
        errors.push("Le mot de passe doit contenir au moins un caractère spécial");
    }

    PasswordValidation {
        is_valid: errors.is_empty(),
        score: requirements.satisfied(),
        requirements,
        errors,
    }
}

/// 强度标签
pub fn strength_label(score: u8) -> &'static str {
    match score {
        0 | 1 => "Très faible",
        2 => "Faible",
        3 => "Moyen",
        4 => "Fort",
        _ => "Très fort",
    }
}
