//! Transactional email templates

use crate::domain::entities::OtpPurpose;

/// A renderable email
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailTemplate {
    /// Link that confirms ownership of an address
    VerificationLink { url: String },
    /// One-time code for any purpose
    OtpCode {
        code: String,
        purpose: OtpPurpose,
        expires_in_minutes: i64,
    },
    /// Passwordless sign-in link
    MagicLink { url: String },
    /// Link to the password reset form
    PasswordReset { url: String },
}

/// Subject and HTML body ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

impl EmailTemplate {
    pub fn subject(&self) -> &'static str {
        match self {
            EmailTemplate::VerificationLink { .. } => "Verify your email address",
            EmailTemplate::MagicLink { .. } => "Sign in to your account",
            EmailTemplate::PasswordReset { .. } => "Reset your password",
            EmailTemplate::OtpCode { purpose, .. } => match purpose {
                OtpPurpose::SignIn => "Sign in to your account",
                OtpPurpose::EmailVerification => "Verify your email address",
                OtpPurpose::ForgetPassword => "Reset your password",
            },
        }
    }

    pub fn render(&self) -> RenderedEmail {
        let body = match self {
            EmailTemplate::VerificationLink { url } => link_body(
                "Verify your email address",
                "Click the button below to confirm your email address.",
                "Verify email",
                url,
            ),
            EmailTemplate::MagicLink { url } => link_body(
                "Sign in to your account",
                "Click the button below to sign in. The link can only be used once.",
                "Sign in",
                url,
            ),
            EmailTemplate::PasswordReset { url } => link_body(
                "Reset your password",
                "Someone asked to reset the password for this account. If it was you, click below.",
                "Reset password",
                url,
            ),
            EmailTemplate::OtpCode {
                code,
                purpose,
                expires_in_minutes,
            } => code_body(self.subject(), code, *purpose, *expires_in_minutes),
        };

        RenderedEmail {
            subject: self.subject().to_string(),
            html: layout(self.subject(), &body),
        }
    }
}

fn code_body(heading: &str, code: &str, purpose: OtpPurpose, expires_in_minutes: i64) -> String {
    let intro = match purpose {
        OtpPurpose::SignIn => "Use this code to sign in:",
        OtpPurpose::EmailVerification => "Use this code to verify your email address:",
        OtpPurpose::ForgetPassword => "Use this code to reset your password:",
    };
    format!(
        "<h1 style=\"font-size:20px\">{heading}</h1>\
         <p>{intro}</p>\
         <p style=\"font-size:32px;font-weight:bold;letter-spacing:6px\">{code}</p>\
         <p>This code expires in {minutes} minute{plural}. If you didn't request it, you can ignore this email.</p>",
        heading = escape_html(heading),
        intro = intro,
        code = escape_html(code),
        minutes = expires_in_minutes,
        plural = if expires_in_minutes == 1 { "" } else { "s" },
    )
}

fn link_body(heading: &str, text: &str, action: &str, url: &str) -> String {
    let url = escape_html(url);
    format!(
        "<h1 style=\"font-size:20px\">{heading}</h1>\
         <p>{text}</p>\
         <p><a href=\"{url}\" style=\"background:#000;color:#fff;padding:12px 20px;border-radius:6px;text-decoration:none\">{action}</a></p>\
         <p>Or paste this link into your browser: {url}</p>",
        heading = escape_html(heading),
        text = escape_html(text),
        action = escape_html(action),
        url = url,
    )
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title></head>\
         <body style=\"font-family:sans-serif;background:#f6f9fc;padding:24px\">\
         <div style=\"max-width:480px;margin:0 auto;background:#fff;padding:32px;border-radius:8px\">{}</div>\
         </body></html>",
        escape_html(title),
        body
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
