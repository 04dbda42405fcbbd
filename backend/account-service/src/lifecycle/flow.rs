use crate::models::AccountState;
use crate::token::TokenClass;
use chrono::{DateTime, Utc};

/// Static description of one email-confirmed lifecycle flow.
///
/// The engine is generic over this table; adding a flow means adding a
/// profile, not another copy of the issue/verify/invalidate logic.
pub(crate) struct FlowProfile {
    pub class: TokenClass,
    /// Account state required to initiate and to confirm the flow.
    pub expected: AccountState,
    /// Path of the confirm endpoint embedded in the emailed link.
    pub confirm_path: &'static str,
    /// Verb and noun for the request email subject, e.g. "Reset" "Password".
    pub verb: &'static str,
    pub noun: &'static str,
    /// What the link asks the user to do, e.g. "activate your account".
    pub action: &'static str,
    /// Subject and body line of the post-confirmation notice.
    pub done_subject: &'static str,
    pub done_notice: &'static str,
}

impl FlowProfile {
    pub(crate) const ACTIVATION: FlowProfile = FlowProfile {
        class: TokenClass::Activation,
        expected: AccountState::Inactive,
        confirm_path: "/api/users/activate",
        verb: "Activate",
        noun: "Account",
        action: "activate your account",
        done_subject: "Account Activated Successfully",
        done_notice: "Your account has been activated. You can now log in.",
    };

    pub(crate) const DEACTIVATION: FlowProfile = FlowProfile {
        class: TokenClass::Deactivation,
        expected: AccountState::Active,
        confirm_path: "/api/users/deactivate_confirm",
        verb: "Deactivate",
        noun: "Account",
        action: "deactivate your account",
        done_subject: "Account Deactivated Successfully",
        done_notice: "Your account has been deactivated. Log in again to reactivate it.",
    };

    pub(crate) const DELETION: FlowProfile = FlowProfile {
        class: TokenClass::Deletion,
        expected: AccountState::Active,
        confirm_path: "/api/users/delete_confirm",
        verb: "Delete",
        noun: "Account",
        action: "permanently delete your account",
        done_subject: "Account Deleted Successfully",
        done_notice: "Your account and its data have been removed.",
    };

    pub(crate) const RESET_PASSWORD: FlowProfile = FlowProfile {
        class: TokenClass::ResetPassword,
        expected: AccountState::Active,
        confirm_path: "/api/users/reset_password_confirm",
        verb: "Reset",
        noun: "Password",
        action: "reset your password",
        done_subject: "Password Reset Successfully",
        done_notice: "Your password has been changed.",
    };

    pub(crate) const UPDATE_USERNAME: FlowProfile = FlowProfile {
        class: TokenClass::UpdateUsername,
        expected: AccountState::Active,
        confirm_path: "/api/users/update_username_confirm",
        verb: "Update",
        noun: "Username",
        action: "change your username",
        done_subject: "Username Updated Successfully",
        done_notice: "Your username has been changed.",
    };

    pub(crate) const UPDATE_EMAIL: FlowProfile = FlowProfile {
        class: TokenClass::UpdateEmail,
        expected: AccountState::Active,
        confirm_path: "/api/users/update_email_confirm",
        verb: "Update",
        noun: "Email Address",
        action: "confirm your new email address",
        done_subject: "Email Updated Successfully",
        done_notice: "Your email address has been changed.",
    };
}

/// Render the confirmation-link email (HTML plus plain-text fallback).
pub(crate) fn link_email(
    first_name: &str,
    action: &str,
    link: &str,
    expires_at: DateTime<Utc>,
) -> (String, String) {
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; padding: 20px; color: #333;">
    <p>Hi {first_name},</p>
    <p>Please click the button below to {action}:</p>
    <p style="margin: 30px 0;">
        <a href="{link}" style="background-color: #000; color: #fff; padding: 14px 28px; text-decoration: none; border-radius: 25px; display: inline-block;">Confirm</a>
    </p>
    <p style="color: #666; font-size: 14px;">
        If the button doesn't work, please copy the following link to your browser:<br>
        <a href="{link}" style="color: #007AFF;">{link}</a>
    </p>
    <p style="color: #999; font-size: 12px; margin-top: 30px;">
        This link will expire at {expires_at}.<br>
        If you did not request this, please ignore this email.
    </p>
</body>
</html>"#,
        first_name = first_name,
        action = action,
        link = link,
        expires_at = expires_at.to_rfc3339(),
    );

    let text = format!(
        "Hi {},\n\nPlease open the following link to {}:\n{}\n\n\
        This link will expire at {}.\n\
        If you did not request this, please ignore this email.",
        first_name,
        action,
        link,
        expires_at.to_rfc3339(),
    );

    (html, text)
}

/// Render the post-confirmation notice email.
pub(crate) fn notice_email(first_name: &str, notice: &str) -> (String, String) {
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; padding: 20px; color: #333;">
    <p>Hi {first_name},</p>
    <p>{notice}</p>
    <p style="color: #999; font-size: 12px; margin-top: 30px;">
        If this wasn't you, please contact support immediately.
    </p>
</body>
</html>"#,
        first_name = first_name,
        notice = notice,
    );

    let text = format!(
        "Hi {},\n\n{}\n\nIf this wasn't you, please contact support immediately.",
        first_name, notice,
    );

    (html, text)
}
