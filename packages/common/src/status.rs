#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    kind: &'static str,
    invalid: String,
    valid: &'static [&'static str],
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid {} '{}'. Valid values: {}",
            self.kind,
            self.invalid,
            self.valid.join(", ")
        )
    }
}

impl std::error::Error for ParseStatusError {}

/// Declares a lowercase string-valued status enum.
///
/// With the `sea-orm` feature enabled the enum doubles as a SeaORM active enum
/// stored in a plain string column.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $value:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
        #[cfg_attr(
            feature = "sea-orm",
            derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
            sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
        )]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $value)]
                #[cfg_attr(feature = "sea-orm", sea_orm(string_value = $value))]
                $variant,
            )+
        }

        impl $name {
            /// All possible values.
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            const NAMES: &'static [&'static str] = &[$($value),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseStatusError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok(Self::$variant),)+
                    _ => Err(ParseStatusError {
                        kind: $kind,
                        invalid: s.to_string(),
                        valid: Self::NAMES,
                    }),
                }
            }
        }
    };
}

string_enum! {
    /// Whether an account may sign in.
    UserStatus ("user status") {
        Active => "active",
        Inactive => "inactive",
    }
}

string_enum! {
    /// Publication state of a movie.
    MovieStatus ("movie status") {
        Active => "active",
        Inactive => "inactive",
        /// Announced but not yet casting.
        Upcoming => "upcoming",
    }
}

string_enum! {
    /// Whether a casting call still accepts applicants.
    MovieRoleStatus ("role status") {
        Open => "open",
        Closed => "closed",
    }
}

string_enum! {
    /// Review state of an audition.
    AuditionStatus ("audition status") {
        /// Submitted, not yet looked at.
        Pending => "pending",
        Viewed => "viewed",
        Shortlisted => "shortlisted",
        Rejected => "rejected",
    }
}

string_enum! {
    /// CMS page lifecycle.
    PageStatus ("page status") {
        Draft => "draft",
        Published => "published",
        Archived => "archived",
    }
}

string_enum! {
    /// Outcome of a broadcast push notification.
    NotificationStatus ("notification status") {
        Sent => "sent",
        Failed => "failed",
        /// No user matched the filters, nothing was pushed.
        NoRecipients => "no_recipients",
    }
}

string_enum! {
    /// Lifecycle of a gateway order.
    PaymentStatus ("payment status") {
        /// Order created at the gateway, awaiting checkout.
        Created => "created",
        Paid => "paid",
        Failed => "failed",
    }
}

string_enum! {
    /// What a one-time password was issued for.
    OtpPurpose ("OTP purpose") {
        Registration => "registration",
        PasswordReset => "password_reset",
    }
}

impl Default for UserStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl Default for MovieStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl Default for MovieRoleStatus {
    fn default() -> Self {
        Self::Open
    }
}

impl Default for AuditionStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl Default for PageStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl MovieStatus {
    /// Statuses listed to applicants (everything except `inactive`).
    pub const VISIBLE: &'static [MovieStatus] = &[Self::Active, Self::Upcoming];
}
