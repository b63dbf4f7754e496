pub mod status;
pub mod storage;

pub use status::{
    AuditionStatus, MovieRoleStatus, MovieStatus, NotificationStatus, OtpPurpose, PageStatus,
    ParseStatusError, PaymentStatus, UserStatus,
};
