pub mod attendance;
pub mod department;
pub mod division;
pub mod employee;
pub mod leave_request;
pub mod role;
pub mod shift;
pub mod user;

/// Lets `sqlx::FromRow` decode VARCHAR columns straight into the strum enums
/// through `#[sqlx(try_from = "String")]`.
macro_rules! string_column {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl TryFrom<String> for $ty {
                type Error = strum::ParseError;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    value.parse()
                }
            }
        )+
    };
}

string_column!(
    attendance::AttendanceStatus,
    leave_request::RequestType,
    leave_request::RequestStatus,
);
