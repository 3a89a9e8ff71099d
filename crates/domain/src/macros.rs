//! Macro for implementing Display and FromStr for token-like enums
//!
//! Enums such as `HttpMethod` or `LogFormat` have a single canonical string
//! form. This macro writes that form on `Display` and parses it back,
//! ignoring ASCII case, on `FromStr`.
//!
//! # Example
//!
//! ```rust
//! use reauth_domain::impl_token_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Verb {
//!     Get,
//!     Put,
//! }
//!
//! impl_token_conversions!(Verb {
//!     Get => "GET",
//!     Put => "PUT",
//! });
//!
//! assert_eq!(Verb::Get.to_string(), "GET");
//! assert_eq!("put".parse::<Verb>().unwrap(), Verb::Put);
//! ```

/// Implements `Display` and `FromStr` for a fieldless enum
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their canonical string
///
/// Parsing is ASCII case-insensitive and the error names the enum.
#[macro_export]
macro_rules! impl_token_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Canonical string form.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case($str) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(format!("Invalid {}: {}", stringify!($enum_name), s))
            }
        }
    };
}
