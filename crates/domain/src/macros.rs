//! Macro for implementing Display and FromStr for domain enums
//!
//! Used for enums that travel through command-line arguments and log fields,
//! where a single lowercase spelling is shown but any casing is accepted.
//!
//! # Example
//!
//! ```rust
//! use jigsaw_domain::impl_domain_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Plan {
//!     Free,
//!     Pro,
//! }
//!
//! impl_domain_enum_conversions!(Plan {
//!     Free => "free",
//!     Pro => "pro",
//! });
//!
//! assert_eq!("PRO".parse::<Plan>().unwrap(), Plan::Pro);
//! assert_eq!(Plan::Free.to_string(), "free");
//! ```

/// Implements Display and FromStr traits for domain enums
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their lowercase string
///   representations
#[macro_export]
macro_rules! impl_domain_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
