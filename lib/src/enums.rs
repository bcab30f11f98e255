//! Open integer enumerations.
//!
//! Protocol enums are newtypes over `i32` rather than native enums: a peer
//! running a newer protocol version can send values this side doesn't know
//! about, and those have to survive decoding, copying and re-encoding.

use std::fmt::Display;

/// Common surface of all enums declared with [`protocol_enum!`].
pub trait ProtocolEnum: Sized + Copy + Eq + Display + 'static {
    fn value(self) -> i32;

    fn from_value(value: i32) -> Self;

    /// Name of the value, `None` if it's outside the known set.
    fn name(self) -> Option<&'static str>;

    fn from_name(name: &str) -> Option<Self>;

    /// All known values in declaration order.
    fn all() -> &'static [Self];

    fn known(self) -> bool {
        self.name().is_some()
    }
}

/// Declares a protocol enum: a transparent `i32` newtype with one associated
/// constant per named value.
///
/// ```
/// protobind::protocol_enum! {
///     pub enum Fruit {
///         APPLE = 1,
///         PEAR = 2,
///     }
/// }
///
/// use protobind::ProtocolEnum;
/// assert_eq!(Fruit::from_name("PEAR"), Some(Fruit::PEAR));
/// assert_eq!(Fruit(7).to_string(), "7");
/// ```
#[macro_export]
macro_rules! protocol_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        $vis struct $name(pub i32);

        #[allow(non_upper_case_globals)]
        impl $name {
            $( $(#[$vmeta])* pub const $variant: $name = $name($value); )*
        }

        impl $crate::ProtocolEnum for $name {
            fn value(self) -> i32 {
                self.0
            }

            fn from_value(value: i32) -> Self {
                $name(value)
            }

            #[allow(unreachable_patterns)]
            fn name(self) -> ::std::option::Option<&'static str> {
                match self {
                    $( $name::$variant => ::std::option::Option::Some(stringify!($variant)), )*
                    _ => ::std::option::Option::None,
                }
            }

            fn from_name(name: &str) -> ::std::option::Option<Self> {
                $(
                    if name == stringify!($variant) {
                        return ::std::option::Option::Some($name::$variant);
                    }
                )*
                ::std::option::Option::None
            }

            fn all() -> &'static [Self] {
                &[$( $name::$variant ),*]
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match $crate::ProtocolEnum::name(*self) {
                    ::std::option::Option::Some(name) => f.write_str(name),
                    ::std::option::Option::None => write!(f, "{}", self.0),
                }
            }
        }

        impl $crate::__private::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: $crate::__private::serde::Serializer,
            {
                serializer.serialize_i32(self.0)
            }
        }

        impl<'de> $crate::__private::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: $crate::__private::serde::Deserializer<'de>,
            {
                <i32 as $crate::__private::serde::Deserialize>::deserialize(deserializer).map($name)
            }
        }
    };
}
