//! Tagged-union records.
//!
//! A variant value carries exactly one of several payload kinds, selected by
//! a discriminant from a [`crate::ProtocolEnum`]. In memory it's a native
//! enum with one case per payload kind, plus a `Default(tag)` case holding
//! a bare discriminant. On the wire it's a record with the discriminant
//! under `"t"` and one optional slot per payload kind; only the slot
//! matching the discriminant is ever written.
//!
//! Accessing the wrong case is a programming error and panics. A
//! discriminant naming a slot that was never filled is a data error and is
//! reported by [`Variant::discriminant`] only.

use crate::{ProtocolEnum, Result};

/// Common surface of all variants declared with [`variant!`].
pub trait Variant: Sized {
    type Tag: ProtocolEnum;

    /// Tag of the live case, without any validation.
    fn tag(&self) -> Self::Tag;

    /// Returns the discriminant after checking that the slot it names is
    /// populated.
    ///
    /// A `Default(tag)` value whose tag has a payload slot fails with
    /// [`crate::Error::VariantIntegrity`]. Tags without a slot, including
    /// ones unknown to this side, are fine.
    fn discriminant(&self) -> Result<Self::Tag>;

    /// Builds a value carrying only the discriminant.
    fn new_default(tag: Self::Tag) -> Self;
}

/// Recursive copy producing an independent value graph.
///
/// All generated records own their data, so cloning already is a deep copy.
pub trait DeepCopy {
    fn deep_copy(&self) -> Self;
}

impl<T: Clone> DeepCopy for T {
    fn deep_copy(&self) -> Self {
        self.clone()
    }
}

/// Declares a variant record.
///
/// Every case names the discriminant constant it's selected by, the wire
/// name of its payload slot, and the names of its constructor and accessor.
/// Payload types need to be `Clone + Default` and serializable. The
/// discriminant is written under `"t"` unless another field name is given
/// with `as "name"` after the tag type.
///
/// ```
/// use protobind::{protocol_enum, variant, Variant};
///
/// protocol_enum! {
///     pub enum Kind {
///         NUMBER = 0,
///         TEXT = 1,
///         EMPTY = 2,
///     }
/// }
///
/// variant! {
///     pub enum Value: Kind {
///         Number(i64) { tag: NUMBER, slot: "number", new: with_number, get: number },
///         Text(String) { tag: TEXT, slot: "text", new: with_text, get: text },
///     }
/// }
///
/// let value = Value::with_text("hi".to_string());
/// assert_eq!(value.discriminant().unwrap(), Kind::TEXT);
/// assert_eq!(value.text(), "hi");
/// assert!(Value::new_default(Kind::NUMBER).discriminant().is_err());
/// ```
#[macro_export]
macro_rules! variant {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $disc:ident $(as $field:literal)? {
            $(
                $(#[$vmeta:meta])*
                $case:ident ($payload:ty) {
                    tag: $tag:ident,
                    slot: $slot:literal,
                    new: $ctor:ident,
                    get: $getter:ident $(,)?
                }
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis enum $name {
            $( $(#[$vmeta])* $case($payload), )*
            /// Discriminant only, no payload.
            Default($disc),
        }

        impl $name {
            $(
                pub fn $ctor(v: $payload) -> Self {
                    $name::$case(v)
                }
            )*

            pub fn new_default(tag: $disc) -> Self {
                $name::Default(tag)
            }

            $(
                /// Panics with "wrong case accessed" unless the discriminant
                /// selects this case. A bare discriminant yields the zero
                /// value.
                pub fn $getter(&self) -> $payload {
                    match self {
                        $name::$case(v) => ::std::clone::Clone::clone(v),
                        $name::Default(tag) if *tag == $disc::$tag => {
                            ::std::default::Default::default()
                        }
                        #[allow(unreachable_patterns)]
                        _ => panic!("wrong case accessed"),
                    }
                }
            )*
        }

        impl $crate::Variant for $name {
            type Tag = $disc;

            fn tag(&self) -> $disc {
                match self {
                    $( $name::$case(_) => $disc::$tag, )*
                    $name::Default(tag) => *tag,
                }
            }

            fn discriminant(&self) -> $crate::Result<$disc> {
                match self {
                    $( $name::$case(_) => ::std::result::Result::Ok($disc::$tag), )*
                    $name::Default(tag) => {
                        $(
                            if *tag == $disc::$tag {
                                return ::std::result::Result::Err(
                                    $crate::Error::VariantIntegrity(format!(
                                        "unexpected nil value for {}",
                                        $slot
                                    )),
                                );
                            }
                        )*
                        ::std::result::Result::Ok(*tag)
                    }
                }
            }

            fn new_default(tag: $disc) -> Self {
                $name::Default(tag)
            }
        }

        impl ::std::default::Default for $name {
            fn default() -> Self {
                $name::Default(<$disc as ::std::default::Default>::default())
            }
        }

        const _: () = {
            use ::std::fmt;
            use $crate::__private::serde::de::{self, MapAccess, Visitor};
            use $crate::__private::serde::ser::{self, SerializeStruct};

            const TAG_FIELD: &str = $crate::__variant_tag_field!($($field)?);

            impl ser::Serialize for $name {
                fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
                where
                    S: ser::Serializer,
                {
                    let len = match self {
                        $name::Default(_) => 1,
                        #[allow(unreachable_patterns)]
                        _ => 2,
                    };
                    let mut state = serializer.serialize_struct(stringify!($name), len)?;
                    state.serialize_field(TAG_FIELD, &$crate::Variant::tag(self))?;
                    match self {
                        $( $name::$case(v) => state.serialize_field($slot, v)?, )*
                        $name::Default(_) => (),
                    }
                    state.end()
                }
            }

            struct WireVisitor;

            impl<'de> Visitor<'de> for WireVisitor {
                type Value = $name;

                fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "variant record {}", stringify!($name))
                }

                fn visit_map<A>(self, mut map: A) -> ::std::result::Result<$name, A::Error>
                where
                    A: MapAccess<'de>,
                {
                    let mut tag: ::std::option::Option<$disc> = None;
                    $( let mut $getter: ::std::option::Option<$payload> = None; )*

                    while let Some(key) = map.next_key::<::std::string::String>()? {
                        if key == TAG_FIELD {
                            tag = Some(map.next_value()?);
                            continue;
                        }
                        match key.as_str() {
                            $( $slot => $getter = map.next_value()?, )*
                            _ => {
                                map.next_value::<de::IgnoredAny>()?;
                            }
                        }
                    }

                    let tag = tag.ok_or_else(|| <A::Error as de::Error>::missing_field(TAG_FIELD))?;
                    // only the slot matching the discriminant counts
                    $(
                        if tag == $disc::$tag {
                            return Ok(match $getter {
                                Some(v) => $name::$case(v),
                                None => $name::Default(tag),
                            });
                        }
                    )*
                    Ok($name::Default(tag))
                }
            }

            impl<'de> de::Deserialize<'de> for $name {
                fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
                where
                    D: de::Deserializer<'de>,
                {
                    deserializer.deserialize_map(WireVisitor)
                }
            }
        };
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __variant_tag_field {
    () => {
        "t"
    };
    ($field:literal) => {
        $field
    };
}
