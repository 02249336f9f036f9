/// Define a 16-byte identifier newtype
///
/// The generated type orders bytewise, and so does its bincode encoding,
/// which lets it serve as a prefix of storage keys. Text form is unpadded
/// base32.
macro_rules! define_id {
    (
        $(#[$outer:meta])*
        $name:ident
    ) => {
        $(#[$outer])*
        #[derive(Copy, Clone, Hash, PartialOrd, Ord, PartialEq, Eq)]
        #[cfg_attr(feature = "bincode", derive(::bincode::Encode, ::bincode::Decode))]
        pub struct $name([u8; $crate::id::ID_LEN]);

        impl $name {
            /// Lowest possible id, start of an inclusive range scan
            pub const ZERO: Self = Self([0u8; $crate::id::ID_LEN]);
            /// Highest possible id, end of an inclusive range scan
            pub const MAX: Self = Self([0xffu8; $crate::id::ID_LEN]);

            pub const fn from_bytes(bytes: [u8; $crate::id::ID_LEN]) -> Self {
                Self(bytes)
            }

            pub const fn to_bytes(self) -> [u8; $crate::id::ID_LEN] {
                self.0
            }

            #[cfg(feature = "rand")]
            pub fn random() -> Self {
                use rand::RngCore as _;

                let mut bytes = [0u8; $crate::id::ID_LEN];
                rand::rng().fill_bytes(&mut bytes);
                Self(bytes)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                data_encoding::BASE32_NOPAD.encode_write(&self.0, f)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({self})", stringify!($name))
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::id::IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $crate::id::decode_id(s).map(Self)
            }
        }

        #[cfg(feature = "serde")]
        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                if s.is_human_readable() {
                    s.collect_str(self)
                } else {
                    s.serialize_bytes(&self.0)
                }
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(d: D) -> Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                use ::serde::de::Error as _;

                if d.is_human_readable() {
                    let s = <std::borrow::Cow<'de, str>>::deserialize(d)?;
                    s.parse().map_err(D::Error::custom)
                } else {
                    let bytes = <Vec<u8>>::deserialize(d)?;
                    let len = bytes.len();
                    bytes
                        .try_into()
                        .map(Self)
                        .map_err(|_| D::Error::invalid_length(len, &"16 bytes"))
                }
            }
        }
    };
}

pub(crate) use define_id;
