/// Declares a `#[repr(transparent)]` bitflags-style newtype. `$name` is
/// substituted throughout, including in the `Debug` impl, so the macro can
/// be instantiated for every flag set this crate declares.
macro_rules! __bitflags {
    ($vis:vis struct $name:ident($ty:ty) {
        $(
            $(#[$($meta:meta)*])*
            $flag_vis:vis const $flag:ident = $value:expr;
        )*
    }) => {
        #[derive(Clone, Copy, PartialEq, Eq)]
        #[repr(transparent)]
        $vis struct $name($ty);

        impl $name {
            $(
                $(#[$($meta)*])*
                $flag_vis const $flag: Self = Self($value);
            )*

            /// Convert the flags to their raw representation.
            #[inline]
            $vis fn into_raw(self) -> $ty {
                self.0
            }

            /// Construct flags from their raw representation.
            #[inline]
            $vis fn from_raw(value: $ty) -> Self {
                Self(value)
            }

            /// True if every flag set in `other` is also set in `self`.
            #[inline]
            $vis fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }
        }

        impl core::ops::BitOr for $name {
            type Output = Self;

            #[inline]
            fn bitor(self, rhs: Self) -> Self::Output {
                Self(self.0 | rhs.0)
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                if self.0 == 0 {
                    return write!(f, "NONE");
                }

                let mut first = true;

                let mut write = |flag: &'static str| -> core::fmt::Result {
                    if !first {
                        write!(f, " | ")?;
                    }

                    flag.fmt(f)?;
                    first = false;
                    Ok(())
                };

                $(
                    if self.0 & Self::$flag.0 != 0 {
                        write(stringify!($flag))?;
                    }
                )*

                Ok(())
            }
        }
    }
}

pub(crate) use __bitflags as bitflags;
