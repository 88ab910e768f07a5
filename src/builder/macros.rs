//! Macros for ergonomic state machine construction.

/// Declare an enum of state identities.
///
/// Generates `name()`, `id()`, `from_id()`, an `ALL` table and
/// `From<Enum> for StateId`.
///
/// # Example
///
/// ```
/// use quickdraw_core::core::StateId;
/// use quickdraw_core::state_ids;
///
/// state_ids! {
///     pub enum DoorStateId {
///         Closed = 0,
///         Opening = 1,
///         Open = 2,
///     }
/// }
///
/// assert_eq!(StateId::from(DoorStateId::Open), StateId(2));
/// assert_eq!(DoorStateId::Opening.name(), "Opening");
/// assert_eq!(DoorStateId::from_id(StateId(0)), Some(DoorStateId::Closed));
/// ```
#[macro_export]
macro_rules! state_ids {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident = $value:expr
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
        #[repr(u32)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant = $value
            ),*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }

            pub fn id(self) -> $crate::core::StateId {
                $crate::core::StateId(self as u32)
            }

            pub fn from_id(id: $crate::core::StateId) -> Option<Self> {
                Self::ALL.iter().copied().find(|variant| variant.id() == id)
            }
        }

        impl From<$name> for $crate::core::StateId {
            fn from(value: $name) -> Self {
                value.id()
            }
        }
    };
}
